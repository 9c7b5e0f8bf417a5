//! # Frame Fitting
//!
//! [`FrameFitter`] turns an arbitrary-size frame into one that exactly fills
//! a slot: scale uniformly until the slot is covered, then center-crop the
//! overflow. No letterboxing, no distortion.
//!
//! ## Target resolution
//!
//! Slot sizes come from a live layout and are signed: a slot that has not
//! been laid out yet reports `0` (or less). Such a target is replaced by the
//! fitter's fallback size for that call only. The substitution is reported
//! through [`SlotTarget::fallback_applied`] and a `debug` event with
//! `fallback = true`, so it can be told apart from a genuine 400x300 slot.
//!
//! ## Concurrency
//!
//! The fitter holds only its fallback size and is `Copy`. Every call owns
//! its scratch memory, so any number of threads may fit frames at once.
//! Workers that want to reuse scratch between frames keep their own
//! `Resizer` and call [`FrameFitter::fit_with`].

use std::sync::Arc;

use fast_image_resize::Resizer;
use fit_scale::cpu::{fit_cpu, output_len, Staging};
use fit_scale::plan::{build_cover_plan, FitPlan, Size};
use tracing::{debug, trace};

use crate::core::Frame;
use crate::error::{FitError, FitResult};

/// Fallback slot size used while the real slot size is unknown.
pub const DEFAULT_FALLBACK: Size = Size { w: 400, h: 300 };

/// The slot size a fit will actually produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotTarget {
    pub size: Size,
    /// True when the requested size was unusable and the fallback was used.
    pub fallback_applied: bool,
}

/// Aspect-fill fitter with an injectable fallback size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameFitter {
    fallback: Size,
}

impl Default for FrameFitter {
    fn default() -> Self {
        Self {
            fallback: DEFAULT_FALLBACK,
        }
    }
}

impl FrameFitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `fallback` instead of 400x300 for unrealized slots.
    ///
    /// Errors if either side is zero, since the fallback must itself be a
    /// usable target.
    pub fn with_fallback(fallback: Size) -> FitResult<Self> {
        if fallback.is_empty() {
            return Err(FitError::config(
                "fallback",
                format!("{}x{}", fallback.w, fallback.h),
                "fallback dimensions must be positive",
            ));
        }
        Ok(Self { fallback })
    }

    pub fn fallback(&self) -> Size {
        self.fallback
    }

    /// Resolve a requested slot size, substituting the fallback when either
    /// side is `<= 0`.
    pub fn resolve_target(&self, width: i32, height: i32) -> SlotTarget {
        if width <= 0 || height <= 0 {
            debug!(
                requested_width = width,
                requested_height = height,
                fallback_width = self.fallback.w,
                fallback_height = self.fallback.h,
                fallback = true,
                "slot not laid out yet, using fallback size"
            );
            return SlotTarget {
                size: self.fallback,
                fallback_applied: true,
            };
        }
        SlotTarget {
            size: Size::new(width as u32, height as u32),
            fallback_applied: false,
        }
    }

    /// Compute the cover plan without touching pixels.
    pub fn plan(&self, frame: &Frame, width: i32, height: i32) -> FitResult<FitPlan> {
        frame.validate()?;
        let target = self.resolve_target(width, height);
        Ok(build_cover_plan(frame.size(), target.size))
    }

    /// Fit `frame` into a `width` x `height` slot.
    ///
    /// The result is exactly the resolved target size. `pts_ns` and pixel
    /// layout carry over from the source; the source is never modified.
    pub fn fit(&self, frame: &Frame, width: i32, height: i32) -> FitResult<Frame> {
        self.fit_with(&mut Resizer::new(), frame, width, height)
    }

    /// Like [`fit`](Self::fit), reusing the caller's resizer scratch.
    pub fn fit_with(
        &self,
        resizer: &mut Resizer,
        frame: &Frame,
        width: i32,
        height: i32,
    ) -> FitResult<Frame> {
        let plan = self.plan(frame, width, height)?;
        trace!(
            src_width = frame.width,
            src_height = frame.height,
            scaled_width = plan.scaled.w,
            scaled_height = plan.scaled.h,
            target_width = plan.target.w,
            target_height = plan.target.h,
            "cover plan"
        );

        let mut out = vec![0u8; output_len(&plan, frame.layout)];
        let mut staging = (!frame.is_packed()).then(|| {
            Staging::with_capacity(
                frame.width as usize * frame.height as usize * frame.layout.bytes_per_pixel(),
            )
        });
        fit_cpu(
            resizer,
            &frame.data,
            frame.size(),
            Some(frame.stride),
            frame.layout,
            &plan,
            &mut out,
            staging.as_mut(),
        )?;

        Ok(Frame {
            data: Arc::new(out),
            width: plan.target.w,
            height: plan.target.h,
            stride: plan.target.w as usize * frame.layout.bytes_per_pixel(),
            layout: frame.layout,
            pts_ns: frame.pts_ns,
        })
    }
}
