// SPDX-License-Identifier: MIT
//! # Cover Plan Computation
//!
//! Computes how a source frame is scaled to *cover* a target rectangle and
//! which centered region of the scaled frame survives the crop.
//!
//! ## Algorithm
//!
//! 1. Compare `video_aspect = w / h` with `target_aspect = tw / th`.
//! 2. Source relatively wider: pin the height to `th`, width becomes
//!    `round(th * video_aspect)`.
//! 3. Otherwise pin the width to `tw`, height becomes `round(tw / video_aspect)`.
//! 4. Crop the excess symmetrically; on an odd excess the extra pixel comes
//!    off the right/bottom edge.
//!
//! Rounding is `f64::round` (nearest, ties away from zero). The scaled size is
//! clamped to at least the target on both axes so the crop never underflows.

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    /// True when either side is zero.
    pub const fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn aspect(self) -> f64 {
        self.w as f64 / self.h as f64
    }
}

/// Sub-rectangle of the scaled image that becomes the output.
/// Coordinates are in scaled-image space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Axis whose scaled length equals the target exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinnedAxis {
    /// Source relatively wider than target; excess is cropped horizontally.
    Height,
    /// Source relatively taller or equal; excess (if any) is cropped vertically.
    Width,
}

/// Complete cover plan computed from input and target sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FitPlan {
    /// Original input dimensions
    pub input: Size,
    /// Exact output dimensions
    pub target: Size,
    /// Cover size after aspect-preserving scale, before cropping. Only the
    /// crop is ever resampled, so this size is never allocated.
    pub scaled: Size,
    /// Which axis was pinned to the target
    pub pinned: PinnedAxis,
    /// Centered crop applied to the scaled image, `None` when it already matches
    pub crop: Option<CropRect>,
}

impl FitPlan {
    /// Whether the source has to be resampled at all.
    pub fn needs_resize(&self) -> bool {
        self.scaled != self.input
    }

    /// The region copied into the output, full-frame when no crop is needed.
    pub fn crop_rect(&self) -> CropRect {
        self.crop.unwrap_or(CropRect {
            x: 0,
            y: 0,
            w: self.target.w,
            h: self.target.h,
        })
    }
}

/// Compute the cover plan for `input` into `target`.
///
/// Both sizes must be non-empty; callers validate frames and substitute
/// fallback targets before planning. Empty sides are treated as 1px to keep
/// the ratios finite.
pub fn build_cover_plan(input: Size, target: Size) -> FitPlan {
    let video_aspect = input.w.max(1) as f64 / input.h.max(1) as f64;
    let target_aspect = target.w.max(1) as f64 / target.h.max(1) as f64;

    let (scaled, pinned) = if video_aspect > target_aspect {
        let w = round_dim(target.h as f64 * video_aspect).max(target.w);
        (Size { w, h: target.h }, PinnedAxis::Height)
    } else {
        let h = round_dim(target.w as f64 / video_aspect).max(target.h);
        (Size { w: target.w, h }, PinnedAxis::Width)
    };

    FitPlan {
        input,
        target,
        scaled,
        pinned,
        crop: center_crop(scaled, target),
    }
}

/// Centered crop of `inner` down to `target`, or `None` if nothing overflows.
/// Floor division puts the odd leftover pixel on the right/bottom side.
pub fn center_crop(inner: Size, target: Size) -> Option<CropRect> {
    if inner.w <= target.w && inner.h <= target.h {
        return None;
    }
    Some(CropRect {
        x: inner.w.saturating_sub(target.w) / 2,
        y: inner.h.saturating_sub(target.h) / 2,
        w: target.w.min(inner.w),
        h: target.h.min(inner.h),
    })
}

#[inline]
fn round_dim(v: f64) -> u32 {
    v.round().clamp(1.0, u32::MAX as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_source_pins_height() {
        let plan = build_cover_plan(Size::new(1920, 1080), Size::new(320, 240));
        assert_eq!(plan.pinned, PinnedAxis::Height);
        assert_eq!(plan.scaled, Size::new(427, 240));
        assert_eq!(
            plan.crop,
            Some(CropRect {
                x: 53,
                y: 0,
                w: 320,
                h: 240
            })
        );
    }

    #[test]
    fn tall_source_pins_width() {
        let plan = build_cover_plan(Size::new(480, 640), Size::new(320, 240));
        assert_eq!(plan.pinned, PinnedAxis::Width);
        assert_eq!(plan.scaled, Size::new(320, 427));
        assert_eq!(plan.crop_rect(), CropRect { x: 0, y: 93, w: 320, h: 240 });
    }

    #[test]
    fn equal_aspect_has_no_crop() {
        let plan = build_cover_plan(Size::new(1920, 1080), Size::new(1280, 720));
        assert_eq!(plan.pinned, PinnedAxis::Width);
        assert_eq!(plan.scaled, Size::new(1280, 720));
        assert_eq!(plan.crop, None);
        assert!(plan.needs_resize());
    }

    #[test]
    fn same_size_input_is_not_resampled() {
        let plan = build_cover_plan(Size::new(427, 240), Size::new(427, 240));
        assert!(!plan.needs_resize());
        assert_eq!(plan.crop, None);
    }

    #[test]
    fn odd_excess_goes_right() {
        // 7x2 into 4x2: scaled stays 7x2, excess 3 -> left 1, right 2
        let plan = build_cover_plan(Size::new(7, 2), Size::new(4, 2));
        assert_eq!(plan.scaled, Size::new(7, 2));
        assert_eq!(plan.crop_rect().x, 1);
    }

    #[test]
    fn half_rounds_away_from_zero() {
        // 2x5 into 1x2 pins the width: 1 / 0.4 = 2.5 -> 3
        let plan = build_cover_plan(Size::new(2, 5), Size::new(1, 2));
        assert_eq!(plan.pinned, PinnedAxis::Width);
        assert_eq!(plan.scaled, Size::new(1, 3));
        assert_eq!(plan.crop_rect().y, 0);
    }

    #[test]
    fn extreme_ratios_still_cover() {
        for (input, target) in [
            (Size::new(10_000, 1), Size::new(3, 3)),
            (Size::new(1, 10_000), Size::new(3, 3)),
            (Size::new(1, 1), Size::new(1920, 1080)),
            (Size::new(3, 2), Size::new(1, 1)),
        ] {
            let plan = build_cover_plan(input, target);
            assert!(plan.scaled.w >= target.w && plan.scaled.h >= target.h);
            let rect = plan.crop_rect();
            assert_eq!((rect.w, rect.h), (target.w, target.h));
            assert!(rect.x + rect.w <= plan.scaled.w);
            assert!(rect.y + rect.h <= plan.scaled.h);
        }
    }
}
