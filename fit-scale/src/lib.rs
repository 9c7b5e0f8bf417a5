// SPDX-License-Identifier: MIT
//! # fit-scale: Aspect-Fill Scaling for Video Tiles
//!
//! Scales a frame so it *covers* a target rectangle without distortion and
//! center-crops whatever overflows. The output always has exactly the target
//! dimensions.
//!
//! ## Key Components
//!
//! - [`plan`]: cover plan computation (intermediate size, pinned axis, crop rect)
//! - [`cpu`]: CPU execution on packed 8-bit buffers using fast_image_resize
//!
//! Resampling is pinned to bilinear convolution ([`cpu::INTERPOLATION`]) so
//! results do not depend on platform defaults.
//!
//! ## Usage Example
//!
//! ```rust
//! use fast_image_resize::Resizer;
//! use fit_scale::cpu::{fit_cpu, output_len, PixelLayout};
//! use fit_scale::plan::{build_cover_plan, Size};
//!
//! let src = vec![128u8; 1920 * 1080 * 4];
//! let plan = build_cover_plan(Size::new(1920, 1080), Size::new(320, 240));
//! assert_eq!(plan.scaled, Size::new(427, 240));
//!
//! let mut out = vec![0u8; output_len(&plan, PixelLayout::Rgba8)];
//! fit_cpu(
//!     &mut Resizer::new(),
//!     &src,
//!     Size::new(1920, 1080),
//!     None, // tightly packed
//!     PixelLayout::Rgba8,
//!     &plan,
//!     &mut out,
//!     None,
//! )?;
//! assert_eq!(out.len(), 320 * 240 * 4);
//! # Ok::<(), fit_scale::cpu::ScaleError>(())
//! ```

pub mod cpu;
pub mod plan;

pub use cpu::{PixelLayout, ScaleError};
pub use plan::{FitPlan, Size};
