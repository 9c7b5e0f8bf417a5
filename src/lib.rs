//! # slotfit
//!
//! Fits decoded video frames into the slots of a conference grid. Every
//! frame is scaled uniformly until it covers its slot and then
//! center-cropped, so tiles are filled edge to edge without distortion or
//! letterbox bars.
//!
//! ## Architecture
//!
//! - `fit`: [`FrameFitter`], the pure aspect-fill-and-crop transform
//! - `layout`: slot size providers and the dynamic grid geometry
//! - `processing`: per-tile processor chain and the presentation seam
//! - `session`: one render task per slot with latest-frame delivery
//! - `core`: the frame data model
//! - `config`: configuration and validation
//! - `error`: error taxonomy and classification
//!
//! Pixel math lives in the `fit-scale` crate; this crate adds validation,
//! fallback handling, logging and the render plumbing around it.
//!
//! ## Example
//!
//! ```rust
//! use slotfit::{Frame, FrameFitter, PixelLayout};
//!
//! let frame = Frame::solid(1920, 1080, PixelLayout::Rgb8, &[30, 60, 90])?;
//! let fitter = FrameFitter::default();
//!
//! let tile = fitter.fit(&frame, 320, 240)?;
//! assert_eq!((tile.width, tile.height), (320, 240));
//!
//! // Slot not laid out yet: the 400x300 fallback is used for this call.
//! let tile = fitter.fit(&frame, 0, 0)?;
//! assert_eq!((tile.width, tile.height), (400, 300));
//! # Ok::<(), slotfit::FitError>(())
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod fit;
pub mod layout;
pub mod processing;
pub mod session;

/// Re-export error types for convenience
pub use error::{FitError, FitResult, HasSeverity, Retryable};

pub use crate::core::{Frame, PixelLayout};
pub use fit::{FrameFitter, SlotTarget};
pub use fit_scale::plan::{FitPlan, Size};
pub use layout::{FixedSlotSize, GridLayout, SharedSlotSize, SlotSizeProvider};
