//! # Core Types
//!
//! Frame data model shared by the fitter, the processing pipeline and the
//! render session.

pub mod frame;

pub use frame::{Frame, PixelLayout};
