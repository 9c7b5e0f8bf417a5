//! # Processing Module
//!
//! This module contains the per-tile frame processing pipeline and the
//! presentation seam it feeds.

pub mod processing;

// Re-export commonly used types for convenience
pub use processing::{
    FitProcessor, FrameProcessor, FrameSink, ProcessingPipeline, SinkMultiplexer, SlotId,
};
