//! # Error Handling
//!
//! Error taxonomy for frame fitting and the code around it.
//!
//! ## Error Classification
//!
//! - `InvalidImage`: the source frame is unusable (zero width/height or a
//!   buffer that does not cover its rows). Never retried: the transform is
//!   pure, so the same input fails the same way.
//! - `Scale`: the CPU scaler rejected its buffers.
//! - `Config`: a configuration value failed validation.
//! - `Io`, `Image`, `Json`: file and codec failures at the CLI/config edge.
//! - `SlotClosed`: a frame was pushed to a slot whose render task is gone.
//!
//! A target size of zero or less is *not* an error; the fitter substitutes
//! its fallback size instead.
//!
//! ## Classification
//!
//! Render sessions consult these traits when a frame fails:
//! - [`Retryable`] sink errors get one more presentation attempt after
//!   [`Retryable::retry_delay_ms`].
//! - [`classify::is_fatal`] errors stop the slot.
//! - Everything else skips the frame and the slot keeps rendering.
//!
//! ```rust
//! use slotfit::error::{classify, FitError, Retryable};
//!
//! let error = FitError::invalid_image(0, 1080, "width and height must be positive");
//! assert!(!error.is_retryable());
//! assert!(classify::is_frame_local(&error));
//! assert!(!classify::is_fatal(&error));
//! ```

use fit_scale::cpu::ScaleError;

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Warnings that may indicate potential issues
    Warning,
    /// Errors that affect operation but can be recovered from
    Error,
    /// Fatal errors that cannot be recovered from
    Fatal,
}

/// Base error type for the fitting library
#[derive(Debug, thiserror::Error)]
pub enum FitError {
    /// Source frame has non-positive dimensions or an inconsistent buffer
    #[error("invalid image {width}x{height}: {reason}")]
    InvalidImage {
        width: u32,
        height: u32,
        reason: String,
    },
    /// CPU scaler failure
    #[error("scaling failed: {0}")]
    Scale(#[from] ScaleError),
    /// Configuration validation errors
    #[error("invalid config field '{field}' = '{value}': {reason}")]
    Config {
        field: String,
        value: String,
        reason: String,
    },
    /// I/O errors
    #[error("I/O error during {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
    /// Image decode/encode errors
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
    /// Config parse errors
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// Slot render task has stopped
    #[error("slot {slot} is closed")]
    SlotClosed { slot: usize },
}

impl FitError {
    /// Create an invalid image error
    pub fn invalid_image(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Short category name, used as a structured log field.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidImage { .. } => "invalid_image",
            Self::Scale(_) => "scale",
            Self::Config { .. } => "config",
            Self::Io { .. } => "io",
            Self::Image(_) => "image",
            Self::Json(_) => "json",
            Self::SlotClosed { .. } => "slot_closed",
        }
    }
}

impl From<std::io::Error> for FitError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

/// Result type alias using our error type
pub type FitResult<T> = Result<T, FitError>;

/// Trait for errors that can be retried
pub trait Retryable {
    /// Check if this error can be retried
    fn is_retryable(&self) -> bool;

    /// Get the recommended retry delay in milliseconds
    fn retry_delay_ms(&self) -> Option<u64> {
        None
    }
}

impl Retryable for FitError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            Self::Io { .. } => Some(100),
            _ => None,
        }
    }
}

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for FitError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidImage { .. } | Self::Scale(_) => ErrorSeverity::Warning,
            Self::SlotClosed { .. } | Self::Config { .. } => ErrorSeverity::Fatal,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Per-frame failures: the slot keeps rendering later frames.
    pub fn is_frame_local(error: &FitError) -> bool {
        matches!(error, FitError::InvalidImage { .. } | FitError::Scale(_))
    }

    /// Check if an error is fatal (cannot be recovered from)
    pub fn is_fatal(error: &FitError) -> bool {
        error.severity() == ErrorSeverity::Fatal
    }
}
