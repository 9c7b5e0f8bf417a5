//! # Configuration
//!
//! Deployment settings for fitting and the slot grid, shared by the CLI and
//! by applications embedding the library.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Range | Description |
//! |-----------|------|-------|-------------|
//! | `fallback_width` | `u32` | ≥ 1 | Width used while a slot is unrealized |
//! | `fallback_height` | `u32` | ≥ 1 | Height used while a slot is unrealized |
//! | `slot_padding` | `u32` | 0-32 | Gap on each side of a slot inside its grid cell |
//! | `slot_border` | `u32` | 0-32 | Border on each side of a slot |
//! | `max_feeds` | `usize` | 1-16 | Feeds laid out in the grid |
//!
//! Files are JSON. Missing fields take their defaults, unknown fields are
//! rejected:
//!
//! ```json
//! { "fallback_width": 640, "fallback_height": 360, "slot_padding": 0 }
//! ```
//!
//! ## Examples
//!
//! ```rust
//! use slotfit::config::FitConfig;
//!
//! let config = FitConfig::from_json_str(r#"{ "fallback_width": 640, "fallback_height": 360 }"#)?;
//! assert_eq!(config.slot_padding, 1);
//! let fitter = config.fitter()?;
//! assert_eq!(fitter.fallback().w, 640);
//! # Ok::<(), slotfit::FitError>(())
//! ```

use std::fs;
use std::path::Path;

use fit_scale::plan::Size;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FitError, FitResult};
use crate::fit::{DEFAULT_FALLBACK, FrameFitter};
use crate::layout::{GridLayout, MAX_FEEDS};

/// Upper bound for padding and border, in pixels.
const MAX_SPACING: u32 = 32;

/// Fitting and layout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitConfig {
    /// Width substituted for an unrealized slot.
    pub fallback_width: u32,
    /// Height substituted for an unrealized slot.
    pub fallback_height: u32,
    /// Gap on each side of a slot inside its grid cell.
    pub slot_padding: u32,
    /// Border on each side of a slot.
    pub slot_border: u32,
    /// Maximum number of feeds laid out in the grid.
    pub max_feeds: usize,
}

impl Default for FitConfig {
    /// 400x300 fallback, 1px padding, no border, 16 feeds.
    fn default() -> Self {
        Self {
            fallback_width: DEFAULT_FALLBACK.w,
            fallback_height: DEFAULT_FALLBACK.h,
            slot_padding: 1,
            slot_border: 0,
            max_feeds: MAX_FEEDS,
        }
    }
}

impl FitConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> FitResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> FitResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| FitError::io(format!("reading config {}", path.display()), e))?;
        let config = Self::from_json_str(&text)?;
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> FitResult<()> {
        if self.fallback_width == 0 {
            return Err(FitError::config(
                "fallback_width",
                self.fallback_width,
                "must be greater than 0",
            ));
        }
        if self.fallback_height == 0 {
            return Err(FitError::config(
                "fallback_height",
                self.fallback_height,
                "must be greater than 0",
            ));
        }
        if self.slot_padding > MAX_SPACING {
            return Err(FitError::config(
                "slot_padding",
                self.slot_padding,
                format!("must be at most {MAX_SPACING}"),
            ));
        }
        if self.slot_border > MAX_SPACING {
            return Err(FitError::config(
                "slot_border",
                self.slot_border,
                format!("must be at most {MAX_SPACING}"),
            ));
        }
        if !(1..=MAX_FEEDS).contains(&self.max_feeds) {
            return Err(FitError::config(
                "max_feeds",
                self.max_feeds,
                format!("must be between 1 and {MAX_FEEDS}"),
            ));
        }
        Ok(())
    }

    pub fn fallback(&self) -> Size {
        Size::new(self.fallback_width, self.fallback_height)
    }

    /// Fitter using this config's fallback size.
    pub fn fitter(&self) -> FitResult<FrameFitter> {
        FrameFitter::with_fallback(self.fallback())
    }

    /// Grid over `display` with this config's spacing and feed limit.
    pub fn grid_layout(&self, display: Size) -> GridLayout {
        GridLayout::new(display)
            .with_spacing(self.slot_padding, self.slot_border)
            .with_max_feeds(self.max_feeds)
    }
}
