//! # Frame Model
//!
//! In-memory decoded frames as they arrive from a capture/decode
//! collaborator and leave towards the presentation layer.
//!
//! Frames share their pixel data through `Arc<Vec<u8>>`, so cloning a frame
//! to hand it to another task or slot never copies pixels.

use std::sync::Arc;

use fit_scale::plan::Size;
use image::RgbaImage;

use crate::error::{FitError, FitResult};

pub use fit_scale::cpu::PixelLayout;

/// A packed 8-bit frame.
#[derive(Clone, Debug)]
pub struct Frame {
    pub data: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    /// Bytes per row, at least `width * layout.bytes_per_pixel()`.
    pub stride: usize,
    pub layout: PixelLayout,
    /// Presentation timestamp carried through fitting unchanged.
    pub pts_ns: Option<u64>,
}

impl Frame {
    /// Create a tightly packed frame, validating the buffer length.
    pub fn new(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> FitResult<Self> {
        let stride = width as usize * layout.bytes_per_pixel();
        Self::with_stride(width, height, stride, layout, data)
    }

    /// Create a frame whose rows may carry trailing padding.
    pub fn with_stride(
        width: u32,
        height: u32,
        stride: usize,
        layout: PixelLayout,
        data: Vec<u8>,
    ) -> FitResult<Self> {
        let frame = Self {
            data: Arc::new(data),
            width,
            height,
            stride,
            layout,
            pts_ns: None,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// A frame filled with one pixel value. `pixel` must be `bytes_per_pixel` long.
    pub fn solid(width: u32, height: u32, layout: PixelLayout, pixel: &[u8]) -> FitResult<Self> {
        if pixel.len() != layout.bytes_per_pixel() {
            return Err(FitError::invalid_image(
                width,
                height,
                format!(
                    "pixel has {} bytes, {:?} needs {}",
                    pixel.len(),
                    layout,
                    layout.bytes_per_pixel()
                ),
            ));
        }
        Self::new(width, height, layout, pixel.repeat(width as usize * height as usize))
    }

    pub fn with_pts(mut self, pts_ns: u64) -> Self {
        self.pts_ns = Some(pts_ns);
        self
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Check that dimensions are positive and the buffer covers every row.
    pub fn validate(&self) -> FitResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FitError::invalid_image(
                self.width,
                self.height,
                "width and height must be positive",
            ));
        }
        let row_bytes = self.width as usize * self.layout.bytes_per_pixel();
        if self.stride < row_bytes {
            return Err(FitError::invalid_image(
                self.width,
                self.height,
                format!("stride {} shorter than row of {} bytes", self.stride, row_bytes),
            ));
        }
        let needed = self
            .stride
            .checked_mul(self.height as usize - 1)
            .and_then(|n| n.checked_add(row_bytes))
            .ok_or_else(|| {
                FitError::invalid_image(
                    self.width,
                    self.height,
                    format!("stride {} overflows the address space", self.stride),
                )
            })?;
        if self.data.len() < needed {
            return Err(FitError::invalid_image(
                self.width,
                self.height,
                format!("buffer holds {} bytes, need {}", self.data.len(), needed),
            ));
        }
        Ok(())
    }

    /// Whether rows are stored without padding.
    pub fn is_packed(&self) -> bool {
        self.stride == self.width as usize * self.layout.bytes_per_pixel()
    }

    /// Bytes of pixel `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let bpp = self.layout.bytes_per_pixel();
        let start = y as usize * self.stride + x as usize * bpp;
        &self.data[start..start + bpp]
    }

    /// Wrap a decoded RGBA image without copying.
    pub fn from_rgba_image(img: RgbaImage) -> FitResult<Self> {
        let (width, height) = img.dimensions();
        Self::new(width, height, PixelLayout::Rgba8, img.into_raw())
    }

    /// Convert to an RGBA image for encoding.
    pub fn to_rgba_image(&self) -> FitResult<RgbaImage> {
        self.validate()?;
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            for x in 0..self.width {
                let px = self.pixel(x, y);
                let rgba = match self.layout {
                    PixelLayout::Gray8 => [px[0], px[0], px[0], 255],
                    PixelLayout::Rgb8 => [px[0], px[1], px[2], 255],
                    PixelLayout::Rgba8 => [px[0], px[1], px[2], px[3]],
                    PixelLayout::Bgra8 => [px[2], px[1], px[0], px[3]],
                };
                out.extend_from_slice(&rgba);
            }
        }
        RgbaImage::from_raw(self.width, self.height, out).ok_or_else(|| {
            FitError::invalid_image(self.width, self.height, "rgba buffer size mismatch")
        })
    }
}
