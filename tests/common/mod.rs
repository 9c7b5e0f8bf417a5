//! Shared helpers for the integration tests.

#![allow(dead_code)]

use slotfit::{Frame, PixelLayout};

/// Standard test sizes
pub const FHD: (u32, u32) = (1920, 1080);
pub const VGA_PORTRAIT: (u32, u32) = (480, 640);
pub const SQUARE: (u32, u32) = (100, 100);

/// RGB frame with a red ramp across x and a green ramp down y,
/// the same pattern the UI test harness draws.
pub fn gradient_frame(width: u32, height: u32) -> Frame {
    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            data.push(((x as f32 / width as f32) * 255.0) as u8);
            data.push(((y as f32 / height as f32) * 255.0) as u8);
            data.push(128);
        }
    }
    Frame::new(width, height, PixelLayout::Rgb8, data).expect("valid gradient frame")
}

/// BGRA frame filled with one color.
pub fn solid_bgra(width: u32, height: u32, bgra: [u8; 4]) -> Frame {
    Frame::solid(width, height, PixelLayout::Bgra8, &bgra).expect("valid solid frame")
}
