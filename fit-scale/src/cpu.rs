// SPDX-License-Identifier: MIT
// CPU scaler built on fast_image_resize (SIMD-accelerated).
// The centered crop is mapped back into source coordinates and resampled
// straight into dst; the cover-scaled image is never materialised.

use fast_image_resize as fir;
use fir::images::{Image, ImageRef};
use fir::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};

use crate::plan::{CropRect, FitPlan, Size};

/// Interpolation used for every resize. Pinned so golden outputs are stable.
pub const INTERPOLATION: ResizeAlg = ResizeAlg::Convolution(FilterType::Bilinear);

/// Byte layout of a packed 8-bit pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    Gray8,
    Rgb8,
    Rgba8,
    Bgra8,
}

impl PixelLayout {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Gray8 => 1,
            PixelLayout::Rgb8 => 3,
            PixelLayout::Rgba8 | PixelLayout::Bgra8 => 4,
        }
    }

    // Channel order does not matter to the resampler, only the channel count.
    fn pixel_type(self) -> PixelType {
        match self {
            PixelLayout::Gray8 => PixelType::U8,
            PixelLayout::Rgb8 => PixelType::U8x3,
            PixelLayout::Rgba8 | PixelLayout::Bgra8 => PixelType::U8x4,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScaleError {
    #[error("output buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },
    #[error("source buffer too small: need {needed} bytes, got {actual}")]
    SourceTooSmall { needed: usize, actual: usize },
    #[error("stride of {stride} bytes is shorter than a {row_bytes}-byte row")]
    StrideTooShort { stride: usize, row_bytes: usize },
    #[error("stride mismatch but no staging buffer provided")]
    StrideMismatchAndNoStaging,
    #[error("plan has an empty target")]
    EmptyTarget,
    #[error("fast image resize error: {0}")]
    Fir(#[from] fir::ResizeError),
    #[error("image buffer error: {0}")]
    ImageBuf(#[from] fir::ImageBufferError),
}

/// Pre-allocated scratch to compact strided input to tightly packed rows (only if needed).
pub struct Staging {
    pub(crate) buf: Vec<u8>,
}
impl Staging {
    pub fn with_capacity(cap: usize) -> Self { Self { buf: Vec::with_capacity(cap) } }
    pub fn ensure_len(&mut self, len: usize) { if self.buf.len() < len { self.buf.resize(len, 0); } }
    pub fn as_slice(&self) -> &[u8] { &self.buf }
}

/// Number of bytes `fit_cpu` writes for `plan`.
pub fn output_len(plan: &FitPlan, layout: PixelLayout) -> usize {
    plan.target.w as usize * plan.target.h as usize * layout.bytes_per_pixel()
}

/// Main fitting entry point.
/// `src_stride_bytes`: bytes per row of source. If `Some(stride) != width*bpp`, rows are compacted into staging.
/// `dst` receives exactly `plan.target` pixels, tightly packed.
#[allow(clippy::too_many_arguments)]
pub fn fit_cpu(
    resizer: &mut Resizer,
    src: &[u8],
    src_size: Size,
    src_stride_bytes: Option<usize>,
    layout: PixelLayout,
    plan: &FitPlan,
    dst: &mut [u8],
    mut staging: Option<&mut Staging>,
) -> Result<(), ScaleError> {
    if plan.target.is_empty() {
        return Err(ScaleError::EmptyTarget);
    }
    let bpp = layout.bytes_per_pixel();
    let dst_len = output_len(plan, layout);
    if dst.len() < dst_len {
        return Err(ScaleError::BufferTooSmall { needed: dst_len, actual: dst.len() });
    }

    // --- Build source view (tightly packed) ---
    let rows = src_size.h as usize;
    let tight_row_bytes = src_size.w as usize * bpp;
    let pitch = src_stride_bytes.unwrap_or(tight_row_bytes);
    if pitch < tight_row_bytes {
        return Err(ScaleError::StrideTooShort { stride: pitch, row_bytes: tight_row_bytes });
    }
    let needed = match rows.checked_sub(1) {
        None => 0,
        Some(last) => pitch
            .checked_mul(last)
            .and_then(|n| n.checked_add(tight_row_bytes))
            .unwrap_or(usize::MAX),
    };
    if src.len() < needed {
        return Err(ScaleError::SourceTooSmall { needed, actual: src.len() });
    }

    let tight: &[u8] = if pitch == tight_row_bytes {
        &src[..tight_row_bytes * rows]
    } else {
        let st = staging.as_deref_mut().ok_or(ScaleError::StrideMismatchAndNoStaging)?;
        st.ensure_len(tight_row_bytes * rows);
        compact_rows(src, pitch, st.buf.as_mut_slice(), tight_row_bytes, rows);
        &st.buf[..tight_row_bytes * rows]
    };

    let rect = plan.crop_rect();
    let dst = &mut dst[..dst_len];

    // Same-size input: nothing to resample, the crop is the whole frame.
    if !plan.needs_resize() {
        copy_crop(tight, src_size, rect, bpp, dst);
        return Ok(());
    }

    // --- Resample the source region under the crop directly into dst ---
    let (left, top, width, height) = source_crop(plan, rect);
    let src_view = ImageRef::new(src_size.w, src_size.h, tight, layout.pixel_type())?;
    let mut dst_view = Image::from_slice_u8(plan.target.w, plan.target.h, dst, layout.pixel_type())?;
    let opts = ResizeOptions::new()
        .resize_alg(INTERPOLATION)
        .use_alpha(false)
        .crop(left, top, width, height);
    resizer.resize(&src_view, &mut dst_view, &opts)?;
    Ok(())
}

/// Crop rectangle of `plan` expressed in source pixels, as
/// `(left, top, width, height)`. Each axis uses its own scale so the result
/// matches cropping the rounded cover size.
pub fn source_crop(plan: &FitPlan, rect: CropRect) -> (f64, f64, f64, f64) {
    let sx = plan.scaled.w as f64 / plan.input.w as f64;
    let sy = plan.scaled.h as f64 / plan.input.h as f64;
    let src_w = plan.input.w as f64;
    let src_h = plan.input.h as f64;

    let left = (rect.x as f64 / sx).min(src_w);
    let top = (rect.y as f64 / sy).min(src_h);
    let width = (rect.w as f64 / sx).min(src_w - left);
    let height = (rect.h as f64 / sy).min(src_h - top);
    (left, top, width, height)
}

#[inline]
fn copy_crop(src: &[u8], src_size: Size, rect: CropRect, bpp: usize, dst: &mut [u8]) {
    let src_row = src_size.w as usize * bpp;
    let row_bytes = rect.w as usize * bpp;
    let x_off = rect.x as usize * bpp;
    for (r, d) in dst.chunks_exact_mut(row_bytes).take(rect.h as usize).enumerate() {
        let start = (rect.y as usize + r) * src_row + x_off;
        d.copy_from_slice(&src[start..start + row_bytes]);
    }
}

#[inline]
fn compact_rows(src: &[u8], src_pitch: usize, dst: &mut [u8], row_bytes: usize, rows: usize) {
    for r in 0..rows {
        let s = &src[r * src_pitch .. r * src_pitch + row_bytes];
        let d = &mut dst[r * row_bytes .. (r + 1) * row_bytes];
        d.copy_from_slice(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::build_cover_plan;

    /// One gray byte per pixel holding the column index.
    fn column_ramp(w: u32, h: u32) -> Vec<u8> {
        (0..h).flat_map(|_| (0..w).map(|x| x as u8)).collect()
    }

    #[test]
    fn same_size_crop_keeps_center_columns() {
        // 6x2 into 3x2: no resample, left offset (6-3)/2 = 1
        let src = column_ramp(6, 2);
        let plan = build_cover_plan(Size::new(6, 2), Size::new(3, 2));
        assert!(!plan.needs_resize());

        let mut dst = vec![0u8; output_len(&plan, PixelLayout::Gray8)];
        fit_cpu(&mut Resizer::new(), &src, Size::new(6, 2), None, PixelLayout::Gray8, &plan, &mut dst, None).unwrap();
        assert_eq!(dst, vec![1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn odd_excess_trims_extra_column_on_the_right() {
        let src = column_ramp(7, 2);
        let plan = build_cover_plan(Size::new(7, 2), Size::new(4, 2));
        let mut dst = vec![0u8; output_len(&plan, PixelLayout::Gray8)];
        fit_cpu(&mut Resizer::new(), &src, Size::new(7, 2), None, PixelLayout::Gray8, &plan, &mut dst, None).unwrap();
        assert_eq!(&dst[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn solid_color_survives_resize() {
        let (w, h) = (64u32, 36u32);
        let src: Vec<u8> = [10u8, 200, 30, 255].repeat((w * h) as usize);
        let plan = build_cover_plan(Size::new(w, h), Size::new(20, 20));
        assert!(plan.needs_resize());

        let mut dst = vec![0u8; output_len(&plan, PixelLayout::Rgba8)];
        fit_cpu(&mut Resizer::new(), &src, Size::new(w, h), None, PixelLayout::Rgba8, &plan, &mut dst, None).unwrap();
        for px in dst.chunks_exact(4) {
            assert!(px[0].abs_diff(10) <= 1);
            assert!(px[1].abs_diff(200) <= 1);
            assert!(px[2].abs_diff(30) <= 1);
            assert!(px[3].abs_diff(255) <= 1);
        }
    }

    #[test]
    fn extreme_aspect_resamples_only_the_crop() {
        // 1x4000 covers 1920x1080 at 1920x7680000; only the target is ever allocated.
        let (w, h) = (1u32, 4000u32);
        let src = vec![77u8; (w * h) as usize];
        let plan = build_cover_plan(Size::new(w, h), Size::new(1920, 1080));
        assert_eq!(plan.scaled, Size::new(1920, 7_680_000));

        let mut dst = vec![0u8; output_len(&plan, PixelLayout::Gray8)];
        fit_cpu(&mut Resizer::new(), &src, Size::new(w, h), None, PixelLayout::Gray8, &plan, &mut dst, None).unwrap();
        assert!(dst.iter().all(|&b| b.abs_diff(77) <= 1));
    }

    #[test]
    fn source_crop_maps_cover_crop_back() {
        let plan = build_cover_plan(Size::new(1920, 1080), Size::new(320, 240));
        let (left, top, width, height) = source_crop(&plan, plan.crop_rect());
        assert_eq!((top, height), (0.0, 1080.0));
        assert!((left - 53.0 * 1920.0 / 427.0).abs() < 1e-9);
        assert!((width - 320.0 * 1920.0 / 427.0).abs() < 1e-9);
        // centered: equal margins up to the odd pixel of the scaled excess
        let right = 1920.0 - left - width;
        assert!((right - left).abs() <= 1920.0 / 427.0 + 1e-9);
    }

    #[test]
    fn overflowing_stride_is_rejected() {
        let src = column_ramp(6, 2);
        let plan = build_cover_plan(Size::new(6, 2), Size::new(3, 2));
        let mut dst = vec![0u8; 6];
        let err = fit_cpu(&mut Resizer::new(), &src, Size::new(6, 2), Some(usize::MAX), PixelLayout::Gray8, &plan, &mut dst, None)
            .unwrap_err();
        assert!(matches!(err, ScaleError::SourceTooSmall { needed: usize::MAX, .. }));
    }

    #[test]
    fn strided_source_needs_staging() {
        // 6x2 gray with 2 padding bytes per row
        let mut src = Vec::new();
        for _ in 0..2 {
            src.extend(0u8..6);
            src.extend([99u8, 99]);
        }
        let plan = build_cover_plan(Size::new(6, 2), Size::new(3, 2));
        let mut dst = vec![0u8; output_len(&plan, PixelLayout::Gray8)];

        let err = fit_cpu(&mut Resizer::new(), &src, Size::new(6, 2), Some(8), PixelLayout::Gray8, &plan, &mut dst, None)
            .unwrap_err();
        assert!(matches!(err, ScaleError::StrideMismatchAndNoStaging));

        let mut staging = Staging::with_capacity(12);
        fit_cpu(&mut Resizer::new(), &src, Size::new(6, 2), Some(8), PixelLayout::Gray8, &plan, &mut dst, Some(&mut staging)).unwrap();
        assert_eq!(dst, vec![1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn undersized_buffers_are_rejected() {
        let src = column_ramp(6, 2);
        let plan = build_cover_plan(Size::new(6, 2), Size::new(3, 2));

        let mut small = vec![0u8; 5];
        let err = fit_cpu(&mut Resizer::new(), &src, Size::new(6, 2), None, PixelLayout::Gray8, &plan, &mut small, None)
            .unwrap_err();
        assert!(matches!(err, ScaleError::BufferTooSmall { needed: 6, actual: 5 }));

        let mut dst = vec![0u8; 6];
        let err = fit_cpu(&mut Resizer::new(), &src[..10], Size::new(6, 2), None, PixelLayout::Gray8, &plan, &mut dst, None)
            .unwrap_err();
        assert!(matches!(err, ScaleError::SourceTooSmall { needed: 12, actual: 10 }));
    }
}
