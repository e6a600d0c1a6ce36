// SPDX-License-Identifier: MIT
// CPU fit path built on fast_image_resize (SIMD-accelerated).
// RGB888 in -> RGB888 panel canvas out, letterboxed black, written into a caller buffer.

use fast_image_resize as fir;
use fir::images::{TypedCroppedImageMut, TypedImage, TypedImageRef};
use fir::pixels::U8x3;
use fir::{ResizeOptions, Resizer};
use thiserror::Error;

use crate::plan::{FitPlan, Size};

const BYTES_PER_PIXEL: usize = 3;

#[derive(Debug, Error)]
pub enum FitError {
    #[error("source buffer holds {got} bytes, {want} needed")]
    SourceTooSmall { got: usize, want: usize },
    #[error("output buffer holds {got} bytes, {want} needed")]
    BufferTooSmall { got: usize, want: usize },
    #[error("fast image resize error: {0}")]
    Fir(#[from] fir::ResizeError),
    #[error("image buffer error: {0}")]
    ImageBuf(#[from] fir::ImageBufferError),
    #[error("crop error: {0}")]
    Crop(#[from] fir::CropBoxError),
}

/// Pre-allocated scratch holding the rotated source, reused across frames.
#[derive(Debug, Default)]
pub struct Staging {
    pub(crate) buf: Vec<u8>,
}

impl Staging {
    pub fn with_capacity(cap: usize) -> Self {
        Self { buf: Vec::with_capacity(cap) }
    }

    pub fn ensure_len(&mut self, len: usize) {
        if self.buf.len() < len {
            self.buf.resize(len, 0);
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

/// Fits one tightly packed RGB888 frame onto the panel described by `plan`.
///
/// `dst` must hold at least `plan.panel.w * plan.panel.h * 3` bytes. Pixels
/// outside the picture rectangle are set to black.
pub fn fit_rgb_cpu(
    resizer: &mut Resizer,
    src_rgb: &[u8],
    plan: &FitPlan,
    dst: &mut [u8],
    staging: &mut Staging,
) -> Result<(), FitError> {
    let src_len = plan.input.area() * BYTES_PER_PIXEL;
    if src_rgb.len() < src_len {
        return Err(FitError::SourceTooSmall { got: src_rgb.len(), want: src_len });
    }
    let dst_len = plan.panel.area() * BYTES_PER_PIXEL;
    if dst.len() < dst_len {
        return Err(FitError::BufferTooSmall { got: dst.len(), want: dst_len });
    }
    let dst = &mut dst[..dst_len];

    if plan.is_identity() {
        dst.copy_from_slice(&src_rgb[..src_len]);
        return Ok(());
    }

    // --- Orient the source ---
    let oriented = plan.oriented_input();
    let src_view = if plan.rotate {
        staging.ensure_len(src_len);
        rotate_cw(&src_rgb[..src_len], plan.input, &mut staging.buf[..src_len]);
        TypedImageRef::<U8x3>::from_buffer(oriented.w, oriented.h, &staging.buf[..src_len])?
    } else {
        TypedImageRef::<U8x3>::from_buffer(oriented.w, oriented.h, &src_rgb[..src_len])?
    };

    // --- Letterbox, then resize into the picture rectangle ---
    dst.fill(0);
    let mut dst_image = TypedImage::<U8x3>::from_buffer(plan.panel.w, plan.panel.h, dst)?;
    let (x, y, w, h) = plan.dst_roi;
    let mut roi = TypedCroppedImageMut::from_ref(&mut dst_image, x, y, w, h)?;

    let opts = ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Bilinear));
    resizer.resize_typed::<U8x3>(&src_view, &mut roi, &opts)?;
    Ok(())
}

/// Rotates a packed RGB888 image 90 degrees clockwise.
///
/// Output is `size.h` wide and `size.w` tall.
pub fn rotate_cw(src: &[u8], size: Size, dst: &mut [u8]) {
    let (w, h) = (size.w as usize, size.h as usize);
    let out_w = h;
    for y in 0..h {
        let row = &src[y * w * BYTES_PER_PIXEL..(y + 1) * w * BYTES_PER_PIXEL];
        let out_x = h - 1 - y;
        for x in 0..w {
            let s = &row[x * BYTES_PER_PIXEL..(x + 1) * BYTES_PER_PIXEL];
            let d = (x * out_w + out_x) * BYTES_PER_PIXEL;
            dst[d..d + BYTES_PER_PIXEL].copy_from_slice(s);
        }
    }
}
