//! Stride-aware access to planar luminance buffers
//!
//! Camera frames arrive as a Y plane with `row_stride` / `pixel_stride`
//! metadata from the capture layer. Neither stride is derived from the
//! frame dimensions, so every computed offset is checked against the real
//! buffer capacity before it is read.

use crate::error::OcrError;
use image::GrayImage;

/// Read-only view over an externally owned planar luminance buffer
#[derive(Clone, Copy, Debug)]
pub struct PlanarLuminanceView<'a> {
    data: &'a [u8],
    row_stride: usize,
    pixel_stride: usize,
    width: usize,
    height: usize,
}

impl<'a> PlanarLuminanceView<'a> {
    pub fn new(
        data: &'a [u8],
        row_stride: usize,
        pixel_stride: usize,
        width: usize,
        height: usize,
    ) -> Self {
        Self {
            data,
            row_stride,
            pixel_stride,
            width,
            height,
        }
    }

    /// Tightly packed view over a decoded grayscale image
    pub fn from_gray(image: &'a GrayImage) -> Self {
        let width = image.width() as usize;
        Self::new(image.as_raw(), width, 1, width, image.height() as usize)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Luminance byte at `y * row_stride + x * pixel_stride`
    pub fn sample(&self, x: usize, y: usize) -> Result<u8, OcrError> {
        let out_of_bounds = |offset| OcrError::OutOfBounds {
            x,
            y,
            offset,
            capacity: self.data.len(),
        };

        if x >= self.width || y >= self.height {
            return Err(out_of_bounds(self.offset_hint(x, y)));
        }

        let offset = y
            .checked_mul(self.row_stride)
            .and_then(|row| x.checked_mul(self.pixel_stride).and_then(|px| row.checked_add(px)))
            .ok_or_else(|| out_of_bounds(usize::MAX))?;

        self.data
            .get(offset)
            .copied()
            .ok_or_else(|| out_of_bounds(offset))
    }

    fn offset_hint(&self, x: usize, y: usize) -> usize {
        y.saturating_mul(self.row_stride)
            .saturating_add(x.saturating_mul(self.pixel_stride))
    }
}
