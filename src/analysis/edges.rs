//! Coarse document-boundary detection for the live preview
//!
//! The frame is downsampled, turned into a boolean edge map by thresholding
//! the forward luminance differences, and the edge map is sampled on a
//! coarse grid. The bounding box of the sampled edge points, padded by a
//! margin, is reported as the document quadrilateral.
//!
//! Confidence values are fixed heuristics, not calibrated probabilities.
//! Only compare them against [`RELIABLE_CONFIDENCE`].

use crate::error::OcrError;
use crate::frame::PlanarLuminanceView;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use serde::Serialize;

/// Corners above this confidence may be used to guide capture
pub const RELIABLE_CONFIDENCE: f32 = 0.5;

const WELL_FRAMED_CONFIDENCE: f32 = 0.7;
const LOOSE_FRAMED_CONFIDENCE: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Document quadrilateral in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DocumentCorners {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
    pub confidence: f32,
}

impl DocumentCorners {
    /// Corners in clockwise order starting top-left
    pub fn points(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Enclosed area (shoelace formula)
    pub fn area(&self) -> f32 {
        let pts = self.points();
        let twice: f32 = (0..4)
            .map(|i| {
                let (a, b) = (pts[i], pts[(i + 1) % 4]);
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice.abs() / 2.0
    }

    pub fn is_reliable(&self) -> bool {
        self.confidence > RELIABLE_CONFIDENCE
    }

    /// Axis-aligned `(min, max)` of the four corners
    pub fn bounding_box(&self) -> (Point, Point) {
        let pts = self.points();
        let xs = pts.map(|p| p.x);
        let ys = pts.map(|p| p.y);
        let min = |v: [f32; 4]| v.into_iter().fold(f32::INFINITY, f32::min);
        let max = |v: [f32; 4]| v.into_iter().fold(f32::NEG_INFINITY, f32::max);
        (
            Point::new(min(xs), min(ys)),
            Point::new(max(xs), max(ys)),
        )
    }
}

/// Gradient-threshold document detector
#[derive(Debug, Clone)]
pub struct EdgeDetector {
    /// Frame is sampled every `downsample` pixels before analysis
    pub downsample: usize,
    /// Minimum luminance step to a right/below neighbour counted as an edge
    pub edge_threshold: u8,
    /// Spacing of the grid used to collect edge points (downsampled pixels)
    pub grid_step: usize,
    /// Padding added around the edge bounding box (downsampled pixels)
    pub margin: usize,
    /// Accepted range of bounding-box area / frame area
    pub min_area_ratio: f32,
    pub max_area_ratio: f32,
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self {
            downsample: 4,
            edge_threshold: 50,
            grid_step: 10,
            margin: 20,
            min_area_ratio: 0.1,
            max_area_ratio: 0.9,
        }
    }
}

/// Luminance grid of the downsampled frame
struct LumaGrid {
    w: usize,
    h: usize,
    data: Vec<u8>,
}

impl LumaGrid {
    fn sample(view: &PlanarLuminanceView<'_>, factor: usize) -> Result<Self, OcrError> {
        let w = view.width() / factor;
        let h = view.height() / factor;
        let mut data = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                data.push(view.sample(x * factor, y * factor)?);
            }
        }
        Ok(Self { w, h, data })
    }

    #[inline]
    fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.w + x]
    }

    /// Edge test against the right and below neighbours
    fn is_edge(&self, x: usize, y: usize, threshold: u8) -> bool {
        if x + 1 >= self.w || y + 1 >= self.h {
            return false;
        }
        let c = self.get(x, y);
        let dx = c.abs_diff(self.get(x + 1, y));
        let dy = c.abs_diff(self.get(x, y + 1));
        dx.max(dy) > threshold
    }
}

impl EdgeDetector {
    /// Detect a document in a camera frame
    ///
    /// Returns `None` when no plausible document is found, including when
    /// the frame cannot be read; the preview favours availability.
    pub fn detect(&self, view: &PlanarLuminanceView<'_>) -> Option<DocumentCorners> {
        let factor = self.downsample.max(1);
        let grid = match LumaGrid::sample(view, factor) {
            Ok(grid) => grid,
            Err(e) => {
                tracing::warn!("Edge detection skipped frame: {}", e);
                return None;
            }
        };
        if grid.w < 2 || grid.h < 2 {
            return None;
        }

        let step = self.grid_step.max(1);
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for y in (0..grid.h).step_by(step) {
            for x in (0..grid.w).step_by(step) {
                if !grid.is_edge(x, y, self.edge_threshold) {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        let (min_x, min_y, max_x, max_y) = bounds?;

        let box_area = ((max_x - min_x) * (max_y - min_y)) as f32;
        let ratio = box_area / (grid.w * grid.h) as f32;
        if ratio < self.min_area_ratio || ratio > self.max_area_ratio {
            tracing::debug!("Edge box rejected: area ratio {:.3}", ratio);
            return None;
        }

        let left = min_x.saturating_sub(self.margin);
        let top = min_y.saturating_sub(self.margin);
        let right = (max_x + self.margin).min(grid.w - 1);
        let bottom = (max_y + self.margin).min(grid.h - 1);

        let scale = |v: usize| (v * factor) as f32;
        let confidence = if (0.2..=0.8).contains(&ratio) {
            WELL_FRAMED_CONFIDENCE
        } else {
            LOOSE_FRAMED_CONFIDENCE
        };

        Some(DocumentCorners {
            top_left: Point::new(scale(left), scale(top)),
            top_right: Point::new(scale(right), scale(top)),
            bottom_right: Point::new(scale(right), scale(bottom)),
            bottom_left: Point::new(scale(left), scale(bottom)),
            confidence,
        })
    }

    /// Convenience wrapper for decoded images
    pub fn detect_image(&self, image: &DynamicImage) -> Option<DocumentCorners> {
        let gray = image.to_luma8();
        self.detect(&PlanarLuminanceView::from_gray(&gray))
    }
}

/// Copy of `image` with the detected quadrilateral outlined
pub fn draw_overlay(image: &DynamicImage, corners: &DocumentCorners) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let color = if corners.is_reliable() {
        Rgb([0u8, 200, 0])
    } else {
        Rgb([230u8, 160, 0])
    };
    let pts = corners.points();
    for i in 0..4 {
        let (a, b) = (pts[i], pts[(i + 1) % 4]);
        draw_line_segment_mut(&mut canvas, (a.x, a.y), (b.x, b.y), color);
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    /// White frame with a dark square covering `[lo, hi)` on both axes
    fn frame_with_document(size: u32, lo: u32, hi: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
                Luma([30])
            } else {
                Luma([230])
            }
        })
    }

    #[test]
    fn test_detects_centered_document() {
        // Downsampled square spans 41..=160 of a 200px grid
        let frame = frame_with_document(800, 164, 644);
        let corners = EdgeDetector::default()
            .detect(&PlanarLuminanceView::from_gray(&frame))
            .expect("document should be detected");

        assert_eq!(corners.top_left, Point::new(80.0, 80.0));
        assert_eq!(corners.top_right, Point::new(720.0, 80.0));
        assert_eq!(corners.bottom_right, Point::new(720.0, 720.0));
        assert_eq!(corners.bottom_left, Point::new(80.0, 720.0));
        assert!(corners.is_reliable());
        assert_eq!(corners.area(), 640.0 * 640.0);
    }

    #[test]
    fn test_margin_clamped_at_frame_border() {
        // Near the top-left corner: edges at downsampled 10 and 130
        let frame = frame_with_document(800, 44, 524);
        let corners = EdgeDetector::default()
            .detect(&PlanarLuminanceView::from_gray(&frame))
            .expect("document should be detected");
        assert_eq!(corners.top_left, Point::new(0.0, 0.0));
        assert_eq!(corners.bottom_right, Point::new(600.0, 600.0));

        // Near the bottom-right corner: edges at 70 and 190, grid ends at 199
        let frame = frame_with_document(800, 284, 764);
        let corners = EdgeDetector::default()
            .detect(&PlanarLuminanceView::from_gray(&frame))
            .expect("document should be detected");
        assert_eq!(corners.top_left, Point::new(200.0, 200.0));
        assert_eq!(corners.bottom_right, Point::new(796.0, 796.0));
    }

    #[test]
    fn test_uniform_frame_has_no_document() {
        let frame = GrayImage::from_pixel(400, 300, Luma([128]));
        assert!(EdgeDetector::default()
            .detect(&PlanarLuminanceView::from_gray(&frame))
            .is_none());
    }

    #[test]
    fn test_rejects_box_too_small() {
        let frame = frame_with_document(800, 356, 444);
        assert!(EdgeDetector::default()
            .detect(&PlanarLuminanceView::from_gray(&frame))
            .is_none());
    }

    #[test]
    fn test_rejects_box_covering_whole_frame() {
        // Texture everywhere: edge points span more than 90% of the frame
        let frame = GrayImage::from_fn(800, 800, |x, _| {
            if (x / 4) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        assert!(EdgeDetector::default()
            .detect(&PlanarLuminanceView::from_gray(&frame))
            .is_none());
    }

    #[test]
    fn test_unreadable_frame_yields_none() {
        let data = vec![0u8; 400 * 400];
        let view = PlanarLuminanceView::new(&data, 800, 1, 400, 400);
        assert!(EdgeDetector::default().detect(&view).is_none());
    }

    #[test]
    fn test_corner_geometry() {
        let corners = DocumentCorners {
            top_left: Point::new(10.0, 20.0),
            top_right: Point::new(110.0, 20.0),
            bottom_right: Point::new(110.0, 70.0),
            bottom_left: Point::new(10.0, 70.0),
            confidence: 0.4,
        };
        assert_eq!(corners.area(), 5000.0);
        assert!(!corners.is_reliable());
        assert_eq!(
            corners.bounding_box(),
            (Point::new(10.0, 20.0), Point::new(110.0, 70.0))
        );
    }

    #[test]
    fn test_draw_overlay_marks_outline() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([255, 255, 255])));
        let corners = DocumentCorners {
            top_left: Point::new(5.0, 5.0),
            top_right: Point::new(45.0, 5.0),
            bottom_right: Point::new(45.0, 45.0),
            bottom_left: Point::new(5.0, 45.0),
            confidence: 0.7,
        };
        let out = draw_overlay(&img, &corners);
        assert_eq!(out.get_pixel(25, 5).0, [0, 200, 0]);
        assert_eq!(out.get_pixel(25, 25).0, [255, 255, 255]);
    }
}
