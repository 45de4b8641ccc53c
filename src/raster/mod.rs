//! Stroke Normalization Layer
//!
//! Converts an arbitrary-length, arbitrary-scale freehand stroke into the
//! fixed-size single-channel raster the classifier was trained on: uniform
//! scale by the longer bounding-box side into the target canvas minus a fit
//! margin, shorter side centered, white ink on black background.
//!
//! Output is a deterministic function of the stroke geometry and the
//! configuration; identical inputs produce bit-identical rasters.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_circle_mut;
use ndarray::Array4;
use serde::{Deserialize, Serialize};

use crate::capture::Stroke;

/// Normalization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterConfig {
    /// Side length of the square output raster (model input size)
    pub target_size: u32,
    /// Margin in target pixels left around the scaled stroke
    pub fit_margin_px: u32,
    /// Rendered line width in target pixels
    ///
    /// Applied after scaling, so the ink density matches training data
    /// regardless of how large the original stroke was drawn.
    pub stroke_width_px: f32,
    /// Minimum bounding-box extent substituted for degenerate strokes
    /// (single dot, perfectly horizontal/vertical line)
    pub min_extent: f32,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            target_size: 28,
            // 28 - 2*2 = 24 usable pixels, matching the training renderer
            fit_margin_px: 2,
            stroke_width_px: 2.0,
            min_extent: 1.0,
        }
    }
}

/// Fixed-size single-channel raster ready for classification
///
/// Dimensions always match the configured target size. Pixels are 0
/// (background) to 255 (ink). Immutable once built; produced fresh per
/// stroke and consumed by a single prediction call.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRaster {
    image: GrayImage,
}

impl NormalizedRaster {
    /// Raster width in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Raster height in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Underlying grayscale image
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Convert to the model input tensor: NCHW `[1, 1, H, W]`, pixel
    /// values scaled from `[0, 255]` to `[0.0, 1.0]`
    pub fn to_input_tensor(&self) -> Array4<f32> {
        let (w, h) = (self.width() as usize, self.height() as usize);
        let mut tensor = Array4::<f32>::zeros((1, 1, h, w));

        for y in 0..h {
            for x in 0..w {
                let Luma([v]) = *self.image.get_pixel(x as u32, y as u32);
                tensor[[0, 0, y, x]] = v as f32 / 255.0;
            }
        }

        tensor
    }

    /// Tensor shape and flat pixel data for handing to the ONNX runtime
    pub fn to_tensor_data(&self) -> ([usize; 4], Vec<f32>) {
        let (w, h) = (self.width() as usize, self.height() as usize);
        let data = self
            .image
            .pixels()
            .map(|Luma([v])| *v as f32 / 255.0)
            .collect();
        ([1, 1, h, w], data)
    }
}

/// Normalize a stroke into the classifier's input raster
///
/// Scale factor is `(target - 2*margin) / max(box_w, box_h)` so the longer
/// dimension fills the target canvas minus the margin; the shorter
/// dimension is center-padded, preserving aspect ratio. Zero-extent boxes
/// are clamped to `min_extent` so the scale factor stays finite.
pub fn normalize(stroke: &Stroke, config: &RasterConfig) -> NormalizedRaster {
    let bounds = stroke.bounds();
    let target = config.target_size.max(1) as f32;

    let box_w = bounds.width().max(config.min_extent);
    let box_h = bounds.height().max(config.min_extent);

    let usable = (target - 2.0 * config.fit_margin_px as f32).max(1.0);
    let scale = usable / box_w.max(box_h);

    // Offsets center the actual extent, so a degenerate axis (dot, flat
    // line) lands in the middle of the raster rather than at the clamped
    // box's corner.
    let offset_x = (target - bounds.width() * scale) / 2.0;
    let offset_y = (target - bounds.height() * scale) / 2.0;

    let mut image = GrayImage::new(config.target_size.max(1), config.target_size.max(1));

    let mapped: Vec<(f32, f32)> = stroke
        .points()
        .iter()
        .map(|p| {
            (
                (p.x - bounds.min_x) * scale + offset_x,
                (p.y - bounds.min_y) * scale + offset_y,
            )
        })
        .collect();

    let radius = (config.stroke_width_px / 2.0).max(0.5);
    render_polyline(&mut image, &mapped, radius);

    NormalizedRaster { image }
}

/// Render a polyline as white ink by stamping discs along each segment
///
/// Disc stamping at half-pixel steps gives a uniform, anti-aliasing-free
/// thick line; the result depends only on the input coordinates.
pub(crate) fn render_polyline(image: &mut GrayImage, points: &[(f32, f32)], radius: f32) {
    const INK: Luma<u8> = Luma([255u8]);
    let r = (radius.round() as i32).max(1);

    let mut stamp = |x: f32, y: f32| {
        draw_filled_circle_mut(image, (x.round() as i32, y.round() as i32), r, INK);
    };

    match points {
        [] => {}
        [only] => stamp(only.0, only.1),
        _ => {
            for pair in points.windows(2) {
                let (x0, y0) = pair[0];
                let (x1, y1) = pair[1];
                let length = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
                // One stamp per half pixel of travel keeps the line solid
                let steps = (length * 2.0).ceil().max(1.0) as u32;
                for i in 0..=steps {
                    let t = i as f32 / steps as f32;
                    stamp(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Point;

    fn stroke_of(points: &[(f32, f32)]) -> Stroke {
        Stroke::from_points(points.iter().map(|&(x, y)| Point::new(x, y)).collect()).unwrap()
    }

    fn ink_bbox(raster: &NormalizedRaster) -> Option<(u32, u32, u32, u32)> {
        let mut bbox: Option<(u32, u32, u32, u32)> = None;
        for (x, y, Luma([v])) in raster.image().enumerate_pixels() {
            if *v > 0 {
                bbox = Some(match bbox {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bbox
    }

    #[test]
    fn test_output_dimensions_match_target() {
        let config = RasterConfig::default();
        let strokes = [
            stroke_of(&[(0.0, 0.0), (100.0, 100.0)]),
            stroke_of(&[(5.0, 5.0)]),
            stroke_of(&[(-50.0, 3.0), (900.0, 7.0), (10.0, 400.0)]),
        ];

        for stroke in &strokes {
            let raster = normalize(stroke, &config);
            assert_eq!(raster.width(), 28);
            assert_eq!(raster.height(), 28);
        }
    }

    #[test]
    fn test_zero_height_stroke_does_not_divide_by_zero() {
        // Perfectly horizontal line: bounding box height is zero
        let stroke = stroke_of(&[(10.0, 50.0), (200.0, 50.0)]);
        let raster = normalize(&stroke, &RasterConfig::default());

        let (x0, y0, x1, y1) = ink_bbox(&raster).expect("line should leave ink");
        assert!(x1 - x0 > 20, "line should span most of the raster width");
        assert!(y1 - y0 < 5, "line should stay thin vertically");
        assert!(y0 > 8 && y1 < 20, "line should be vertically centered");
    }

    #[test]
    fn test_zero_width_stroke_does_not_divide_by_zero() {
        let stroke = stroke_of(&[(50.0, 10.0), (50.0, 200.0)]);
        let raster = normalize(&stroke, &RasterConfig::default());
        assert!(ink_bbox(&raster).is_some());
    }

    #[test]
    fn test_single_point_renders_a_centered_dot() {
        let stroke = stroke_of(&[(123.0, 456.0)]);
        let raster = normalize(&stroke, &RasterConfig::default());

        let (x0, y0, x1, y1) = ink_bbox(&raster).expect("dot should leave ink");
        assert!(x1 - x0 <= 4, "dot should be small");
        assert!(y1 - y0 <= 4, "dot should be small");
        let (cx, cy) = ((x0 + x1) / 2, (y0 + y1) / 2);
        assert!((10..=17).contains(&cx) && (10..=17).contains(&cy));
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let stroke = stroke_of(&[(3.0, 9.0), (77.0, 12.0), (40.0, 88.0), (3.0, 9.0)]);
        let config = RasterConfig::default();

        let a = normalize(&stroke, &config);
        let b = normalize(&stroke, &config);
        assert_eq!(a.image().as_raw(), b.image().as_raw());
    }

    #[test]
    fn test_aspect_ratio_preserved_for_thin_strokes() {
        // 10:1 aspect stroke must not be stretched square
        let stroke = stroke_of(&[(0.0, 0.0), (200.0, 20.0)]);
        let raster = normalize(&stroke, &RasterConfig::default());

        let (x0, y0, x1, y1) = ink_bbox(&raster).unwrap();
        let ink_w = (x1 - x0) as f32;
        let ink_h = (y1 - y0) as f32;
        assert!(
            ink_w / ink_h > 3.0,
            "wide stroke stayed wide: {}x{}",
            ink_w,
            ink_h
        );
    }

    #[test]
    fn test_longer_side_fills_usable_region() {
        let stroke = stroke_of(&[(0.0, 0.0), (100.0, 100.0)]);
        let config = RasterConfig::default();
        let raster = normalize(&stroke, &config);

        let (x0, _, x1, _) = ink_bbox(&raster).unwrap();
        // 24 usable pixels plus the line radius on each end
        assert!(x1 - x0 >= 22, "stroke should fill the margin-inset canvas");
    }

    #[test]
    fn test_input_tensor_shape_and_range() {
        let stroke = stroke_of(&[(0.0, 0.0), (10.0, 10.0)]);
        let raster = normalize(&stroke, &RasterConfig::default());

        let tensor = raster.to_input_tensor();
        assert_eq!(tensor.dim(), (1, 1, 28, 28));
        assert!(tensor.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(tensor.iter().any(|&v| v > 0.0), "tensor should carry ink");

        let (shape, data) = raster.to_tensor_data();
        assert_eq!(shape, [1, 1, 28, 28]);
        assert_eq!(data.len(), 28 * 28);
    }
}
