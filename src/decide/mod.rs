//! Decision Policy Layer
//!
//! Turns raw class probabilities into an accept/reject outcome, maps
//! recognized labels into the document's shape vocabulary, and derives
//! the replacement shape's geometry from the original stroke's bounds.
//!
//! Canonical shape geometry is data-driven: one outline generator keyed
//! by [`ShapeKind`] plus a small per-kind parameter table, instead of one
//! renderer type per doodle class.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use crate::capture::{Bounds, Point};
use crate::classify::Classification;

/// Default minimum confidence for accepting a classification
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;

/// Outcome of the confidence threshold check
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Confidence below threshold; the stroke stays as drawn
    Unknown,
    /// Confidence at or above threshold; replacement may proceed
    Recognized { label: String, confidence: f32 },
}

/// Apply the confidence threshold to a classification
///
/// Tie-break is pinned: `confidence >= threshold` is recognized,
/// `confidence < threshold` is unknown.
pub fn decide(result: &Classification, threshold: f32) -> Decision {
    if result.confidence >= threshold {
        Decision::Recognized {
            label: result.label.clone(),
            confidence: result.confidence,
        }
    } else {
        Decision::Unknown
    }
}

/// Shape vocabulary of the receiving document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Circle,
    Rectangle,
    Triangle,
    Star,
    Line,
    /// Named icon asset rendered by the host (e.g. "sailboat")
    Icon(String),
}

/// Total mapping from classifier labels to document shape kinds
///
/// Labels missing from the table fall back to `fallback` rather than
/// being silently dropped, so the mapping is total over any vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeMapping {
    map: HashMap<String, ShapeKind>,
    fallback: ShapeKind,
}

impl Default for ShapeMapping {
    fn default() -> Self {
        let mut map = HashMap::new();
        map.insert("circle".to_string(), ShapeKind::Circle);
        map.insert("square".to_string(), ShapeKind::Rectangle);
        map.insert("triangle".to_string(), ShapeKind::Triangle);
        map.insert("star".to_string(), ShapeKind::Star);
        map.insert("line".to_string(), ShapeKind::Line);
        for icon in [
            "axis",
            "bat",
            "car",
            "cat",
            "eyeglasses",
            "moon",
            "sailboat",
            "dog",
            "tree",
            "cloud",
            "house",
        ] {
            map.insert(icon.to_string(), ShapeKind::Icon(icon.to_string()));
        }
        map.insert("other".to_string(), ShapeKind::Rectangle);

        Self {
            map,
            fallback: ShapeKind::Rectangle,
        }
    }
}

impl ShapeMapping {
    /// Resolve a label to a shape kind; total over all labels
    pub fn kind_for(&self, label: &str) -> ShapeKind {
        self.map.get(label).cloned().unwrap_or_else(|| self.fallback.clone())
    }
}

/// Decision-stage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Minimum confidence to accept a classification
    pub confidence_threshold: f32,
    /// Fractional inset shrinking the canonical shape inside the stroke's
    /// bounding box
    pub fit_margin: f32,
    /// Label-to-shape mapping table
    pub shapes: ShapeMapping,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            fit_margin: 0.10,
            shapes: ShapeMapping::default(),
        }
    }
}

/// Position, size and style of a replacement shape
///
/// Derived from the stroke's page-space bounding box (not the normalized
/// raster box) so the replacement visually overlays the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    pub kind: ShapeKind,
    /// Top-left corner in page coordinates
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub stroke_width: f32,
}

impl ShapeDescriptor {
    /// Shape bounding box
    pub fn bounds(&self) -> Bounds {
        Bounds {
            min_x: self.x,
            min_y: self.y,
            max_x: self.x + self.w,
            max_y: self.y + self.h,
        }
    }
}

/// Derive the replacement descriptor from the original stroke's bounds
///
/// Centered on the box centroid, sized to the shorter box dimension
/// shrunk by the fit margin, stroke width proportional to size within
/// sane limits.
pub fn descriptor_for(kind: ShapeKind, bounds: Bounds, fit_margin: f32) -> ShapeDescriptor {
    let side = bounds.width().min(bounds.height()).max(1.0);
    let size = side * (1.0 - 2.0 * fit_margin);
    let center = bounds.center();
    let stroke_width = (size * 0.07).clamp(4.0, 20.0);

    ShapeDescriptor {
        kind,
        x: center.x - size / 2.0,
        y: center.y - size / 2.0,
        w: size,
        h: size,
        stroke_width,
    }
}

/// Outline parameters for one shape kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawParams {
    /// Outline vertex count; 0 means a sampled ellipse, 2 a straight segment
    pub vertices: u32,
    /// Outer radius as a fraction of the shape size
    pub radius_ratio: f32,
    /// Inner radius fraction for star outlines; 0 disables the inner ring
    pub inner_ratio: f32,
    /// Angle of the first vertex
    pub start_angle: f32,
}

/// Per-kind outline parameter table
pub fn draw_params(kind: &ShapeKind) -> DrawParams {
    match kind {
        ShapeKind::Circle => DrawParams {
            vertices: 0,
            radius_ratio: 0.5,
            inner_ratio: 0.0,
            start_angle: 0.0,
        },
        // Circumradius of a square with side = size, rotated axis-aligned
        ShapeKind::Rectangle | ShapeKind::Icon(_) => DrawParams {
            vertices: 4,
            radius_ratio: std::f32::consts::FRAC_1_SQRT_2,
            inner_ratio: 0.0,
            start_angle: -FRAC_PI_4,
        },
        ShapeKind::Triangle => DrawParams {
            vertices: 3,
            radius_ratio: 0.58,
            inner_ratio: 0.0,
            start_angle: -FRAC_PI_2,
        },
        ShapeKind::Star => DrawParams {
            vertices: 6,
            radius_ratio: 0.7,
            inner_ratio: 0.35,
            start_angle: 0.0,
        },
        ShapeKind::Line => DrawParams {
            vertices: 2,
            radius_ratio: 0.5,
            inner_ratio: 0.0,
            start_angle: 0.0,
        },
    }
}

/// Generate the canonical outline polyline for a descriptor
///
/// One generic generator driven by [`draw_params`]; closed outlines repeat
/// their first point at the end. Icons get a placeholder box outline; the
/// host renders the actual asset.
pub fn outline_points(descriptor: &ShapeDescriptor) -> Vec<Point> {
    let params = draw_params(&descriptor.kind);
    let center = descriptor.bounds().center();
    let size = descriptor.w.min(descriptor.h);
    let radius = size * params.radius_ratio;

    let at = |angle: f32, r: f32| Point::new(center.x + angle.cos() * r, center.y + angle.sin() * r);

    match params.vertices {
        0 => {
            const SEGMENTS: u32 = 32;
            let mut points: Vec<Point> = (0..SEGMENTS)
                .map(|i| at(TAU * i as f32 / SEGMENTS as f32, radius))
                .collect();
            points.push(points[0]);
            points
        }
        2 => vec![
            at(params.start_angle, radius),
            at(params.start_angle + TAU / 2.0, radius),
        ],
        n => {
            let inner = size * params.inner_ratio;
            let mut points = Vec::with_capacity(2 * n as usize + 1);
            for i in 0..n {
                let angle = params.start_angle + TAU * i as f32 / n as f32;
                points.push(at(angle, radius));
                if params.inner_ratio > 0.0 {
                    points.push(at(angle + TAU / (2.0 * n as f32), inner));
                }
            }
            points.push(points[0]);
            points
        }
    }
}
