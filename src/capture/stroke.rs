//! Stroke data structures for completed freehand gestures

use serde::{Deserialize, Serialize};

/// A single point in page/canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box in page/canvas coordinates
///
/// Maintained incrementally as gesture points arrive; the envelope never
/// shrinks during a single gesture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    /// Create a degenerate box containing a single point
    pub fn at(point: Point) -> Self {
        Self {
            min_x: point.x,
            min_y: point.y,
            max_x: point.x,
            max_y: point.y,
        }
    }

    /// Expand the box to include a point
    pub fn union_point(&mut self, point: Point) {
        self.min_x = self.min_x.min(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_x = self.max_x.max(point.x);
        self.max_y = self.max_y.max(point.y);
    }

    /// Box width (zero for a vertical line or single point)
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Box height (zero for a horizontal line or single point)
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Center of the box
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// A completed freehand stroke: the ordered point sequence of one gesture
/// plus its tight axis-aligned envelope
///
/// Frozen once the gesture ends; consumed once by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    points: Vec<Point>,
    bounds: Bounds,
}

impl Stroke {
    pub(crate) fn new(points: Vec<Point>, bounds: Bounds) -> Self {
        Self { points, bounds }
    }

    /// Build a stroke directly from a point list, computing the envelope.
    /// Returns `None` for an empty list.
    pub fn from_points(points: Vec<Point>) -> Option<Self> {
        let first = *points.first()?;
        let mut bounds = Bounds::at(first);
        for &p in &points[1..] {
            bounds.union_point(p);
        }
        Some(Self { points, bounds })
    }

    /// Ordered gesture points
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Tight bounding box of all points
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Number of recorded points (always at least 1)
    pub fn len(&self) -> usize {
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_union_grows_monotonically() {
        let mut bounds = Bounds::at(Point::new(10.0, 10.0));
        bounds.union_point(Point::new(5.0, 20.0));
        assert_eq!(bounds.min_x, 5.0);
        assert_eq!(bounds.max_y, 20.0);

        // A point inside the envelope changes nothing
        bounds.union_point(Point::new(7.0, 15.0));
        assert_eq!(bounds.min_x, 5.0);
        assert_eq!(bounds.min_y, 10.0);
        assert_eq!(bounds.max_x, 10.0);
        assert_eq!(bounds.max_y, 20.0);
    }

    #[test]
    fn test_bounds_center_and_dims() {
        let mut bounds = Bounds::at(Point::new(0.0, 0.0));
        bounds.union_point(Point::new(100.0, 50.0));
        assert_eq!(bounds.width(), 100.0);
        assert_eq!(bounds.height(), 50.0);
        assert_eq!(bounds.center(), Point::new(50.0, 25.0));
    }

    #[test]
    fn test_stroke_from_points() {
        let stroke = Stroke::from_points(vec![
            Point::new(3.0, 4.0),
            Point::new(-1.0, 8.0),
            Point::new(5.0, 2.0),
        ])
        .unwrap();

        assert_eq!(stroke.len(), 3);
        assert_eq!(stroke.bounds().min_x, -1.0);
        assert_eq!(stroke.bounds().max_x, 5.0);
        assert_eq!(stroke.bounds().min_y, 2.0);
        assert_eq!(stroke.bounds().max_y, 8.0);
    }

    #[test]
    fn test_stroke_from_empty_points() {
        assert!(Stroke::from_points(vec![]).is_none());
    }
}
