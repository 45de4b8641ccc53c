//! Stroke Capture Layer
//!
//! Accumulates raw points of a freehand gesture and the gesture's
//! axis-aligned bounding box while the pointer is active. Pure and
//! synchronous; runs on the input-event path.

pub mod stroke;

pub use stroke::{Bounds, Point, Stroke};

/// In-progress gesture state
#[derive(Debug, Clone)]
struct Gesture {
    points: Vec<Point>,
    bounds: Bounds,
}

/// Accumulates one freehand gesture at a time
///
/// `begin` starts a gesture at a point, `extend` appends points and unions
/// the bounds, `end` freezes the gesture into a [`Stroke`]. A gesture that
/// recorded no points yields no stroke.
#[derive(Debug, Default)]
pub struct StrokeCapture {
    active: Option<Gesture>,
}

impl StrokeCapture {
    /// Create an idle capture
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a gesture is currently being captured
    pub fn is_capturing(&self) -> bool {
        self.active.is_some()
    }

    /// Start a new gesture at a point, discarding any in-progress gesture
    ///
    /// The starting point is recorded, so a press-and-release with no drag
    /// still produces a single-point stroke.
    pub fn begin(&mut self, point: Point) {
        self.active = Some(Gesture {
            points: vec![point],
            bounds: Bounds::at(point),
        });
    }

    /// Append a point to the active gesture and union the bounds
    ///
    /// Ignored when no gesture is active (e.g. a move event after cancel).
    pub fn extend(&mut self, point: Point) {
        if let Some(gesture) = self.active.as_mut() {
            gesture.points.push(point);
            gesture.bounds.union_point(point);
        }
    }

    /// Finish the active gesture, yielding a frozen stroke
    ///
    /// Returns `None` when no gesture is active or no point was recorded;
    /// the pipeline must not invoke the normalizer in that case.
    pub fn end(&mut self) -> Option<Stroke> {
        let gesture = self.active.take()?;
        if gesture.points.is_empty() {
            return None;
        }
        Some(Stroke::new(gesture.points, gesture.bounds))
    }

    /// Discard the active gesture without producing a stroke
    pub fn cancel(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_lifecycle() {
        let mut capture = StrokeCapture::new();
        assert!(!capture.is_capturing());

        capture.begin(Point::new(10.0, 10.0));
        assert!(capture.is_capturing());

        capture.extend(Point::new(20.0, 5.0));
        capture.extend(Point::new(30.0, 15.0));

        let stroke = capture.end().unwrap();
        assert!(!capture.is_capturing());
        assert_eq!(stroke.len(), 3);
        assert_eq!(stroke.bounds().min_y, 5.0);
        assert_eq!(stroke.bounds().max_x, 30.0);
    }

    #[test]
    fn test_end_without_begin_yields_nothing() {
        let mut capture = StrokeCapture::new();
        assert!(capture.end().is_none());
    }

    #[test]
    fn test_single_point_gesture_is_a_stroke() {
        // Pinned behavior: a click with no drag still emits a stroke;
        // the normalizer turns it into a dot raster.
        let mut capture = StrokeCapture::new();
        capture.begin(Point::new(42.0, 7.0));

        let stroke = capture.end().unwrap();
        assert_eq!(stroke.len(), 1);
        assert_eq!(stroke.bounds().width(), 0.0);
        assert_eq!(stroke.bounds().height(), 0.0);
    }

    #[test]
    fn test_cancel_discards_gesture() {
        let mut capture = StrokeCapture::new();
        capture.begin(Point::new(1.0, 1.0));
        capture.extend(Point::new(2.0, 2.0));
        capture.cancel();

        assert!(!capture.is_capturing());
        assert!(capture.end().is_none());
    }

    #[test]
    fn test_extend_without_begin_is_ignored() {
        let mut capture = StrokeCapture::new();
        capture.extend(Point::new(5.0, 5.0));
        assert!(!capture.is_capturing());
        assert!(capture.end().is_none());
    }

    #[test]
    fn test_begin_replaces_in_progress_gesture() {
        let mut capture = StrokeCapture::new();
        capture.begin(Point::new(0.0, 0.0));
        capture.extend(Point::new(100.0, 100.0));

        capture.begin(Point::new(5.0, 5.0));
        let stroke = capture.end().unwrap();
        assert_eq!(stroke.len(), 1);
        assert_eq!(stroke.bounds().max_x, 5.0);
    }
}
