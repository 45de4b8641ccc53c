//! Host Document Boundary
//!
//! The whiteboard editor proper is an external collaborator; this module
//! defines the narrow operations the pipeline consumes from it, the
//! atomic stroke-replacement transaction, and an in-memory document used
//! by tests and the demo binary.

use std::fmt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::capture::{Bounds, Stroke};
use crate::decide::ShapeDescriptor;

/// Stable shape identity, captured at stroke-completion time
///
/// Replacements target shapes by id, never by "most recently drawn", so
/// out-of-order classification across strokes cannot touch the wrong one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(Uuid);

impl ShapeId {
    /// Generate a fresh id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShapeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A shape owned by the document
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeRecord {
    /// Raw freehand stroke as drawn
    Freehand(Stroke),
    /// Canonical replacement shape
    Canonical(ShapeDescriptor),
}

impl ShapeRecord {
    /// Page-space bounding box of the shape
    pub fn bounds(&self) -> Bounds {
        match self {
            ShapeRecord::Freehand(stroke) => stroke.bounds(),
            ShapeRecord::Canonical(descriptor) => descriptor.bounds(),
        }
    }
}

/// Narrow host-document operations the pipeline consumes
pub trait Document {
    /// Whether a shape still exists in the document
    fn contains(&self, id: ShapeId) -> bool;

    /// Page-space bounding box of a shape, if it exists
    fn shape_bounds(&self, id: ShapeId) -> Option<Bounds>;

    /// Insert a completed freehand stroke, returning its stable id
    fn insert_stroke(&mut self, stroke: Stroke) -> ShapeId;

    /// Insert a canonical shape, returning its id
    fn create_shape(&mut self, descriptor: ShapeDescriptor) -> ShapeId;

    /// Delete a shape; returns false if it was already gone
    fn delete_shape(&mut self, id: ShapeId) -> bool;

    /// Record an undo checkpoint; following mutations undo as one unit
    fn mark_undo_checkpoint(&mut self);
}

/// Outcome of a replacement transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// Original deleted and canonical shape inserted
    Replaced(ShapeId),
    /// Original vanished before commit (concurrent edit); nothing changed
    Skipped,
}

/// Atomically replace a freehand stroke with its canonical shape
///
/// One undo checkpoint covers the delete and the insert, so undo restores
/// the original stroke in a single action. The liveness check happens
/// immediately before commit; a vanished target is a safe no-op because
/// the user's intervening edit is authoritative.
pub fn replace_stroke(
    doc: &mut dyn Document,
    original: ShapeId,
    descriptor: ShapeDescriptor,
) -> ReplaceOutcome {
    if !doc.contains(original) {
        debug!("replacement target {original} vanished; skipping");
        return ReplaceOutcome::Skipped;
    }

    doc.mark_undo_checkpoint();
    doc.delete_shape(original);
    let id = doc.create_shape(descriptor);
    info!("replaced stroke {original} with canonical shape {id}");
    ReplaceOutcome::Replaced(id)
}

/// In-memory whiteboard document with checkpointed undo
///
/// Shapes keep insertion order as z-order. Undo restores the snapshot
/// taken at the last checkpoint.
#[derive(Debug, Default)]
pub struct Whiteboard {
    shapes: Vec<(ShapeId, ShapeRecord)>,
    undo_stack: Vec<Vec<(ShapeId, ShapeRecord)>>,
}

impl Whiteboard {
    /// Create an empty whiteboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of shapes in the document
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Look up a shape record by id
    pub fn shape(&self, id: ShapeId) -> Option<&ShapeRecord> {
        self.shapes
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, record)| record)
    }

    /// Ids in z-order (oldest first)
    pub fn shape_ids(&self) -> Vec<ShapeId> {
        self.shapes.iter().map(|(id, _)| *id).collect()
    }

    /// Restore the state at the last undo checkpoint
    ///
    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(snapshot) => {
                self.shapes = snapshot;
                true
            }
            None => false,
        }
    }
}

impl Document for Whiteboard {
    fn contains(&self, id: ShapeId) -> bool {
        self.shapes.iter().any(|(sid, _)| *sid == id)
    }

    fn shape_bounds(&self, id: ShapeId) -> Option<Bounds> {
        self.shape(id).map(ShapeRecord::bounds)
    }

    fn insert_stroke(&mut self, stroke: Stroke) -> ShapeId {
        let id = ShapeId::new();
        self.shapes.push((id, ShapeRecord::Freehand(stroke)));
        id
    }

    fn create_shape(&mut self, descriptor: ShapeDescriptor) -> ShapeId {
        let id = ShapeId::new();
        self.shapes.push((id, ShapeRecord::Canonical(descriptor)));
        id
    }

    fn delete_shape(&mut self, id: ShapeId) -> bool {
        let before = self.shapes.len();
        self.shapes.retain(|(sid, _)| *sid != id);
        self.shapes.len() < before
    }

    fn mark_undo_checkpoint(&mut self) {
        self.undo_stack.push(self.shapes.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Point;
    use crate::decide::ShapeKind;

    fn test_stroke() -> Stroke {
        Stroke::from_points(vec![
            Point::new(0.0, 0.0),
            Point::new(50.0, 20.0),
            Point::new(100.0, 100.0),
        ])
        .unwrap()
    }

    fn test_descriptor() -> ShapeDescriptor {
        ShapeDescriptor {
            kind: ShapeKind::Circle,
            x: 10.0,
            y: 10.0,
            w: 80.0,
            h: 80.0,
            stroke_width: 5.6,
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut board = Whiteboard::new();
        let stroke = test_stroke();
        let id = board.insert_stroke(stroke.clone());

        assert!(board.contains(id));
        assert_eq!(board.shape_count(), 1);
        assert_eq!(board.shape_bounds(id), Some(stroke.bounds()));
    }

    #[test]
    fn test_delete_missing_shape_is_false() {
        let mut board = Whiteboard::new();
        assert!(!board.delete_shape(ShapeId::new()));
    }

    #[test]
    fn test_replace_is_one_undo_unit() {
        let mut board = Whiteboard::new();
        let stroke = test_stroke();
        let id = board.insert_stroke(stroke.clone());

        let outcome = replace_stroke(&mut board, id, test_descriptor());
        let new_id = match outcome {
            ReplaceOutcome::Replaced(new_id) => new_id,
            ReplaceOutcome::Skipped => panic!("replacement should commit"),
        };

        assert!(!board.contains(id));
        assert!(board.contains(new_id));
        assert_eq!(board.shape_count(), 1);

        // A single undo restores the original stroke, points and bounds
        assert!(board.undo());
        assert_eq!(board.shape_count(), 1);
        assert!(board.contains(id));
        assert_eq!(board.shape(id), Some(&ShapeRecord::Freehand(stroke)));
    }

    #[test]
    fn test_replace_vanished_target_is_noop() {
        let mut board = Whiteboard::new();
        let id = board.insert_stroke(test_stroke());
        let other = board.insert_stroke(test_stroke());

        // Concurrent edit deletes the original before the commit
        board.delete_shape(id);

        let outcome = replace_stroke(&mut board, id, test_descriptor());
        assert_eq!(outcome, ReplaceOutcome::Skipped);
        assert_eq!(board.shape_count(), 1);
        assert!(board.contains(other));
        // No checkpoint was recorded for the skipped transaction
        assert!(!board.undo());
    }

    #[test]
    fn test_replacement_preserves_other_shapes() {
        let mut board = Whiteboard::new();
        let first = board.insert_stroke(test_stroke());
        let second = board.insert_stroke(test_stroke());

        replace_stroke(&mut board, first, test_descriptor());
        assert!(board.contains(second));
        assert_eq!(board.shape_count(), 2);
    }
}
