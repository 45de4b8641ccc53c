//! Per-stroke Pipeline Orchestration
//!
//! Drives one completed gesture through capture → normalize → classify →
//! decide → replace, in strict sequence. Each run is independent state
//! keyed by the stroke's stable id, so a fast second stroke's
//! classification resolving before a slow first stroke's can never
//! replace the wrong shape. Classification runs asynchronously; input
//! events keep flowing while a previous stroke is in flight.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::capture::{Point, Stroke, StrokeCapture};
use crate::classify::Classifier;
use crate::decide::{decide, descriptor_for, Decision, DecisionConfig};
use crate::document::{replace_stroke, Document, ReplaceOutcome, ShapeId};
use crate::raster::{normalize, RasterConfig};

/// Lifecycle of one gesture through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokePhase {
    Idle,
    Capturing,
    Classifying,
    Deciding,
    Replacing,
}

/// Shared, observable phase of one stroke's pipeline run
///
/// Travels with the [`PendingStroke`]; the pipeline advances it as the
/// run progresses and returns it to `Idle` when the run terminates.
#[derive(Debug, Clone)]
pub struct PhaseHandle(Arc<Mutex<StrokePhase>>);

impl PhaseHandle {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(StrokePhase::Idle)))
    }

    /// Current phase of this run
    pub fn get(&self) -> StrokePhase {
        *self.0.lock()
    }

    fn set(&self, phase: StrokePhase) {
        *self.0.lock() = phase;
    }
}

/// Terminal outcome of one stroke's pipeline run
#[derive(Debug, Clone, PartialEq)]
pub enum StrokeOutcome {
    /// Decision was unknown (low confidence or classifier failure);
    /// the freehand stroke stays on the canvas
    Kept,
    /// Stroke replaced by a canonical shape
    Replaced {
        shape: ShapeId,
        label: String,
        confidence: f32,
    },
    /// Recognized, but the original stroke vanished before commit
    Skipped { label: String },
}

/// A completed stroke awaiting classification
///
/// Carries the stroke value snapshotted at completion time plus the
/// document id identifying the replacement target.
#[derive(Debug, Clone)]
pub struct PendingStroke {
    pub id: ShapeId,
    pub stroke: Stroke,
    /// Observable phase of this stroke's run
    pub phase: PhaseHandle,
}

/// The stroke-to-shape pipeline
///
/// Owns an injected classifier service (no module-level model singleton)
/// and the normalization/decision configuration.
pub struct SketchPipeline {
    classifier: Arc<dyn Classifier>,
    raster: RasterConfig,
    decision: DecisionConfig,
}

impl SketchPipeline {
    /// Create a pipeline around a classifier service
    pub fn new(
        classifier: Arc<dyn Classifier>,
        raster: RasterConfig,
        decision: DecisionConfig,
    ) -> Self {
        Self {
            classifier,
            raster,
            decision,
        }
    }

    /// Normalize and classify a stroke, applying the confidence threshold
    ///
    /// Every classifier failure is absorbed here: a stroke the model
    /// cannot judge is indistinguishable from one it wasn't confident
    /// about, so errors normalize to [`Decision::Unknown`] instead of
    /// propagating into the input-event path.
    pub async fn classify_stroke(&self, stroke: &Stroke) -> Decision {
        debug!(phase = ?StrokePhase::Classifying, points = stroke.len());
        let raster = normalize(stroke, &self.raster);

        match self.classifier.predict(&raster).await {
            Ok(result) => {
                debug!(
                    phase = ?StrokePhase::Deciding,
                    label = %result.label,
                    confidence = result.confidence,
                );
                decide(&result, self.decision.confidence_threshold)
            }
            Err(e) => {
                warn!("classification failed, treating stroke as unknown: {e}");
                Decision::Unknown
            }
        }
    }

    /// Run one completed stroke through classify → decide → replace
    ///
    /// The replacement targets `pending.id` only; if that shape was
    /// deleted while classification was in flight the transaction is a
    /// safe no-op.
    pub async fn process_stroke<D: Document>(
        &self,
        doc: &Mutex<D>,
        pending: PendingStroke,
    ) -> StrokeOutcome {
        pending.phase.set(StrokePhase::Classifying);
        let decision = self.classify_stroke(&pending.stroke).await;
        pending.phase.set(StrokePhase::Deciding);

        let outcome = match decision {
            Decision::Unknown => StrokeOutcome::Kept,
            Decision::Recognized { label, confidence } => {
                let kind = self.decision.shapes.kind_for(&label);
                pending.phase.set(StrokePhase::Replacing);
                debug!(phase = ?StrokePhase::Replacing, target = %pending.id);

                // Geometry is read from the document at commit time, not
                // from the snapshot taken at stroke completion, so a shape
                // the user moved during classification is replaced where
                // it now sits.
                let mut doc = doc.lock();
                match doc.shape_bounds(pending.id) {
                    None => StrokeOutcome::Skipped { label },
                    Some(bounds) => {
                        let descriptor =
                            descriptor_for(kind, bounds, self.decision.fit_margin);
                        match replace_stroke(&mut *doc, pending.id, descriptor) {
                            ReplaceOutcome::Replaced(shape) => StrokeOutcome::Replaced {
                                shape,
                                label,
                                confidence,
                            },
                            ReplaceOutcome::Skipped => StrokeOutcome::Skipped { label },
                        }
                    }
                }
            }
        };
        pending.phase.set(StrokePhase::Idle);
        outcome
    }
}

/// Input-side session tying a capture to a document and pipeline
///
/// Pointer events mutate only local capture state; a finished gesture is
/// inserted into the document (fixing its identity) and handed to the
/// pipeline asynchronously.
pub struct StrokeSession<D: Document> {
    pipeline: Arc<SketchPipeline>,
    doc: Arc<Mutex<D>>,
    capture: StrokeCapture,
    phase: StrokePhase,
}

impl<D: Document> StrokeSession<D> {
    /// Create an idle session
    pub fn new(pipeline: Arc<SketchPipeline>, doc: Arc<Mutex<D>>) -> Self {
        Self {
            pipeline,
            doc,
            capture: StrokeCapture::new(),
            phase: StrokePhase::Idle,
        }
    }

    /// Current gesture phase; dispatched strokes report their in-flight
    /// phase through their [`PendingStroke::phase`] handle instead
    pub fn phase(&self) -> StrokePhase {
        self.phase
    }

    /// Shared document handle
    pub fn document(&self) -> &Arc<Mutex<D>> {
        &self.doc
    }

    /// Pointer pressed: start capturing
    pub fn pointer_down(&mut self, point: Point) {
        self.capture.begin(point);
        self.phase = StrokePhase::Capturing;
    }

    /// Pointer moved while pressed
    pub fn pointer_move(&mut self, point: Point) {
        self.capture.extend(point);
    }

    /// Gesture cancelled: discard capture state, back to idle
    pub fn pointer_cancel(&mut self) {
        self.capture.cancel();
        self.phase = StrokePhase::Idle;
    }

    /// Pointer released: freeze the gesture and insert it into the
    /// document, returning the pending stroke for resolution
    ///
    /// Returns `None` for an empty gesture (nothing to classify).
    pub fn pointer_up(&mut self) -> Option<PendingStroke> {
        self.phase = StrokePhase::Idle;
        let stroke = self.capture.end()?;
        let id = self.doc.lock().insert_stroke(stroke.clone());
        Some(PendingStroke {
            id,
            stroke,
            phase: PhaseHandle::new(),
        })
    }

    /// Resolve a pending stroke on this task
    pub async fn resolve(&self, pending: PendingStroke) -> StrokeOutcome {
        self.pipeline.process_stroke(&self.doc, pending).await
    }
}

impl<D: Document + Send + 'static> StrokeSession<D> {
    /// Resolve a pending stroke on a spawned task, leaving the session
    /// free to capture the next gesture immediately
    pub fn spawn_resolve(&self, pending: PendingStroke) -> JoinHandle<StrokeOutcome> {
        let pipeline = Arc::clone(&self.pipeline);
        let doc = Arc::clone(&self.doc);
        tokio::spawn(async move { pipeline.process_stroke(&doc, pending).await })
    }
}
