//! Classifier Adapter Layer
//!
//! Wraps a pre-trained image classifier behind a single async contract:
//! normalized raster in, label + confidence out. The model is loaded once
//! and shared; every failure below this boundary is converted into an
//! error the decision policy absorbs as "unknown" rather than a crash on
//! the input-handling path.

pub mod channel;
pub mod labels;
pub mod onnx;

pub use channel::ChannelClassifier;
pub use labels::LabelVocabulary;
pub use onnx::OnnxClassifier;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use thiserror::Error;

use crate::raster::NormalizedRaster;

/// Lifecycle state of a classifier's model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// No load attempt yet
    Unloaded,
    /// Load in progress
    Loading,
    /// Model loaded; predictions allowed
    Ready,
    /// Load failed; predictions fail until a reload succeeds
    Failed,
}

/// Classification errors
///
/// Callers on the input path treat every variant as "unknown": the stroke
/// stays on the canvas and no replacement happens.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("model is not ready (state: {0:?})")]
    NotReady(ModelState),
    #[error("failed to load model: {0}")]
    LoadFailure(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Result of classifying one normalized raster
///
/// The probability vector is aligned 1:1 with the label vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Probability per vocabulary class, in training order
    pub probabilities: Vec<f32>,
    /// Arg-max class index
    pub label_index: usize,
    /// Arg-max class name
    pub label: String,
    /// Probability mass on the arg-max class
    pub confidence: f32,
}

/// Async classification contract
///
/// `load` is idempotent and may fail; `predict` must not be called before
/// `load` resolves and fails with [`ClassifyError::NotReady`] if it is.
/// Implementations either tolerate overlapping `predict` calls or
/// serialize them internally.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Load the model; safe to call again after a failure to retry
    async fn load(&self) -> Result<(), ClassifyError>;

    /// Current model lifecycle state
    fn state(&self) -> ModelState;

    /// Classify one raster, returning the full distribution plus the
    /// arg-max label and its confidence
    async fn predict(&self, raster: &NormalizedRaster) -> Result<Classification, ClassifyError>;
}

/// Numerically stable softmax
pub(crate) fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

/// Build a [`Classification`] from an already-normalized probability vector
pub(crate) fn classification_from_probs(
    probabilities: Vec<f32>,
    vocabulary: &LabelVocabulary,
) -> Result<Classification, ClassifyError> {
    if probabilities.len() != vocabulary.len() {
        return Err(ClassifyError::Inference(format!(
            "model emitted {} scores but the vocabulary has {} labels",
            probabilities.len(),
            vocabulary.len()
        )));
    }

    let (label_index, confidence) = probabilities
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &p)| {
            if p > best.1 {
                (i, p)
            } else {
                best
            }
        });

    let label = vocabulary
        .get(label_index)
        .unwrap_or("other")
        .to_string();

    Ok(Classification {
        probabilities,
        label_index,
        label,
        confidence,
    })
}

/// Scripted classifier for tests and offline runs
///
/// Returns queued distributions in order, then falls back to a fixed
/// distribution. Starts `Ready` unless built with [`FakeClassifier::unloaded`].
pub struct FakeClassifier {
    vocabulary: LabelVocabulary,
    responses: Mutex<VecDeque<Vec<f32>>>,
    fallback: Vec<f32>,
    state: Mutex<ModelState>,
}

impl FakeClassifier {
    /// Ready classifier that always answers with `distribution`
    pub fn ready(vocabulary: LabelVocabulary, distribution: Vec<f32>) -> Self {
        Self {
            vocabulary,
            responses: Mutex::new(VecDeque::new()),
            fallback: distribution,
            state: Mutex::new(ModelState::Ready),
        }
    }

    /// Classifier that has not been loaded yet; `predict` fails until
    /// `load` is called
    pub fn unloaded(vocabulary: LabelVocabulary, distribution: Vec<f32>) -> Self {
        Self {
            vocabulary,
            responses: Mutex::new(VecDeque::new()),
            fallback: distribution,
            state: Mutex::new(ModelState::Unloaded),
        }
    }

    /// Queue a one-shot distribution returned before the fallback
    pub fn push_response(&self, distribution: Vec<f32>) {
        self.responses.lock().push_back(distribution);
    }
}

#[async_trait]
impl Classifier for FakeClassifier {
    async fn load(&self) -> Result<(), ClassifyError> {
        *self.state.lock() = ModelState::Ready;
        Ok(())
    }

    fn state(&self) -> ModelState {
        *self.state.lock()
    }

    async fn predict(&self, _raster: &NormalizedRaster) -> Result<Classification, ClassifyError> {
        let state = self.state();
        if state != ModelState::Ready {
            return Err(ClassifyError::NotReady(state));
        }
        let probs = self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        classification_from_probs(probs, &self.vocabulary)
    }
}
