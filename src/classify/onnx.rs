//! ONNX Runtime classifier backend
//!
//! Owns the model lifecycle: load-once, predict-many. Predictions are
//! serialized behind a mutex because an ONNX session run takes exclusive
//! access; intermediate tensors are scoped to each call.

use async_trait::async_trait;
use ort::session::{builder::GraphOptimizationLevel, Session};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{
    classification_from_probs, softmax, Classification, Classifier, ClassifyError,
    LabelVocabulary, ModelState,
};
use crate::raster::NormalizedRaster;

/// A loaded session plus the tensor names discovered at load time
struct LoadedModel {
    session: Session,
    input_name: String,
    output_name: String,
}

/// Doodle classifier backed by a local ONNX model artifact
///
/// The label vocabulary is pinned next to the model; its ordering must
/// match the model's training-time label order.
pub struct OnnxClassifier {
    model_path: PathBuf,
    vocabulary: LabelVocabulary,
    model: Mutex<Option<LoadedModel>>,
    state: Mutex<ModelState>,
}

impl OnnxClassifier {
    /// Create an unloaded classifier for a model file
    pub fn new(model_path: impl Into<PathBuf>, vocabulary: LabelVocabulary) -> Self {
        Self {
            model_path: model_path.into(),
            vocabulary,
            model: Mutex::new(None),
            state: Mutex::new(ModelState::Unloaded),
        }
    }

    /// The pinned label vocabulary
    pub fn vocabulary(&self) -> &LabelVocabulary {
        &self.vocabulary
    }
}

#[async_trait]
impl Classifier for OnnxClassifier {
    async fn load(&self) -> Result<(), ClassifyError> {
        if self.state() == ModelState::Ready {
            return Ok(());
        }
        *self.state.lock() = ModelState::Loading;

        let path = self.model_path.clone();
        let built = tokio::task::spawn_blocking(move || build_session(&path))
            .await
            .map_err(|e| ClassifyError::LoadFailure(format!("load task panicked: {e}")))?;

        match built {
            Ok(loaded) => {
                info!(
                    "Model loaded from {:?} (input: {}, output: {})",
                    self.model_path, loaded.input_name, loaded.output_name
                );
                *self.model.lock() = Some(loaded);
                *self.state.lock() = ModelState::Ready;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load model from {:?}: {e}", self.model_path);
                *self.state.lock() = ModelState::Failed;
                Err(e)
            }
        }
    }

    fn state(&self) -> ModelState {
        *self.state.lock()
    }

    async fn predict(&self, raster: &NormalizedRaster) -> Result<Classification, ClassifyError> {
        let mut guard = self.model.lock();
        let model = guard
            .as_mut()
            .ok_or_else(|| ClassifyError::NotReady(self.state()))?;

        let (shape, data) = raster.to_tensor_data();
        let input = ort::value::TensorRef::from_array_view((shape, data.as_slice()))
            .map_err(|e| ClassifyError::Inference(format!("failed to build input tensor: {e}")))?;

        let outputs = model
            .session
            .run(ort::inputs![model.input_name.as_str() => input])
            .map_err(|e| ClassifyError::Inference(format!("session run failed: {e}")))?;

        let value = outputs.get(model.output_name.as_str()).ok_or_else(|| {
            ClassifyError::Inference(format!("model has no output named {}", model.output_name))
        })?;

        let (_shape, scores) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifyError::Inference(format!("failed to extract scores: {e}")))?;

        // Treat the output as logits; softmax is monotone, so thresholding
        // still behaves if a model already emits probabilities.
        let probabilities = softmax(scores);
        debug!(
            "Inference complete: {} classes, max score {:.3}",
            probabilities.len(),
            probabilities.iter().cloned().fold(0.0f32, f32::max)
        );

        classification_from_probs(probabilities, &self.vocabulary)
    }
}

/// Build an ONNX session and record its tensor names
fn build_session(model_path: &Path) -> Result<LoadedModel, ClassifyError> {
    let session = Session::builder()
        .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
        .and_then(|b| b.with_intra_threads(4))
        .and_then(|b| b.commit_from_file(model_path))
        .map_err(|e| ClassifyError::LoadFailure(e.to_string()))?;

    let input_name = session
        .inputs
        .first()
        .map(|i| i.name.clone())
        .ok_or_else(|| ClassifyError::LoadFailure("model declares no inputs".into()))?;
    let output_name = session
        .outputs
        .first()
        .map(|o| o.name.clone())
        .ok_or_else(|| ClassifyError::LoadFailure("model declares no outputs".into()))?;

    Ok(LoadedModel {
        session,
        input_name,
        output_name,
    })
}
