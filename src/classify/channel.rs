//! Worker-style classification over a message channel
//!
//! Alternative execution context for the same [`Classifier`] contract:
//! requests (raster + correlation id) go over a channel to a task that
//! owns the actual model, responses come back per request. Decision and
//! replacement logic stays unchanged whether inference runs in-process
//! or behind this boundary.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::{Classification, Classifier, ClassifyError, ModelState};
use crate::raster::NormalizedRaster;

enum WorkerRequest {
    Load {
        respond: oneshot::Sender<Result<(), ClassifyError>>,
    },
    Predict {
        id: u64,
        raster: NormalizedRaster,
        respond: oneshot::Sender<Result<Classification, ClassifyError>>,
    },
}

/// Classifier handle whose inference runs in a separate worker task
pub struct ChannelClassifier {
    requests: mpsc::Sender<WorkerRequest>,
    next_id: AtomicU64,
    state: Mutex<ModelState>,
}

impl ChannelClassifier {
    /// Spawn a worker task owning `inner` and return a handle to it
    ///
    /// The worker exits when the last handle is dropped.
    pub fn spawn(inner: Arc<dyn Classifier>) -> Self {
        let (tx, mut rx) = mpsc::channel::<WorkerRequest>(16);

        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                match request {
                    WorkerRequest::Load { respond } => {
                        let _ = respond.send(inner.load().await);
                    }
                    WorkerRequest::Predict {
                        id,
                        raster,
                        respond,
                    } => {
                        let result = inner.predict(&raster).await;
                        debug!("worker resolved classify request {id}");
                        let _ = respond.send(result);
                    }
                }
            }
        });

        Self {
            requests: tx,
            next_id: AtomicU64::new(0),
            state: Mutex::new(ModelState::Unloaded),
        }
    }
}

#[async_trait]
impl Classifier for ChannelClassifier {
    async fn load(&self) -> Result<(), ClassifyError> {
        *self.state.lock() = ModelState::Loading;

        let (respond, rx) = oneshot::channel();
        let result = match self.requests.send(WorkerRequest::Load { respond }).await {
            Ok(()) => rx.await.unwrap_or_else(|_| {
                Err(ClassifyError::LoadFailure(
                    "classification worker is gone".into(),
                ))
            }),
            Err(_) => Err(ClassifyError::LoadFailure(
                "classification worker is gone".into(),
            )),
        };

        *self.state.lock() = if result.is_ok() {
            ModelState::Ready
        } else {
            ModelState::Failed
        };
        result
    }

    fn state(&self) -> ModelState {
        *self.state.lock()
    }

    async fn predict(&self, raster: &NormalizedRaster) -> Result<Classification, ClassifyError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (respond, rx) = oneshot::channel();

        let request = WorkerRequest::Predict {
            id,
            raster: raster.clone(),
            respond,
        };
        if self.requests.send(request).await.is_err() {
            return Err(ClassifyError::Inference(
                "classification worker is gone".into(),
            ));
        }

        rx.await.unwrap_or_else(|_| {
            Err(ClassifyError::Inference(
                "classification worker dropped the request".into(),
            ))
        })
    }
}
