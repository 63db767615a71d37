use super::types::{LoopState, ShutdownReason};
use crate::camera::CameraBackend;
use crate::capture::CaptureStation;
use crate::config::PlantcamConfig;
use crate::remote::{RemoteStore, Uploader};
use crate::storage::{ImageStore, KeepAll, RetentionPolicy};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Owns everything a capture cycle needs: the camera, the remote session, the
/// resolved top-level folder and the shutdown token.
pub struct PlantcamOrchestrator {
    pub(super) config: PlantcamConfig,
    pub(super) images: ImageStore,
    pub(super) station: CaptureStation,
    pub(super) remote: Arc<dyn RemoteStore>,
    pub(super) uploader: Uploader,
    pub(super) retention: Box<dyn RetentionPolicy>,

    // Set by initialize()
    pub(super) root_folder_id: Option<String>,

    // Lifecycle management
    pub(super) state: LoopState,
    pub(super) shutdown_reason: Arc<Mutex<Option<ShutdownReason>>>,
    pub(super) cancellation_token: CancellationToken,
}

impl PlantcamOrchestrator {
    /// Create an orchestrator over the given camera backend and remote store.
    ///
    /// Call [`initialize`](Self::initialize) before running cycles.
    pub fn new(
        config: PlantcamConfig,
        camera: Arc<dyn CameraBackend>,
        remote: Arc<dyn RemoteStore>,
    ) -> Self {
        let images = ImageStore::new(&config.storage);
        let station = CaptureStation::new(config.camera.clone(), camera);
        let uploader = Uploader::from_config(&config.remote);

        Self {
            config,
            images,
            station,
            remote,
            uploader,
            retention: Box::new(KeepAll),
            root_folder_id: None,
            state: LoopState::Stopping,
            shutdown_reason: Arc::new(Mutex::new(None)),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Replace the retention policy (default [`KeepAll`]).
    pub fn with_retention(mut self, retention: Box<dyn RetentionPolicy>) -> Self {
        self.retention = retention;
        self
    }

    pub fn config(&self) -> &PlantcamConfig {
        &self.config
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn root_folder_id(&self) -> Option<&str> {
        self.root_folder_id.as_deref()
    }

    /// Token that stops the loop between cycles when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Ask the loop to stop after the current cycle.
    pub fn request_shutdown(&self) {
        request_shutdown(
            &self.cancellation_token,
            &self.shutdown_reason,
            ShutdownReason::UserRequest,
        );
    }
}

/// Record the first shutdown reason and cancel the token.
pub(super) fn request_shutdown(
    token: &CancellationToken,
    slot: &Mutex<Option<ShutdownReason>>,
    reason: ShutdownReason,
) {
    slot.lock().get_or_insert(reason);
    token.cancel();
}
