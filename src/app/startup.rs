use super::{LoopState, PlantcamOrchestrator};
use crate::camera::system_backend;
use crate::config::PlantcamConfig;
use crate::error::{AuthError, Result};
use crate::remote::{authenticate, FolderResolver};
use std::sync::Arc;
use tracing::{error, info};

impl PlantcamOrchestrator {
    /// Authenticate against the remote store, open the platform camera backend
    /// and resolve the top-level folder. Any failure here is fatal.
    pub async fn connect(config: PlantcamConfig) -> Result<Self> {
        let session = authenticate(&config.remote).await.map_err(|e| {
            error!("Remote storage authentication failed: {}", e);
            e
        })?;

        let mut orchestrator = Self::new(config, system_backend(), Arc::new(session));
        orchestrator.initialize().await?;

        info!("Remote storage authentication successful");
        Ok(orchestrator)
    }

    /// Resolve (or create) the top-level remote folder and enter the running state.
    pub async fn initialize(&mut self) -> Result<()> {
        let name = self.config.remote.root_folder.clone();

        let root_id = FolderResolver::get_or_create(self.remote.as_ref(), &name, None)
            .await
            .map_err(|e| AuthError::RootFolder {
                name: name.clone(),
                source: e,
            })?;

        info!("Using remote folder {} ({})", name, root_id);
        self.root_folder_id = Some(root_id);
        self.state = LoopState::Running;
        Ok(())
    }
}
