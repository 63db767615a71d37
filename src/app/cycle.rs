use super::{CycleOutcome, PlantcamOrchestrator};
use crate::remote::FolderResolver;
use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

impl PlantcamOrchestrator {
    /// Capture an image now and push it into today's remote folder.
    pub async fn run_cycle(&self) -> CycleOutcome {
        self.run_cycle_at(Local::now()).await
    }

    /// One capture → resolve → upload cycle with `now` naming the files.
    ///
    /// Failures are logged and folded into the returned outcome; nothing here
    /// stops the loop.
    pub async fn run_cycle_at(&self, now: DateTime<Local>) -> CycleOutcome {
        if self.cancellation_token.is_cancelled() {
            return CycleOutcome::Skipped;
        }

        let target = match self.images.prepare(now) {
            Ok(target) => target,
            Err(e) => {
                error!("Cannot prepare local folder: {}", e);
                return CycleOutcome::CaptureFailed;
            }
        };

        if self.station.capture(&target.path).await.is_err() {
            return CycleOutcome::CaptureFailed;
        }

        let Some(root_id) = self.root_folder_id.as_deref() else {
            warn!("Skipping upload - remote storage not initialized");
            return CycleOutcome::FolderUnavailable {
                file_name: target.file_name,
            };
        };

        let day_folder_id =
            match FolderResolver::get_or_create(self.remote.as_ref(), &target.day, Some(root_id))
                .await
            {
                Ok(id) => id,
                Err(_) => {
                    error!("Could not create/access remote folder {}", target.day);
                    return CycleOutcome::FolderUnavailable {
                        file_name: target.file_name,
                    };
                }
            };

        match self
            .uploader
            .upload(
                self.remote.as_ref(),
                &target.path,
                &target.file_name,
                &day_folder_id,
            )
            .await
        {
            Ok(file) => {
                match self.images.count_files(&target.day_dir) {
                    Ok(count) => info!("Total files in local folder: {}", count),
                    Err(e) => warn!("Cannot count files in {}: {}", target.day_dir.display(), e),
                }
                CycleOutcome::Uploaded {
                    file_name: target.file_name,
                    remote_id: file.id,
                }
            }
            Err(e) => {
                error!("{}; image kept at {}", e, target.path.display());
                CycleOutcome::UploadFailed {
                    file_name: target.file_name,
                }
            }
        }
    }

    pub(super) fn apply_retention(&self) {
        match self.retention.prune(&self.images, Local::now()) {
            Ok(0) => {}
            Ok(removed) => debug!("Retention removed {} captures", removed),
            Err(e) => warn!("Retention failed: {}", e),
        }
    }
}
