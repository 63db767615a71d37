use super::{RemoteFile, RemoteStore};
use crate::config::RemoteConfig;
use crate::error::{RemoteError, UploadError};
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Fixed-count, fixed-delay upload retry.
#[derive(Debug, Clone)]
pub struct Uploader {
    max_attempts: u32,
    retry_delay: Duration,
}

impl Uploader {
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    pub fn from_config(config: &RemoteConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Upload `local_path` as `file_name` into `folder_id`, trying up to
    /// `max_attempts` times with `retry_delay` between attempts.
    pub async fn upload(
        &self,
        store: &dyn RemoteStore,
        local_path: &Path,
        file_name: &str,
        folder_id: &str,
    ) -> Result<RemoteFile, UploadError> {
        let mut attempt = 1;
        loop {
            match store.upload_file(local_path, file_name, folder_id).await {
                Ok(file) => {
                    info!("Upload successful: {}", file_name);
                    return Ok(file);
                }
                Err(e) => {
                    warn!("Upload attempt {} failed: {}", attempt, e);
                    if attempt >= self.max_attempts {
                        error!("Upload failed after {} attempts", self.max_attempts);
                        return Err(self.exhausted(file_name, e));
                    }
                    sleep(self.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn exhausted(&self, file_name: &str, last: RemoteError) -> UploadError {
        UploadError {
            file_name: file_name.to_string(),
            attempts: self.max_attempts,
            last,
        }
    }
}
