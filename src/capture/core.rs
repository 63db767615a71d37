use crate::{camera::CameraBackend, config::CameraConfig, error::CameraError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::encode::encode_jpeg;

/// A JPEG that passed the size check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub width: u32,
    pub height: u32,
}

/// Takes single still images: open, warm up, read one frame, encode, write, verify.
pub struct CaptureStation {
    config: CameraConfig,
    backend: Arc<dyn CameraBackend>,
}

impl CaptureStation {
    pub fn new(config: CameraConfig, backend: Arc<dyn CameraBackend>) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Make one attempt at writing a JPEG to `path`.
    ///
    /// On any failure no file is left at `path`. The device is released before
    /// returning whatever the result.
    pub async fn capture(&self, path: &Path) -> Result<CapturedImage, CameraError> {
        info!("Attempting to capture image...");

        let result = self.capture_inner(path).await;
        if let Err(e) = &result {
            error!("Camera capture error: {}", e);
            discard_partial(path);
        }
        result
    }

    async fn capture_inner(&self, path: &Path) -> Result<CapturedImage, CameraError> {
        let frame = {
            let mut device = self
                .backend
                .open(self.config.index, self.config.resolution)?;

            debug!(
                "Camera {} open, warming up for {:?}",
                self.config.index,
                self.config.warmup()
            );
            sleep(self.config.warmup()).await;

            device.read_frame()?
            // device dropped here, releasing the camera
        };

        if frame.is_empty() {
            return Err(CameraError::NoFrame {
                details: "Failed to capture frame".to_string(),
            });
        }

        let jpeg = encode_jpeg(&frame, self.config.jpeg_quality)?;

        fs::write(path, &jpeg).map_err(|e| CameraError::Write {
            path: path.display().to_string(),
            source: e,
        })?;

        let size_bytes = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        if size_bytes <= self.config.min_file_bytes {
            return Err(CameraError::TooSmall {
                path: path.display().to_string(),
                size: size_bytes,
                minimum: self.config.min_file_bytes,
            });
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!(
            "Image captured successfully: {} ({} bytes)",
            file_name, size_bytes
        );

        Ok(CapturedImage {
            path: path.to_path_buf(),
            size_bytes,
            width: frame.width,
            height: frame.height,
        })
    }
}

fn discard_partial(path: &Path) {
    if path.exists() {
        match fs::remove_file(path) {
            Ok(()) => debug!("Removed rejected image {}", path.display()),
            Err(e) => warn!("Failed to remove rejected image {}: {}", path.display(), e),
        }
    }
}
