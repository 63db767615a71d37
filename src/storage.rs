use crate::{
    config::StorageConfig,
    error::{PlantcamError, Result},
};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Local day-bucket layout: `<image_root>/<YYYY-MM-DD>/<YYYYMMDD_HHMMSS>.jpg`
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

/// Where one capture cycle writes its image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTarget {
    /// Day bucket key shared by the local directory and the remote folder
    pub day: String,
    pub file_name: String,
    pub day_dir: PathBuf,
    pub path: PathBuf,
}

impl ImageStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self::with_root(&config.image_root)
    }

    pub fn with_root<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compute the target for `timestamp` without touching the filesystem.
    pub fn target_for(&self, timestamp: DateTime<Local>) -> CaptureTarget {
        let day = day_folder_name(timestamp);
        let file_name = capture_file_name(timestamp);
        let day_dir = self.root.join(&day);
        let path = day_dir.join(&file_name);

        CaptureTarget {
            day,
            file_name,
            day_dir,
            path,
        }
    }

    /// Compute the target for `timestamp` and make sure its day directory exists.
    pub fn prepare(&self, timestamp: DateTime<Local>) -> Result<CaptureTarget> {
        let target = self.target_for(timestamp);

        if !target.day_dir.is_dir() {
            fs::create_dir_all(&target.day_dir).map_err(|e| {
                PlantcamError::system(format!(
                    "Failed to create day directory {}: {}",
                    target.day_dir.display(),
                    e
                ))
            })?;
            info!("Created day directory: {}", target.day_dir.display());
        }

        Ok(target)
    }

    /// Number of entries in a day directory.
    pub fn count_files(&self, day_dir: &Path) -> Result<usize> {
        let mut count = 0;
        for entry in fs::read_dir(day_dir)? {
            entry?;
            count += 1;
        }
        debug!("{} holds {} files", day_dir.display(), count);
        Ok(count)
    }
}

/// `YYYY-MM-DD`
pub fn day_folder_name(timestamp: DateTime<Local>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

/// `YYYYMMDD_HHMMSS.jpg`
pub fn capture_file_name(timestamp: DateTime<Local>) -> String {
    format!("{}.jpg", timestamp.format("%Y%m%d_%H%M%S"))
}

/// Hook for pruning old local captures.
///
/// No deletion policy is defined; [`KeepAll`] is the only implementation and
/// never removes anything.
pub trait RetentionPolicy: Send + Sync {
    fn prune(&self, store: &ImageStore, now: DateTime<Local>) -> Result<usize>;
}

/// Keeps every capture forever.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeepAll;

impl RetentionPolicy for KeepAll {
    fn prune(&self, store: &ImageStore, _now: DateTime<Local>) -> Result<usize> {
        debug!("Retention: keeping all captures under {}", store.root().display());
        Ok(0)
    }
}
