use super::{RemoteFile, RemoteFolder, RemoteStore};
use crate::error::RemoteError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const ROOT_PARENT: &str = "root";

#[derive(Debug, Clone)]
struct FolderEntry {
    id: String,
    name: String,
    parent: String,
}

#[derive(Debug, Clone)]
struct FileEntry {
    name: String,
    parent: String,
    size_bytes: u64,
}

#[derive(Debug, Default)]
struct MemoryState {
    folders: Vec<FolderEntry>,
    files: Vec<FileEntry>,
    unreachable: bool,
    failing_uploads: u32,
    folder_creates: usize,
    upload_attempts: usize,
}

/// In-process remote store for running without network access.
///
/// Listing keeps insertion order. Failures can be injected for the whole store
/// or for a number of upcoming uploads.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail until switched back.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
    }

    /// Make the next `count` upload attempts fail.
    pub fn fail_next_uploads(&self, count: u32) {
        self.state.lock().failing_uploads = count;
    }

    pub fn folder_create_count(&self) -> usize {
        self.state.lock().folder_creates
    }

    pub fn upload_attempt_count(&self) -> usize {
        self.state.lock().upload_attempts
    }

    /// Number of files stored, across all folders.
    pub fn file_count(&self) -> usize {
        self.state.lock().files.len()
    }

    pub fn folder_parent(&self, folder_id: &str) -> Option<String> {
        self.state
            .lock()
            .folders
            .iter()
            .find(|f| f.id == folder_id)
            .map(|f| f.parent.clone())
    }

    /// Id of the first folder named `name` under `parent`.
    pub fn folder_id(&self, name: &str, parent: &str) -> Option<String> {
        self.state
            .lock()
            .folders
            .iter()
            .find(|f| f.name == name && f.parent == parent)
            .map(|f| f.id.clone())
    }

    /// Names of the files in `folder_id`, in upload order.
    pub fn files_in(&self, folder_id: &str) -> Vec<String> {
        self.state
            .lock()
            .files
            .iter()
            .filter(|f| f.parent == folder_id)
            .map(|f| f.name.clone())
            .collect()
    }

    /// Total bytes stored in `folder_id`.
    pub fn bytes_in(&self, folder_id: &str) -> u64 {
        self.state
            .lock()
            .files
            .iter()
            .filter(|f| f.parent == folder_id)
            .map(|f| f.size_bytes)
            .sum()
    }

    fn check_reachable(state: &MemoryState) -> Result<(), RemoteError> {
        if state.unreachable {
            Err(RemoteError::Other("remote store unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn find_folders(
        &self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<Vec<RemoteFolder>, RemoteError> {
        let state = self.state.lock();
        Self::check_reachable(&state)?;

        let parent = parent.unwrap_or(ROOT_PARENT);
        Ok(state
            .folders
            .iter()
            .filter(|f| f.name == name && f.parent == parent)
            .map(|f| RemoteFolder {
                id: f.id.clone(),
                name: f.name.clone(),
            })
            .collect())
    }

    async fn create_folder(
        &self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<RemoteFolder, RemoteError> {
        let mut state = self.state.lock();
        Self::check_reachable(&state)?;

        let entry = FolderEntry {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            parent: parent.unwrap_or(ROOT_PARENT).to_string(),
        };
        debug!("Memory store: created folder {} ({})", entry.name, entry.id);

        state.folder_creates += 1;
        state.folders.push(entry.clone());
        Ok(RemoteFolder {
            id: entry.id,
            name: entry.name,
        })
    }

    async fn upload_file(
        &self,
        local_path: &Path,
        name: &str,
        parent: &str,
    ) -> Result<RemoteFile, RemoteError> {
        let mut state = self.state.lock();
        state.upload_attempts += 1;
        Self::check_reachable(&state)?;

        if state.failing_uploads > 0 {
            state.failing_uploads -= 1;
            return Err(RemoteError::Status {
                status: 503,
                body: "injected upload failure".to_string(),
            });
        }

        let size_bytes = std::fs::metadata(local_path)
            .map_err(|e| RemoteError::LocalFile {
                path: local_path.display().to_string(),
                source: e,
            })?
            .len();

        if !state.folders.iter().any(|f| f.id == parent) {
            return Err(RemoteError::Status {
                status: 404,
                body: format!("folder {} not found", parent),
            });
        }

        state.files.push(FileEntry {
            name: name.to_string(),
            parent: parent.to_string(),
            size_bytes,
        });
        Ok(RemoteFile {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
        })
    }
}
