//! Remote folder tree: session, folder resolution and uploads.

mod auth;
#[cfg(test)]
mod canned;
mod drive;
mod memory;
mod resolver;
mod upload;

use crate::error::RemoteError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

pub use auth::{authenticate, authenticate_with, CredentialsFile, StoredCredentials};
pub use drive::{folder_query, DriveSession, FOLDER_MIME_TYPE};
pub use memory::MemoryStore;
pub use resolver::FolderResolver;
pub use upload::Uploader;

/// A folder in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFolder {
    pub id: String,
    pub name: String,
}

/// A file placed in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
}

/// Hierarchical cloud storage. `parent: None` means the root container.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Un-trashed folders called exactly `name` directly under `parent`, in
    /// the order the service returns them.
    async fn find_folders(
        &self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<Vec<RemoteFolder>, RemoteError>;

    async fn create_folder(
        &self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<RemoteFolder, RemoteError>;

    /// Create a new file entry `name` in `parent` holding the content of `local_path`.
    async fn upload_file(
        &self,
        local_path: &Path,
        name: &str,
        parent: &str,
    ) -> Result<RemoteFile, RemoteError>;
}
