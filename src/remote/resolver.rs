use super::RemoteStore;
use crate::error::RemoteError;
use tracing::{debug, error, warn};

/// Looks up a folder by (name, parent) and creates it when missing.
///
/// When several folders share the name the first one the service returns is
/// used; duplicates are left alone.
pub struct FolderResolver;

impl FolderResolver {
    /// Identifier of the folder `name` under `parent` (root when `None`).
    pub async fn get_or_create(
        store: &dyn RemoteStore,
        name: &str,
        parent: Option<&str>,
    ) -> Result<String, RemoteError> {
        let result = Self::resolve(store, name, parent).await;
        if let Err(e) = &result {
            error!("Failed to create/get folder {}: {}", name, e);
        }
        result
    }

    async fn resolve(
        store: &dyn RemoteStore,
        name: &str,
        parent: Option<&str>,
    ) -> Result<String, RemoteError> {
        let matches = store.find_folders(name, parent).await?;

        if let Some(first) = matches.first() {
            if matches.len() > 1 {
                warn!(
                    "{} folders named {} found, using {}",
                    matches.len(),
                    name,
                    first.id
                );
            }
            debug!("Found folder {} ({})", name, first.id);
            return Ok(first.id.clone());
        }

        let folder = store.create_folder(name, parent).await?;
        Ok(folder.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryStore;

    #[tokio::test]
    async fn test_creates_missing_folder() {
        let store = MemoryStore::new();

        let id = FolderResolver::get_or_create(&store, "plants", None)
            .await
            .unwrap();

        assert_eq!(store.folder_create_count(), 1);
        assert_eq!(store.folder_parent(&id), Some("root".to_string()));
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let store = MemoryStore::new();
        let root = FolderResolver::get_or_create(&store, "plants", None)
            .await
            .unwrap();

        let first = FolderResolver::get_or_create(&store, "2024-03-07", Some(&root))
            .await
            .unwrap();
        let second = FolderResolver::get_or_create(&store, "2024-03-07", Some(&root))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.folder_create_count(), 2);
    }

    #[tokio::test]
    async fn test_same_name_under_different_parents() {
        let store = MemoryStore::new();
        let a = FolderResolver::get_or_create(&store, "a", None).await.unwrap();
        let b = FolderResolver::get_or_create(&store, "b", None).await.unwrap();

        let under_a = FolderResolver::get_or_create(&store, "day", Some(&a))
            .await
            .unwrap();
        let under_b = FolderResolver::get_or_create(&store, "day", Some(&b))
            .await
            .unwrap();

        assert_ne!(under_a, under_b);
    }

    #[tokio::test]
    async fn test_first_match_wins_on_duplicates() {
        let store = MemoryStore::new();
        let first = store.create_folder("dup", None).await.unwrap();
        let _second = store.create_folder("dup", None).await.unwrap();

        let id = FolderResolver::get_or_create(&store, "dup", None)
            .await
            .unwrap();

        assert_eq!(id, first.id);
        assert_eq!(store.folder_create_count(), 2);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_reported() {
        let store = MemoryStore::new();
        store.set_unreachable(true);

        assert!(FolderResolver::get_or_create(&store, "plants", None)
            .await
            .is_err());
        assert_eq!(store.folder_create_count(), 0);
    }
}
