//! Content-addressed storage for uploaded images.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::domain::DomainError;

/// A file written by [`UploadStore::save`].
///
/// Holds the lock on its digest until dropped or discarded, so no other
/// upload of the same bytes can observe the file while its fate is open.
#[derive(Debug)]
pub struct StoredUpload {
    path: PathBuf,
    newly_created: bool,
    _guard: OwnedMutexGuard<()>,
}

impl StoredUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn reference(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    /// False when identical bytes were already stored.
    pub fn newly_created(&self) -> bool {
        self.newly_created
    }
}

/// Stores uploads as `<root>/<sha256>.<ext>`.
pub struct UploadStore {
    root: PathBuf,
    digest_locks: Mutex<HashMap<String, Weak<Mutex<()>>>>,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            DomainError::persistence(format!(
                "Failed to create upload directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self {
            root,
            digest_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn save(
        &self,
        file_name: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<StoredUpload, DomainError> {
        if bytes.is_empty() {
            return Err(DomainError::validation("Uploaded file is empty"));
        }

        let digest = format!("{:x}", Sha256::digest(&bytes));
        let target = self
            .root
            .join(format!("{}.{}", digest, extension_of(file_name)));
        let root = self.root.clone();

        let guard = self.lock_digest(&digest).await;
        let (path, newly_created) =
            tokio::task::spawn_blocking(move || write_new(&root, &target, &bytes))
                .await
                .map_err(|e| DomainError::persistence(format!("Upload task failed: {}", e)))??;

        Ok(StoredUpload {
            path,
            newly_created,
            _guard: guard,
        })
    }

    /// Removes an upload that no record will reference, then releases its digest.
    pub async fn discard(&self, upload: StoredUpload) {
        if !upload.newly_created {
            return;
        }
        if let Err(e) = tokio::fs::remove_file(&upload.path).await {
            warn!("Failed to remove {}: {}", upload.path.display(), e);
        }
    }

    /// Writes a query image to a temporary file that is deleted on drop.
    pub async fn stage_query(
        &self,
        file_name: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<NamedTempFile, DomainError> {
        if bytes.is_empty() {
            return Err(DomainError::validation("Uploaded file is empty"));
        }

        let root = self.root.clone();
        let suffix = format!(".{}", extension_of(file_name));
        let file = tokio::task::spawn_blocking(move || write_query(&root, &suffix, &bytes))
            .await
            .map_err(|e| DomainError::persistence(format!("Staging task failed: {}", e)))??;

        debug!("Staged query image at {}", file.path().display());
        Ok(file)
    }

    async fn lock_digest(&self, digest: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.digest_locks.lock().await;
            locks.retain(|_, lock| lock.strong_count() > 0);
            match locks.get(digest).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(Mutex::new(()));
                    locks.insert(digest.to_string(), Arc::downgrade(&lock));
                    lock
                }
            }
        };
        lock.lock_owned().await
    }
}

fn write_query(root: &Path, suffix: &str, bytes: &[u8]) -> Result<NamedTempFile, DomainError> {
    let mut file = tempfile::Builder::new()
        .prefix("query_")
        .suffix(suffix)
        .tempfile_in(root)
        .map_err(|e| DomainError::persistence(format!("Failed to create temp file: {}", e)))?;
    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|e| DomainError::persistence(format!("Failed to write temp file: {}", e)))?;
    Ok(file)
}

/// Returns the stored path and whether this call created it.
fn write_new(root: &Path, target: &Path, bytes: &[u8]) -> Result<(PathBuf, bool), DomainError> {
    if target.exists() {
        debug!("Upload already stored at {}", target.display());
        return Ok((target.to_path_buf(), false));
    }

    let mut file = NamedTempFile::new_in(root)
        .map_err(|e| DomainError::persistence(format!("Failed to create temp file: {}", e)))?;
    file.write_all(bytes)
        .map_err(|e| DomainError::persistence(format!("Failed to save file: {}", e)))?;

    match file.persist_noclobber(target) {
        Ok(_) => Ok((target.to_path_buf(), true)),
        Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
            Ok((target.to_path_buf(), false))
        }
        Err(e) => Err(DomainError::persistence(format!(
            "Failed to save file: {}",
            e.error
        ))),
    }
}

/// Lowercased alphanumeric extension of `file_name`, or `img`.
fn extension_of(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "img".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Some("me.JPG")), "jpg");
        assert_eq!(extension_of(Some("../../etc/passwd")), "img");
        assert_eq!(extension_of(Some("x.p/ng")), "img");
        assert_eq!(extension_of(None), "img");
    }

    #[tokio::test]
    async fn test_save_is_content_addressed() {
        let dir = tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads")).unwrap();

        let first = store.save(Some("a.png"), b"pixels".to_vec()).await.unwrap();
        let first_path = first.path().to_path_buf();
        assert!(first.newly_created());
        drop(first);

        let second = store.save(Some("b.png"), b"pixels".to_vec()).await.unwrap();
        assert!(!second.newly_created());
        assert_eq!(second.path(), first_path);
        assert_eq!(std::fs::read(&first_path).unwrap(), b"pixels");
    }

    #[tokio::test]
    async fn test_discard_only_removes_new_files() {
        let dir = tempdir().unwrap();
        let store = UploadStore::new(dir.path()).unwrap();

        let first = store.save(Some("a.png"), b"pixels".to_vec()).await.unwrap();
        let path = first.path().to_path_buf();
        drop(first);

        let again = store.save(Some("a.png"), b"pixels".to_vec()).await.unwrap();
        store.discard(again).await;
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_discarded_new_file_is_removed() {
        let dir = tempdir().unwrap();
        let store = UploadStore::new(dir.path()).unwrap();

        let first = store.save(Some("a.png"), b"pixels".to_vec()).await.unwrap();
        let path = first.path().to_path_buf();
        store.discard(first).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_same_bytes_wait_for_pending_upload() {
        let dir = tempdir().unwrap();
        let store = Arc::new(UploadStore::new(dir.path()).unwrap());

        let pending = store.save(Some("a.jpg"), b"face".to_vec()).await.unwrap();
        assert!(pending.newly_created());

        let other = store.clone();
        let mut second =
            tokio::spawn(async move { other.save(Some("b.jpg"), b"face".to_vec()).await });

        // Blocked while the first upload is still undecided.
        let early = tokio::time::timeout(std::time::Duration::from_millis(100), &mut second).await;
        assert!(early.is_err());

        store.discard(pending).await;

        let second = second.await.unwrap().unwrap();
        assert!(second.newly_created());
        assert!(second.path().exists());
        assert_eq!(std::fs::read(second.path()).unwrap(), b"face");
    }

    #[tokio::test]
    async fn test_different_bytes_do_not_wait() {
        let dir = tempdir().unwrap();
        let store = UploadStore::new(dir.path()).unwrap();

        let _held = store.save(Some("a.jpg"), b"one".to_vec()).await.unwrap();
        let other = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            store.save(Some("b.jpg"), b"two".to_vec()),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(other.newly_created());
    }

    #[tokio::test]
    async fn test_empty_upload_is_rejected() {
        let dir = tempdir().unwrap();
        let store = UploadStore::new(dir.path()).unwrap();

        let err = store.save(None, Vec::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailure(_)));
    }

    #[tokio::test]
    async fn test_staged_query_is_removed_on_drop() {
        let dir = tempdir().unwrap();
        let store = UploadStore::new(dir.path()).unwrap();

        let staged = store
            .stage_query(Some("q.jpg"), b"query".to_vec())
            .await
            .unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }
}
