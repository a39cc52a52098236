use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::{
    application::{
        error::ApplicationError,
        services::blob_backend::{BlobBackend, BlobStream},
    },
    services::error::StorageError,
};

/// Blob store backed by a directory on the local filesystem. `/` in a key
/// maps to a subdirectory; writes go through a temp file and an atomic
/// rename so a crashed `put` never leaves a partial blob behind.
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let traversal = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || traversal {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobBackend for LocalBackend {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ApplicationError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(StorageError::from)?;
        }

        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        fs::write(&temp_path, bytes)
            .await
            .map_err(StorageError::from)?;
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::from(e).into());
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<BlobStream, ApplicationError> {
        let path = self.resolve(key)?;
        match fs::File::open(&path).await {
            Ok(file) => Ok(Box::new(file) as BlobStream),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()).into())
            }
            Err(e) => Err(StorageError::from(e).into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), ApplicationError> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from(e).into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, ApplicationError> {
        let path = self.resolve(key)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::from(e).into())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    async fn read_all(backend: &LocalBackend, key: &str) -> Vec<u8> {
        let mut reader = backend.get(key).await.unwrap();
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await.unwrap();
        buffer
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_path_buf()).unwrap();

        backend.put("abc.txt", b"hello shelf").await.unwrap();
        assert_eq!(read_all(&backend, "abc.txt").await, b"hello shelf");
        assert!(backend.exists("abc.txt").await.unwrap());
    }

    #[tokio::test]
    async fn put_creates_intermediate_directories() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_path_buf()).unwrap();

        backend.put("thumbnails/abc.jpg", b"jpeg").await.unwrap();
        assert_eq!(read_all(&backend, "thumbnails/abc.jpg").await, b"jpeg");
        assert!(dir.path().join("thumbnails").is_dir());
    }

    #[tokio::test]
    async fn put_overwrites_existing_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_path_buf()).unwrap();

        backend.put("key", b"first").await.unwrap();
        backend.put("key", b"second").await.unwrap();
        assert_eq!(read_all(&backend, "key").await, b"second");
    }

    #[tokio::test]
    async fn put_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_path_buf()).unwrap();

        backend.put("key.bin", b"data").await.unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("key.bin")]);
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_path_buf()).unwrap();

        assert!(matches!(
            backend.get("missing").await,
            Err(ApplicationError::NotFound(_))
        ));
        assert!(!backend.exists("missing").await.unwrap());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_path_buf()).unwrap();

        backend.put("key", b"data").await.unwrap();
        backend.delete("key").await.unwrap();
        backend.delete("key").await.unwrap();
        assert!(!backend.exists("key").await.unwrap());
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_path_buf()).unwrap();

        assert!(backend.put("../escape", b"data").await.is_err());
        assert!(backend.put("", b"data").await.is_err());
        assert!(backend.get("/etc/passwd").await.is_err());
    }
}
