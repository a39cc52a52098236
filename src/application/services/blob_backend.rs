use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::application::error::ApplicationError;

pub type BlobStream = Box<dyn AsyncRead + Send + Unpin>;

/// Uniform interface over the local-directory and S3 blob stores. Keys are
/// flat strings (`<id>.<ext>`, `thumbnails/<id>.jpg`); the backend does not
/// interpret them beyond path mapping.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Idempotent overwrite.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ApplicationError>;

    /// Fails with `ApplicationError::NotFound` when the key is absent.
    async fn get(&self, key: &str) -> Result<BlobStream, ApplicationError>;

    /// Succeeds when the key is already absent.
    async fn delete(&self, key: &str) -> Result<(), ApplicationError>;

    async fn exists(&self, key: &str) -> Result<bool, ApplicationError>;
}
