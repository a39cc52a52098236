mod error;
mod local_storage;
mod s3_storage;
pub mod thumbnailer;

pub use error::StorageError;
pub use local_storage::LocalBackend;
pub use s3_storage::S3Backend;
pub use thumbnailer::ThumbnailWorker;

use std::sync::Arc;

use crate::{application::services::BlobBackend, domain::config::environment::DataSource};

pub fn create_blob_backend(datasource: &DataSource) -> Result<Arc<dyn BlobBackend>, StorageError> {
    match datasource {
        DataSource::Local { directory } => {
            let backend = LocalBackend::new(directory.clone())?;
            Ok(Arc::new(backend))
        }
        DataSource::S3 {
            bucket,
            region,
            endpoint,
            access_key_id,
            secret_access_key,
        } => {
            let backend = S3Backend::new(
                bucket.clone(),
                region.clone(),
                endpoint.clone(),
                access_key_id.clone(),
                secret_access_key.clone(),
            );
            Ok(Arc::new(backend))
        }
    }
}
