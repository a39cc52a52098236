use async_trait::async_trait;
use aws_sdk_s3::{
    config::{BehaviorVersion, Credentials, Region},
    primitives::ByteStream,
    Client,
};

use crate::{
    application::{
        error::ApplicationError,
        services::blob_backend::{BlobBackend, BlobStream},
    },
    services::error::StorageError,
};

/// Blob store backed by a single S3-compatible bucket. Bare keys (original
/// blobs) live under the `uploads/` prefix; keys that already carry a path
/// segment, like `thumbnails/<id>.jpg`, are stored as-is.
pub struct S3Backend {
    client: Client,
    bucket: String,
}

impl S3Backend {
    pub fn new(
        bucket: String,
        region: String,
        endpoint: Option<String>,
        access_key_id: String,
        secret_access_key: String,
    ) -> Self {
        let credentials =
            Credentials::new(access_key_id, secret_access_key, None, None, "environment");

        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region))
            .credentials_provider(credentials)
            .force_path_style(true);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket,
        }
    }

    fn object_key(key: &str) -> String {
        if key.contains('/') {
            key.to_string()
        } else {
            format!("uploads/{}", key)
        }
    }
}

#[async_trait]
impl BlobBackend for S3Backend {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ApplicationError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(Self::object_key(key))
            .body(ByteStream::from(bytes.to_vec()))
            .send()
            .await
            .map_err(|e| StorageError::Provider(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<BlobStream, ApplicationError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(Self::object_key(key))
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::Provider(service_error.to_string())
                }
            })?;
        Ok(Box::new(output.body.into_async_read()) as BlobStream)
    }

    async fn delete(&self, key: &str) -> Result<(), ApplicationError> {
        // S3 DeleteObject succeeds on absent keys, matching the contract.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(Self::object_key(key))
            .send()
            .await
            .map_err(|e| StorageError::Provider(e.to_string()))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, ApplicationError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(Self::object_key(key))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(StorageError::Provider(service_error.to_string()).into())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_keys_land_under_the_uploads_prefix() {
        assert_eq!(S3Backend::object_key("abc.png"), "uploads/abc.png");
        assert_eq!(
            S3Backend::object_key("thumbnails/abc.jpg"),
            "thumbnails/abc.jpg"
        );
        assert_eq!(
            S3Backend::object_key("avatars/user.png"),
            "avatars/user.png"
        );
    }
}
