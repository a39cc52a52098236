use async_trait::async_trait;

use crate::application::error::ApplicationError;

/// Read access to the instance-wide `settings` table. Writing settings is an
/// admin concern outside the core.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ApplicationError>;

    async fn get_or(&self, key: &str, default: &str) -> Result<String, ApplicationError> {
        Ok(self
            .get(key)
            .await?
            .unwrap_or_else(|| default.to_string()))
    }
}
