use async_trait::async_trait;
use sqlx::query_scalar;

use crate::application::{
    error::ApplicationError, repositories::settings_repository::SettingsRepository,
};

pub struct PgSettingsRepository {
    pool: sqlx::PgPool,
}

impl PgSettingsRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, ApplicationError> {
        query_scalar::<_, String>(r#"SELECT value FROM settings WHERE "key" = $1"#)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ApplicationError::DatabaseError(e.to_string()))
    }
}
