use async_trait::async_trait;

use crate::{application::error::ApplicationError, domain::models::session::Session};

/// Session provider consumed by the core: maps a request token to a live
/// session, or `None` when the token is absent, invalid, or revoked.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Option<Session>, ApplicationError>;
}
