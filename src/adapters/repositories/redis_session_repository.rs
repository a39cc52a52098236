use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use redis::AsyncCommands;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    application::{error::ApplicationError, repositories::session_repository::SessionRepository},
    domain::models::session::Session,
};

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: Uuid,
    username: String,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    timezone: Option<String>,
}

/// Sessions are JWTs backed by Redis presence: the signature proves who
/// issued the token, the `session:<user>:<token>` key proves it has not been
/// revoked or expired out of the store.
pub struct RedisSessionRepository {
    client: redis::aio::ConnectionManager,
    decoding_key: DecodingKey,
}

impl RedisSessionRepository {
    pub fn new(client: redis::aio::ConnectionManager, jwt_secret: &str) -> Self {
        Self {
            client,
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
        }
    }

    fn get_redis_key(user_id: Uuid, token: &str) -> String {
        format!("session:{}:{}", user_id, token)
    }
}

#[async_trait]
impl SessionRepository for RedisSessionRepository {
    async fn resolve(&self, token: &str) -> Result<Option<Session>, ApplicationError> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = match decode::<SessionClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims,
            // Tampered or expired tokens are anonymous requests, not errors.
            Err(_) => return Ok(None),
        };

        let key = Self::get_redis_key(claims.sub, token);
        let mut conn = self.client.clone();
        let live: bool = conn.exists(&key).await.map_err(|e| {
            ApplicationError::InternalError(format!("Failed to check session: {}", e))
        })?;
        if !live {
            return Ok(None);
        }

        Ok(Some(Session {
            id: claims.sub,
            username: claims.username,
            roles: claims.roles,
            timezone: claims.timezone,
        }))
    }
}
