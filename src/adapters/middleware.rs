use axum::{
    body::Body,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::{
    application::repositories::session_repository::SessionRepository,
    domain::models::session::Session,
};

/// The session attached to the current request, if any. Handlers decide for
/// themselves whether an anonymous caller is acceptable.
#[derive(Clone, Default)]
pub struct CurrentSession(pub Option<Session>);

/// Resolves the caller's session from the `session` cookie or a bearer token
/// and stores it as a request extension. Invalid or expired tokens resolve to
/// an anonymous request rather than an error.
pub async fn resolve_session(
    State(sessions): State<Arc<dyn SessionRepository>>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let mut session = None;
    if let Some(token) = extract_token(&headers) {
        match sessions.resolve(&token).await {
            Ok(resolved) => session = resolved,
            Err(e) => warn!("Session lookup failed: {:?}", e),
        }
    }

    request.extensions_mut().insert(CurrentSession(session));
    next.run(request).await
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(cookies) = headers.get("cookie").and_then(|v| v.to_str().ok()) {
        for cookie in cookies.split(';') {
            if let Some(value) = cookie.trim().strip_prefix("session=") {
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }

    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_comes_from_the_session_cookie_first() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", "theme=dark; session=abc123; lang=en".parse().unwrap());
        headers.insert("authorization", "Bearer from-header".parse().unwrap());
        assert_eq!(extract_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn bearer_header_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer from-header".parse().unwrap());
        assert_eq!(extract_token(&headers), Some("from-header".to_string()));
    }

    #[test]
    fn absent_or_empty_credentials_mean_anonymous() {
        assert_eq!(extract_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert("cookie", "session=".parse().unwrap());
        headers.insert("authorization", "Basic abc".parse().unwrap());
        assert_eq!(extract_token(&headers), None);
    }
}
