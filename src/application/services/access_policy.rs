//! Pure access decisions for serving a file.

use chrono::Utc;

use crate::{
    application::services::password,
    domain::models::{file::FileEntry, session::Session},
};

#[derive(Debug, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(DenyReason),
}

#[derive(Debug, PartialEq, Eq)]
pub enum DenyReason {
    /// Entry is password-protected and no password was provided. 403.
    PasswordRequired,
    /// A password was provided but does not verify. 403.
    InvalidPassword,
    /// Expired or view cap reached; served as 404 so the entry does not
    /// confirm its existence.
    Gone,
}

/// Decides whether `entry` may be served to `session` with
/// `provided_password`. Admins and the owner bypass the password check but
/// not expiry or the view cap.
pub fn evaluate(
    session: Option<&Session>,
    entry: &FileEntry,
    provided_password: Option<&str>,
) -> AccessDecision {
    if let Some(expires_at) = entry.expires_at {
        if expires_at <= Utc::now() {
            return AccessDecision::Deny(DenyReason::Gone);
        }
    }

    if let Some(max_views) = entry.max_views {
        if entry.views >= max_views {
            return AccessDecision::Deny(DenyReason::Gone);
        }
    }

    if let Some(stored_hash) = entry.password.as_deref() {
        let privileged = session
            .map(|s| s.is_admin() || s.owns(entry.owner))
            .unwrap_or(false);
        if !privileged {
            match provided_password {
                None => return AccessDecision::Deny(DenyReason::PasswordRequired),
                Some(provided) => {
                    if !password::verify(provided, stored_hash) {
                        return AccessDecision::Deny(DenyReason::InvalidPassword);
                    }
                }
            }
        }
    }

    AccessDecision::Allow
}
