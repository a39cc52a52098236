use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::warn;
use uuid::Uuid;

use crate::{
    adapters::{
        controllers::file_controller::is_uuid,
        dto::file_dto::{parse_bool_flag, RawQuery},
        middleware::CurrentSession,
        state::AppState,
    },
    application::{
        error::ApplicationError,
        services::access_policy::{self, AccessDecision, DenyReason},
    },
    domain::models::file::FileEntry,
};

pub struct RawController;

impl RawController {
    /// GET /raw/{query}
    ///
    /// `query` is a UUID or a public name, optionally carrying a file
    /// extension that is ignored for resolution.
    pub async fn serve(
        State(app_state): State<AppState>,
        Extension(CurrentSession(session)): Extension<CurrentSession>,
        Path(query): Path<String>,
        Query(options): Query<RawQuery>,
    ) -> Result<Response, ApplicationError> {
        let entry = Self::resolve(&app_state, &query)
            .await?
            .ok_or_else(|| ApplicationError::NotFound("File not found".to_string()))?;

        match access_policy::evaluate(session.as_ref(), &entry, options.password.as_deref()) {
            AccessDecision::Allow => {}
            AccessDecision::Deny(DenyReason::Gone) => {
                // Expired and view-capped entries do not confirm their
                // existence.
                return Err(ApplicationError::NotFound("File not found".to_string()));
            }
            AccessDecision::Deny(DenyReason::PasswordRequired) => {
                return Err(ApplicationError::Forbidden("Password required".to_string()));
            }
            AccessDecision::Deny(DenyReason::InvalidPassword) => {
                return Err(ApplicationError::Forbidden("Invalid password".to_string()));
            }
        }

        if parse_bool_flag(options.json.as_deref()) {
            // The password hash is stripped by the entry's serializer.
            let body = Json(json!({
                "success": true,
                "code": 200,
                "file": entry,
            }));
            return Ok(body.into_response());
        }

        let thumbnail = parse_bool_flag(options.thumbnail.as_deref());
        let (blob_key, content_type) = if thumbnail {
            (entry.thumbnail_key(), "image/jpeg".to_string())
        } else {
            (entry.blob_key(), entry.mime_type.clone())
        };

        let reader = app_state.blob_backend.get(&blob_key).await?;

        // Best effort; a failed increment must not block the serve.
        if let Err(e) = app_state.file_repository.increment_views(entry.id).await {
            warn!("View increment failed for {}: {:?}", entry.id, e);
        }

        let disposition_kind = if parse_bool_flag(options.download.as_deref()) {
            "attachment"
        } else {
            "inline"
        };
        let disposition = format!(
            "{}; filename=\"{}\"",
            disposition_kind,
            entry.download_name()
        );

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_DISPOSITION, disposition)
            .body(Body::from_stream(ReaderStream::new(reader)))
            .map_err(|e| ApplicationError::InternalError(e.to_string()))?;
        Ok(response)
    }

    async fn resolve(
        app_state: &AppState,
        query: &str,
    ) -> Result<Option<FileEntry>, ApplicationError> {
        let stem = name_without_extension(query);
        if is_uuid(stem) {
            let id = Uuid::parse_str(stem)
                .map_err(|e| ApplicationError::InternalError(e.to_string()))?;
            return app_state.file_repository.find_by_id(id).await;
        }

        // Names may legitimately contain dots, so the exact query wins over
        // the extension-stripped form.
        if let Some(entry) = app_state.file_repository.find_by_name(query).await? {
            return Ok(Some(entry));
        }
        if stem != query {
            return app_state.file_repository.find_by_name(stem).await;
        }
        Ok(None)
    }
}

fn name_without_extension(query: &str) -> &str {
    match query.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => stem,
        _ => query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_stripping_keeps_dotless_and_edge_names() {
        assert_eq!(name_without_extension("report.pdf"), "report");
        assert_eq!(
            name_without_extension("0190a6be-7cc1-7abc-8def-0123456789ab.png"),
            "0190a6be-7cc1-7abc-8def-0123456789ab"
        );
        assert_eq!(name_without_extension("noext"), "noext");
        assert_eq!(name_without_extension(".hidden"), ".hidden");
    }
}
