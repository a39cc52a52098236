use axum::{
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::HeaderMap,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    adapters::{
        dto::file_dto::{
            parse_bool_flag, DeleteBody, DeleteResponse, FailedFile, ListQuery, ListResponse,
            UploadQuery, UploadResponse, UploadedFile,
        },
        middleware::CurrentSession,
        state::AppState,
    },
    application::{
        dto::file_dto::{FileListQuery, NewFileDTO, SortColumn, SortOrder},
        error::ApplicationError,
        services::{exif_scrubber, name_policy, name_policy::NameFormat, password},
    },
    domain::{
        duration::parse_duration,
        models::{file::FileEntry, session::Session},
    },
};

/// Upper bound on a single upload request body.
pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

const DEFAULT_LIST_COUNT: i64 = 25;
const MAX_LIST_COUNT: i64 = 100;

/// One file lifted out of the request body, before validation.
struct IncomingFile {
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

/// Upload options after request-level validation. A bad option fails the
/// whole request with a 400 instead of surfacing as per-file noise.
struct UploadOptions {
    format: NameFormat,
    max_views: Option<i32>,
    expires_at: Option<DateTime<Utc>>,
    folder: Option<Uuid>,
    tags: Vec<String>,
    favorite: bool,
    password_hash: Option<String>,
}

impl UploadOptions {
    fn parse(query: UploadQuery) -> Result<Self, ApplicationError> {
        let format = NameFormat::parse(query.format.as_deref());

        let max_views = match query.max_views.as_deref() {
            None => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(v) if v > 0 => Some(v),
                _ => {
                    return Err(ApplicationError::BadRequest(
                        "Invalid max_views value".to_string(),
                    ))
                }
            },
        };

        let expires_at = match query.expires.as_deref() {
            None => None,
            Some(raw) => {
                let duration = parse_duration(raw).ok_or_else(|| {
                    ApplicationError::BadRequest("Invalid expires value".to_string())
                })?;
                Some(Utc::now() + duration)
            }
        };

        let folder = match query.folder.as_deref() {
            None => None,
            Some(raw) => Some(Uuid::parse_str(raw).map_err(|_| {
                ApplicationError::BadRequest("Invalid folder ID".to_string())
            })?),
        };

        let tags = query
            .tags
            .as_deref()
            .map(|raw| {
                raw.split([',', ' '])
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        // One hash per request; every file in the batch shares it.
        let password_hash = match query.password.as_deref() {
            None => None,
            Some(raw) => Some(password::hash(raw)?),
        };

        Ok(Self {
            format,
            max_views,
            expires_at,
            folder,
            tags,
            favorite: parse_bool_flag(query.favorite.as_deref()),
            password_hash,
        })
    }
}

pub struct FileController;

impl FileController {
    /// POST /api/files/upload
    pub async fn upload(
        State(app_state): State<AppState>,
        Extension(CurrentSession(session)): Extension<CurrentSession>,
        Query(query): Query<UploadQuery>,
        headers: HeaderMap,
        request: Request,
    ) -> Result<Json<UploadResponse>, ApplicationError> {
        let session = session.ok_or(ApplicationError::Unauthorized)?;
        let options = UploadOptions::parse(query)?;
        let clear_exif = parse_bool_flag(
            headers
                .get("X-Clear-Exif")
                .and_then(|v| v.to_str().ok()),
        );
        let domain = pick_domain(&headers, &app_state.environment.fqdn);

        let incoming = collect_files(request).await?;
        let policy = Self::name_policy_for(&app_state, &session).await?;

        let mut files = Vec::new();
        let mut failed = Vec::new();
        let mut thumbnail_batch: Vec<FileEntry> = Vec::new();

        for file in incoming {
            match Self::ingest_one(&app_state, &session, &options, &policy, clear_exif, file).await
            {
                Ok(entry) => {
                    let url = format!("{}/raw/{}", domain, entry.name);
                    files.push(UploadedFile::from_entry(&entry, url));
                    if entry.wants_thumbnail() {
                        thumbnail_batch.push(entry);
                    }
                }
                Err(failure) => failed.push(failure),
            }
        }

        // The batch is already committed; a settings fault only costs the
        // thumbnails, never the 200 aggregates.
        match app_state
            .settings_repository
            .get_or("enable_thumbnails", "true")
            .await
        {
            Ok(value) => {
                if value == "true" {
                    app_state.thumbnails.enqueue(thumbnail_batch);
                }
            }
            Err(e) => warn!("Could not read enable_thumbnails setting: {:?}", e),
        }

        info!(
            "Upload by {}: {} stored, {} failed",
            session.username,
            files.len(),
            failed.len()
        );
        Ok(Json(UploadResponse {
            success: true,
            files,
            failed,
        }))
    }

    /// Full per-file pipeline: validate, name, scrub, blob write, row insert.
    /// The blob is written first; a failed insert deletes it again so a row
    /// never points at missing bytes.
    async fn ingest_one(
        app_state: &AppState,
        session: &Session,
        options: &UploadOptions,
        policy: &name_policy::NamePolicy,
        clear_exif: bool,
        file: IncomingFile,
    ) -> Result<FileEntry, FailedFile> {
        let fail = |reason: &str| FailedFile {
            file: file.name.clone(),
            reason: reason.to_string(),
        };

        if file.mime_type.is_empty() {
            return Err(fail("Cannot determine file type"));
        }
        if file.bytes.is_empty() {
            return Err(fail("Empty file"));
        }
        if file.name.is_empty() {
            return Err(fail("Missing file name"));
        }

        let (base, extension) = split_extension(&file.name);
        if let Some(ref ext) = extension {
            if mime_guess::from_ext(ext).first().is_none() {
                return Err(fail("Invalid file name"));
            }
        }

        let id = Uuid::now_v7();
        let derived = policy.derive(options.format, base, id);

        let mut name = derived.name;
        let mut original_name = derived.original_name;
        match app_state
            .file_repository
            .name_taken(session.id, &name)
            .await
        {
            Ok(false) => {}
            Ok(true) => {
                // One retry with a random suffix; a second collision is a
                // genuine conflict.
                let suffixed = name_policy::with_collision_suffix(&name);
                match app_state
                    .file_repository
                    .name_taken(session.id, &suffixed)
                    .await
                {
                    Ok(false) => {
                        name = suffixed;
                        // The suffix makes the name diverge from the base
                        // even when the slug matched it exactly.
                        if original_name.is_none() {
                            original_name = Some(base.to_string());
                        }
                    }
                    Ok(true) => return Err(fail("File name already in use")),
                    Err(e) => {
                        warn!("Name lookup failed: {:?}", e);
                        return Err(fail("Failed to save file"));
                    }
                }
            }
            Err(e) => {
                warn!("Name lookup failed: {:?}", e);
                return Err(fail("Failed to save file"));
            }
        }

        let mut bytes = file.bytes;
        if clear_exif {
            if let Some(ref ext) = extension {
                if exif_scrubber::can_scrub(ext) {
                    bytes = exif_scrubber::clear_location_tags(bytes, ext);
                }
            }
        }

        let blob_key = crate::domain::models::file::blob_key(id, extension.as_deref());
        if let Err(e) = app_state.blob_backend.put(&blob_key, &bytes).await {
            warn!("Blob write failed for {}: {:?}", blob_key, e);
            return Err(fail("Failed to save file"));
        }

        let dto = NewFileDTO {
            id,
            owner: session.id,
            folder: options.folder,
            name,
            original_name,
            mime_type: file.mime_type.clone(),
            extension,
            size: bytes.len() as i64,
            max_views: options.max_views,
            password: options.password_hash.clone(),
            favorite: options.favorite,
            tags: options.tags.clone(),
            expires_at: options.expires_at,
        };
        match app_state.file_repository.insert(dto).await {
            Ok(entry) => Ok(entry),
            Err(e) => {
                // The row never landed; reclaim the blob.
                if let Err(cleanup) = app_state.blob_backend.delete(&blob_key).await {
                    warn!("Orphan blob cleanup failed for {}: {:?}", blob_key, cleanup);
                }
                match e {
                    ApplicationError::Conflict(_) => Err(fail("File name already in use")),
                    other => {
                        warn!("Insert failed for {}: {:?}", blob_key, other);
                        Err(fail("Failed to save file"))
                    }
                }
            }
        }
    }

    async fn name_policy_for(
        app_state: &AppState,
        session: &Session,
    ) -> Result<name_policy::NamePolicy, ApplicationError> {
        let settings = &app_state.settings_repository;

        let date_format = settings
            .get_or("date_format", name_policy::DEFAULT_DATE_FORMAT)
            .await?;
        let random_name_length = settings
            .get("random_name_length")
            .await?
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(name_policy::DEFAULT_RANDOM_NAME_LENGTH);

        let timezone_name = match session.timezone.clone() {
            Some(tz) => Some(tz),
            None => settings.get("default_timezone").await?,
        };
        let timezone = timezone_name
            .and_then(|tz| tz.parse::<chrono_tz::Tz>().ok())
            .unwrap_or(chrono_tz::Tz::UTC);

        Ok(name_policy::NamePolicy {
            date_format,
            random_name_length,
            timezone,
        })
    }

    /// GET /api/files
    pub async fn list(
        State(app_state): State<AppState>,
        Extension(CurrentSession(session)): Extension<CurrentSession>,
        Query(query): Query<ListQuery>,
    ) -> Result<Json<ListResponse>, ApplicationError> {
        let session = session.ok_or(ApplicationError::Unauthorized)?;

        let sort_by = match query.sort_by.as_deref() {
            None => SortColumn::CreatedAt,
            Some(raw) => SortColumn::parse(raw).ok_or_else(|| {
                ApplicationError::BadRequest("Invalid sort_by value".to_string())
            })?,
        };
        let sort_order = query
            .sort_order
            .as_deref()
            .map(SortOrder::parse)
            .unwrap_or_default();
        let count = query.count.unwrap_or(DEFAULT_LIST_COUNT).clamp(1, MAX_LIST_COUNT);
        let page = query.page.unwrap_or(0).max(0);

        let page_result = app_state
            .file_repository
            .list_for_owner(
                session.id,
                FileListQuery {
                    count,
                    page,
                    sort_by,
                    sort_order,
                    search_value: query.search_value,
                },
            )
            .await?;

        Ok(Json(ListResponse {
            success: true,
            files: page_result.files,
            total: page_result.total,
            page,
            count,
        }))
    }

    /// DELETE /api/files/{query}
    ///
    /// `query` is a UUID or a name; `_` (or an empty segment) defers to the
    /// `{files: [...]}` body for bulk deletes.
    pub async fn delete(
        State(app_state): State<AppState>,
        Extension(CurrentSession(session)): Extension<CurrentSession>,
        Path(query): Path<String>,
        body: Option<Json<DeleteBody>>,
    ) -> Result<Json<DeleteResponse>, ApplicationError> {
        let session = session.ok_or(ApplicationError::Unauthorized)?;

        let entries: Vec<String> = if query.is_empty() || query == "_" {
            body.map(|Json(b)| b.files).unwrap_or_default()
        } else {
            vec![query]
        };
        if entries.is_empty() {
            return Err(ApplicationError::BadRequest(
                "No files specified".to_string(),
            ));
        }

        let mut deleted = Vec::new();
        let mut failed = Vec::new();

        for entry_query in entries {
            match Self::delete_one(&app_state, &session, &entry_query).await {
                Ok(()) => deleted.push(entry_query),
                Err(reason) => failed.push(FailedFile {
                    file: entry_query,
                    reason,
                }),
            }
        }

        info!(
            "Delete by {}: {} removed, {} failed",
            session.username,
            deleted.len(),
            failed.len()
        );
        Ok(Json(DeleteResponse {
            success: true,
            code: 200,
            deleted,
            failed,
        }))
    }

    /// Blob first, row second: a crash here leaves a retryable dangling row,
    /// never an orphan blob.
    async fn delete_one(
        app_state: &AppState,
        session: &Session,
        query: &str,
    ) -> Result<(), String> {
        let lookup = if is_uuid(query) {
            app_state
                .file_repository
                .find_by_id(Uuid::parse_str(query).unwrap_or_default())
                .await
        } else {
            app_state.file_repository.find_by_name(query).await
        };

        let entry = match lookup {
            Ok(Some(entry)) => entry,
            Ok(None) => return Err("File not found".to_string()),
            Err(e) => {
                warn!("Delete lookup failed for {}: {:?}", query, e);
                return Err("Failed to delete file".to_string());
            }
        };

        if !session.is_admin() && !session.owns(entry.owner) {
            return Err("Forbidden".to_string());
        }

        if let Err(e) = app_state.blob_backend.delete(&entry.blob_key()).await {
            warn!("Blob delete failed for {}: {:?}", entry.blob_key(), e);
        }
        if entry.thumbnail {
            if let Err(e) = app_state.blob_backend.delete(&entry.thumbnail_key()).await {
                warn!(
                    "Thumbnail delete failed for {}: {:?}",
                    entry.thumbnail_key(),
                    e
                );
            }
        }

        match app_state.file_repository.delete(entry.id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Row delete failed for {}: {:?}", entry.id, e);
                Err("Failed to delete file".to_string())
            }
        }
    }
}

/// Lifts the request body into a uniform list of files: every part of a
/// multipart body, or the whole body as `file.txt`/`file.json` for plain
/// text and JSON uploads.
async fn collect_files(request: Request) -> Result<Vec<IncomingFile>, ApplicationError> {
    let content_type = request
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &()).await.map_err(|e| {
            warn!("Invalid multipart data: {}", e);
            ApplicationError::BadRequest("Invalid request format".to_string())
        })?;

        let mut files = Vec::new();
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            warn!("Invalid multipart data: {}", e);
            ApplicationError::BadRequest("Invalid request format".to_string())
        })? {
            if field.file_name().is_none() {
                continue;
            }
            let name = field.file_name().unwrap_or_default().to_string();
            let mime_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| {
                    warn!("Cannot read file bytes: {}", e);
                    ApplicationError::BadRequest("Invalid file data".to_string())
                })?
                .to_vec();
            files.push(IncomingFile {
                name,
                mime_type,
                bytes,
            });
        }
        return Ok(files);
    }

    let single = |name: &str, mime_type: &str| (name.to_string(), mime_type.to_string());
    let (name, mime_type) = if content_type.starts_with("text/plain") {
        single("file.txt", "text/plain")
    } else if content_type.starts_with("application/json") {
        single("file.json", "application/json")
    } else {
        return Err(ApplicationError::BadRequest(
            "Invalid request format".to_string(),
        ));
    };

    let bytes = axum::body::to_bytes(request.into_body(), MAX_UPLOAD_BYTES)
        .await
        .map_err(|e| {
            warn!("Cannot read request body: {}", e);
            ApplicationError::BadRequest("Invalid file data".to_string())
        })?;
    Ok(vec![IncomingFile {
        name,
        mime_type,
        bytes: bytes.to_vec(),
    }])
}

/// Chooses the host for response URLs: a random entry of the CSV
/// `X-Override-Domains` header, or the configured FQDN.
fn pick_domain(headers: &HeaderMap, fqdn: &str) -> String {
    let chosen = headers
        .get("X-Override-Domains")
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| {
            let domains: Vec<&str> = raw
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .collect();
            domains.choose(&mut rand::rng()).map(|d| d.to_string())
        })
        .unwrap_or_else(|| fqdn.to_string());

    if chosen.starts_with("http://") || chosen.starts_with("https://") {
        chosen
    } else {
        format!("https://{}", chosen)
    }
}

fn split_extension(file_name: &str) -> (&str, Option<String>) {
    match file_name.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() && !ext.is_empty() => {
            (base, Some(ext.to_ascii_lowercase()))
        }
        _ => (file_name, None),
    }
}

pub fn is_uuid(value: &str) -> bool {
    value.len() == 36 && Uuid::parse_str(value).is_ok()
}
