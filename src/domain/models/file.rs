use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One row of the `files` table. The blob key-space derived from `id` is
/// owned exclusively by this row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FileEntry {
    pub id: Uuid,
    pub owner: Uuid,
    pub folder: Option<Uuid>,
    pub name: String,
    pub original_name: Option<String>,
    pub mime_type: String,
    pub extension: Option<String>,
    pub size: i64,
    pub views: i32,
    pub max_views: Option<i32>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub favorite: bool,
    pub tags: Vec<String>,
    pub thumbnail: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl FileEntry {
    /// Key of the original blob: `<id>` with the extension appended when one
    /// is known.
    pub fn blob_key(&self) -> String {
        blob_key(self.id, self.extension.as_deref())
    }

    /// Key of the rendered thumbnail.
    pub fn thumbnail_key(&self) -> String {
        format!("thumbnails/{}.jpg", self.id)
    }

    /// Thumbnail predicate: `image/*` except SVG, or `video/*`.
    pub fn wants_thumbnail(&self) -> bool {
        if self.mime_type == "image/svg+xml" {
            return false;
        }
        self.mime_type.starts_with("image/") || self.mime_type.starts_with("video/")
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    pub fn download_name(&self) -> &str {
        self.original_name.as_deref().unwrap_or(&self.name)
    }
}

pub fn blob_key(id: Uuid, extension: Option<&str>) -> String {
    match extension {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mime_type: &str) -> FileEntry {
        FileEntry {
            id: Uuid::now_v7(),
            owner: Uuid::now_v7(),
            folder: None,
            name: "test".to_string(),
            original_name: None,
            mime_type: mime_type.to_string(),
            extension: Some("bin".to_string()),
            size: 1,
            views: 0,
            max_views: None,
            password: None,
            favorite: false,
            tags: Vec::new(),
            thumbnail: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            expires_at: None,
        }
    }

    #[test]
    fn blob_key_appends_extension_when_present() {
        let id = Uuid::now_v7();
        assert_eq!(blob_key(id, Some("png")), format!("{}.png", id));
        assert_eq!(blob_key(id, None), id.to_string());
    }

    #[test]
    fn thumbnail_predicate_accepts_images_and_videos() {
        assert!(entry("image/png").wants_thumbnail());
        assert!(entry("image/webp").wants_thumbnail());
        assert!(entry("video/mp4").wants_thumbnail());
        assert!(!entry("image/svg+xml").wants_thumbnail());
        assert!(!entry("text/plain").wants_thumbnail());
        assert!(!entry("application/pdf").wants_thumbnail());
    }

    #[test]
    fn password_is_never_serialized() {
        let mut e = entry("text/plain");
        e.password = Some("$argon2id$v=19$m=65536,t=3,p=4$c2FsdA$aGFzaA".to_string());
        let json = serde_json::to_value(&e).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["name"], "test");
    }
}
