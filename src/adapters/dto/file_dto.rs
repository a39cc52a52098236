use serde::{Deserialize, Serialize};

use crate::domain::models::file::FileEntry;

/// Raw upload options as they arrive on the query string. Everything is kept
/// as a string here; the controller parses and rejects with a request-level
/// 400 so one bad option never turns into a confusing per-file failure.
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub format: Option<String>,
    pub max_views: Option<String>,
    pub password: Option<String>,
    pub expires: Option<String>,
    pub tags: Option<String>,
    pub favorite: Option<String>,
    pub folder: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "originalName")]
    pub original_name: Option<String>,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub extension: Option<String>,
    pub size: i64,
    pub url: String,
}

impl UploadedFile {
    pub fn from_entry(entry: &FileEntry, url: String) -> Self {
        Self {
            id: entry.id.to_string(),
            name: entry.name.clone(),
            original_name: entry.original_name.clone(),
            mime_type: entry.mime_type.clone(),
            extension: entry.extension.clone(),
            size: entry.size,
            url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FailedFile {
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub files: Vec<UploadedFile>,
    pub failed: Vec<FailedFile>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteBody {
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub code: u16,
    pub deleted: Vec<String>,
    pub failed: Vec<FailedFile>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawQuery {
    pub password: Option<String>,
    pub download: Option<String>,
    pub json: Option<String>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub count: Option<i64>,
    pub page: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search_value: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub files: Vec<FileEntry>,
    pub total: i64,
    pub page: i64,
    pub count: i64,
}

/// Boolean-ish query and header values: exactly `true` or `1` are truthy.
pub fn parse_bool_flag(value: Option<&str>) -> bool {
    matches!(value, Some("true") | Some("1"))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn upload_echo_carries_the_extension() {
        let entry = FileEntry {
            id: Uuid::now_v7(),
            owner: Uuid::now_v7(),
            folder: None,
            name: "hello".to_string(),
            original_name: None,
            mime_type: "text/plain".to_string(),
            extension: Some("txt".to_string()),
            size: 17,
            views: 0,
            max_views: None,
            password: None,
            favorite: false,
            tags: Vec::new(),
            thumbnail: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            expires_at: None,
        };

        let echoed =
            UploadedFile::from_entry(&entry, "https://files.example.com/raw/hello".to_string());
        assert_eq!(echoed.name, "hello");
        assert_eq!(echoed.extension, Some("txt".to_string()));
        assert_eq!(echoed.size, 17);

        let json = serde_json::to_value(&echoed).unwrap();
        assert_eq!(json["extension"], "txt");
        assert_eq!(json["mimeType"], "text/plain");
    }

    #[test]
    fn bool_flags_accept_true_and_1_only() {
        assert!(parse_bool_flag(Some("true")));
        assert!(parse_bool_flag(Some("1")));
        assert!(!parse_bool_flag(Some("TRUE")));
        assert!(!parse_bool_flag(Some("yes")));
        assert!(!parse_bool_flag(Some("")));
        assert!(!parse_bool_flag(None));
    }

    #[test]
    fn delete_body_deserializes_a_file_list() {
        let body: DeleteBody = serde_json::from_str(r#"{"files": ["a.png", "b"]}"#).unwrap();
        assert_eq!(body.files, vec!["a.png", "b"]);
        assert!(serde_json::from_str::<DeleteBody>(r#"{"files": "a"}"#).is_err());
    }
}
