use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Everything the repository needs to insert a new `files` row. The caller
/// has already written the blob for `id` before this DTO reaches the
/// database.
#[derive(Debug, Clone)]
pub struct NewFileDTO {
    pub id: Uuid,
    pub owner: Uuid,
    pub folder: Option<Uuid>,
    pub name: String,
    pub original_name: Option<String>,
    pub mime_type: String,
    pub extension: Option<String>,
    pub size: i64,
    pub max_views: Option<i32>,
    pub password: Option<String>,
    pub favorite: bool,
    pub tags: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Columns the listing endpoint may sort by. Caller input is validated
/// against this closed set before it is ever interpolated into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Size,
    CreatedAt,
    ExpiresAt,
    Views,
    Name,
    OriginalName,
    MimeType,
    Extension,
}

impl SortColumn {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "size" => Some(Self::Size),
            "created_at" => Some(Self::CreatedAt),
            "expires_at" => Some(Self::ExpiresAt),
            "views" => Some(Self::Views),
            "name" => Some(Self::Name),
            "original_name" => Some(Self::OriginalName),
            "mime_type" => Some(Self::MimeType),
            "extension" => Some(Self::Extension),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::CreatedAt => "created_at",
            Self::ExpiresAt => "expires_at",
            Self::Views => "views",
            Self::Name => "name",
            Self::OriginalName => "original_name",
            Self::MimeType => "mime_type",
            Self::Extension => "extension",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Self::Ascending,
            _ => Self::Descending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileListQuery {
    pub count: i64,
    pub page: i64,
    pub sort_by: SortColumn,
    pub sort_order: SortOrder,
    pub search_value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FileListPage {
    pub files: Vec<crate::domain::models::file::FileEntry>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_column_allow_list_is_closed() {
        for valid in [
            "size",
            "created_at",
            "expires_at",
            "views",
            "name",
            "original_name",
            "mime_type",
            "extension",
        ] {
            let column = SortColumn::parse(valid).unwrap();
            assert_eq!(column.as_str(), valid);
        }

        assert!(SortColumn::parse("owner").is_none());
        assert!(SortColumn::parse("password").is_none());
        assert!(SortColumn::parse("created_at; DROP TABLE files").is_none());
        assert!(SortColumn::parse("").is_none());
    }

    #[test]
    fn sort_order_defaults_to_descending() {
        assert_eq!(SortOrder::parse("asc").as_str(), "ASC");
        assert_eq!(SortOrder::parse("ASCENDING").as_str(), "ASC");
        assert_eq!(SortOrder::parse("desc").as_str(), "DESC");
        assert_eq!(SortOrder::parse("descending").as_str(), "DESC");
        assert_eq!(SortOrder::parse("sideways").as_str(), "DESC");
    }
}
