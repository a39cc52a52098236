use async_trait::async_trait;
use sqlx::{query, query_as, query_scalar, QueryBuilder};
use uuid::Uuid;

use crate::{
    application::{
        dto::file_dto::{FileListPage, FileListQuery, NewFileDTO},
        error::ApplicationError,
        repositories::file_repository::FileRepository,
    },
    domain::models::file::FileEntry,
};

pub struct PgFileRepository {
    pool: sqlx::PgPool,
}

impl PgFileRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

/// Escapes `%`, `_` and `\` so caller input matches literally inside an
/// ILIKE pattern.
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn map_db_error(e: sqlx::Error) -> ApplicationError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return ApplicationError::Conflict("File name already in use".to_string());
        }
    }
    ApplicationError::DatabaseError(e.to_string())
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn insert(&self, file: NewFileDTO) -> Result<FileEntry, ApplicationError> {
        let sql = r#"
            INSERT INTO files (
                id, owner, folder, name, original_name, mime_type,
                extension, size, max_views, password, favorite, tags,
                expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
        "#;

        query_as::<_, FileEntry>(sql)
            .bind(file.id)
            .bind(file.owner)
            .bind(file.folder)
            .bind(&file.name)
            .bind(&file.original_name)
            .bind(&file.mime_type)
            .bind(&file.extension)
            .bind(file.size)
            .bind(file.max_views)
            .bind(&file.password)
            .bind(file.favorite)
            .bind(&file.tags)
            .bind(file.expires_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileEntry>, ApplicationError> {
        query_as::<_, FileEntry>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<FileEntry>, ApplicationError> {
        query_as::<_, FileEntry>(
            "SELECT * FROM files WHERE name = $1 ORDER BY created_at LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn name_taken(&self, owner: Uuid, name: &str) -> Result<bool, ApplicationError> {
        query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM files WHERE owner = $1 AND name = $2)",
        )
        .bind(owner)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn increment_views(&self, id: Uuid) -> Result<(), ApplicationError> {
        query("UPDATE files SET views = views + 1, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    async fn mark_thumbnail(&self, id: Uuid) -> Result<(), ApplicationError> {
        query("UPDATE files SET thumbnail = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApplicationError> {
        query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    async fn list_for_owner(
        &self,
        owner: Uuid,
        list: FileListQuery,
    ) -> Result<FileListPage, ApplicationError> {
        // Count and page run on one reserved connection so they see a
        // consistent pool slot under load.
        let mut conn = self.pool.acquire().await.map_err(map_db_error)?;

        let search_pattern = list
            .search_value
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let mut count_builder =
            QueryBuilder::new("SELECT COUNT(*) FROM files WHERE owner = ");
        count_builder.push_bind(owner);
        count_builder.push(" AND (expires_at IS NULL OR expires_at > NOW())");
        if let Some(ref pattern) = search_pattern {
            count_builder.push(" AND (name ILIKE ");
            count_builder.push_bind(pattern);
            count_builder.push(" ESCAPE '\\' OR original_name ILIKE ");
            count_builder.push_bind(pattern);
            count_builder.push(" ESCAPE '\\')");
        }
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&mut *conn)
            .await
            .map_err(map_db_error)?;

        let mut select_builder = QueryBuilder::new("SELECT * FROM files WHERE owner = ");
        select_builder.push_bind(owner);
        select_builder.push(" AND (expires_at IS NULL OR expires_at > NOW())");
        if let Some(ref pattern) = search_pattern {
            select_builder.push(" AND (name ILIKE ");
            select_builder.push_bind(pattern);
            select_builder.push(" ESCAPE '\\' OR original_name ILIKE ");
            select_builder.push_bind(pattern);
            select_builder.push(" ESCAPE '\\')");
        }
        // sort_by and sort_order come from closed allow-list enums, never
        // raw caller input.
        select_builder.push(format!(
            " ORDER BY {} {}",
            list.sort_by.as_str(),
            list.sort_order.as_str()
        ));
        select_builder.push(" LIMIT ");
        select_builder.push_bind(list.count);
        select_builder.push(" OFFSET ");
        select_builder.push_bind(list.page * list.count);

        let files = select_builder
            .build_query_as::<FileEntry>()
            .fetch_all(&mut *conn)
            .await
            .map_err(map_db_error)?;

        Ok(FileListPage { files, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("under_score"), "under\\_score");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
