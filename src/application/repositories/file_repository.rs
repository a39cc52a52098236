use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    application::{
        dto::file_dto::{FileListPage, FileListQuery, NewFileDTO},
        error::ApplicationError,
    },
    domain::models::file::FileEntry,
};

#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Inserts a committed upload. A `(owner, name)` unique violation maps
    /// to `ApplicationError::Conflict`.
    async fn insert(&self, file: NewFileDTO) -> Result<FileEntry, ApplicationError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileEntry>, ApplicationError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<FileEntry>, ApplicationError>;

    async fn name_taken(&self, owner: Uuid, name: &str) -> Result<bool, ApplicationError>;

    async fn increment_views(&self, id: Uuid) -> Result<(), ApplicationError>;

    async fn mark_thumbnail(&self, id: Uuid) -> Result<(), ApplicationError>;

    async fn delete(&self, id: Uuid) -> Result<(), ApplicationError>;

    async fn list_for_owner(
        &self,
        owner: Uuid,
        query: FileListQuery,
    ) -> Result<FileListPage, ApplicationError>;
}
