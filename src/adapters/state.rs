use axum::extract::FromRef;
use std::sync::Arc;

use crate::{
    application::{
        repositories::{
            file_repository::FileRepository, session_repository::SessionRepository,
            settings_repository::SettingsRepository,
        },
        services::BlobBackend,
    },
    domain::config::environment::Environment,
    services::ThumbnailWorker,
};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub environment: Arc<Environment>,
    pub file_repository: Arc<dyn FileRepository>,
    pub settings_repository: Arc<dyn SettingsRepository>,
    pub session_repository: Arc<dyn SessionRepository>,
    pub blob_backend: Arc<dyn BlobBackend>,
    pub thumbnails: ThumbnailWorker,
}
