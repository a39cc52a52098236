use axum::{extract::State, Json};
use serde::Serialize;
use tracing::warn;

use crate::adapters::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: bool,
}

pub struct HealthController;

impl HealthController {
    /// GET /api/health
    pub async fn health_check(State(app_state): State<AppState>) -> Json<HealthResponse> {
        let database = match app_state.settings_repository.get("date_format").await {
            Ok(_) => true,
            Err(e) => {
                warn!("Health check database probe failed: {:?}", e);
                false
            }
        };

        Json(HealthResponse {
            status: if database { "healthy" } else { "degraded" }.to_string(),
            database,
        })
    }
}
