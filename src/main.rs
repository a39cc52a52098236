mod adapters;
mod application;
mod domain;
mod services;

use std::sync::Arc;

use adapters::{
    controllers::{
        file_controller::{FileController, MAX_UPLOAD_BYTES},
        health_controller::HealthController,
        raw_controller::RawController,
    },
    middleware::resolve_session,
    repositories::{PgFileRepository, PgSettingsRepository, RedisSessionRepository},
    state::AppState,
};
use application::repositories::{
    file_repository::FileRepository, session_repository::SessionRepository,
    settings_repository::SettingsRepository,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use domain::config::environment::Environment;
use services::ThumbnailWorker;
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Initialize AWS SDK crypto provider (required for aws-sdk-s3)
    // This must be called before any AWS SDK operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let environment = Environment::from_env()
        .unwrap_or_else(|e| panic!("ERROR: invalid environment configuration: {}", e));
    let environment = Arc::new(environment);

    tracing::info!("Starting shelf on {}:{}", environment.host, environment.port);

    // Configure CORS
    let cors = if let Ok(allowed_origins) = std::env::var("CORS_ALLOWED_ORIGINS") {
        // Parse comma-separated origins
        let origins: Vec<_> = allowed_origins
            .split(',')
            .map(|s| s.trim().parse().expect("Invalid CORS origin"))
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Allow all origins if not specified (only for development)
        CorsLayer::permissive()
    };

    // Connect to PostgreSQL and Redis in parallel for faster startup
    tracing::info!("Connecting to databases...");
    let (pool, redis_conn_manager) = tokio::join!(
        async {
            sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(std::time::Duration::from_secs(30))
                .connect(&environment.database_url)
                .await
                .expect("ERROR: Failed to connect to PostgreSQL database. Check PG* variables and network connectivity.")
        },
        async {
            let redis_client = redis::Client::open(environment.redis_url.as_str())
                .expect("ERROR: Failed to create Redis client. Check REDIS_URL format.");
            redis::aio::ConnectionManager::new(redis_client)
                .await
                .expect(
                    "ERROR: Failed to connect to Redis. Check REDIS_URL and network connectivity.",
                )
        }
    );
    tracing::info!("Database connections established");

    let file_repository =
        Arc::new(PgFileRepository::new(pool.clone())) as Arc<dyn FileRepository>;
    let settings_repository =
        Arc::new(PgSettingsRepository::new(pool)) as Arc<dyn SettingsRepository>;
    let session_repository = Arc::new(RedisSessionRepository::new(
        redis_conn_manager,
        &environment.jwt_secret,
    )) as Arc<dyn SessionRepository>;

    let blob_backend = services::create_blob_backend(&environment.datasource)
        .expect("ERROR: Failed to initialize blob storage backend");
    let thumbnails = ThumbnailWorker::new(blob_backend.clone(), file_repository.clone());

    let app_state = AppState {
        environment: environment.clone(),
        file_repository,
        settings_repository,
        session_repository,
        blob_backend,
        thumbnails: thumbnails.clone(),
    };

    let router = Router::new()
        .route("/api/files/upload", post(FileController::upload))
        .route("/api/files", get(FileController::list))
        .route("/api/files/{query}", delete(FileController::delete))
        .route("/raw/{query}", get(RawController::serve))
        .route("/api/health", get(HealthController::health_check))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            resolve_session,
        ))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(app_state);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", environment.host, environment.port))
            .await
            .expect("Failed to bind to port");

    tracing::info!(
        "Server listening on {}:{}",
        environment.host,
        environment.port
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .expect("Failed to start server");

    // Let in-flight thumbnail batches finish before the process exits.
    thumbnails.shutdown().await;
}
