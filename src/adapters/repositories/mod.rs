mod pg_file_repository;
mod pg_settings_repository;
mod redis_session_repository;

pub use pg_file_repository::PgFileRepository;
pub use pg_settings_repository::PgSettingsRepository;
pub use redis_session_repository::RedisSessionRepository;
