pub mod file_repository;
pub mod session_repository;
pub mod settings_repository;
