pub mod file;
pub mod session;
