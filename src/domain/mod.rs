pub mod config;
pub mod duration;
pub mod models;
