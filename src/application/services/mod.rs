pub mod access_policy;
pub mod blob_backend;
pub mod exif_scrubber;
pub mod name_policy;
pub mod password;

pub use blob_backend::BlobBackend;
