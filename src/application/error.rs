#[derive(Debug)]
pub enum ApplicationError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    Forbidden(String),
    Conflict(String),
    DatabaseError(String),
    StorageError(String),
    InternalError(String),
}
