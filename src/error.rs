use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("session lookup collision")]
    SessionLookupCollision,

    #[error("template is not active")]
    TemplateInactive,

    #[error("repository name already taken: {0}")]
    NameConflict(String),

    #[error("provider rejected the request: {0}")]
    Provider(String),

    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote repository was created but the local record could not be
    /// persisted. When `compensation_failed` is true the remote repository
    /// still exists at `remote_url` and needs manual cleanup.
    #[error("provisioning partially failed (compensation_failed: {compensation_failed})")]
    PartialFailure {
        compensation_failed: bool,
        remote_url: Option<String>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("invalid token format")]
    InvalidTokenFormat,

    #[error("session expired")]
    SessionExpired,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, Error>;
