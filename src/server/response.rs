use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::error::Error;
use crate::error::Result as StoreResult;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }
}

/// API error that converts to a proper HTTP response
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "data": null, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// The single place crate errors become HTTP responses. Internal detail is
/// logged, not echoed.
impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound => ApiError::not_found("Not found"),
            Error::AlreadyExists => ApiError::conflict("Already exists"),
            Error::TemplateInactive => ApiError::bad_request("Template is not active"),
            Error::NameConflict(name) => {
                ApiError::conflict(format!("Repository name '{name}' is already taken"))
            }
            Error::Provider(msg) => ApiError::bad_request(format!("GitHub rejected the request: {msg}")),
            Error::Transport(msg) => {
                tracing::warn!("transport failure talking to GitHub: {msg}");
                ApiError::bad_gateway("GitHub could not be reached")
            }
            Error::PartialFailure {
                compensation_failed: false,
                ..
            } => ApiError::internal(
                "Provisioning failed; the created repository was rolled back and the request can be retried",
            ),
            Error::PartialFailure {
                compensation_failed: true,
                remote_url,
            } => ApiError::internal(format!(
                "Provisioning failed and rollback did not complete; repository left at {}",
                remote_url.as_deref().unwrap_or("unknown")
            )),
            Error::BadRequest(msg) => ApiError::bad_request(msg),
            Error::Conflict(msg) => ApiError::conflict(msg),
            Error::Unauthorized | Error::InvalidTokenFormat | Error::SessionExpired => ApiError {
                status: StatusCode::UNAUTHORIZED,
                message: "Unauthorized".to_string(),
            },
            Error::Forbidden => ApiError::forbidden("Forbidden"),
            Error::Database(e) => {
                tracing::error!("database error: {e}");
                ApiError::internal("Database error")
            }
            Error::Io(e) => {
                tracing::error!("io error: {e}");
                ApiError::internal("Internal server error")
            }
            Error::Config(msg) => {
                tracing::error!("configuration error: {msg}");
                ApiError::internal("Internal server error")
            }
            Error::SessionLookupCollision => ApiError::internal("Internal server error"),
        }
    }
}

/// Extension trait for converting store results to API errors with a custom message.
pub trait StoreResultExt<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|_| ApiError::internal(message))
    }
}

/// Extension for Option types from store operations.
pub trait StoreOptionExt<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreOptionExt<T> for Option<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(message))
    }
}
