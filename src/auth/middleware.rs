use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::helpers::{AuthedIdentity, SessionValidationError, extract_bearer_token, validate_session};
use crate::server::AppState;
use crate::types::{Identity, Role, Session};

/// Extractor that requires a valid session. This is the gate every
/// authenticated route goes through: it resolves the bearer token to the
/// caller's identity and role for the duration of the request.
pub struct RequireUser {
    pub session: Session,
    pub identity: Identity,
    pub role: Role,
}

/// Extractor that additionally requires the caller's role to be admin.
pub struct RequireAdmin {
    pub identity: Identity,
}

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    SessionExpired,
    NotAdmin,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidScheme => (StatusCode::UNAUTHORIZED, "Invalid authorization scheme"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid session token"),
            AuthError::SessionExpired => (StatusCode::UNAUTHORIZED, "Session expired"),
            AuthError::NotAdmin => (StatusCode::FORBIDDEN, "Admin access required"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                "WWW-Authenticate",
                "Bearer realm=\"botforge\"".parse().unwrap(),
            );
        }

        response
    }
}

impl From<SessionValidationError> for AuthError {
    fn from(err: SessionValidationError) -> Self {
        match err {
            SessionValidationError::InvalidScheme => AuthError::InvalidScheme,
            SessionValidationError::InvalidToken => AuthError::InvalidToken,
            SessionValidationError::SessionExpired => AuthError::SessionExpired,
            SessionValidationError::InternalError => AuthError::InternalError,
        }
    }
}

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let authed = resolve_caller(parts, state)?;
        Ok(RequireUser {
            session: authed.session,
            identity: authed.identity,
            role: authed.role,
        })
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let authed = resolve_caller(parts, state)?;

        if !authed.role.is_admin() {
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireAdmin {
            identity: authed.identity,
        })
    }
}

fn resolve_caller(parts: &Parts, state: &Arc<AppState>) -> Result<AuthedIdentity, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let raw_token = extract_bearer_token(auth_header)
        .map_err(AuthError::from)?
        .ok_or(AuthError::MissingAuth)?;

    validate_session(state, &raw_token).map_err(AuthError::from)
}
