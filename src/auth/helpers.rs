use std::sync::Arc;

use chrono::Utc;

use super::token::{SessionTokens, token_lookup};
use crate::server::AppState;
use crate::types::{Identity, Role, Session};

#[derive(Debug)]
pub enum SessionValidationError {
    InvalidScheme,
    InvalidToken,
    SessionExpired,
    InternalError,
}

/// The resolved caller of a request: session, identity, and role.
pub struct AuthedIdentity {
    pub session: Session,
    pub identity: Identity,
    pub role: Role,
}

/// Extracts a raw token from an Authorization header.
/// Returns None if no auth header is present, Err for unsupported schemes.
pub fn extract_bearer_token(
    auth_header: Option<&str>,
) -> Result<Option<String>, SessionValidationError> {
    match auth_header {
        Some(header) => match header.strip_prefix("Bearer ") {
            Some(token) => Ok(Some(token.to_string())),
            None => Err(SessionValidationError::InvalidScheme),
        },
        None => Ok(None),
    }
}

/// Validates a raw session token against the store and resolves the
/// identity and role it belongs to.
pub fn validate_session(
    state: &Arc<AppState>,
    raw_token: &str,
) -> Result<AuthedIdentity, SessionValidationError> {
    let lookup = token_lookup(raw_token).map_err(|_| SessionValidationError::InvalidToken)?;

    let session = state
        .store
        .get_session_by_lookup(lookup)
        .map_err(|_| SessionValidationError::InternalError)?
        .ok_or(SessionValidationError::InvalidToken)?;

    let tokens = SessionTokens::new();
    if !tokens
        .verify(raw_token, &session.token_hash)
        .map_err(|_| SessionValidationError::InternalError)?
    {
        return Err(SessionValidationError::InvalidToken);
    }

    if let Some(expires_at) = &session.expires_at {
        if expires_at < &Utc::now() {
            return Err(SessionValidationError::SessionExpired);
        }
    }

    let identity = state
        .store
        .get_identity(&session.identity_id)
        .map_err(|_| SessionValidationError::InternalError)?
        .ok_or(SessionValidationError::InvalidToken)?;

    let role = state
        .store
        .get_role(&identity.id)
        .map_err(|_| SessionValidationError::InternalError)?
        .ok_or(SessionValidationError::InternalError)?;

    Ok(AuthedIdentity {
        session,
        identity,
        role,
    })
}
