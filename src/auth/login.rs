use chrono::{Duration, Utc};
use uuid::Uuid;

use super::token::SessionTokens;
use crate::error::{Error, Result};
use crate::server::AppState;
use crate::types::{Identity, Role, Session};

const SESSION_TTL_DAYS: i64 = 30;
const MINT_RETRIES: u32 = 3;

/// Result of a completed login: the upserted identity, its role, and a raw
/// session token the client presents on subsequent requests.
pub struct LoginOutcome {
    pub identity: Identity,
    pub role: Role,
    pub session_token: String,
}

/// Runs the full login handshake: exchanges the one-time authorization code
/// for an access token, fetches the profile it belongs to, upserts the
/// identity (sealing the token before it touches the database), ensures the
/// identity has a role, and mints a session.
///
/// The code and the access token never appear in logs; the identity row is
/// only written after both provider calls succeed.
pub async fn login(state: &AppState, code: &str) -> Result<LoginOutcome> {
    if code.trim().is_empty() {
        return Err(Error::BadRequest("code cannot be empty".to_string()));
    }

    let access_token = state.host.exchange_code(code).await?;
    let profile = state.host.fetch_profile(&access_token).await?;

    let now = Utc::now();
    let identity = Identity {
        id: profile.id.to_string(),
        login: profile.login,
        avatar_url: profile.avatar_url,
        sealed_token: state.cipher.seal(&access_token)?,
        created_at: now,
        updated_at: now,
    };

    state.store.upsert_identity(&identity)?;
    let role = state.store.ensure_role(&identity.id)?;

    let session_token = mint_session(state, &identity.id)?;

    tracing::info!(identity = %identity.id, login = %identity.login, "login completed");

    Ok(LoginOutcome {
        identity,
        role,
        session_token,
    })
}

/// Deletes every session belonging to the identity.
pub fn logout(state: &AppState, identity_id: &str) -> Result<()> {
    state.store.delete_identity_sessions(identity_id)
}

fn mint_session(state: &AppState, identity_id: &str) -> Result<String> {
    let tokens = SessionTokens::new();

    // Lookup prefixes are random; retry the rare collision.
    for _ in 0..MINT_RETRIES {
        let minted = tokens.mint()?;

        let session = Session {
            id: Uuid::new_v4().to_string(),
            token_hash: minted.hash,
            token_lookup: minted.lookup,
            identity_id: identity_id.to_string(),
            created_at: Utc::now(),
            expires_at: Some(Utc::now() + Duration::days(SESSION_TTL_DAYS)),
        };

        match state.store.create_session(&session) {
            Ok(()) => return Ok(minted.raw),
            Err(Error::SessionLookupCollision) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(Error::Config(
        "failed to mint session token after retries".to_string(),
    ))
}
