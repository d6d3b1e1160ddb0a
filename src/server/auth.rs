use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use crate::auth::{self, RequireUser};
use crate::server::AppState;
use crate::server::dto::{LoginRequest, LoginResponse, SessionResponse};
use crate::server::response::{ApiError, ApiResponse};

pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/github", post(github_login))
        .route("/auth/logout", post(logout))
        .route("/me", get(me))
}

/// Completes the GitHub OAuth flow: trades the one-time code for an access
/// token, upserts the identity, and issues a session.
async fn github_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let outcome = auth::login(&state, &req.code).await.map_err(ApiError::from)?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(LoginResponse {
            token: outcome.session_token,
            user: outcome.identity,
            role: outcome.role,
        })),
    ))
}

/// Revokes every session of the calling identity.
async fn logout(auth: RequireUser, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    auth::logout(&state, &auth.identity.id).map_err(ApiError::from)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

async fn me(auth: RequireUser) -> impl IntoResponse {
    Json(ApiResponse::success(SessionResponse {
        user: auth.identity,
        role: auth.role,
    }))
}
