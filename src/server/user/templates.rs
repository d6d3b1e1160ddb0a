use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};

/// Lists the templates available for provisioning. Only active entries are
/// visible to users; the full catalog lives under the admin routes.
pub async fn list_active_templates(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let templates = state
        .store
        .list_active_templates()
        .api_err("Failed to list templates")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(templates)))
}
