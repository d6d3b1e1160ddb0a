use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::UpdateChatbotConfigRequest;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};

use super::access::require_owned_chatbot;

pub async fn get_config(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let chatbot = require_owned_chatbot(state.store.as_ref(), &auth.identity.id, &id)?;

    let config = state
        .store
        .get_chatbot_config(&chatbot.id)
        .api_err("Failed to get config")?
        .or_not_found("Config not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(config)))
}

/// Replaces the landing configuration. PUT semantics: omitted fields clear.
pub async fn update_config(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateChatbotConfigRequest>,
) -> impl IntoResponse {
    let chatbot = require_owned_chatbot(state.store.as_ref(), &auth.identity.id, &id)?;

    let mut config = state
        .store
        .get_chatbot_config(&chatbot.id)
        .api_err("Failed to get config")?
        .or_not_found("Config not found")?;

    config.title = req.title;
    config.subtitle = req.subtitle;
    config.updated_at = Utc::now();

    state
        .store
        .update_chatbot_config(&config)
        .api_err("Failed to update config")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(config)))
}
