use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::ProvisionChatbotRequest;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::validate_chatbot_name;

use super::access::require_owned_chatbot;

/// Provisions a chatbot repository from a template under the caller's own
/// GitHub account. The heavy lifting is the provisioner's saga; this handler
/// only validates input and translates the outcome.
pub async fn provision_chatbot(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProvisionChatbotRequest>,
) -> impl IntoResponse {
    validate_chatbot_name(&req.name)?;

    let chatbot = state
        .provisioner
        .provision(&auth.identity, &req.template_id, &req.name)
        .await
        .map_err(ApiError::from)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(chatbot))))
}

pub async fn list_chatbots(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let chatbots = state
        .store
        .list_identity_chatbots(&auth.identity.id)
        .api_err("Failed to list chatbots")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(chatbots)))
}

pub async fn get_chatbot(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let chatbot = require_owned_chatbot(state.store.as_ref(), &auth.identity.id, &id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(chatbot)))
}
