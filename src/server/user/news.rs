use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{CreateNewsRequest, UpdateNewsRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_news_title, validate_repo_url};
use crate::types::NewsItem;

use super::access::require_owned_chatbot;

pub async fn list_news(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let chatbot = require_owned_chatbot(state.store.as_ref(), &auth.identity.id, &id)?;

    let news = state
        .store
        .list_chatbot_news(&chatbot.id)
        .api_err("Failed to list news")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(news)))
}

pub async fn create_news(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateNewsRequest>,
) -> impl IntoResponse {
    let chatbot = require_owned_chatbot(state.store.as_ref(), &auth.identity.id, &id)?;

    validate_news_title(&req.title)?;
    validate_repo_url(&req.url)?;

    let now = Utc::now();
    let item = NewsItem {
        id: Uuid::new_v4().to_string(),
        chatbot_id: chatbot.id,
        title: req.title.trim().to_string(),
        url: req.url,
        full_text: req.full_text,
        published_at: req.published_at,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .create_news_item(&item)
        .api_err("Failed to create news item")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

pub async fn update_news(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path((id, news_id)): Path<(String, String)>,
    Json(req): Json<UpdateNewsRequest>,
) -> impl IntoResponse {
    let chatbot = require_owned_chatbot(state.store.as_ref(), &auth.identity.id, &id)?;

    let mut item = state
        .store
        .get_news_item(&news_id)
        .api_err("Failed to get news item")?
        .filter(|n| n.chatbot_id == chatbot.id)
        .or_not_found("News item not found")?;

    if let Some(title) = req.title {
        validate_news_title(&title)?;
        item.title = title.trim().to_string();
    }
    if let Some(url) = req.url {
        validate_repo_url(&url)?;
        item.url = url;
    }
    if let Some(full_text) = req.full_text {
        item.full_text = full_text;
    }
    if let Some(published_at) = req.published_at {
        item.published_at = published_at;
    }
    item.updated_at = Utc::now();

    state
        .store
        .update_news_item(&item)
        .api_err("Failed to update news item")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(item)))
}

pub async fn delete_news(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path((id, news_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let chatbot = require_owned_chatbot(state.store.as_ref(), &auth.identity.id, &id)?;

    state
        .store
        .get_news_item(&news_id)
        .api_err("Failed to get news item")?
        .filter(|n| n.chatbot_id == chatbot.id)
        .or_not_found("News item not found")?;

    state
        .store
        .delete_news_item(&news_id)
        .api_err("Failed to delete news item")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
