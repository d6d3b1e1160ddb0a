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
use crate::server::dto::{CreateQuestionRequest, UpdateQuestionRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_question;
use crate::types::Question;

use super::access::require_owned_chatbot;

pub async fn list_questions(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let chatbot = require_owned_chatbot(state.store.as_ref(), &auth.identity.id, &id)?;

    let questions = state
        .store
        .list_chatbot_questions(&chatbot.id)
        .api_err("Failed to list questions")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(questions)))
}

pub async fn create_question(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateQuestionRequest>,
) -> impl IntoResponse {
    let chatbot = require_owned_chatbot(state.store.as_ref(), &auth.identity.id, &id)?;

    validate_question(&req.question)?;

    let now = Utc::now();
    let question = Question {
        id: Uuid::new_v4().to_string(),
        chatbot_id: chatbot.id,
        question: req.question.trim().to_string(),
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .create_question(&question)
        .api_err("Failed to create question")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(question))))
}

pub async fn update_question(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path((id, question_id)): Path<(String, String)>,
    Json(req): Json<UpdateQuestionRequest>,
) -> impl IntoResponse {
    let chatbot = require_owned_chatbot(state.store.as_ref(), &auth.identity.id, &id)?;

    let mut question = state
        .store
        .get_question(&question_id)
        .api_err("Failed to get question")?
        .filter(|q| q.chatbot_id == chatbot.id)
        .or_not_found("Question not found")?;

    validate_question(&req.question)?;
    question.question = req.question.trim().to_string();
    question.updated_at = Utc::now();

    state
        .store
        .update_question(&question)
        .api_err("Failed to update question")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(question)))
}

pub async fn delete_question(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path((id, question_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let chatbot = require_owned_chatbot(state.store.as_ref(), &auth.identity.id, &id)?;

    state
        .store
        .get_question(&question_id)
        .api_err("Failed to get question")?
        .filter(|q| q.chatbot_id == chatbot.id)
        .or_not_found("Question not found")?;

    state
        .store
        .delete_question(&question_id)
        .api_err("Failed to delete question")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
