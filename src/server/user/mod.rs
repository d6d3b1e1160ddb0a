pub mod access;
mod chatbots;
mod config;
mod news;
mod questions;
mod templates;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::server::AppState;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        // Templates (active catalog)
        .route("/templates", get(templates::list_active_templates))
        // Chatbots
        .route("/chatbots", get(chatbots::list_chatbots))
        .route("/chatbots", post(chatbots::provision_chatbot))
        .route("/chatbots/{id}", get(chatbots::get_chatbot))
        // Landing configuration (one per chatbot)
        .route("/chatbots/{id}/config", get(config::get_config))
        .route("/chatbots/{id}/config", put(config::update_config))
        // News
        .route("/chatbots/{id}/news", get(news::list_news))
        .route("/chatbots/{id}/news", post(news::create_news))
        .route("/chatbots/{id}/news/{news_id}", patch(news::update_news))
        .route("/chatbots/{id}/news/{news_id}", delete(news::delete_news))
        // Questions
        .route("/chatbots/{id}/questions", get(questions::list_questions))
        .route("/chatbots/{id}/questions", post(questions::create_question))
        .route(
            "/chatbots/{id}/questions/{question_id}",
            patch(questions::update_question),
        )
        .route(
            "/chatbots/{id}/questions/{question_id}",
            delete(questions::delete_question),
        )
}
