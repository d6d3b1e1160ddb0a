use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{CreateTemplateRequest, UpdateTemplateRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_repo_url, validate_template_name};
use crate::types::Template;

pub async fn create_template(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTemplateRequest>,
) -> impl IntoResponse {
    validate_template_name(&req.name)?;
    validate_repo_url(&req.url)?;

    let now = Utc::now();
    let template = Template {
        id: Uuid::new_v4().to_string(),
        owner_identity_id: admin.identity.id,
        name: req.name.trim().to_string(),
        url: req.url,
        description: req.description,
        active: req.active,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .create_template(&template)
        .api_err("Failed to create template")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(template))))
}

pub async fn list_templates(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let templates = state
        .store
        .list_templates()
        .api_err("Failed to list templates")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(templates)))
}

pub async fn get_template(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let template = state
        .store
        .get_template(&id)
        .api_err("Failed to get template")?
        .or_not_found("Template not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(template)))
}

pub async fn update_template(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTemplateRequest>,
) -> impl IntoResponse {
    let mut template = state
        .store
        .get_template(&id)
        .api_err("Failed to get template")?
        .or_not_found("Template not found")?;

    if let Some(name) = req.name {
        validate_template_name(&name)?;
        template.name = name.trim().to_string();
    }
    if let Some(url) = req.url {
        validate_repo_url(&url)?;
        template.url = url;
    }
    if let Some(description) = req.description {
        template.description = Some(description);
    }
    if let Some(active) = req.active {
        template.active = active;
    }
    template.updated_at = Utc::now();

    state
        .store
        .update_template(&template)
        .api_err("Failed to update template")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(template)))
}

pub async fn delete_template(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state
        .store
        .get_template(&id)
        .api_err("Failed to get template")?
        .or_not_found("Template not found")?;

    // Referenced templates cannot be deleted; the store surfaces the
    // foreign-key restriction as a conflict. Deactivating is the usual path.
    state
        .store
        .delete_template(&id)
        .map_err(ApiError::from)?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
