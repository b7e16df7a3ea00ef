//! Resource API endpoints
//!
//! One set of handlers serves every entity registered with the
//! [`ResourceRegistry`](crate::services::ResourceRegistry):
//! - GET    /api/:resource      - Paginated list with search, filters, ordering
//! - POST   /api/:resource      - Create
//! - GET    /api/:resource/:id  - Retrieve
//! - PUT    /api/:resource/:id  - Replace
//! - PATCH  /api/:resource/:id  - Partial update
//! - DELETE /api/:resource/:id  - Delete
//!
//! plus view counters for tools and articles, category lookup by slug and
//! newsletter unsubscribe.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::api::common::{resource, JsonBody};
use crate::api::middleware::{ApiError, AppState};
use crate::db::{ListQuery, Page};
use crate::models::{Category, NewsletterSubscriber};
use crate::services::ServiceError;

/// Response for a view counter bump
#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub id: i64,
    pub views: i64,
}

/// Build the resource router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{resource}", get(list).post(create))
        .route(
            "/{resource}/{id}",
            get(retrieve).put(update).patch(partial_update).delete(destroy),
        )
        .route("/{resource}/{id}/view", post(record_view))
        .route("/{resource}/by-slug/{slug}", get(retrieve_by_slug))
        .route("/{resource}/unsubscribe/{token}", get(unsubscribe))
}

/// GET /api/:resource
async fn list(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<Value>>, ApiError> {
    let resource = resource(&state, &name)?;
    let query = ListQuery::from_params(&params).map_err(ServiceError::from)?;
    Ok(Json(resource.list_json(&query).await?))
}

/// POST /api/:resource
async fn create(
    State(state): State<AppState>,
    Path(name): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let resource = resource(&state, &name)?;
    let created = resource.create_json(body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/:resource/:id
async fn retrieve(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, i64)>,
) -> Result<Json<Value>, ApiError> {
    let resource = resource(&state, &name)?;
    Ok(Json(resource.get_json(id).await?))
}

/// PUT /api/:resource/:id
async fn update(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, i64)>,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, ApiError> {
    let resource = resource(&state, &name)?;
    Ok(Json(resource.update_json(id, body).await?))
}

/// PATCH /api/:resource/:id
async fn partial_update(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, i64)>,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, ApiError> {
    let resource = resource(&state, &name)?;
    Ok(Json(resource.patch_json(id, body).await?))
}

/// DELETE /api/:resource/:id
async fn destroy(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    let resource = resource(&state, &name)?;
    resource.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/ai-tools/:id/view and /api/articles/:id/view
async fn record_view(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, i64)>,
) -> Result<Json<ViewResponse>, ApiError> {
    let views = match name.as_str() {
        "ai-tools" => state.services.ai_tools.record_view(id).await?,
        "articles" => state.services.articles.record_view(id).await?,
        _ => return Err(ApiError::not_found("Resource does not track views")),
    };
    Ok(Json(ViewResponse { id, views }))
}

/// GET /api/categories/by-slug/:slug
async fn retrieve_by_slug(
    State(state): State<AppState>,
    Path((name, slug)): Path<(String, String)>,
) -> Result<Json<Category>, ApiError> {
    if name != "categories" {
        return Err(ApiError::not_found(format!("Resource {} not found", name)));
    }
    state
        .services
        .categories
        .get_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category not found"))
}

/// GET /api/newsletter-subscribers/unsubscribe/:token
async fn unsubscribe(
    State(state): State<AppState>,
    Path((name, token)): Path<(String, String)>,
) -> Result<Json<NewsletterSubscriber>, ApiError> {
    if name != "newsletter-subscribers" {
        return Err(ApiError::not_found(format!("Resource {} not found", name)));
    }
    Ok(Json(state.services.newsletter.unsubscribe(&token).await?))
}
