//! Admin API endpoints
//!
//! Handles HTTP requests for the admin console. Every route sits behind
//! `require_auth` and `require_staff`:
//! - GET    /admin/api/                           - Model index with row counts
//! - GET    /admin/api/:resource                  - List (20 per page)
//! - POST   /admin/api/:resource                  - Create
//! - GET    /admin/api/:resource/:id              - Retrieve
//! - PUT    /admin/api/:resource/:id              - Update
//! - PATCH  /admin/api/:resource/:id              - Partial update
//! - DELETE /admin/api/:resource/:id              - Delete
//! - POST   /admin/api/:resource/actions/:action  - Bulk action over `{ids}`
//! - POST   /admin/api/:resource/bulk-edit        - List-editable changes
//! - PUT    /admin/api/ai-tools/:id/inlines       - Replace a tool's owned rows

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;

use crate::api::common::{IdsRequest, JsonBody};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::db::repositories::ToolChildren;
use crate::db::Page;
use crate::models::{AiToolDetail, FieldErrors, NON_FIELD_ERRORS};
use crate::services::admin::{ActionOutcome, ModelSummary};
use crate::services::ServiceError;

/// Build the admin router
///
/// Paths are absolute so the index answers on both `/admin/api` and
/// `/admin/api/`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/api", get(index))
        .route("/admin/api/", get(index))
        .route("/admin/api/{resource}", get(list).post(create))
        .route(
            "/admin/api/{resource}/{id}",
            get(retrieve).put(update).patch(partial_update).delete(destroy),
        )
        .route("/admin/api/{resource}/actions/{action}", post(run_action))
        .route("/admin/api/{resource}/bulk-edit", post(bulk_edit))
        .route("/admin/api/{resource}/{id}/inlines", put(replace_inlines))
}

/// GET /admin/api/
async fn index(State(state): State<AppState>) -> Result<Json<Vec<ModelSummary>>, ApiError> {
    Ok(Json(state.services.admin.index().await?))
}

/// GET /admin/api/:resource
async fn list(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<Value>>, ApiError> {
    Ok(Json(state.services.admin.list(&name, &params).await?))
}

/// POST /admin/api/:resource
async fn create(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(name): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let resource = state.services.admin.resource(&name)?;
    let created = resource.create_json(body).await?;
    tracing::info!("{} created a {} row", user.username, name);
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /admin/api/:resource/:id
async fn retrieve(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, i64)>,
) -> Result<Json<Value>, ApiError> {
    let resource = state.services.admin.resource(&name)?;
    Ok(Json(resource.get_json(id).await?))
}

/// PUT /admin/api/:resource/:id
async fn update(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, i64)>,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, ApiError> {
    let resource = state.services.admin.resource(&name)?;
    Ok(Json(resource.update_json(id, body).await?))
}

/// PATCH /admin/api/:resource/:id
async fn partial_update(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, i64)>,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, ApiError> {
    let resource = state.services.admin.resource(&name)?;
    Ok(Json(resource.patch_json(id, body).await?))
}

/// DELETE /admin/api/:resource/:id
async fn destroy(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((name, id)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    let resource = state.services.admin.resource(&name)?;
    resource.delete(id).await?;
    tracing::info!("{} deleted {} {}", user.username, name, id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/api/:resource/actions/:action
async fn run_action(
    State(state): State<AppState>,
    Path((name, action)): Path<(String, String)>,
    body: JsonBody,
) -> Result<Json<ActionOutcome>, ApiError> {
    let body: IdsRequest = body.decode()?;
    Ok(Json(
        state
            .services
            .admin
            .run_action(&name, &action, &body.ids)
            .await?,
    ))
}

/// POST /admin/api/:resource/bulk-edit
async fn bulk_edit(
    State(state): State<AppState>,
    Path(name): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Json<Vec<Value>>, ApiError> {
    let Value::Array(rows) = body else {
        return Err(ServiceError::from(FieldErrors::single(
            NON_FIELD_ERRORS,
            "Expected a list of items.",
        ))
        .into());
    };
    Ok(Json(state.services.admin.bulk_edit(&name, rows).await?))
}

/// PUT /admin/api/ai-tools/:id/inlines
async fn replace_inlines(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, i64)>,
    body: JsonBody,
) -> Result<Json<AiToolDetail>, ApiError> {
    if name != "ai-tools" {
        return Err(ApiError::not_found(format!("{} has no inlines", name)));
    }
    let children: ToolChildren = body.decode()?;
    Ok(Json(
        state.services.ai_tools.replace_inlines(id, children).await?,
    ))
}
