use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::filter;
use crate::middleware::AuthUser;
use crate::service::{AttrPayload, Scoped};
use crate::AppState;

fn scoped(state: &AppState, user: &AuthUser) -> Scoped {
    Scoped::new(state.store.clone(), state.media.clone(), user.user_id)
}

#[derive(Debug, Deserialize)]
pub struct AttrListQuery {
    /// 1 restricts the listing to tags attached to at least one collection
    pub assigned_only: Option<String>,
}

/// GET /api/tags - list the requesting user's tags, descending by name.
/// There is no direct create endpoint; tags come into existence through
/// collection writes.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AttrListQuery>,
) -> Result<Json<Value>, ApiError> {
    let assigned_only = filter::parse_assigned_only(query.assigned_only.as_deref())?;
    let data = scoped(&state, &user).list_tags(assigned_only).await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// GET /api/tags/:id
pub async fn retrieve(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let data = scoped(&state, &user).get_tag(id).await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// PATCH /api/tags/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(payload): Json<AttrPayload>,
) -> Result<Json<Value>, ApiError> {
    let data = scoped(&state, &user).update_tag(id, payload).await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// DELETE /api/tags/:id - removes the tag and detaches it everywhere
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    scoped(&state, &user).delete_tag(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
