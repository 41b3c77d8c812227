use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde_json::{json, Value};

use super::collections::read_image_field;
use super::tags::AttrListQuery;
use crate::error::ApiError;
use crate::filter;
use crate::middleware::AuthUser;
use crate::service::{AttrPayload, Scoped};
use crate::AppState;

fn scoped(state: &AppState, user: &AuthUser) -> Scoped {
    Scoped::new(state.store.clone(), state.media.clone(), user.user_id)
}

/// GET /api/garments - list the requesting user's garments, descending by name
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AttrListQuery>,
) -> Result<Json<Value>, ApiError> {
    let assigned_only = filter::parse_assigned_only(query.assigned_only.as_deref())?;
    let data = scoped(&state, &user).list_garments(assigned_only).await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// GET /api/garments/:id
pub async fn retrieve(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let data = scoped(&state, &user).get_garment(id).await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// PATCH /api/garments/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(payload): Json<AttrPayload>,
) -> Result<Json<Value>, ApiError> {
    let data = scoped(&state, &user).update_garment(id, payload).await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// DELETE /api/garments/:id
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    scoped(&state, &user).delete_garment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/garments/:id/upload-image - multipart image upload
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let bytes = read_image_field(multipart).await?;
    let data = scoped(&state, &user).upload_garment_image(id, &bytes).await?;
    Ok(Json(json!({ "success": true, "data": data })))
}
