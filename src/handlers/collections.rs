use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::filter;
use crate::middleware::AuthUser;
use crate::service::{CollectionPayload, Scoped};
use crate::AppState;

fn scoped(state: &AppState, user: &AuthUser) -> Scoped {
    Scoped::new(state.store.clone(), state.media.clone(), user.user_id)
}

#[derive(Debug, Deserialize)]
pub struct CollectionListQuery {
    /// Comma separated tag ids to filter by
    pub tags: Option<String>,
    /// Comma separated garment ids to filter by
    pub garments: Option<String>,
}

/// GET /api/collections - list the requesting user's collections
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<CollectionListQuery>,
) -> Result<Json<Value>, ApiError> {
    // An empty query value is treated as absent, like a missing parameter
    let tag_ids = match query.tags.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(filter::parse_id_list("tags", raw)?),
        None => None,
    };
    let garment_ids = match query.garments.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(filter::parse_id_list("garments", raw)?),
        None => None,
    };

    let data = scoped(&state, &user)
        .list_collections(tag_ids, garment_ids)
        .await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// POST /api/collections - create a collection, reconciling any tag/garment
/// descriptors in the payload
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CollectionPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let data = scoped(&state, &user).create_collection(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": data })),
    ))
}

/// GET /api/collections/:id
pub async fn retrieve(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let data = scoped(&state, &user).get_collection(id).await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// PUT /api/collections/:id - full update
pub async fn replace(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(payload): Json<CollectionPayload>,
) -> Result<Json<Value>, ApiError> {
    let data = scoped(&state, &user)
        .update_collection(id, payload, false)
        .await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// PATCH /api/collections/:id - partial update
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(payload): Json<CollectionPayload>,
) -> Result<Json<Value>, ApiError> {
    let data = scoped(&state, &user)
        .update_collection(id, payload, true)
        .await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// DELETE /api/collections/:id
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    scoped(&state, &user).delete_collection(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/collections/:id/upload-image - multipart image upload
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let bytes = read_image_field(multipart).await?;
    let data = scoped(&state, &user)
        .upload_collection_image(id, &bytes)
        .await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// Pulls the `image` part out of a multipart body
pub(crate) async fn read_image_field(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(ApiError::missing_field("image"))
}
