pub mod auth;
pub mod config;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use media::MediaStore;
use store::EntityStore;

/// Shared application state: the entity store backend and the media asset
/// store. Both are cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub media: MediaStore,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes
        .merge(auth_public_routes())
        // Protected API
        .merge(api_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

fn api_routes() -> Router<AppState> {
    use axum::routing::delete;
    use handlers::{auth, collections, garments, tags};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        // Collections
        .route(
            "/api/collections",
            get(collections::list).post(collections::create),
        )
        .route(
            "/api/collections/:id",
            get(collections::retrieve)
                .put(collections::replace)
                .patch(collections::update)
                .delete(collections::destroy),
        )
        .route(
            "/api/collections/:id/upload-image",
            post(collections::upload_image),
        )
        // Tags (no direct create; reconciled through collection writes)
        .route("/api/tags", get(tags::list))
        .route(
            "/api/tags/:id",
            get(tags::retrieve).patch(tags::update).delete(tags::destroy),
        )
        // Garments
        .route("/api/garments", get(garments::list))
        .route(
            "/api/garments/:id",
            delete(garments::destroy)
                .get(garments::retrieve)
                .patch(garments::update),
        )
        .route(
            "/api/garments/:id/upload-image",
            post(garments::upload_image),
        )
        .route_layer(axum::middleware::from_fn(middleware::jwt_auth_middleware))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Wardrobe API",
            "version": version,
            "description": "Per-user collections of garments and tags, with image uploads",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/register, /auth/login (public - token acquisition)",
                "whoami": "/api/auth/whoami (protected)",
                "collections": "/api/collections[/:id] (protected, ?tags=, ?garments=)",
                "tags": "/api/tags[/:id] (protected, ?assigned_only=0|1)",
                "garments": "/api/garments[/:id] (protected, ?assigned_only=0|1)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "store unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "store_error": e.to_string()
                }
            })),
        ),
    }
}
