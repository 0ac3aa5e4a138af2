/**
 * Router Configuration
 *
 * Combines the REST handlers and the WebSocket endpoint into the
 * application router.
 *
 * # Route Layers
 *
 * Routes are assembled in two groups:
 * 1. Open routes: health, the share-link validity probe, and the
 *    WebSocket upgrade (which verifies its own token before upgrading).
 * 2. Authenticated routes: everything else, behind `auth_middleware`.
 *
 * CORS and request tracing wrap the whole router.
 */

pub mod media;
pub mod share;

use crate::auth::middleware::auth_middleware;
use crate::gateway::socket::rooms_handler;
use crate::server::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Handle health check (GET /health)
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Create the application router with all routes configured.
pub fn create_router(app_state: AppState) -> Router<()> {
    let authed = Router::new()
        .route("/media", get(media::list_media))
        .route(
            "/media/{id}",
            get(media::get_media).delete(media::delete_media),
        )
        .route("/media/{id}/share-links", post(share::create_share_link))
        .route("/media/{id}/grants", post(share::create_grant))
        .route("/comments/{media_id}", get(media::list_comments))
        .route(
            "/comments/{media_id}/annotations",
            get(media::list_annotations),
        )
        .route("/share-links/{token}/accept", post(share::accept_share_link))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/rooms", get(rooms_handler))
        .route("/share-links/{token}/check", get(share::check_share_link))
        .merge(authed)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
