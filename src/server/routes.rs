//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/enqueue_enrichment", post(handlers::enqueue_enrichment))
        .route("/tag_outreach_ready", post(handlers::tag_outreach_ready))
        .route("/prospects", get(handlers::list_prospects))
        .route("/list-options", get(handlers::list_list_options));

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
