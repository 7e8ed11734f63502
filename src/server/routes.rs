//! Application routing
//!
//! This module defines all HTTP routes for the application.

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderName,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{health, images, monitor, prompts};
use crate::middleware::{log_request, REQUEST_ID_HEADER};
use crate::server::state::AppState;

/// Upper bound on request bodies; images arrive base64-encoded
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // Health check routes
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness))
        .route("/liveness", get(health::liveness));

    let api_routes = Router::new()
        .route("/enhance-prompt", post(prompts::enhance_prompt))
        .route("/generate-image", post(images::generate_image))
        .route("/edit-image", post(images::edit_image))
        .route("/style-transfer", post(images::style_transfer))
        .route("/photo-restore", post(images::photo_restore))
        .route(
            "/monitor-keys",
            get(monitor::key_stats).post(monitor::manage_key),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        // Apply middleware layers (last added = outermost = runs first)
        .layer(create_cors_layer())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Create CORS layer with permissive settings
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}
