//! Application setup and server configuration.

use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{confirm_handler, health_handler, queue_next_handler, run_handler};

/// Build the Axum application router
///
/// `max_body_bytes` caps request bodies, which carry base64 images and PDFs.
pub fn build_app(deps: ServerDeps, allowed_origins: &[String], max_body_bytes: usize) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/run", post(run_handler))
        .route("/confirm/:request_id", post(confirm_handler))
        .route("/queue/next", post(queue_next_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(Extension(deps))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
