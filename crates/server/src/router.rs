use super::{handlers, state::AppState};
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Headroom on top of the image limit for the JSON envelope.
const BODY_LIMIT_HEADROOM: usize = 1024 * 1024;

/// The largest `/api/analyze` body accepted for a given image limit.
pub fn body_limit(max_image_base64_len: usize) -> usize {
    max_image_base64_len.saturating_add(BODY_LIMIT_HEADROOM)
}

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    let limit = body_limit(app_state.config.analysis.max_image_base64_len);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route(
            "/api/analyze",
            post(handlers::analyze_handler).layer(DefaultBodyLimit::max(limit)),
        )
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
