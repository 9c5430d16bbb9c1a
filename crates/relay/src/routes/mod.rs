//! HTTP route handlers for the relay.
//!
//! # Route Structure
//!
//! ```text
//! GET          /health                  - Liveness check
//!
//! # Order form (browser, CORS)
//! POST|OPTIONS /api/order-form          - Intake; any other method gets 405
//!
//! # Airtable automation
//! POST         /api/webhooks/airtable   - Update and/or complete a draft order
//! ```

pub mod callback;
pub mod intake;

use axum::{
    Router,
    http::Request,
    middleware,
    routing::{any, get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the API routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/order-form", any(intake::submit))
        .route("/api/webhooks/airtable", post(callback::receive))
}

/// Build the full application with health check and request tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check upstream APIs.
async fn health() -> &'static str {
    "ok"
}
