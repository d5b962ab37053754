//! Route table.

use crate::handlers::{auth, citation, health};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Build the application router.
///
/// The correlation id layer is applied here; transport-level layers such as
/// `TraceLayer` or CORS are left to the binary.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/auth/login", post(auth::login))
        .route("/auth/session", get(auth::session))
        .route("/auth/logout", post(auth::logout))
        .route("/citation/request", get(citation::submit_query))
        .route(
            "/citation/requests",
            get(citation::list_requests).post(citation::submit_json),
        )
        .route(
            "/citation/requests/:id",
            get(citation::get_request).delete(citation::delete_request),
        )
        .route("/citation/requests/:id/status", get(citation::request_status))
        .layer(correlation_id_layer())
        .with_state(state)
}
