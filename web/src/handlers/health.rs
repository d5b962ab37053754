//! Health check endpoints.
//!
//! Used by load balancers and orchestrators. Neither endpoint requires a
//! session.

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use data_citation_runtime::{HealthCheck, HealthStatus};

/// Liveness.
///
/// ```text
/// GET /health  ->  200 "ok"
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness, from the processor's own health report.
///
/// # Status Codes
///
/// - 200 OK: Healthy or Degraded
/// - 503 Service Unavailable: Unhealthy (e.g. draining for shutdown)
///
/// ```text
/// GET /health/ready
/// ```
///
/// ```json
/// {
///   "component": "processor",
///   "status": "healthy",
///   "metadata": [["in_flight", "0"], ["max_concurrent_resolutions", "16"], ["tracked_requests", "3"]]
/// }
/// ```
#[allow(clippy::unused_async)]
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<HealthCheck>) {
    let health = state.processor.health();

    let status = match health.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(health))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
