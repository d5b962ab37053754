//! Prometheus metrics for the citation request pipeline.
//!
//! Recorders are thin wrappers over the `metrics` macros; without an installed
//! recorder every call is a no-op, so library code and tests can record freely.
//!
//! # Example
//!
//! ```rust,no_run
//! use data_citation_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Serve `server.render()` on the metrics port
//! # Ok(())
//! # }
//! ```

use data_citation_core::FailureReason;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder plus the address its scrape endpoint is served on.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server for `addr` (e.g. `0.0.0.0:9090`).
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Address the scrape endpoint should listen on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Describe all metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed. A recorder
    /// that is already installed (e.g. by another test) is not an error.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                register_metrics();
                self.handle = Some(handle);
                tracing::info!(
                    addr = %self.addr,
                    "Metrics recorder installed - scrape at http://{}/metrics",
                    self.addr
                );
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if this server did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(
        "citation_requests_submitted_total",
        "Citation requests accepted, labelled by initial state"
    );
    describe_counter!(
        "citation_requests_completed_total",
        "Citation requests that reached a terminal state, labelled by outcome"
    );
    describe_counter!(
        "citation_resolver_retries_total",
        "Resolver calls repeated after a transient failure"
    );
    describe_histogram!(
        "citation_resolution_duration_seconds",
        "Time from resolution start to terminal outcome, retries included"
    );
    describe_gauge!(
        "citation_resolutions_in_flight",
        "Resolutions scheduled or running"
    );
    describe_counter!(
        "citation_requests_swept_total",
        "Requests timed out or evicted by the sweeper, labelled by kind"
    );
}

/// Label value for a terminal outcome.
#[must_use]
pub const fn outcome_label(reason: Option<FailureReason>) -> &'static str {
    match reason {
        None => "succeeded",
        Some(reason) => reason.as_str(),
    }
}

/// Request lifecycle metrics recorder.
pub struct RequestMetrics;

impl RequestMetrics {
    /// Record an accepted submission (`pending` or `malformed`).
    pub fn record_submitted(initial: &'static str) {
        counter!("citation_requests_submitted_total", "initial" => initial).increment(1);
    }

    /// Record a terminal transition performed by a resolution.
    pub fn record_completed(reason: Option<FailureReason>, duration: Duration) {
        counter!("citation_requests_completed_total", "outcome" => outcome_label(reason))
            .increment(1);
        histogram!("citation_resolution_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a resolver retry.
    pub fn record_retry() {
        counter!("citation_resolver_retries_total").increment(1);
    }

    /// Record the current number of in-flight resolutions.
    // Gauge precision is irrelevant for counts this small
    #[allow(clippy::cast_precision_loss)]
    pub fn record_in_flight(count: usize) {
        gauge!("citation_resolutions_in_flight").set(count as f64);
    }
}

/// Sweeper metrics recorder.
pub struct SweepMetrics;

impl SweepMetrics {
    /// Record requests failed with `timeout`.
    pub fn record_timed_out(count: usize) {
        counter!("citation_requests_swept_total", "kind" => "timeout").increment(count as u64);
    }

    /// Record evicted terminal requests.
    pub fn record_evicted(count: usize) {
        counter!("citation_requests_swept_total", "kind" => "evicted").increment(count as u64);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome_label(None), "succeeded");
        assert_eq!(outcome_label(Some(FailureReason::NotFound)), "not-found");
        assert_eq!(outcome_label(Some(FailureReason::Timeout)), "timeout");
    }

    #[test]
    fn test_metrics_server_creation() {
        let server = MetricsServer::new("127.0.0.1:0".parse().unwrap());
        assert!(server.handle().is_none());
        assert!(server.render().is_none());
    }

    #[test]
    fn test_metrics_server_render() {
        let mut server = MetricsServer::new("127.0.0.1:0".parse().unwrap());
        server.start().unwrap();

        RequestMetrics::record_submitted("pending");
        RequestMetrics::record_completed(Some(FailureReason::NotFound), Duration::from_millis(40));
        SweepMetrics::record_timed_out(2);

        // Another test may have installed the recorder first
        if let Some(rendered) = server.render() {
            assert!(rendered.contains("citation_requests_submitted_total"));
            assert!(rendered.contains("citation_requests_completed_total"));
            assert!(rendered.contains("citation_requests_swept_total"));
        }
    }
}
