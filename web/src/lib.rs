//! Axum HTTP surface for the data citation request service.
//!
//! The web layer is the imperative shell around the processor: it parses
//! requests, authenticates through bearer tokens, calls into
//! [`CitationProcessor`](data_citation_runtime::CitationProcessor) and maps
//! results to HTTP.
//!
//! # Request Flow
//!
//! 1. **Correlation id** assigned by [`correlation_id_layer`]
//! 2. **Extract** the bearer token, path and query/body
//! 3. **Call** the processor (which authorizes the token)
//! 4. **Map** domain errors to [`AppError`] and serialize the response
//!
//! # Routes
//!
//! | Method | Path                            | Handler                               |
//! |--------|---------------------------------|---------------------------------------|
//! | GET    | `/health`                       | [`handlers::health::health_check`]    |
//! | GET    | `/health/ready`                 | [`handlers::health::readiness_check`] |
//! | POST   | `/auth/login`                   | [`handlers::auth::login`]             |
//! | GET    | `/auth/session`                 | [`handlers::auth::session`]           |
//! | POST   | `/auth/logout`                  | [`handlers::auth::logout`]            |
//! | GET    | `/citation/request?doi=`        | [`handlers::citation::submit_query`]  |
//! | POST   | `/citation/requests`            | [`handlers::citation::submit_json`]   |
//! | GET    | `/citation/requests`            | [`handlers::citation::list_requests`] |
//! | GET    | `/citation/requests/:id`        | [`handlers::citation::get_request`]   |
//! | GET    | `/citation/requests/:id/status` | [`handlers::citation::request_status`]|
//! | DELETE | `/citation/requests/:id`        | [`handlers::citation::delete_request`]|
//!
//! # Example
//!
//! ```ignore
//! use data_citation_web::{AppState, build_router};
//!
//! let app = build_router(AppState::new(processor));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::AppError;
pub use extractors::{BearerToken, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use router::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
