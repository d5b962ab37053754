//! Error types for web handlers.
//!
//! [`AppError`] is the only error a handler returns. Domain errors convert
//! into it through `From`, so handlers stay `?`-driven.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use data_citation_auth::AuthError;
use data_citation_runtime::ProcessorError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Carries the HTTP status, a stable machine-readable code and a user-facing
/// message. The optional source is logged for server errors and never sent to
/// the client.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    code: &'static str,
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    /// 403 Forbidden.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{resource} with id {id} not found"),
        )
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            message,
        )
    }

    /// 503 Service Unavailable.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            message,
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    code: &'a str,
    message: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Internal server error"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: &self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::unauthorized("Invalid username or password"),
            AuthError::InvalidToken | AuthError::SessionNotFound => {
                Self::unauthorized("Missing or unknown session")
            }
            AuthError::SessionExpired => Self::unauthorized("Session expired"),
            AuthError::StoreError(_) | AuthError::Configuration(_) => {
                Self::internal("Authentication backend failure").with_source(err)
            }
        }
    }
}

impl From<ProcessorError> for AppError {
    fn from(err: ProcessorError) -> Self {
        match err {
            ProcessorError::Authentication(auth) => auth.into(),
            ProcessorError::NotFound(id) => Self::not_found("Citation request", id),
            ProcessorError::Forbidden(id) => {
                Self::forbidden(format!("Citation request {id} belongs to another user"))
            }
            ProcessorError::ShuttingDown | ProcessorError::ShutdownTimeout(_) => {
                Self::unavailable("Service is shutting down").with_source(err)
            }
            ProcessorError::Store(_) => {
                Self::internal("An internal error occurred").with_source(err)
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_citation_core::RequestId;
    use data_citation_runtime::StoreError;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("doi parameter is required");
        assert_eq!(err.to_string(), "[BAD_REQUEST] doi parameter is required");
    }

    #[test]
    fn test_not_found() {
        let err = AppError::not_found("Citation request", "123");
        assert_eq!(
            err.to_string(),
            "[NOT_FOUND] Citation request with id 123 not found"
        );
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::InvalidToken,
            AuthError::SessionExpired,
            AuthError::SessionNotFound,
        ] {
            assert_eq!(AppError::from(err).status(), StatusCode::UNAUTHORIZED);
        }

        let err = AppError::from(AuthError::StoreError("poisoned".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_processor_error_mapping() {
        let id = RequestId::new();

        assert_eq!(
            AppError::from(ProcessorError::Forbidden(id)).code(),
            "FORBIDDEN"
        );
        assert_eq!(
            AppError::from(ProcessorError::NotFound(id)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(ProcessorError::ShuttingDown).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );

        let err = AppError::from(ProcessorError::Store(StoreError::Internal(
            "lock poisoned".to_string(),
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("lock poisoned"));
    }
}
