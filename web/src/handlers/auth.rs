//! Session lifecycle endpoints.
//!
//! The bearer token handed out by `login` is the session id; every other
//! endpoint expects it in `Authorization: Bearer <token>`.

use crate::error::AppError;
use crate::extractors::{BearerToken, CorrelationId};
use crate::state::AppState;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use data_citation_auth::{Credentials, Session};
use serde::Serialize;

/// Body of a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// Authenticated user.
    pub user_id: String,
    /// Absolute expiry, refreshed on every authorized call.
    pub expires_at: DateTime<Utc>,
}

/// Current session, as seen by its holder.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Authenticated user.
    pub user_id: String,
    /// Login time.
    pub created_at: DateTime<Utc>,
    /// Last authorized call.
    pub last_active: DateTime<Utc>,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            user_id: session.user_id.0,
            created_at: session.created_at,
            last_active: session.last_active,
            expires_at: session.expires_at,
        }
    }
}

/// Acknowledgement body for logout.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Always `"logged_out"`.
    pub status: &'static str,
}

/// Open a session.
///
/// ```text
/// POST /auth/login  {"username": "...", "password": "..."}
/// ```
///
/// # Errors
///
/// - 400 if the body is not a credentials document
/// - 401 if the credentials are rejected
pub async fn login(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(credentials) = body.map_err(|e| AppError::bad_request(e.body_text()))?;

    let session = state.processor.gate().login(&credentials).await?;

    tracing::info!(
        correlation_id = %correlation_id.0,
        user_id = %session.user_id,
        "Session opened"
    );

    Ok(Json(LoginResponse {
        token: session.session_id.to_string(),
        user_id: session.user_id.0,
        expires_at: session.expires_at,
    }))
}

/// Describe the caller's session.
///
/// ```text
/// GET /auth/session
/// ```
///
/// # Errors
///
/// 401 if the token is missing, unknown or expired.
pub async fn session(
    State(state): State<AppState>,
    token: BearerToken,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.processor.gate().authorize(token.as_str()).await?;
    Ok(Json(session.into()))
}

/// Close the caller's session.
///
/// Succeeds for any well-formed token, including one already logged out.
///
/// ```text
/// POST /auth/logout
/// ```
///
/// # Errors
///
/// 401 if no bearer token is presented or it is not a session id.
pub async fn logout(
    State(state): State<AppState>,
    token: BearerToken,
) -> Result<(StatusCode, Json<LogoutResponse>), AppError> {
    state.processor.gate().logout(token.as_str()).await?;
    Ok((
        StatusCode::OK,
        Json(LogoutResponse {
            status: "logged_out",
        }),
    ))
}
