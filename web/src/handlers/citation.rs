//! Citation request endpoints.
//!
//! Submission is asynchronous: the response carries the new request id and
//! its initial state, and clients poll `/citation/requests/:id/status` until
//! the state is terminal.

use crate::error::AppError;
use crate::extractors::{BearerToken, CorrelationId};
use crate::state::AppState;
use crate::WebResult;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use data_citation_core::{CitationRequest, PollOutcome, RequestId};
use data_citation_runtime::Submission;
use serde::{Deserialize, Serialize};

/// `?doi=` query of the GET submission form.
#[derive(Debug, Deserialize)]
pub struct SubmitQuery {
    /// Candidate DOI.
    pub doi: Option<String>,
}

/// JSON body of the POST submission form.
#[derive(Debug, Deserialize)]
pub struct SubmitBody {
    /// Candidate DOI.
    pub doi: Option<String>,
}

/// Poll answer: the id plus the flattened three-shape state.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Request polled.
    pub request_id: RequestId,
    /// `{"state": "PENDING"}`, `{"state": "SUCCEEDED", "result": ...}` or
    /// `{"state": "FAILED", "reason": ...}`.
    #[serde(flatten)]
    pub outcome: PollOutcome,
}

/// Submit via query parameter.
///
/// ```text
/// GET /citation/request?doi=10.11570/18.0001   ->  202 {"request_id": "...", "state": "PENDING"}
/// GET /citation/request?doi=99.9999            ->  202 {"request_id": "...", "state": "FAILED"}
/// ```
///
/// # Errors
///
/// - 400 if `doi` is missing or blank
/// - 401 if the session is not accepted
pub async fn submit_query(
    State(state): State<AppState>,
    token: BearerToken,
    correlation_id: CorrelationId,
    Query(query): Query<SubmitQuery>,
) -> Result<(StatusCode, Json<Submission>), AppError> {
    submit(&state, &token, correlation_id, query.doi).await
}

/// Submit via JSON body.
///
/// ```text
/// POST /citation/requests  {"doi": "10.11570/18.0001"}
/// ```
///
/// # Errors
///
/// Same as [`submit_query`], plus 400 for a body that is not JSON.
pub async fn submit_json(
    State(state): State<AppState>,
    token: BearerToken,
    correlation_id: CorrelationId,
    body: Result<Json<SubmitBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Submission>), AppError> {
    let Json(body) = body.map_err(|e| AppError::bad_request(e.body_text()))?;
    submit(&state, &token, correlation_id, body.doi).await
}

async fn submit(
    state: &AppState,
    token: &BearerToken,
    correlation_id: CorrelationId,
    doi: Option<String>,
) -> Result<(StatusCode, Json<Submission>), AppError> {
    let doi = doi
        .filter(|doi| !doi.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("doi parameter is required"))?;

    let submission = state.processor.submit(&doi, token.as_str()).await?;

    tracing::debug!(
        correlation_id = %correlation_id.0,
        request_id = %submission.request_id,
        state = %submission.state,
        "Submission accepted"
    );

    Ok((StatusCode::ACCEPTED, Json(submission)))
}

/// The caller's requests, oldest first.
///
/// ```text
/// GET /citation/requests
/// ```
///
/// # Errors
///
/// 401 if the session is not accepted.
pub async fn list_requests(
    State(state): State<AppState>,
    token: BearerToken,
) -> WebResult<Json<Vec<CitationRequest>>> {
    Ok(Json(state.processor.list(token.as_str()).await?))
}

/// Full request document.
///
/// ```text
/// GET /citation/requests/:id
/// ```
///
/// # Errors
///
/// 400 for a malformed id, 401, 403 for another user's request, 404.
pub async fn get_request(
    State(state): State<AppState>,
    token: BearerToken,
    Path(id): Path<String>,
) -> WebResult<Json<CitationRequest>> {
    let id = parse_id(&id)?;
    Ok(Json(state.processor.request(id, token.as_str()).await?))
}

/// Poll a request.
///
/// ```text
/// GET /citation/requests/:id/status  ->  {"request_id": "...", "state": "FAILED", "reason": "malformed"}
/// ```
///
/// # Errors
///
/// Same as [`get_request`].
pub async fn request_status(
    State(state): State<AppState>,
    token: BearerToken,
    Path(id): Path<String>,
) -> WebResult<Json<StatusResponse>> {
    let request_id = parse_id(&id)?;
    let outcome = state.processor.poll(request_id, token.as_str()).await?;
    Ok(Json(StatusResponse {
        request_id,
        outcome,
    }))
}

/// Delete one of the caller's requests.
///
/// ```text
/// DELETE /citation/requests/:id  ->  204
/// ```
///
/// # Errors
///
/// Same as [`get_request`].
pub async fn delete_request(
    State(state): State<AppState>,
    token: BearerToken,
    Path(id): Path<String>,
) -> WebResult<StatusCode> {
    let id = parse_id(&id)?;
    state.processor.delete(id, token.as_str()).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(raw: &str) -> Result<RequestId, AppError> {
    RequestId::parse(raw).map_err(|_| AppError::bad_request(format!("invalid request id {raw:?}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use data_citation_core::FailureReason;

    #[test]
    fn test_parse_id_rejects_garbage() {
        let err = parse_id("not-a-uuid").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let id = RequestId::new();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_status_response_is_flat() {
        let request_id = RequestId::new();
        let json = serde_json::to_value(StatusResponse {
            request_id,
            outcome: PollOutcome::Failed {
                reason: FailureReason::Malformed,
            },
        })
        .unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "request_id": request_id.to_string(),
                "state": "FAILED",
                "reason": "malformed",
            })
        );
    }
}
