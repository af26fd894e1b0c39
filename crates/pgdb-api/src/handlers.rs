//! REST API handlers.
//!
//! Deploy, destroy and status hold a file lock and talk to the container
//! engine, so each runs on the blocking pool and the handler awaits it.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use pgdb_core::{DeployRequest, ErrorKind, ProvisionError, ProvisionResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::ApiState;

/// Error body shared by every route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub(crate) fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ErrorBody {
            error: msg.to_string(),
        }),
    )
}

/// Why a request failed after it reached a handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid json body")]
    InvalidBody(#[source] serde_json::Error),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error("worker task failed: {0}")]
    Join(tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Provision(e) => status_for(e.kind()),
            Self::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// HTTP status for each failure class.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::RetriesExhausted => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Infrastructure | ErrorKind::Lock => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            debug!(error = %self, %status, "request rejected");
        }
        error_response(&self.to_string(), status).into_response()
    }
}

/// Run a blocking core call without stalling the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> ProvisionResult<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f)
        .await
        .map_err(ApiError::Join)??)
}

/// An empty (or all-whitespace) body means every field takes its default.
fn parse_deploy_request(body: &[u8]) -> Result<DeployRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(DeployRequest::default());
    }
    serde_json::from_slice(body).map_err(ApiError::InvalidBody)
}

// ── Deploy ─────────────────────────────────────────────────────

/// POST /v1/deploy
pub async fn deploy(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let req = parse_deploy_request(&body)?;
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let deployer = state.deployer.clone();
    let result = run_blocking(move || deployer.deploy(&req, &host)).await?;
    Ok(Json(result).into_response())
}

// ── Status ─────────────────────────────────────────────────────

/// GET /v1/status
pub async fn status(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let status = state.status.clone();
    let snapshot = run_blocking(move || status.status()).await?;
    Ok(Json(snapshot).into_response())
}

// ── Destroy ────────────────────────────────────────────────────

/// Query string of a destroy call.
#[derive(Debug, Default, Deserialize)]
pub struct DestroyParams {
    #[serde(default)]
    pub keep_data: Option<String>,
}

impl DestroyParams {
    /// Only the literal `true` keeps the volume.
    pub fn keep_data(&self) -> bool {
        self.keep_data.as_deref() == Some("true")
    }
}

/// DELETE /v1/db/{name}
pub async fn destroy(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Query(params): Query<DestroyParams>,
) -> Result<Response, ApiError> {
    let keep_data = params.keep_data();
    if params.keep_data.is_some() && !keep_data {
        warn!(value = ?params.keep_data, "keep_data is not 'true'; volume will be removed");
    }
    let destroyer = state.destroyer.clone();
    run_blocking(move || destroyer.destroy(&name, keep_data)).await?;
    Ok(Json(serde_json::json!({ "ok": true })).into_response())
}

// ── Health ─────────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
