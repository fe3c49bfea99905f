//! Local JSON API consumed by the browser dashboard.
//!
//! Every error leaves as `{"error": ..., "code": ..., "hint"?: ...}` with
//! the HTTP status of its [`ErrorCode`](crate::error::ErrorCode).

mod requests;

pub use requests::{ColumnsRequest, IssuesParams, OverlaySaveRequest};

use crate::dashboard::{Dashboard, IssueList};
use crate::error::{ErrorCode, Result, SidecarError, StructuredError};
use crate::model::ColumnPrefs;
use crate::overlay::RankAction;
use crate::view::{ViewQuery, personal_status_options, priority_labels};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

type AppState = Arc<Dashboard>;

/// Error response carrying a structured error.
#[derive(Debug)]
pub struct ApiError(pub StructuredError);

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    async fn from_sidecar(state: &Dashboard, err: &SidecarError) -> Self {
        Self(state.describe_error(err).await)
    }

    fn bad_body(rejection: &JsonRejection) -> Self {
        Self(StructuredError {
            code: ErrorCode::ValidationFailed,
            message: format!("Invalid request body: {}", rejection.body_text()),
            hint: Some("Send a JSON object with Content-Type: application/json".to_string()),
            retryable: false,
            context: None,
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(code = self.0.code.as_str(), message = %self.0.message, "Request failed");
        } else {
            debug!(code = self.0.code.as_str(), message = %self.0.message, "Request rejected");
        }
        (status, Json(self.0.to_api_body())).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Build the router over a shared dashboard.
pub fn router(dashboard: Arc<Dashboard>) -> Router {
    Router::new()
        .route("/api/issues", get(list_issues))
        .route("/api/refresh", post(refresh_issues))
        .route("/api/overlay/{id}", post(save_overlay))
        .route("/api/overlay/{id}/rank", post(rank_issue))
        .route("/api/columns", get(get_columns).put(put_columns))
        .route("/api/priority-labels", get(get_priority_labels))
        .route("/api/personal-status-options", get(get_personal_status_options))
        .with_state(dashboard)
}

/// Bind `addr` and serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(dashboard: Arc<Dashboard>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SidecarError::Config(format!("cannot bind {addr}: {e}")))?;
    let local = listener.local_addr()?;
    info!(addr = %local, "Dashboard API listening");
    eprintln!("sidecar listening on http://{local}");

    axum::serve(listener, router(dashboard))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Dashboard API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C; stop the process to shut down");
        std::future::pending::<()>().await;
    }
}

async fn list_issues(
    State(state): State<AppState>,
    Query(params): Query<IssuesParams>,
) -> ApiResult<IssueList> {
    let query = parse_view(&state, &params).await?;
    match state.issues(&query).await {
        Ok(list) => Ok(Json(list)),
        Err(e) => Err(ApiError::from_sidecar(&state, &e).await),
    }
}

async fn refresh_issues(
    State(state): State<AppState>,
    Query(params): Query<IssuesParams>,
) -> ApiResult<IssueList> {
    let query = parse_view(&state, &params).await?;
    match state.refresh(&query).await {
        Ok(list) => Ok(Json(list)),
        Err(e) => Err(ApiError::from_sidecar(&state, &e).await),
    }
}

async fn parse_view(
    state: &Dashboard,
    params: &IssuesParams,
) -> std::result::Result<ViewQuery, ApiError> {
    match ViewQuery::parse(
        params.filter.as_deref(),
        params.sort.as_deref(),
        params.dir.as_deref(),
    ) {
        Ok(query) => Ok(query),
        Err(e) => Err(ApiError::from_sidecar(state, &e).await),
    }
}

async fn save_overlay(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<OverlaySaveRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(request) = payload.map_err(|rejection| ApiError::bad_body(&rejection))?;

    let result = match request.into_patch() {
        Ok(patch) => state
            .save_overlay(&id, &patch)
            .await
            .map(|outcome| (outcome, patch.personal_priority.is_some())),
        Err(e) => Err(e),
    };

    match result {
        Ok((outcome, priority_touched)) => {
            let mut entry = serde_json::to_value(&outcome.record).unwrap_or_else(|_| json!({}));
            entry["id"] = Value::String(outcome.id.clone());
            let mut body = json!({"ok": true, "entry": entry});
            if priority_touched || outcome.ranks_changed {
                body["overlay"] = json!(outcome.document.issues);
            }
            Ok(Json(body))
        }
        Err(e) => Err(ApiError::from_sidecar(&state, &e).await),
    }
}

async fn rank_issue(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<RankAction>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(action) = payload.map_err(|rejection| ApiError::bad_body(&rejection))?;
    match state.reorder(&id, action).await {
        Ok(document) => Ok(Json(json!({"ok": true, "overlay": document.issues}))),
        Err(e) => Err(ApiError::from_sidecar(&state, &e).await),
    }
}

async fn get_columns(State(state): State<AppState>) -> Json<ColumnPrefs> {
    Json(state.columns().await)
}

async fn put_columns(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ColumnsRequest>, JsonRejection>,
) -> ApiResult<ColumnPrefs> {
    let Json(request) = payload.map_err(|rejection| ApiError::bad_body(&rejection))?;
    let result = match ColumnPrefs::parse(&request.visible) {
        Ok(prefs) => state.set_columns(prefs).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(prefs) => Ok(Json(prefs)),
        Err(e) => Err(ApiError::from_sidecar(&state, &e).await),
    }
}

async fn get_priority_labels() -> Json<BTreeMap<String, &'static str>> {
    Json(
        priority_labels()
            .into_iter()
            .map(|(value, label)| (value.to_string(), label))
            .collect(),
    )
}

async fn get_personal_status_options() -> Json<Vec<&'static str>> {
    Json(personal_status_options())
}
