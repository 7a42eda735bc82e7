// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control API surface (C7, §6): a thin Axum translation over [`Core`].
//! Every handler is a direct call into the core plus a status-code mapping;
//! no business logic lives here.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use qc_core::{Clock, ConfigKey, Job, JobId, JobState, JobSummary, NewJob, SystemClock, WorkerSummary};
use qc_engine::Core;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::lifecycle::Lifecycle;

#[derive(Clone)]
pub struct AppState {
    pub core: Arc<Core>,
    pub lifecycle: Arc<Lifecycle>,
    #[allow(dead_code)]
    pub state_dir: PathBuf,
}

/// Build the full router: public read/write routes plus the localhost-only
/// administrative routes (§6 "Administrative operations ... refuse requests
/// whose source address is not loopback").
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/config", get(config_list).post(config_set))
        .route("/config/:key", get(config_get))
        .route("/shutdown", post(shutdown))
        .layer(middleware::from_fn(require_loopback));

    Router::new()
        .route("/jobs", get(list_jobs).post(enqueue))
        .route("/status", get(status))
        .route("/dlq", get(dlq_list))
        .route("/dlq/:id/retry", post(dlq_retry_one))
        .route("/dlq/retry-all", post(dlq_retry_all))
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// §6: "Administrative operations ... refuse requests whose source address
/// is not loopback (IPv4 or IPv6)". Reads only the transport-level peer
/// address (never a forwarded-for header, which a non-loopback client could
/// set itself) so the guard can't be spoofed by a remote caller.
async fn require_loopback(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if addr.ip().is_loopback() {
        next.run(req).await
    } else {
        ApiError::forbidden("administrative endpoints are localhost-only").into_response()
    }
}

#[derive(Deserialize)]
struct ListParams {
    state: Option<String>,
}

async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Job>>, ApiError> {
    let filter = match params.state {
        Some(raw) => Some(
            JobState::from_str(&raw)
                .map_err(|_| ApiError::validation(format!("unknown state filter: {raw}")))?,
        ),
        None => None,
    };
    let jobs = state.core.list(filter).map_err(ApiError::from)?;
    Ok(Json(jobs))
}

async fn enqueue(
    State(state): State<AppState>,
    Json(body): Json<NewJob>,
) -> Result<Json<Job>, ApiError> {
    let now = SystemClock.now_ms();
    let job = state.core.enqueue(body, now).map_err(ApiError::from)?;
    Ok(Json(job))
}

#[derive(Serialize)]
struct StatusResponse {
    job_summary: JobSummary,
    worker_summary: WorkerSummary,
}

async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let (job_summary, worker_summary) = state.core.status().map_err(ApiError::from)?;
    Ok(Json(StatusResponse {
        job_summary,
        worker_summary,
    }))
}

async fn dlq_list(State(state): State<AppState>) -> Result<Json<Vec<Job>>, ApiError> {
    let jobs = state.core.dlq_list().map_err(ApiError::from)?;
    Ok(Json(jobs))
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn dlq_retry_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::validation("job id must not be empty"));
    }
    let now = SystemClock.now_ms();
    let requeued = state
        .core
        .dlq_retry_one(&JobId::new(id.clone()), now)
        .map_err(ApiError::from)?;
    if requeued {
        Ok(Json(MessageResponse {
            message: format!("job {id} requeued"),
        }))
    } else {
        Err(ApiError::not_found(format!("no dead job with id {id:?}")))
    }
}

#[derive(Serialize)]
struct RetryAllResponse {
    message: String,
    count: u64,
}

async fn dlq_retry_all(
    State(state): State<AppState>,
) -> Result<Json<RetryAllResponse>, ApiError> {
    let now = SystemClock.now_ms();
    let count = state.core.dlq_retry_all(now).map_err(ApiError::from)?;
    if count == 0 {
        Err(ApiError::not_found("no dead jobs to requeue"))
    } else {
        Ok(Json(RetryAllResponse {
            message: format!("requeued {count} job(s)"),
            count,
        }))
    }
}

async fn config_list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let entries = state.core.get_config().map_err(ApiError::from)?;
    let mut map = Map::new();
    for (key, value) in entries {
        map.insert(key.as_str().to_string(), Value::from(value));
    }
    Ok(Json(Value::Object(map)))
}

async fn config_get(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let config_key = ConfigKey::from_str(&key)
        .map_err(|_| ApiError::not_found(format!("unknown config key: {key}")))?;
    let value = state
        .core
        .get_config_one(config_key)
        .map_err(ApiError::from)?;
    let mut map = Map::new();
    map.insert(config_key.as_str().to_string(), Value::from(value));
    Ok(Json(Value::Object(map)))
}

#[derive(Deserialize)]
struct ConfigSetRequest {
    key: String,
    value: String,
}

async fn config_set(
    State(state): State<AppState>,
    Json(body): Json<ConfigSetRequest>,
) -> Result<Json<Value>, ApiError> {
    let (key, value) = state
        .core
        .set_config(&body.key, &body.value)
        .map_err(ApiError::from)?;
    let mut map = Map::new();
    map.insert(key.as_str().to_string(), Value::from(value));
    Ok(Json(Value::Object(map)))
}

async fn shutdown(State(state): State<AppState>) -> Json<MessageResponse> {
    state.lifecycle.initiate(&state.core);
    Json(MessageResponse {
        message: "shutting down".to_string(),
    })
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
