// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control API client for CLI commands (§6, §9).

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use qc_core::{Job, JobSummary, NewJob, WorkerSummary};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::daemon_process::{start_daemon_background, wait_for_daemon};
use crate::env;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("queuectld is not reachable at {0}")]
    DaemonNotRunning(String),

    #[error("failed to start queuectld: {0}")]
    DaemonStartFailed(String),

    #[error("timed out waiting for queuectld to start")]
    DaemonStartTimeout,

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Rejected(String),
}

/// Thin HTTP wrapper over the Control API. Constructed once per invocation.
pub struct DaemonClient {
    base_url: String,
    http: reqwest::Client,
}

impl DaemonClient {
    /// For action commands (enqueue, dlq retry, config set): auto-start the
    /// daemon if unreachable, but at most once per process (§9).
    pub async fn for_action() -> Result<Self, ClientError> {
        static RESTARTED: AtomicBool = AtomicBool::new(false);

        let base_url = env::resolve_base_url(None)
            .map_err(|e| ClientError::DaemonNotRunning(e.to_string()))?;
        let client = Self::new(base_url.clone());

        if client.probe().await {
            return Ok(client);
        }

        if RESTARTED.swap(true, Ordering::SeqCst) {
            return Err(ClientError::DaemonNotRunning(base_url));
        }

        let child = start_daemon_background()?;
        wait_for_daemon(&base_url, child, Duration::from_secs(5)).await?;
        Ok(client)
    }

    /// For query commands (list, status, dlq list, config get/list): connect
    /// only, never auto-start — a query has nothing useful to report from a
    /// daemon it just started with an empty store.
    pub async fn for_query() -> Result<Self, ClientError> {
        let base_url = env::resolve_base_url(None)
            .map_err(|e| ClientError::DaemonNotRunning(e.to_string()))?;
        let client = Self::new(base_url.clone());
        if client.probe().await {
            Ok(client)
        } else {
            Err(ClientError::DaemonNotRunning(base_url))
        }
    }

    fn new(base_url: String) -> Self {
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    async fn probe(&self) -> bool {
        self.http
            .get(format!("{}/status", self.base_url))
            .send()
            .await
            .is_ok()
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let message = resp
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| status.to_string());
        Err(ClientError::Rejected(message))
    }

    pub async fn enqueue(&self, job: NewJob) -> Result<Job, ClientError> {
        let resp = self
            .http
            .post(format!("{}/jobs", self.base_url))
            .json(&job)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn list(&self, state: Option<&str>) -> Result<Vec<Job>, ClientError> {
        let mut req = self.http.get(format!("{}/jobs", self.base_url));
        if let Some(state) = state {
            req = req.query(&[("state", state)]);
        }
        let resp = req.send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn status(&self) -> Result<(JobSummary, WorkerSummary), ClientError> {
        #[derive(Deserialize)]
        struct StatusResponse {
            job_summary: JobSummary,
            worker_summary: WorkerSummary,
        }
        let resp = self
            .http
            .get(format!("{}/status", self.base_url))
            .send()
            .await?;
        let body: StatusResponse = Self::check(resp).await?.json().await?;
        Ok((body.job_summary, body.worker_summary))
    }

    pub async fn dlq_list(&self) -> Result<Vec<Job>, ClientError> {
        let resp = self.http.get(format!("{}/dlq", self.base_url)).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn dlq_retry_one(&self, id: &str) -> Result<String, ClientError> {
        let resp = self
            .http
            .post(format!("{}/dlq/{id}/retry", self.base_url))
            .send()
            .await?;
        let body: Value = Self::check(resp).await?.json().await?;
        Ok(body["message"].as_str().unwrap_or_default().to_string())
    }

    pub async fn dlq_retry_all(&self) -> Result<(String, u64), ClientError> {
        let resp = self
            .http
            .post(format!("{}/dlq/retry-all", self.base_url))
            .send()
            .await?;
        let body: Value = Self::check(resp).await?.json().await?;
        let message = body["message"].as_str().unwrap_or_default().to_string();
        let count = body["count"].as_u64().unwrap_or(0);
        Ok((message, count))
    }

    pub async fn config_list(&self) -> Result<Value, ClientError> {
        let resp = self
            .http
            .get(format!("{}/config", self.base_url))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn config_get(&self, key: &str) -> Result<Value, ClientError> {
        let resp = self
            .http
            .get(format!("{}/config/{key}", self.base_url))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn config_set(&self, key: &str, value: &str) -> Result<Value, ClientError> {
        let resp = self
            .http
            .post(format!("{}/config", self.base_url))
            .json(&serde_json::json!({ "key": key, "value": value }))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn shutdown(&self) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(format!("{}/shutdown", self.base_url))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}
