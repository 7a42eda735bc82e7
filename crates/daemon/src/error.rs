// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps the core's error taxonomy (§7) onto HTTP status codes for the
//! Control API (§6). Nothing below this module knows about HTTP; everything
//! above it (handlers only) knows nothing else.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use qc_core::ErrorKind;
use qc_storage::StoreError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Conflict(String),
    NotFound(String),
    GuardedRefused(String),
    Forbidden(String),
    Internal(String),
}

impl ApiError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::GuardedRefused(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::Validation(m)
            | ApiError::Conflict(m)
            | ApiError::NotFound(m)
            | ApiError::GuardedRefused(m)
            | ApiError::Forbidden(m)
            | ApiError::Internal(m) => m,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.message() }));
        (status, body).into_response()
    }
}

/// Classify a store error into the category the HTTP layer needs (§7):
/// user-facing categories pass through as-is, anything else (sqlite/io) is
/// an unclassified internal failure.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err.as_core_error() {
            Some(core_err) => match core_err.kind {
                ErrorKind::Validation => ApiError::Validation(core_err.message),
                ErrorKind::Conflict => ApiError::Conflict(core_err.message),
                ErrorKind::NotFound => ApiError::NotFound(core_err.message),
                ErrorKind::GuardedRefused => ApiError::GuardedRefused(core_err.message),
            },
            None => ApiError::Internal(err.to_string()),
        }
    }
}
