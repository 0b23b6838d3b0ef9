use std::error::Error as _;

use axum::{Json, http::StatusCode};
use screenplay_core::ScreenplayError;
use serde::Serialize;
use serde_json::Value;

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Error body. The verbose variant is only produced in debug mode.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ErrorResponse {
    Debug {
        error: String,
        stack: Vec<String>,
        details: Value,
        timestamp: String,
    },
    Brief {
        error: String,
    },
}

impl ErrorResponse {
    pub fn from_error(err: &ScreenplayError, debug: bool) -> Self {
        if !debug {
            return Self::Brief {
                error: err.to_string(),
            };
        }

        Self::Debug {
            error: err.to_string(),
            stack: error_chain(err),
            details: details(err),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Every failure is reported as 500; only the body varies with `debug`.
pub fn internal_error(err: &ScreenplayError, debug: bool) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::from_error(err, debug)),
    )
}

/// Messages of `err` and its sources, outermost first.
fn error_chain(err: &ScreenplayError) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}

/// Upstream payload when there is one, else the direct cause.
fn details(err: &ScreenplayError) -> Value {
    if let Some(body) = err.upstream_body() {
        return body.clone();
    }
    err.source()
        .map(|cause| Value::String(cause.to_string()))
        .unwrap_or(Value::Null)
}
