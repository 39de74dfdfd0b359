//! Error types for mirror-sync.
//!
//! Three layers:
//! - [`TrackerError`]: raw failure reported by a tracker client
//! - [`SyncError`]: crate error; tracker failures carry their [`Classification`]
//! - [`ApiError`]: stable `{code, message, details}` pair handed to callers

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use mirror_core::ConfigError;
use mirror_renderer::RenderError;

use crate::classify::{Classification, ErrorCode};

/// Tracker operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerOp {
    Search,
    Create,
    Update,
    Get,
}

impl fmt::Display for TrackerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerOp::Search => f.write_str("search"),
            TrackerOp::Create => f.write_str("create"),
            TrackerOp::Update => f.write_str("update"),
            TrackerOp::Get => f.write_str("get"),
        }
    }
}

/// Transport-level failure as reported by a tracker client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// Non-success HTTP response.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        /// Value of `x-ratelimit-remaining`, when the tracker sent one.
        rate_limit_remaining: Option<u64>,
    },

    /// No response: connection reset/refused, DNS failure, timeout.
    #[error("transport failure: {message}")]
    Transport { message: String, timed_out: bool },

    /// A response arrived but could not be decoded.
    #[error("unexpected tracker response: {0}")]
    Decode(String),
}

impl TrackerError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        TrackerError::Http {
            status,
            message: message.into(),
            rate_limit_remaining: None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TrackerError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the rendering engine.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// A classified tracker failure.
    #[error("tracker {operation} failed ({}): {source}", .classification.code)]
    Tracker {
        operation: TrackerOp,
        classification: Classification,
        #[source]
        source: TrackerError,
    },

    /// An error loading configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The schema-label pattern is not a valid regex.
    #[error("invalid managed label pattern: {0}")]
    LabelPattern(#[from] regex::Error),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (link store).
    #[error("link store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Wrap a tracker failure, classifying it.
    pub fn tracker(operation: TrackerOp, source: TrackerError) -> Self {
        SyncError::Tracker {
            operation,
            classification: crate::classify::classify(&source),
            source,
        }
    }

    /// Classification of a tracker failure, `None` for local errors.
    pub fn classification(&self) -> Option<Classification> {
        match self {
            SyncError::Tracker { classification, .. } => Some(*classification),
            _ => None,
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.classification().map(|c| c.retriable).unwrap_or(false)
    }

    /// Stable caller-facing error.
    pub fn to_api_error(&self) -> ApiError {
        match self {
            SyncError::Tracker {
                operation,
                classification,
                source,
            } => {
                let code = match classification.code {
                    ErrorCode::Validation => ApiErrorCode::ValidationError,
                    _ => ApiErrorCode::GithubApiError,
                };
                ApiError {
                    code,
                    message: self.to_string(),
                    details: Some(json!({
                        "classification": classification.code,
                        "retriable": classification.retriable,
                        "operation": operation,
                        "status": source.status(),
                    })),
                }
            }
            SyncError::Render(_) | SyncError::Config(_) | SyncError::LabelPattern(_) => ApiError {
                code: ApiErrorCode::ValidationError,
                message: self.to_string(),
                details: None,
            },
            SyncError::Io { .. } | SyncError::Json(_) => ApiError {
                code: ApiErrorCode::GithubApiError,
                message: self.to_string(),
                details: Some(json!({ "classification": ErrorCode::Unknown, "retriable": false })),
            },
        }
    }
}

/// Caller-facing error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    /// Rate limit, network and unknown tracker failures.
    GithubApiError,
    /// Rejected input.
    ValidationError,
}

/// Typed error surface exposed upward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
