//! Maps raw tracker failures onto a small typed taxonomy.
//!
//! Checks run in order; the first match wins:
//! 1. `RATE_LIMITED`: 429, or 403 with an exhausted quota or a rate-limit message
//! 2. `NETWORK`: transport failure, or a reset/timeout message
//! 3. `DUPLICATE`: 409, or a 4xx carrying a duplicate/unique-constraint message
//! 4. `VALIDATION`: any other 4xx
//! 5. `UNKNOWN`: everything else (5xx, undecodable responses)

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    RateLimited,
    Network,
    /// Create rejected because the resource already exists. Only ever
    /// recovered inside the upsert create step.
    Duplicate,
    Validation,
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::Network => "NETWORK",
            ErrorCode::Duplicate => "DUPLICATE",
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub code: ErrorCode,
    /// Whether an outer caller may reasonably retry the whole operation.
    pub retriable: bool,
}

impl Classification {
    fn new(code: ErrorCode, retriable: bool) -> Self {
        Self { code, retriable }
    }
}

fn rate_limit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(secondary rate limit|rate limit exceeded|abuse detection|api rate limit)")
            .expect("static regex")
    })
}

fn network_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(econnreset|etimedout|econnrefused|enotfound|eai_again|connection reset|connection refused|timed out|timeout|broken pipe|socket hang up)",
        )
        .expect("static regex")
    })
}

fn duplicate_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(already exists|duplicate|unique constraint|uniqueness violation)")
            .expect("static regex")
    })
}

/// Classify a raw tracker failure.
pub fn classify(err: &TrackerError) -> Classification {
    match err {
        TrackerError::Http {
            status,
            message,
            rate_limit_remaining,
        } => classify_http(*status, message, *rate_limit_remaining),
        TrackerError::Transport { .. } => Classification::new(ErrorCode::Network, true),
        TrackerError::Decode(message) => {
            if network_re().is_match(message) {
                Classification::new(ErrorCode::Network, true)
            } else {
                Classification::new(ErrorCode::Unknown, false)
            }
        }
    }
}

fn classify_http(status: u16, message: &str, remaining: Option<u64>) -> Classification {
    if status == 429 || (status == 403 && (remaining == Some(0) || rate_limit_re().is_match(message)))
    {
        return Classification::new(ErrorCode::RateLimited, true);
    }
    if status == 408 || status == 504 || network_re().is_match(message) {
        return Classification::new(ErrorCode::Network, true);
    }
    if status == 409 || ((400..500).contains(&status) && duplicate_re().is_match(message)) {
        return Classification::new(ErrorCode::Duplicate, false);
    }
    if (400..500).contains(&status) {
        return Classification::new(ErrorCode::Validation, false);
    }
    Classification::new(ErrorCode::Unknown, status >= 500)
}
