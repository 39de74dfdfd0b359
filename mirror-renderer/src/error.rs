//! Error types for mirror-renderer.

use thiserror::Error;

/// All errors that can arise from content rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (canonical form or tera context).
    #[error("content serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
