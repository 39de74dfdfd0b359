//! # mirror-renderer
//!
//! Turns a canonical record into stable tracker content: title, body with an
//! embedded canonical marker, sorted labels, and a content hash.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mirror_core::{CanonicalRecord, LabelConfig};
//! use mirror_renderer::ContentRenderer;
//!
//! fn show(record: &CanonicalRecord) {
//!     if let Ok(renderer) = ContentRenderer::new(&LabelConfig::default()) {
//!         if let Ok(content) = renderer.render(record) {
//!             println!("{} ({})", content.title, content.hash);
//!         }
//!     }
//! }
//! ```

pub mod canonical;
pub mod context;
pub mod engine;
pub mod error;

pub use canonical::content_hash;
pub use context::BodyContext;
pub use engine::{canonical_marker, extract_canonical_id, ContentRenderer, RenderedContent};
pub use error::RenderError;
