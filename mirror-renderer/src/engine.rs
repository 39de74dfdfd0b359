//! Tera rendering engine: [`ContentRenderer`] and the canonical marker token.
//!
//! | Output   | Source                                                       |
//! |----------|--------------------------------------------------------------|
//! | `title`  | `[<canonical id>] <record title>`                            |
//! | `body`   | `issue_body.md.tera`, ends with the canonical marker         |
//! | `labels` | record labels ∪ system label ∪ schema-version label          |
//! | `hash`   | SHA-256 of the record's canonical form (see [`crate::canonical`]) |

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tera::Tera;

use mirror_core::{CanonicalId, CanonicalRecord, LabelConfig};

use crate::canonical::{content_hash, normalized};
use crate::context::BodyContext;
use crate::error::RenderError;

const BODY_TEMPLATE: &str = "issue_body.md.tera";

const TPLS: &[(&str, &str)] = &[(BODY_TEMPLATE, include_str!("templates/issue_body.md.tera"))];

const MARKER_PREFIX: &str = "<!-- mirror:canonical-id=";
const MARKER_SUFFIX: &str = " -->";

/// Fixed-format marker embedded in every rendered body.
pub fn canonical_marker(id: &CanonicalId) -> String {
    format!("{MARKER_PREFIX}{}{MARKER_SUFFIX}", id.0)
}

/// Extract the canonical id from a body carrying a marker, if any.
pub fn extract_canonical_id(body: &str) -> Option<CanonicalId> {
    let start = body.find(MARKER_PREFIX)? + MARKER_PREFIX.len();
    let rest = &body[start..];
    let end = rest.find(MARKER_SUFFIX)?;
    let id = rest[..end].trim();
    if id.is_empty() {
        return None;
    }
    Some(CanonicalId::from(id))
}

/// Output of a render call. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedContent {
    pub title: String,
    pub body: String,
    pub labels: BTreeSet<String>,
    pub hash: String,
}

/// Renders canonical records into tracker content.
///
/// Create once and reuse; rendering is pure.
pub struct ContentRenderer {
    tera: Tera,
    system_label: String,
    schema_version: String,
}

impl ContentRenderer {
    /// Construct a renderer applying the managed labels from `labels`.
    pub fn new(labels: &LabelConfig) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TPLS.iter().copied())?;
        Ok(ContentRenderer {
            tera,
            system_label: labels.system_label.clone(),
            schema_version: labels.schema_version.clone(),
        })
    }

    /// Render `record` into title, body, labels and content hash.
    ///
    /// The record is assumed valid; nothing is re-validated here.
    pub fn render(&self, record: &CanonicalRecord) -> Result<RenderedContent, RenderError> {
        let record = &normalized(record);
        let ctx = BodyContext::from_record(record);
        let body = self.tera.render(BODY_TEMPLATE, &ctx.to_tera_context()?)?;
        let title = format!("[{}] {}", ctx.canonical_id, ctx.title);

        let mut labels: BTreeSet<String> = record
            .labels
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        for managed in [&self.system_label, &self.schema_version] {
            if !managed.is_empty() {
                labels.insert(managed.clone());
            }
        }

        Ok(RenderedContent {
            title,
            body,
            labels,
            hash: content_hash(record)?,
        })
    }
}
