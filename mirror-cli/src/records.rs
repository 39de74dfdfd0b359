//! Loading canonical records from YAML or JSON files.
//!
//! A file holds one record or a list of records. `.json` files are parsed as
//! JSON, everything else as YAML.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use mirror_core::CanonicalRecord;

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordFile {
    Many(Vec<CanonicalRecord>),
    One(Box<CanonicalRecord>),
}

impl RecordFile {
    fn into_records(self) -> Vec<CanonicalRecord> {
        match self {
            RecordFile::Many(records) => records,
            RecordFile::One(record) => vec![*record],
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Records in `path`, in file order.
pub fn load_file(path: &Path) -> Result<Vec<CanonicalRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;
    let parsed: RecordFile = if is_json(path) {
        serde_json::from_str(&content)
            .with_context(|| format!("invalid record JSON in '{}'", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("invalid record YAML in '{}'", path.display()))?
    };
    Ok(parsed.into_records())
}

/// Records from every file in order. A canonical id may appear only once.
pub fn load_all(paths: &[PathBuf]) -> Result<Vec<CanonicalRecord>> {
    let mut seen = BTreeSet::new();
    let mut records = Vec::new();
    for path in paths {
        for record in load_file(path)? {
            if record.canonical_id.as_str().trim().is_empty() {
                bail!("record with empty canonical id in '{}'", path.display());
            }
            if !seen.insert(record.canonical_id.clone()) {
                bail!(
                    "duplicate canonical id '{}' in '{}'",
                    record.canonical_id,
                    path.display()
                );
            }
            records.push(record);
        }
    }
    Ok(records)
}
