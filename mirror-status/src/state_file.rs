//! Mirror state snapshots on disk (`.json`, `.yaml`, `.yml`).

use std::fs;
use std::path::Path;

use mirror_core::MirrorState;

use crate::error::StatusError;

/// Load a [`MirrorState`]. `.json` files are read as JSON, anything else as
/// YAML.
pub fn load(path: &Path) -> Result<MirrorState, StatusError> {
    let content = fs::read_to_string(path).map_err(|source| StatusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(path, &content)
}

fn parse(path: &Path, content: &str) -> Result<MirrorState, StatusError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let parsed = if is_json {
        serde_json::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| StatusError::Parse {
        path: path.to_path_buf(),
        message,
    })
}
