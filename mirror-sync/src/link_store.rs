//! Link store: persisted mirror-facing fields per canonical id.
//!
//! Persists a `LinkStoreFile` JSON document at
//! `<home>/.mirror/links/<owner>__<name>.json`.
//! Writes use the same atomic `.tmp` + rename pattern as the config.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mirror_core::{config, CanonicalId, MirrorLink, Repository};

use crate::error::{io_err, SyncError};

/// In-memory link store keyed by canonical id.
pub type LinkStore = BTreeMap<CanonicalId, MirrorLink>;

/// On-disk link store payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkStoreFile {
    pub synced_at: DateTime<Utc>,
    pub links: LinkStore,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LinkStoreCompat {
    Structured(LinkStoreStructuredCompat),
    Legacy(LinkStore),
}

#[derive(Debug, Deserialize)]
struct LinkStoreStructuredCompat {
    pub synced_at: Option<DateTime<Utc>>,
    pub links: LinkStore,
}

/// Path to the link store JSON for `repo`, rooted at `home`.
pub fn store_path_at(home: &Path, repo: &Repository) -> PathBuf {
    config::mirror_dir_at(home)
        .join("links")
        .join(format!("{}__{}.json", repo.owner, repo.name))
}

/// Load the link store for `repo`.
///
/// Returns an empty store if the file does not yet exist.
pub fn load_at(home: &Path, repo: &Repository) -> Result<LinkStoreFile, SyncError> {
    let path = store_path_at(home, repo);
    if !path.exists() {
        return Ok(LinkStoreFile {
            synced_at: Utc::now(),
            links: BTreeMap::new(),
        });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    match serde_json::from_str::<LinkStoreCompat>(&contents)? {
        LinkStoreCompat::Structured(store) => Ok(LinkStoreFile {
            synced_at: store.synced_at.unwrap_or_else(Utc::now),
            links: store.links,
        }),
        LinkStoreCompat::Legacy(links) => Ok(LinkStoreFile {
            synced_at: Utc::now(),
            links,
        }),
    }
}

/// Save the link store for `repo` atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save_at(home: &Path, repo: &Repository, store: &LinkStoreFile) -> Result<(), SyncError> {
    let path = store_path_at(home, repo);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid link store path")));
    };

    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(store)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_core::ExternalId;
    use tempfile::TempDir;

    fn repo() -> Repository {
        "acme/workflow".parse().unwrap()
    }

    fn link(n: u64) -> MirrorLink {
        MirrorLink {
            external_id: ExternalId(n),
            external_url: format!("https://tracker.test/issues/{n}"),
            rendered_hash: "deadbeef".into(),
            last_synced_at: Utc::now(),
        }
    }

    #[test]
    fn empty_store_when_file_missing() {
        let tmp = TempDir::new().unwrap();
        let store = load_at(tmp.path(), &repo()).unwrap();
        assert!(store.links.is_empty());
    }

    #[test]
    fn store_path_is_per_repository() {
        let path = store_path_at(Path::new("/h"), &repo());
        assert_eq!(path, PathBuf::from("/h/.mirror/links/acme__workflow.json"));
    }

    #[test]
    fn roundtrip_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut links = BTreeMap::new();
        links.insert(CanonicalId::from("I-1"), link(1));
        links.insert(CanonicalId::from("I-2"), link(2));
        let store = LinkStoreFile {
            synced_at: Utc::now(),
            links,
        };

        save_at(tmp.path(), &repo(), &store).unwrap();
        let loaded = load_at(tmp.path(), &repo()).unwrap();
        assert_eq!(loaded.links, store.links);
        assert!(!store_path_at(tmp.path(), &repo()).with_extension("json.tmp").exists());
    }

    #[test]
    fn load_legacy_flat_map() {
        let tmp = TempDir::new().unwrap();
        let path = store_path_at(tmp.path(), &repo());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let legacy: LinkStore = [(CanonicalId::from("I-9"), link(9))].into_iter().collect();
        std::fs::write(&path, serde_json::to_string(&legacy).unwrap()).unwrap();

        let before = Utc::now();
        let loaded = load_at(tmp.path(), &repo()).unwrap();
        assert_eq!(loaded.links, legacy);
        assert!(loaded.synced_at >= before);
    }
}
