//! YAML configuration at `~/.mirror/config.yaml`.
//!
//! # API pattern
//!
//! Every function touching disk has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Saves are atomic: serialize → `config.yaml.tmp` → `chmod 0600` → `rename`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};

pub const CONFIG_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// `owner/name` slug of the tracker repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for Repository {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(2, '/');
        let owner = parts.next().unwrap_or_default();
        let name = parts.next().unwrap_or_default();
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "repository must be 'owner/name', got '{s}'"
            )));
        }
        Ok(Repository {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl TryFrom<String> for Repository {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Repository> for String {
    fn from(r: Repository) -> Self {
        r.to_string()
    }
}

/// Managed-label settings. Every label outside this set is preserved on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Marker label identifying resources owned by this system.
    pub system_label: String,
    /// Current schema-version label applied on every render.
    pub schema_version: String,
    /// Regex recognising any schema-version label, current or previous.
    pub schema_label_pattern: String,
    /// Prefix of the label convention the resolver searches by.
    pub canonical_label_prefix: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            system_label: "mirror".to_string(),
            schema_version: "v1.0".to_string(),
            schema_label_pattern: r"^v\d+(\.\d+)*$".to_string(),
            canonical_label_prefix: "canonical:".to_string(),
        }
    }
}

/// Root of `~/.mirror/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    pub version: u32,
    pub repository: Repository,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Name of the environment variable holding the API token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Per-request timeout for tracker calls.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub labels: LabelConfig,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl MirrorConfig {
    pub fn new(repository: Repository) -> Self {
        Self {
            version: CONFIG_VERSION,
            repository,
            api_base_url: default_api_base_url(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
            labels: LabelConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.mirror/`
pub fn mirror_dir_at(home: &Path) -> PathBuf {
    home.join(".mirror")
}

/// `<home>/.mirror/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    mirror_dir_at(home).join("config.yaml")
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load the config from `<home>/.mirror/config.yaml`.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with path)
/// if malformed.
pub fn load_at(home: &Path) -> Result<MirrorConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Err(ConfigError::NotFound { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<MirrorConfig, ConfigError> {
    load_at(&home()?)
}

/// Atomically save the config.
pub fn save_at(home: &Path, config: &MirrorConfig) -> Result<(), ConfigError> {
    let dir = mirror_dir_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        set_dir_permissions(&dir)?;
    }
    let path = config_path_at(home);
    let tmp_path = path.with_extension("yaml.tmp");

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(config: &MirrorConfig) -> Result<(), ConfigError> {
    save_at(&home()?, config)
}

/// Create the config for `repository`, or repoint an existing one at it.
///
/// Label and transport settings of an existing config are kept.
pub fn init_at(home: &Path, repository: Repository) -> Result<MirrorConfig, ConfigError> {
    let config = match load_at(home) {
        Ok(mut existing) => {
            existing.repository = repository;
            existing
        }
        Err(ConfigError::NotFound { .. }) => MirrorConfig::new(repository),
        Err(e) => return Err(e),
    };
    save_at(home, &config)?;
    Ok(config)
}

/// `init_at` convenience wrapper.
pub fn init(repository: Repository) -> Result<MirrorConfig, ConfigError> {
    init_at(&home()?, repository)
}

pub fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo() -> Repository {
        "acme/workflow".parse().expect("repo")
    }

    #[test]
    fn config_path_is_correct() {
        let home = Path::new("/home/u");
        assert_eq!(config_path_at(home), PathBuf::from("/home/u/.mirror/config.yaml"));
    }

    #[test]
    fn repository_parse_rejects_bad_slugs() {
        assert!("acme".parse::<Repository>().is_err());
        assert!("/name".parse::<Repository>().is_err());
        assert!("a/b/c".parse::<Repository>().is_err());
        assert_eq!(repo().to_string(), "acme/workflow");
    }

    #[test]
    fn save_and_load_roundtrip() {
        let home = TempDir::new().unwrap();
        let config = MirrorConfig::new(repo());
        save_at(home.path(), &config).unwrap();
        assert_eq!(load_at(home.path()).unwrap(), config);
    }

    #[test]
    fn atomic_save_cleans_up_tmp() {
        let home = TempDir::new().unwrap();
        save_at(home.path(), &MirrorConfig::new(repo())).unwrap();
        let tmp = config_path_at(home.path()).with_extension("yaml.tmp");
        assert!(!tmp.exists());
    }

    #[cfg(unix)]
    #[test]
    fn saved_config_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let home = TempDir::new().unwrap();
        save_at(home.path(), &MirrorConfig::new(repo())).unwrap();
        let mode = std::fs::metadata(config_path_at(home.path()))
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn init_keeps_existing_label_settings() {
        let home = TempDir::new().unwrap();
        let mut config = MirrorConfig::new(repo());
        config.labels.system_label = "afu9".to_string();
        save_at(home.path(), &config).unwrap();

        let updated = init_at(home.path(), "acme/other".parse().unwrap()).unwrap();
        assert_eq!(updated.repository.name, "other");
        assert_eq!(updated.labels.system_label, "afu9");
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let home = TempDir::new().unwrap();
        std::fs::create_dir_all(mirror_dir_at(home.path())).unwrap();
        std::fs::write(
            config_path_at(home.path()),
            "version: 1\nrepository: acme/workflow\n",
        )
        .unwrap();
        let config = load_at(home.path()).unwrap();
        assert_eq!(config.token_env, "GITHUB_TOKEN");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.labels, LabelConfig::default());
    }
}
