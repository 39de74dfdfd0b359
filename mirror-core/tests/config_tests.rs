//! Config error-message and persistence integration tests.

use assert_fs::prelude::*;
use mirror_core::{config, ConfigError, MirrorConfig, Repository};
use predicates::prelude::predicate;
use rstest::rstest;

fn repo() -> Repository {
    "acme/workflow".parse().expect("repo")
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_returns_not_found() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
    assert!(err.to_string().contains("mirror init"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".mirror/config.yaml")
        .write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
}

#[rstest]
#[case("version: 1\nrepository: no-slash\n")]
#[case("version: 1\nrepository: a/b/c\n")]
fn load_invalid_repository_is_a_parse_error(#[case] yaml: &str) {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".mirror/config.yaml").write_str(yaml).expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Init and save
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config_file() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let created = config::init_at(home.path(), repo()).expect("init");
    assert_eq!(created, MirrorConfig::new(repo()));

    home.child(".mirror/config.yaml")
        .assert(predicate::path::exists())
        .assert(predicate::str::contains("repository: acme/workflow"));
}

#[test]
fn repeated_init_is_idempotent() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let first = config::init_at(home.path(), repo()).expect("first");
    let second = config::init_at(home.path(), repo()).expect("second");
    assert_eq!(first, second);
}
