use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn mirror_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mirror"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("GITHUB_TOKEN")
        .env_remove("MIRROR_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

fn render_hash(home: &Path, file: &Path) -> String {
    let output = mirror_cmd(home)
        .arg("render")
        .arg(file)
        .arg("--json")
        .output()
        .expect("run render");
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("render json");
    json["hash"].as_str().expect("hash").to_string()
}

const RECORD_YAML: &str = "\
canonicalId: I-811
title: Mirror records
description: Publish each committed unit of work.
acceptanceCriteria:
  - creates once
labels: [\"area:sync\", backend]
";

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

#[test]
fn render_prints_title_marker_and_hash() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let file = write(&work, "record.yaml", RECORD_YAML);

    mirror_cmd(home.path())
        .arg("render")
        .arg(&file)
        .assert()
        .success()
        .stdout(contains("title:  [I-811] Mirror records"))
        .stdout(contains("<!-- mirror:canonical-id=I-811 -->"))
        .stdout(contains("- [ ] creates once"))
        .stdout(contains("labels: area:sync, backend, mirror, v1.0"));
}

#[test]
fn render_hash_ignores_format_and_ordering() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let yaml = write(&work, "record.yaml", RECORD_YAML);
    let json = write(
        &work,
        "record.json",
        r#"{
            "labels": ["backend", "area:sync"],
            "acceptance_criteria": ["creates once"],
            "updated_at": "2026-01-01T00:00:00Z",
            "description": "Publish each committed unit of work.",
            "title": "Mirror records",
            "canonical_id": "I-811"
        }"#,
    );

    let a = render_hash(home.path(), &yaml);
    let b = render_hash(home.path(), &json);
    assert_eq!(a, b);
    assert_eq!(a.len(), 64);
}

#[test]
fn render_missing_file_fails() {
    let home = TempDir::new().unwrap();
    mirror_cmd(home.path())
        .args(["render", "does-not-exist.yaml"])
        .assert()
        .failure()
        .stderr(contains("cannot read"));
}

// ---------------------------------------------------------------------------
// init / upsert
// ---------------------------------------------------------------------------

#[test]
fn init_writes_config() {
    let home = TempDir::new().unwrap();
    mirror_cmd(home.path())
        .args(["init", "--repo", "acme/workflow"])
        .assert()
        .success()
        .stdout(contains("Mirroring into 'acme/workflow'"));

    let config = fs::read_to_string(home.path().join(".mirror/config.yaml")).unwrap();
    assert!(config.contains("acme/workflow"));
}

#[test]
fn init_rejects_bad_repository() {
    let home = TempDir::new().unwrap();
    mirror_cmd(home.path())
        .args(["init", "--repo", "not-a-slug"])
        .assert()
        .failure()
        .stderr(contains("owner/name"));
}

#[test]
fn upsert_without_init_points_at_init() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let file = write(&work, "record.yaml", RECORD_YAML);

    mirror_cmd(home.path())
        .arg("upsert")
        .arg(&file)
        .assert()
        .failure()
        .stderr(contains("mirror init"));
}

#[test]
fn upsert_dry_run_reports_and_writes_nothing() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let file = write(&work, "record.yaml", RECORD_YAML);
    mirror_cmd(home.path())
        .args(["init", "--repo", "acme/workflow"])
        .assert()
        .success();

    mirror_cmd(home.path())
        .arg("upsert")
        .arg(&file)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(contains("[dry-run]"))
        .stdout(contains("~  I-811"));

    assert!(!home.path().join(".mirror/links").exists());
}

#[test]
fn upsert_without_token_refuses_to_publish() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let file = write(&work, "record.yaml", RECORD_YAML);
    mirror_cmd(home.path())
        .args(["init", "--repo", "acme/workflow"])
        .assert()
        .success();

    mirror_cmd(home.path())
        .arg("upsert")
        .arg(&file)
        .assert()
        .failure()
        .stderr(contains("GITHUB_TOKEN"));
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

#[test]
fn status_table_shows_effective_status() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let file = write(
        &work,
        "i-811.yaml",
        "localStatus: IMPLEMENTING\ngithubMirrorStatus: IN_REVIEW\nexecutionState: IDLE\n",
    );

    mirror_cmd(home.path())
        .arg("status")
        .arg(&file)
        .assert()
        .success()
        .stdout(contains("MERGE_READY"))
        .stdout(contains("1 records | 0 drifting"));
}

#[test]
fn status_json_reports_drift() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let running = write(
        &work,
        "running.json",
        r#"{"localStatus":"IMPLEMENTING","githubMirrorStatus":"DONE","executionState":"RUNNING"}"#,
    );
    let closed = write(
        &work,
        "closed.json",
        r#"{"localStatus":"CREATED","rawExternalStatus":"{\"state\":\"closed\"}"}"#,
    );

    let output = mirror_cmd(home.path())
        .args(["status", "--json"])
        .arg(&running)
        .arg(&closed)
        .output()
        .unwrap();
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(rows[0]["effectiveStatus"], "IMPLEMENTING");
    assert_eq!(rows[0]["rule"], "execution_dominates");
    assert_eq!(rows[1]["effectiveStatus"], "CREATED");
    assert_eq!(rows[1]["drift"]["hasDrift"], true);
    assert_eq!(rows[1]["drift"]["severity"], "warning");
}

#[test]
fn status_rejects_unknown_local_status() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let file = write(&work, "bad.yaml", "localStatus: SHIPPED\n");

    mirror_cmd(home.path())
        .arg("status")
        .arg(&file)
        .assert()
        .failure()
        .stderr(contains("bad.yaml").and(contains("cannot load mirror state")));
}
