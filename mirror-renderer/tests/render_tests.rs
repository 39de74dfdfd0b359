//! Hash stability and body rendering tests for `mirror-renderer`.

use mirror_core::{CanonicalRecord, LabelConfig};
use mirror_renderer::{extract_canonical_id, ContentRenderer, RenderedContent};
use rstest::rstest;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const BASE: &str = r#"{
    "canonicalId": "I-811",
    "title": "Mirror records into the tracker",
    "description": "Publish each committed unit of work.",
    "acceptanceCriteria": ["creates once", "updates afterwards"],
    "dependencies": ["I-700", "I-650"],
    "labels": ["area:sync", "prio:high"],
    "owner": {"team": "core", "oncall": "ops"},
    "updatedAt": "2026-01-01T10:00:00Z"
}"#;

fn renderer() -> ContentRenderer {
    ContentRenderer::new(&LabelConfig::default()).expect("renderer")
}

fn render_json(json: &str) -> RenderedContent {
    let record: CanonicalRecord = serde_json::from_str(json).expect("parse record");
    renderer().render(&record).expect("render")
}

// ---------------------------------------------------------------------------
// Hash stability
// ---------------------------------------------------------------------------

#[test]
fn hash_invariant_under_key_and_set_reordering() {
    let permuted = r#"{
        "updatedAt": "2026-01-01T10:00:00Z",
        "owner": {"oncall": "ops", "team": "core"},
        "labels": ["prio:high", "area:sync"],
        "dependencies": ["I-650", "I-700"],
        "acceptanceCriteria": ["creates once", "updates afterwards"],
        "description": "Publish each committed unit of work.",
        "title": "Mirror records into the tracker",
        "canonicalId": "I-811"
    }"#;
    let a = render_json(BASE);
    let b = render_json(permuted);
    assert_eq!(a.hash, b.hash);
    assert_eq!(a.body, b.body);
    assert_eq!(a.labels, b.labels);
}

#[test]
fn hash_ignores_volatile_timestamps() {
    let a = render_json(BASE);
    let b = render_json(&BASE.replace("2026-01-01T10:00:00Z", "2026-03-09T08:30:00Z"));
    assert_eq!(a.hash, b.hash);
}

#[test]
fn yaml_and_json_inputs_hash_identically() {
    let yaml = r#"
canonical_id: I-811
title: Mirror records into the tracker
description: Publish each committed unit of work.
acceptance_criteria:
  - creates once
  - updates afterwards
dependencies: [I-650, I-700]
labels: [prio:high, area:sync]
owner:
  team: core
  oncall: ops
"#;
    let record: CanonicalRecord = serde_yaml::from_str(yaml).expect("yaml");
    let from_yaml = renderer().render(&record).expect("render");
    assert_eq!(from_yaml.hash, render_json(BASE).hash);
}

#[rstest]
#[case::extra_criterion(
    r#""acceptanceCriteria": ["creates once", "updates afterwards"]"#,
    r#""acceptanceCriteria": ["creates once", "updates afterwards", "preserves labels"]"#
)]
#[case::reordered_criteria(
    r#""acceptanceCriteria": ["creates once", "updates afterwards"]"#,
    r#""acceptanceCriteria": ["updates afterwards", "creates once"]"#
)]
#[case::title(r#""title": "Mirror records into the tracker""#, r#""title": "Mirror records""#)]
#[case::new_label(r#""labels": ["area:sync", "prio:high"]"#, r#""labels": ["area:sync", "prio:low"]"#)]
#[case::nested_extra(r#""team": "core""#, r#""team": "platform""#)]
fn semantic_change_changes_hash(#[case] from: &str, #[case] to: &str) {
    let changed = BASE.replace(from, to);
    assert_ne!(changed, BASE, "fixture replacement must apply");
    assert_ne!(render_json(BASE).hash, render_json(&changed).hash);
}

#[test]
fn whitespace_only_edit_keeps_content_and_hash() {
    let padded = BASE
        .replace(r#""Mirror records into the tracker""#, r#""  Mirror records into the tracker ""#)
        .replace(r#""Publish each committed unit of work.""#, r#""Publish each committed unit of work.\n\n""#)
        .replace(r#"["creates once", "updates afterwards"]"#, r#"[" creates once", "updates afterwards ", "  "]"#)
        .replace(r#"["area:sync", "prio:high"]"#, r#"["area:sync ", " prio:high"]"#);
    assert_ne!(padded, BASE, "fixture replacement must apply");

    let base = render_json(BASE);
    let edited = render_json(&padded);
    assert_eq!(edited.title, base.title);
    assert_eq!(edited.body, base.body);
    assert_eq!(edited.labels, base.labels);
    assert_eq!(edited.hash, base.hash);
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

#[test]
fn body_lists_sections_and_marker() {
    let out = render_json(BASE);
    assert!(out.body.starts_with("Publish each committed unit of work."));
    assert!(out.body.contains("## Acceptance Criteria"));
    assert!(out.body.contains("- [ ] creates once\n- [ ] updates afterwards"));
    assert!(out.body.contains("- I-650\n- I-700"), "dependencies sorted");
    assert!(out.body.contains("- **owner:** {\"oncall\":\"ops\",\"team\":\"core\"}"));
    assert!(!out.body.contains("2026-01-01"), "timestamps stay out of the body");
    assert_eq!(
        extract_canonical_id(&out.body).map(|id| id.0),
        Some("I-811".to_string())
    );
}

#[test]
fn render_is_deterministic() {
    let record: CanonicalRecord = serde_json::from_str(BASE).expect("parse");
    let r = renderer();
    assert_eq!(r.render(&record).unwrap(), r.render(&record).unwrap());
}
