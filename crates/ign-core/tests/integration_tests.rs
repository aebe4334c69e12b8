//! Integration tests for ign-core's public domain API.

use ign_core::domain::{
    DirectiveExtractor, IgnoreMatcher, ProjectVariables, RegexDirectiveExtractor, TemplateManifest,
    TemplateRef, VarValue, reconcile,
};

const MANIFEST_V1: &str = r#"{
    "name": "svc",
    "version": "1.0.0",
    "variables": {
        "name": { "type": "string", "required": true },
        "port": { "type": "int", "default": 8080 }
    },
    "settings": { "ignore": ["*.log", "target"] }
}"#;

const MANIFEST_V2: &str = r#"{
    "name": "svc",
    "version": "2.0.0",
    "variables": {
        "name": { "type": "string", "required": true },
        "license": { "type": "string", "default": "MIT" }
    }
}"#;

fn manifest(json: &str) -> TemplateManifest {
    let manifest: TemplateManifest = serde_json::from_str(json).unwrap();
    manifest.validate().unwrap();
    manifest
}

#[test]
fn manifest_ignore_rules_and_reserved_paths() {
    let matcher = manifest(MANIFEST_V1).ignore_matcher();

    assert!(matcher.excludes("logs/debug.log"));
    assert!(matcher.excludes("target/release/app"));
    assert!(matcher.excludes("ign.json"));
    assert!(matcher.excludes(".git/HEAD"));
    assert!(!matcher.excludes("src/main.rs"));
    assert!(!matcher.excludes("docs/ign.json"));
    assert!(!IgnoreMatcher::empty().excludes("target/x"));
}

#[test]
fn upgrade_drops_removed_values_and_defaults_new_ones() {
    let v2 = manifest(MANIFEST_V2).declarations();

    let mut existing = ProjectVariables::new();
    existing.insert("name".into(), VarValue::String("demo".into()));
    existing.insert("port".into(), VarValue::Int(9000));

    let result = reconcile::diff(existing.keys().map(String::as_str), &v2);
    assert_eq!(result.new_names, vec!["license"]);
    assert_eq!(result.removed_names, vec!["port"]);

    let merged = reconcile::merge_values(&existing, &result, &v2, &ProjectVariables::new());
    assert_eq!(merged.len(), 2);
    assert_eq!(merged["name"], VarValue::String("demo".into()));
    assert_eq!(merged["license"], VarValue::String("MIT".into()));
}

#[test]
fn supplied_values_win_over_new_defaults() {
    let v2 = manifest(MANIFEST_V2).declarations();
    let existing = ProjectVariables::from([("name".into(), VarValue::String("demo".into()))]);
    let supplied = ProjectVariables::from([("license".into(), VarValue::String("Apache-2.0".into()))]);

    let result = reconcile::diff(existing.keys().map(String::as_str), &v2);
    let merged = reconcile::merge_values(&existing, &result, &v2, &supplied);
    assert_eq!(merged["license"], VarValue::String("Apache-2.0".into()));
}

#[test]
fn default_of_wrong_type_is_rejected() {
    let bad: TemplateManifest = serde_json::from_str(
        r#"{ "name": "svc", "variables": { "port": { "type": "int", "default": "eighty" } } }"#,
    )
    .unwrap();
    assert!(bad.validate().is_err());
}

#[test]
fn extracted_directives_feed_manifest_declarations() {
    let extractor = RegexDirectiveExtractor::new();
    let directives = extractor
        .extract("listen on @ign-var:port:int=8080@ as @ign-var:name@")
        .unwrap();
    assert_eq!(directives.len(), 2);
}

#[test]
fn template_references() {
    assert_eq!(
        TemplateRef::parse("./tpl").unwrap().as_local(),
        Some("./tpl".as_ref())
    );
    assert_eq!(
        TemplateRef::parse("github.com/acme/templates/go@v1")
            .unwrap()
            .to_string(),
        "github.com/acme/templates/go@v1"
    );
    assert!(TemplateRef::parse("acme/templates").is_err());
    assert!(TemplateRef::parse("").is_err());
}
