//! Tests for the `templar` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use templar_cli::test_utils::TemplateFixture;

/// Templates plus a config file pointing `templates_dir` at them.
struct CliFixture {
    templates: TemplateFixture,
    config_dir: TempDir,
}

impl CliFixture {
    fn new() -> Self {
        let templates = TemplateFixture::new().unwrap();
        templates.template("core", json!({"license": "MIT", "year": "2024"})).unwrap();
        templates.file("core", "LICENSE", "MIT").unwrap();
        templates
            .template("app", json!({"project_slug": "demo", "license": "GPL", "_bases": ["core"]}))
            .unwrap();
        templates.file("app", "README.md", "readme").unwrap();

        let config_dir = TempDir::new().unwrap();
        let config = format!("templates_dir = '{}'\n", templates.root().display());
        fs::write(config_dir.path().join("config.toml"), config).unwrap();

        Self {
            templates,
            config_dir,
        }
    }

    fn config_path(&self) -> PathBuf {
        self.config_dir.path().join("config.toml")
    }

    fn templar(&self) -> Command {
        let mut cmd = Command::cargo_bin("templar").unwrap();
        cmd.env_remove("TEMPLAR_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .arg("--config")
            .arg(self.config_path());
        cmd
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn test_resolve_text() {
    let fixture = CliFixture::new();
    fixture
        .templar()
        .args(["resolve", &path_arg(&fixture.templates.path("app"))])
        .assert()
        .success()
        .stdout(predicate::str::contains("Template: app"))
        .stdout(predicate::str::contains("1. core"))
        .stdout(predicate::str::contains("\"license\": \"GPL\""));
}

#[test]
fn test_resolve_json() {
    let fixture = CliFixture::new();
    let output = fixture
        .templar()
        .args(["resolve", &path_arg(&fixture.templates.path("app")), "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["template"], "app");
    assert_eq!(parsed["resolution_order"][0]["id"], "core");
    let keys: Vec<&String> = parsed["fields"].as_object().unwrap().keys().collect();
    assert_eq!(
        keys,
        ["project_slug", "license", "year", "_bases", "_copy_without_render", "__prompts__"]
    );
}

#[test]
fn test_resolve_by_name_uses_templates_dir() {
    let fixture = CliFixture::new();
    fixture
        .templar()
        .args(["resolve", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. core"));
}

#[test]
fn test_resolve_rejects_unknown_format() {
    let fixture = CliFixture::new();
    fixture
        .templar()
        .args(["resolve", "app", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid format 'yaml'"));
}

#[test]
fn test_resolve_unknown_template() {
    let fixture = CliFixture::new();
    fixture
        .templar()
        .args(["resolve", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not be located"))
        .stderr(predicate::str::contains("Cannot locate template 'missing'"));
}

#[test]
fn test_tree() {
    let fixture = CliFixture::new();
    fixture
        .templar()
        .args(["tree", "app"])
        .assert()
        .success()
        .stdout(predicate::eq("app\n└── core\n"));
}

#[test]
fn test_tree_with_cycle_fails() {
    let fixture = CliFixture::new();
    fixture.templates.template("ping", json!({"_bases": ["pong"]})).unwrap();
    fixture.templates.template("pong", json!({"_bases": ["ping"]})).unwrap();

    fixture
        .templar()
        .args(["tree", "ping"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("(circular reference)"))
        .stderr(predicate::str::contains("Circular inheritance detected: ping → pong → ping"));
}

#[test]
fn test_resolve_with_cycle_fails() {
    let fixture = CliFixture::new();
    fixture.templates.template("ping", json!({"_bases": ["pong"]})).unwrap();
    fixture.templates.template("pong", json!({"_bases": ["ping"]})).unwrap();

    fixture
        .templar()
        .args(["resolve", "ping"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Circular inheritance detected"))
        .stderr(predicate::str::contains("suggestion"));
}

#[test]
fn test_merge_writes_flattened_template() {
    let fixture = CliFixture::new();
    let output = TempDir::new().unwrap();

    fixture
        .templar()
        .args(["merge", "app", "--output", &path_arg(output.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 base template(s) merged"));

    let merged = output.path().join("app");
    assert!(merged.join("README.md").is_file());
    assert!(!merged.join("LICENSE").exists());
    let definitions = TemplateFixture::definitions_at(&merged).unwrap();
    assert_eq!(definitions.public_keys(), ["project_slug", "license", "year"]);
    assert_eq!(definitions.get("license"), Some(&json!("GPL")));

    // the source template is untouched
    let source = TemplateFixture::definitions_at(&fixture.templates.path("app")).unwrap();
    assert_eq!(source.public_keys(), ["project_slug", "license"]);

    fixture
        .templar()
        .args(["merge", "app", "--output", &path_arg(output.path())])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    fixture
        .templar()
        .args(["merge", "app", "--output", &path_arg(output.path()), "--force"])
        .assert()
        .success();
}

#[test]
fn test_merge_failure_leaves_no_copy() {
    let fixture = CliFixture::new();
    fixture.templates.template("ping", json!({"_bases": ["pong"]})).unwrap();
    fixture.templates.template("pong", json!({"_bases": ["ping"]})).unwrap();
    let output = TempDir::new().unwrap();

    fixture
        .templar()
        .args(["merge", "ping", "--output", &path_arg(output.path())])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Circular inheritance detected"));
    assert!(!output.path().join("ping").exists());
}

#[test]
fn test_replay() {
    let fixture = CliFixture::new();
    let project = TempDir::new().unwrap();
    fs::write(
        project.path().join(".templar-replay.json"),
        r#"{"project_slug": "demo", "license": "GPL", "_bases": ["core"]}"#,
    )
    .unwrap();

    fixture
        .templar()
        .args(["replay", &path_arg(project.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains("project_slug = demo"))
        .stdout(predicate::str::contains("_bases").not());

    let output = fixture
        .templar()
        .args(["replay", &path_arg(project.path()), "--format", "json", "--all"])
        .output()
        .unwrap();
    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed, json!({"project_slug": "demo", "license": "GPL", "_bases": ["core"]}));
}

#[test]
fn test_replay_missing() {
    let fixture = CliFixture::new();
    let project = TempDir::new().unwrap();
    fixture
        .templar()
        .args(["replay", &path_arg(project.path())])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No replay file found"));
}

#[test]
fn test_config_path_and_show() {
    let fixture = CliFixture::new();
    fixture
        .templar()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(path_arg(&fixture.config_path())));

    fixture
        .templar()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Global Configuration"))
        .stdout(predicate::str::contains(path_arg(fixture.templates.root())));
}

#[test]
fn test_config_init() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("nested").join("config.toml");

    Command::cargo_bin("templar")
        .unwrap()
        .env_remove("TEMPLAR_CONFIG")
        .args(["config", "init", "--config", &path_arg(&config_path)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created global config"));
    let written = fs::read_to_string(&config_path).unwrap();
    assert!(written.contains("[abbreviations]"));

    Command::cargo_bin("templar")
        .unwrap()
        .env("TEMPLAR_CONFIG", &config_path)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}
