//! Integration tests for the export projector.

use std::fs;
use std::path::Path;

use komodo_settings::config::{
    ConfigSection, ConfigValue, LeafSpec, Schema, Selector, project, read_document,
    render_exports, to_toml_string,
};
use tempfile::TempDir;

fn lines(document: &ConfigSection) -> Vec<String> {
    project(document).iter().map(ToString::to_string).collect()
}

#[test]
fn flatten_scenario_from_each_format() {
    let temp = TempDir::new().unwrap();
    let files = [
        ("doc.toml", "[discord]\ntoken = \"abc\"\n\n[discord.retry]\nmax_attempts = 3\n"),
        ("doc.yaml", "discord:\n  token: abc\n  retry:\n    max_attempts: 3\n"),
        ("doc.json", r#"{"discord": {"token": "abc", "retry": {"max_attempts": 3}}}"#),
    ];

    for (name, content) in files {
        let path = temp.path().join(name);
        fs::write(&path, content).unwrap();
        let document = read_document(&path).unwrap();
        assert_eq!(
            lines(&document),
            vec![
                "export KOMODO_DISCORD_TOKEN=\"abc\"",
                "export KOMODO_DISCORD_RETRY_MAX_ATTEMPTS=3",
            ],
            "{name}"
        );
    }
}

#[test]
fn flatten_generated_komodo_document() {
    let schema = Schema::komodo().unwrap();
    let defaults = schema.defaults(Selector::Production);
    let text = to_toml_string(&defaults).unwrap();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.toml");
    fs::write(&path, text).unwrap();

    let exports = render_exports(&project(&read_document(&path).unwrap()));
    let names: Vec<&str> = exports
        .lines()
        .filter_map(|l| l.strip_prefix("export "))
        .filter_map(|l| l.split('=').next())
        .collect();
    let expected: Vec<&str> = schema.leaves().iter().map(|l| l.variable.as_str()).collect();
    assert_eq!(names, expected);
    assert!(exports.contains("export KOMODO_DATABASE_PORT=5432\n"));
    assert!(exports.contains("export KOMODO_LOGGING_STREAM_ANSI=true\n"));
    assert!(exports.contains("export KOMODO_VERSION=\"0.1.0\"\n"));
}

#[test]
fn flatten_keeps_arbitrary_keys() {
    // Arbitrary documents need not match any schema.
    let extra = ConfigSection::new().with("ratio", ConfigValue::from(0.5));
    let document = ConfigSection::new()
        .with("extra", extra)
        .with("top", ConfigValue::from(false));
    assert_eq!(
        lines(&document),
        vec!["export KOMODO_EXTRA_RATIO=0.5", "export KOMODO_TOP=false"]
    );
}

#[test]
fn schema_defaults_export_in_schema_order() {
    let schema = Schema::builder()
        .section("b", |s| s.leaf("x", LeafSpec::string("q\"uote")))
        .section("a", |s| s.leaf("y", LeafSpec::integer(-1)))
        .build()
        .unwrap();
    assert_eq!(
        lines(&schema.defaults(Selector::Production)),
        vec!["export KOMODO_B_X=\"q\\\"uote\"", "export KOMODO_A_Y=-1"]
    );
}

#[test]
fn unsupported_extension_is_rejected() {
    assert!(read_document(Path::new("settings.ini")).is_err());
}
