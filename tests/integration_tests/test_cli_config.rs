// integration tests for the config command

use crate::common::*;
use std::fs;

/// helper to run ctlcond config command (text output)
fn run_config(dir: &std::path::Path, args: &[&str]) -> std::process::Output {
    // use --no-json to get text output (stdout is piped in tests, which auto-enables JSON)
    let mut cmd_args = vec!["--no-json", "config"];
    cmd_args.extend(args);
    run_ctlcond(dir, &cmd_args)
}

#[test]
fn test_config_show_defaults_without_file() {
    let dir = create_test_dir(&unique_test_name("config_show"));

    let output = run_config(&dir, &["show"]);
    assert!(output.status.success());

    let shown: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(shown["engine"]["nested_relation"], "fixed");
    assert_eq!(shown["engine"]["cache"], true);

    cleanup_test_dir(&dir);
}

#[test]
fn test_config_path_uses_override() {
    let dir = create_test_dir(&unique_test_name("config_path"));

    let output = run_config(&dir, &["path"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), dir.join("config.json").display().to_string());

    cleanup_test_dir(&dir);
}

#[test]
fn test_config_set_persists_value() {
    let dir = create_test_dir(&unique_test_name("config_set"));

    let output = run_config(&dir, &["set", "engine.nested_relation", "declared"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Set engine.nested_relation = declared"));

    let content = fs::read_to_string(dir.join("config.json")).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(saved["engine"]["nested_relation"], "declared");

    cleanup_test_dir(&dir);
}

#[test]
fn test_config_set_invalid_value() {
    let dir = create_test_dir(&unique_test_name("config_set_invalid"));

    let output = run_config(&dir, &["set", "engine.cache", "maybe"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid boolean value"));
    assert!(!dir.join("config.json").exists());

    cleanup_test_dir(&dir);
}

#[test]
fn test_config_verify_valid() {
    let dir = create_test_dir(&unique_test_name("config_verify_valid"));
    write_file(
        &dir,
        "config.json",
        r#"{ engine: { nested_relation: "declared", cache: false } }"#,
    );

    let output = run_config(&dir, &["verify"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Configuration is valid"));

    cleanup_test_dir(&dir);
}

#[test]
fn test_config_verify_reports_errors() {
    let dir = create_test_dir(&unique_test_name("config_verify_errors"));
    write_file(
        &dir,
        "config.json",
        r#"{ engine: { nested_relation: "sometimes", cache: "yes" }, extra: 1 }"#,
    );

    let output = run_config(&dir, &["verify"]);
    assert_eq!(output.status.code(), Some(5));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3 error(s)"), "stdout: {}", stdout);
    assert!(stdout.contains("unknown key 'extra'"));
    assert!(stdout.contains("engine.nested_relation"));
    assert!(stdout.contains("engine.cache"));

    cleanup_test_dir(&dir);
}

#[test]
fn test_declared_nested_relation_changes_evaluation() {
    let dir = create_test_dir(&unique_test_name("config_declared"));
    let rules = write_file(
        &dir,
        "rules.json5",
        r#"{ controls: [ {
            control: "caption",
            conditions: { terms: [ { relation: "or", terms: [
                { name: "layout", value: "grid" },
                { name: "layout", value: "masonry" },
            ] } ] },
        }, {
            control: "caption",
            action: "hide",
            conditions: { terms: [] },
        } ] }"#,
    );
    let settings = write_file(&dir, "settings.json5", r#"{ layout: "grid" }"#);
    let args = [
        "--json",
        "check",
        "-r",
        rules.to_str().unwrap(),
        "-s",
        settings.to_str().unwrap(),
    ];

    // fixed: the nested group is AND-ed, so the show rule fails and the
    // catch-all hide rule decides
    let output = run_ctlcond(&dir, &args);
    assert_eq!(json_result(&output)["controls"][0]["visible"], false);

    let output = run_config(&dir, &["set", "engine.nested_relation", "declared"]);
    assert!(output.status.success());

    let output = run_ctlcond(&dir, &args);
    assert_eq!(json_result(&output)["controls"][0]["visible"], true);

    cleanup_test_dir(&dir);
}

#[test]
fn test_config_schema_output() {
    let dir = create_test_dir(&unique_test_name("config_schema"));
    let path = dir.join("rules.schema.json");

    let output = run_config(&dir, &["schema", "--output", path.to_str().unwrap()]);
    assert!(output.status.success());

    let schema: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(schema["title"], "ctlcond rule file");

    cleanup_test_dir(&dir);
}
