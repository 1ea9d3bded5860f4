// integration tests for the check command

use crate::common::*;

#[test]
fn test_check_all_controls_json() {
    let dir = create_test_dir(&unique_test_name("check_all"));
    let rules = write_file(&dir, "rules.json5", LINK_RULES);
    let settings = write_file(
        &dir,
        "settings.json5",
        r#"{ link_type: "custom", background: { url: "" }, background_type: "video" }"#,
    );

    let output = run_ctlcond(
        &dir,
        &[
            "--json",
            "check",
            "--rules",
            rules.to_str().unwrap(),
            "--settings",
            settings.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let result = json_result(&output);
    let controls = result["controls"].as_array().unwrap();
    assert_eq!(controls.len(), 3);

    assert_eq!(controls[0]["control"], "url");
    assert_eq!(controls[0]["visible"], true);
    assert_eq!(controls[0]["trigger"], 0);
    assert_eq!(controls[0]["reason"], "condition #0 matched (action: show)");

    // target only hides for "none", nothing matched
    assert_eq!(controls[1]["control"], "target");
    assert_eq!(controls[1]["visible"], true);
    assert_eq!(controls[1]["reason"], "no condition matched");

    // show rule that did not match leaves the control visible
    assert_eq!(controls[2]["control"], "overlay_color");
    assert_eq!(controls[2]["visible"], true);
    assert!(controls[2].get("trigger").is_none());

    cleanup_test_dir(&dir);
}

#[test]
fn test_check_hidden_control_text_output() {
    let dir = create_test_dir(&unique_test_name("check_hidden"));
    let rules = write_file(&dir, "rules.json5", LINK_RULES);
    let settings = write_file(&dir, "settings.json5", r#"{ link_type: "none" }"#);

    let output = run_ctlcond(
        &dir,
        &[
            "--no-json",
            "check",
            "-r",
            rules.to_str().unwrap(),
            "-s",
            settings.to_str().unwrap(),
            "target",
        ],
    );
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        "target: hidden (condition #0 matched (action: hide))"
    );

    cleanup_test_dir(&dir);
}

#[test]
fn test_check_fail_hidden_exit_code() {
    let dir = create_test_dir(&unique_test_name("check_fail_hidden"));
    let rules = write_file(&dir, "rules.json5", LINK_RULES);
    let settings = write_file(&dir, "settings.json5", r#"{ link_type: "none" }"#);

    let output = run_ctlcond(
        &dir,
        &[
            "--quiet",
            "check",
            "-r",
            rules.to_str().unwrap(),
            "-s",
            settings.to_str().unwrap(),
            "--fail-hidden",
            "target",
        ],
    );
    assert_eq!(output.status.code(), Some(6));
    assert!(output.stdout.is_empty());

    cleanup_test_dir(&dir);
}

#[test]
fn test_check_without_settings_treats_everything_undefined() {
    let dir = create_test_dir(&unique_test_name("check_no_settings"));
    let rules = write_file(&dir, "rules.json5", LINK_RULES);

    let output = run_ctlcond(&dir, &["--json", "check", "-r", rules.to_str().unwrap(), "url"]);
    assert!(output.status.success());

    let result = json_result(&output);
    assert_eq!(result["controls"][0]["visible"], true);
    assert_eq!(result["controls"][0]["reason"], "no condition matched");

    cleanup_test_dir(&dir);
}

#[test]
fn test_check_unknown_control_suggests_names() {
    let dir = create_test_dir(&unique_test_name("check_unknown"));
    let rules = write_file(&dir, "rules.json5", LINK_RULES);

    let output = run_ctlcond(&dir, &["--json", "check", "-r", rules.to_str().unwrap(), "urll"]);
    assert_eq!(output.status.code(), Some(2));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let response: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(response["error"]["code"], -32002);
    assert_eq!(response["error"]["data"]["suggestions"][0], "url");

    cleanup_test_dir(&dir);
}

#[test]
fn test_check_invalid_rule_file() {
    let dir = create_test_dir(&unique_test_name("check_bad_rules"));
    let rules = write_file(
        &dir,
        "rules.json5",
        r#"{ controls: [ { control: "url", condition: { "": 1 } } ] }"#,
    );

    let output = run_ctlcond(&dir, &["--no-json", "check", "-r", rules.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(3));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("controls[0].condition: shorthand key must not be empty"),
        "stderr: {}",
        stderr
    );

    cleanup_test_dir(&dir);
}

#[test]
fn test_check_missing_rule_file() {
    let dir = create_test_dir(&unique_test_name("check_missing_rules"));
    let missing = dir.join("missing.json5");

    let output = run_ctlcond(&dir, &["--no-json", "check", "-r", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(3));

    cleanup_test_dir(&dir);
}
