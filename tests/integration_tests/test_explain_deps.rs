// integration tests for the explain, deps and stats commands

use crate::common::*;

#[test]
fn test_explain_reports_evaluated_terms() {
    let dir = create_test_dir(&unique_test_name("explain_terms"));
    let rules = write_file(&dir, "rules.json5", LINK_RULES);
    let settings = write_file(
        &dir,
        "settings.json5",
        r#"{ background: { url: "" }, background_type: "classic" }"#,
    );

    let output = run_ctlcond(
        &dir,
        &[
            "--json",
            "explain",
            "-r",
            rules.to_str().unwrap(),
            "-s",
            settings.to_str().unwrap(),
            "overlay_color",
        ],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let result = json_result(&output);
    assert_eq!(result["control"], "overlay_color");
    assert_eq!(result["visible"], true);

    let conditions = result["conditions"].as_array().unwrap();
    assert_eq!(conditions.len(), 1);
    assert_eq!(conditions[0]["action"], "show");
    assert_eq!(conditions[0]["matched"], true);

    let terms = conditions[0]["terms"].as_array().unwrap();
    assert_eq!(terms.len(), 2);
    assert_eq!(terms[0]["current"], "");
    assert_eq!(terms[0]["result"], false);
    assert_eq!(terms[1]["current"], "classic");
    assert_eq!(terms[1]["result"], true);

    cleanup_test_dir(&dir);
}

#[test]
fn test_explain_undefined_setting_has_no_current() {
    let dir = create_test_dir(&unique_test_name("explain_undefined"));
    let rules = write_file(&dir, "rules.json5", LINK_RULES);

    let output = run_ctlcond(&dir, &["--json", "explain", "-r", rules.to_str().unwrap(), "url"]);
    assert!(output.status.success());

    let result = json_result(&output);
    let term = &result["conditions"][0]["terms"][0];
    assert!(term.get("current").is_none());
    assert_eq!(term["result"], false);
    assert_eq!(result["reason"], "no condition matched");

    cleanup_test_dir(&dir);
}

#[test]
fn test_explain_text_output() {
    let dir = create_test_dir(&unique_test_name("explain_text"));
    let rules = write_file(&dir, "rules.json5", LINK_RULES);
    let settings = write_file(&dir, "settings.json5", r#"{ link_type: "none" }"#);

    let output = run_ctlcond(
        &dir,
        &[
            "--no-json",
            "explain",
            "-r",
            rules.to_str().unwrap(),
            "-s",
            settings.to_str().unwrap(),
            "target",
        ],
    );
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("#0 hide when"), "stdout: {}", stdout);
    assert!(stdout.contains("-> matched"));
    assert!(stdout.contains("target: hidden"));

    cleanup_test_dir(&dir);
}

#[test]
fn test_deps_lists_base_setting_names() {
    let dir = create_test_dir(&unique_test_name("deps_all"));
    let rules = write_file(&dir, "rules.json5", LINK_RULES);

    let output = run_ctlcond(&dir, &["--json", "deps", "-r", rules.to_str().unwrap()]);
    assert!(output.status.success());

    let result = json_result(&output);
    assert_eq!(result["url"], serde_json::json!(["link_type"]));
    assert_eq!(result["target"], serde_json::json!(["link_type"]));
    // sub-keys collapse to the base setting name
    assert_eq!(
        result["overlay_color"],
        serde_json::json!(["background", "background_type"])
    );

    cleanup_test_dir(&dir);
}

#[test]
fn test_deps_filtered_by_setting() {
    let dir = create_test_dir(&unique_test_name("deps_setting"));
    let rules = write_file(&dir, "rules.json5", LINK_RULES);

    let output = run_ctlcond(
        &dir,
        &[
            "--no-json",
            "deps",
            "-r",
            rules.to_str().unwrap(),
            "--setting",
            "link_type",
        ],
    );
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let controls: Vec<&str> = stdout.lines().collect();
    assert_eq!(controls, ["url", "target"]);

    cleanup_test_dir(&dir);
}

#[test]
fn test_stats_counts_rules() {
    let dir = create_test_dir(&unique_test_name("stats"));
    let rules = write_file(&dir, "rules.json5", LINK_RULES);

    let output = run_ctlcond(&dir, &["--json", "stats", "-r", rules.to_str().unwrap()]);
    assert!(output.status.success());

    let result = json_result(&output);
    assert_eq!(result["controls"], 3);
    assert_eq!(result["conditions"], 3);
    assert_eq!(result["avg_conditions_per_control"], 1.0);

    cleanup_test_dir(&dir);
}
