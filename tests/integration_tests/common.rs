// shared utilities for integration tests

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

// counter for unique test directory names
static TEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// link control rules shared by most tests
pub const LINK_RULES: &str = r#"{
    controls: [
        // custom url only for custom links
        { control: "url", condition: { link_type: "custom" } },
        { control: "target", action: "hide", condition: { link_type: "none" } },
        {
            control: "overlay_color",
            conditions: {
                relation: "or",
                terms: [
                    { name: "background[url]", operator: "!==", value: "" },
                    { name: "background_type", operator: "in", value: ["classic", "gradient"] },
                ],
            },
        },
    ],
}"#;

/// create a unique test directory name
pub fn unique_test_name(prefix: &str) -> String {
    let count = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let thread_id = std::thread::current().id();
    format!("{}_{:?}_{}", prefix, thread_id, count)
        .replace(['(', ')'], "")
}

/// create a temporary directory for test files
pub fn create_test_dir(name: &str) -> PathBuf {
    let base = env::temp_dir().join("ctlcond_integration_tests");
    let dir = base.join(name);

    // clean up if exists
    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }

    fs::create_dir_all(&dir).expect("Failed to create test directory");
    dir
}

/// clean up a test directory
pub fn cleanup_test_dir(path: &Path) {
    if path.exists() {
        fs::remove_dir_all(path).ok();
    }
}

/// write a file into the test directory and return its path
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

/// get path to the built ctlcond binary
pub fn ctlcond_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ctlcond"))
}

/// run ctlcond with an isolated config path and capture output
pub fn run_ctlcond(dir: &Path, args: &[&str]) -> std::process::Output {
    let config_path = dir.join("config.json");

    Command::new(ctlcond_binary_path())
        .arg("--config")
        .arg(&config_path)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run ctlcond")
}

/// parse the JSON-RPC result of a successful run
pub fn json_result(output: &std::process::Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let response: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("stdout should be JSON");
    assert_eq!(response["jsonrpc"], "2.0");
    response["result"].clone()
}
