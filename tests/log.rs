use tempfile::TempDir;
use tracing::info;

#[test]
fn init_writes_json_lines_to_log_file() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("nested/echo-lsp.log");

    echo_lsp::log::init(&log_path, "info").unwrap();
    info!("log file test message");

    let contents = std::fs::read_to_string(&log_path).unwrap();
    let line = contents
        .lines()
        .find(|line| line.contains("log file test message"))
        .expect("message should be logged");
    let entry: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(entry["level"], "INFO");
    assert_eq!(entry["fields"]["message"], "log file test message");

    // A second subscriber cannot be installed
    assert!(echo_lsp::log::init(&log_path, "info").is_err());
}
