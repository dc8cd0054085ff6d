mod common;

use std::io::Write;

use serde_json::json;

use common::{DrillServer, run_command};

// ============================================================================
// version command
// ============================================================================

#[test]
fn version_human() {
    let output = run_command(&["version"], "");
    assert!(
        output.status.success(),
        "version should exit 0: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.starts_with("cyberdrill "),
        "version output should name the binary: {stdout}"
    );
    assert!(
        stdout.contains('.'),
        "version output should contain a version number: {stdout}"
    );
}

#[test]
fn version_json() {
    let output = run_command(&["version", "--format", "json"], "");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("version JSON should be valid");
    assert_eq!(parsed["name"], "cyberdrill");
    assert!(parsed.get("version").is_some(), "missing version: {stdout}");
}

// ============================================================================
// console command
// ============================================================================

#[test]
fn console_block_drill() {
    let output = run_command(
        &["console", "--manual", "--seed", "4", "--quiet"],
        "step\nufw deny from 192.168.1.50 to any port 22\nstep\nstatus\nquit\n",
    );
    assert!(
        output.status.success(),
        "console should exit 0: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    assert!(lines.next().unwrap().starts_with("Attacker"));
    assert_eq!(
        lines.next().unwrap(),
        "✅ Firewall rule applied. Attacker blocked."
    );
    assert_eq!(lines.next().unwrap(), "Attacker already blocked.");

    let status: serde_json::Value =
        serde_json::from_str(&lines.collect::<Vec<_>>().join("\n")).expect("status JSON");
    assert_eq!(status["blocked"], true);
    assert_eq!(status["attempts"], 1);
    assert_eq!(status["log_count"], 2);
}

#[test]
fn console_ends_on_eof() {
    let output = run_command(&["console", "--manual", "--quiet"], "tail\n");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "No logs yet.\n");
}

#[test]
fn console_wrong_port_is_rejected() {
    let output = run_command(
        &["console", "--manual", "--target-port", "2222", "--quiet"],
        "ufw deny from 10.0.0.1 to any port 22\nstatus\n",
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("❌ Unrecognized or ineffective command."));
    assert!(stdout.contains("\"blocked\": false"));
}

#[test]
fn json_log_format_writes_json_to_stderr() {
    let output = run_command(
        &["console", "--manual", "--log-format", "json", "-v"],
        "quit\n",
    );
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let events: Vec<serde_json::Value> = stderr
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("not JSON ({e}): {l}")))
        .collect();
    assert!(
        events
            .iter()
            .any(|e| e["message"] == "console session started" && e["level"] == "INFO"),
        "missing start event: {stderr}"
    );
    assert!(output.stdout.is_empty());
}

// ============================================================================
// configuration errors
// ============================================================================

#[test]
fn missing_config_exits_with_config_code() {
    let output = run_command(
        &["console", "--config", "/nonexistent/drill.yaml", "--quiet"],
        "",
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("file not found"));
}

#[test]
fn invalid_config_exits_with_config_code() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "log_max_entries: 5\nlog_retain_entries: 50").unwrap();
    let path = file.path().to_str().unwrap();

    let output = run_command(&["console", "--config", path, "--quiet"], "");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("log_retain_entries"));
}

#[test]
fn bad_flag_value_is_usage_error() {
    let output = run_command(&["console", "--stealth", "extreme"], "");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("extreme"));
}

// ============================================================================
// serve command
// ============================================================================

#[tokio::test]
async fn serve_round_trip_and_shutdown() {
    let server = DrillServer::spawn().await;

    let resp = server.get("/attack").await;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let reply: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(reply["status"]["attempts"], 1);

    let resp = server
        .post(
            "/defend",
            &json!({"command": "ufw deny from 192.168.1.50 to any port 22"}),
        )
        .await;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let reply: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(reply["message"], "✅ Firewall rule applied. Attacker blocked.");
    assert_eq!(reply["status"]["blocked"], true);

    let status: serde_json::Value = server.get("/status").await.json().await.unwrap();
    assert_eq!(status["log_count"], 2);

    let resp = server.post("/shutdown", &json!({})).await;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let reply: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(reply["message"], "Server shutting down.");

    assert_eq!(server.wait().await, Some(0));
}
