//! Shared integration-test harness for running the `cyberdrill` binary as a
//! child process.

#![allow(dead_code)]

use std::io::Write;
use std::process::{Output, Stdio};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};

/// Default timeout for waiting on the child process.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_cyberdrill")
}

/// Runs a one-shot command with `input` on stdin and collects its output.
#[allow(clippy::missing_panics_doc)]
pub fn run_command(args: &[&str], input: &str) -> Output {
    let mut child = std::process::Command::new(bin())
        .args(args)
        .env_remove("CYBERDRILL_CONFIG")
        .env_remove("CYBERDRILL_STEALTH")
        .env_remove("CYBERDRILL_SEED")
        .env_remove("CYBERDRILL_LOG_LEVEL")
        .env_remove("CYBERDRILL_LOG_FORMAT")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn cyberdrill");

    child
        .stdin
        .take()
        .expect("stdin not captured")
        .write_all(input.as_bytes())
        .expect("failed to write stdin");

    child.wait_with_output().expect("failed to wait on cyberdrill")
}

/// A running `cyberdrill serve` process with an HTTP client.
///
/// The child process is killed on drop via `kill_on_drop(true)`.
pub struct DrillServer {
    child: Child,
    // Held so the child's log pipe stays open.
    _stderr: BufReader<ChildStderr>,
    base_url: String,
    client: reqwest::Client,
}

impl DrillServer {
    /// Starts `serve` on an ephemeral loopback port with a manual, seeded
    /// session.
    ///
    /// Reads stderr until the "control API listening" line to discover the
    /// port.
    #[allow(clippy::missing_panics_doc)]
    pub async fn spawn() -> Self {
        let mut child = Command::new(bin())
            .args([
                "serve",
                "--bind",
                "127.0.0.1:0",
                "--manual",
                "--seed",
                "1",
                "--color",
                "never",
                "-v",
            ])
            .env_remove("CYBERDRILL_LOG_LEVEL")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .expect("failed to spawn cyberdrill serve");

        let stderr = child.stderr.take().expect("stderr not captured");
        let mut reader = BufReader::new(stderr);
        let mut line = String::new();
        let mut port: Option<u16> = None;

        let deadline = tokio::time::Instant::now() + DEFAULT_TIMEOUT;
        while tokio::time::Instant::now() < deadline {
            line.clear();
            let read = tokio::time::timeout(DEFAULT_TIMEOUT, reader.read_line(&mut line))
                .await
                .expect("timed out waiting for server startup")
                .expect("failed to read stderr");
            assert!(read > 0, "server exited before printing its address");

            if line.contains("control API listening") {
                if let Some(start) = line.find("127.0.0.1:") {
                    let digits: String = line[start + "127.0.0.1:".len()..]
                        .chars()
                        .take_while(char::is_ascii_digit)
                        .collect();
                    port = digits.parse().ok();
                }
                break;
            }
        }

        let port = port.expect("failed to discover control API port from stderr");
        Self {
            child,
            _stderr: reader,
            base_url: format!("http://127.0.0.1:{port}"),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends `GET path`.
    #[allow(clippy::missing_panics_doc)]
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    /// Sends `POST path` with a JSON body.
    #[allow(clippy::missing_panics_doc)]
    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST failed")
    }

    /// Waits for the process to exit and returns its exit code.
    #[allow(clippy::missing_panics_doc)]
    pub async fn wait(mut self) -> Option<i32> {
        tokio::time::timeout(DEFAULT_TIMEOUT, self.child.wait())
            .await
            .expect("server did not exit")
            .expect("wait failed")
            .code()
    }
}
