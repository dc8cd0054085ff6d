//! Metrics collection for `cyberdrill`.
//!
//! Prometheus-compatible metrics with typed convenience functions. Every
//! label value comes from a closed set (mode names, command kinds, HTTP
//! route names), so cardinality is bounded by construction.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::CyberDrillError;
use crate::scenario::Mode;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without
/// an HTTP endpoint.
///
/// # Errors
///
/// Returns `CyberDrillError::Io` if the recorder or HTTP listener
/// cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), CyberDrillError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| CyberDrillError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "cyberdrill_steps_total",
        "Simulated attacker steps generated"
    );
    describe_counter!(
        "cyberdrill_successes_total",
        "Simulated attacker successes"
    );
    describe_counter!(
        "cyberdrill_commands_total",
        "Defensive commands applied, by kind"
    );
    describe_counter!(
        "cyberdrill_api_requests_total",
        "Control API requests, by route"
    );
    describe_gauge!(
        "cyberdrill_blocked",
        "1 while the attacker is blocked, as last set by any session"
    );
}

/// Records one generated step.
pub fn record_step(mode: Mode, success: bool) {
    counter!("cyberdrill_steps_total", "mode" => mode.as_str()).increment(1);
    if success {
        counter!("cyberdrill_successes_total", "mode" => mode.as_str()).increment(1);
    }
}

/// Records an applied command by kind.
pub fn record_command(kind: &'static str) {
    counter!("cyberdrill_commands_total", "command" => kind).increment(1);
}

/// Records a control API request by route.
pub fn record_api_request(route: &'static str) {
    counter!("cyberdrill_api_requests_total", "route" => route).increment(1);
}

/// Sets the blocked gauge.
///
/// The gauge is process-wide and unlabeled: with several sessions in one
/// process it reports whichever session blocked or reset last. The
/// per-kind `cyberdrill_commands_total` counters aggregate correctly.
pub fn set_blocked(blocked: bool) {
    gauge!("cyberdrill_blocked").set(if blocked { 1.0 } else { 0.0 });
}
