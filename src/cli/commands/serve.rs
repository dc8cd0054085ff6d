//! `serve` command handler
//!
//! Runs one drill session behind the HTTP control API until a signal or
//! `POST /shutdown` cancels it.

use tokio_util::sync::CancellationToken;

use crate::api;
use crate::cli::args::ServeArgs;
use crate::error::CyberDrillError;
use crate::session::Session;

/// Start a session and serve the control API.
///
/// # Errors
///
/// Returns a config error if the session configuration is invalid, or a
/// server error if the listener cannot be bound or the serve loop fails.
pub async fn run(args: &ServeArgs, cancel: CancellationToken) -> Result<(), CyberDrillError> {
    let config = args.session.load_config()?;

    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    let (listener, addr) = api::bind(&args.bind).await?;
    let session = Session::start(&config);
    tracing::info!(
        %addr,
        stealth = %config.stealth,
        mode = %config.mode,
        autostart = config.autostart,
        "control API listening"
    );

    let result = api::serve(listener, session.clone(), cancel).await;

    // Idempotent; a no-op when /shutdown already stopped the loop.
    session.stop().await;
    tracing::info!("drill session ended");
    result.map_err(Into::into)
}
