//! HTTP control API.
//!
//! Thin axum mapping from routes to [`Session`] calls. Request bodies are
//! parsed leniently: a missing or malformed body is treated as an empty
//! request, so the session answers with its ordinary rejection message
//! rather than the framework answering with a 4xx.
//!
//! | Route | Session call |
//! |-------|--------------|
//! | `GET /attack` | [`Session::step`] |
//! | `POST /defend` `{"command"}` | [`Session::apply_command`] |
//! | `GET /status` | [`Session::status`] |
//! | `POST /set_stealth` `{"stealth"}` | [`Session::set_stealth`] |
//! | `POST /set_mode` `{"mode"}` | [`Session::set_mode`] |
//! | `POST /reset` | `apply_command("reset")` |
//! | `POST /shutdown` | [`Session::stop`] and server shutdown |

use std::net::SocketAddr;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::response::Json;
use axum::routing::{get, post};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::observability::metrics;
use crate::session::{Session, SessionStatus};

/// Default control API address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

/// Largest accepted request body (64 KB).
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Reply to `POST /shutdown`.
pub const SHUTDOWN_MESSAGE: &str = "Server shutting down.";

/// Reply body for every route that performs an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReply {
    /// Operator-facing result text.
    pub message: String,
    /// Session state after the action.
    pub status: SessionStatus,
}

/// Reply body for `POST /shutdown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReply {
    /// Operator-facing result text.
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
struct DefendRequest {
    #[serde(default)]
    command: String,
}

#[derive(Debug, Default, Deserialize)]
struct StealthRequest {
    stealth: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ModeRequest {
    mode: Option<String>,
}

#[derive(Clone)]
struct ApiState {
    session: Session,
    shutdown: CancellationToken,
}

/// Builds the control router.
///
/// `POST /shutdown` stops `session` and cancels `shutdown`.
pub fn router(session: Session, shutdown: CancellationToken) -> Router {
    Router::new()
        .route("/attack", get(handle_attack))
        .route("/defend", post(handle_defend))
        .route("/status", get(handle_status))
        .route("/set_stealth", post(handle_set_stealth))
        .route("/set_mode", post(handle_set_mode))
        .route("/reset", post(handle_reset))
        .route("/shutdown", post(handle_shutdown))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(ApiState { session, shutdown })
}

/// Binds the control API listener.
///
/// Returns the listener and the actual bound address (useful when binding
/// to port 0 in tests).
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or in use.
pub async fn bind(bind_addr: &str) -> Result<(TcpListener, SocketAddr), ServerError> {
    let addr = parse_bind_addr(bind_addr)?;
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ServerError::Bind(format!("{addr}: {e}")))?;
    let bound = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("local_addr failed: {e}")))?;
    Ok((listener, bound))
}

/// Serves the control API until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] if the serve loop fails.
pub async fn serve(
    listener: TcpListener,
    session: Session,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let app = router(session, shutdown.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
        })
        .await
        .map_err(|e| ServerError::Serve(e.to_string()))?;
    debug!("control API shut down");
    Ok(())
}

/// Parses a bind address string into a full `host:port` form.
///
/// Accepts:
/// - `:5000` → `127.0.0.1:5000`
/// - `5000` → `127.0.0.1:5000`
/// - `0.0.0.0:5000` → as-is
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the result is not a socket address.
pub fn parse_bind_addr(input: &str) -> Result<String, ServerError> {
    let addr = if input.starts_with(':') {
        format!("127.0.0.1{input}")
    } else if input.parse::<u16>().is_ok() {
        format!("127.0.0.1:{input}")
    } else {
        input.to_string()
    };
    addr.parse::<SocketAddr>()
        .map_err(|e| ServerError::Bind(format!("invalid bind address \"{input}\": {e}")))?;
    Ok(addr)
}

/// Decodes a JSON body, falling back to the default on anything unusable.
fn lenient<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

fn reply(session: &Session, message: String) -> Json<ActionReply> {
    Json(ActionReply {
        message,
        status: session.status(),
    })
}

async fn handle_attack(State(state): State<ApiState>) -> Json<ActionReply> {
    metrics::record_api_request("attack");
    let message = state.session.step();
    reply(&state.session, message)
}

async fn handle_defend(State(state): State<ApiState>, body: Bytes) -> Json<ActionReply> {
    metrics::record_api_request("defend");
    let req: DefendRequest = lenient(&body);
    let message = state.session.apply_command(&req.command);
    reply(&state.session, message)
}

async fn handle_status(State(state): State<ApiState>) -> Json<SessionStatus> {
    metrics::record_api_request("status");
    Json(state.session.status())
}

async fn handle_set_stealth(State(state): State<ApiState>, body: Bytes) -> Json<ActionReply> {
    metrics::record_api_request("set_stealth");
    let req: StealthRequest = lenient(&body);
    let message = state
        .session
        .set_stealth(req.stealth.as_deref().unwrap_or_default());
    reply(&state.session, message)
}

async fn handle_set_mode(State(state): State<ApiState>, body: Bytes) -> Json<ActionReply> {
    metrics::record_api_request("set_mode");
    let req: ModeRequest = lenient(&body);
    let message = state
        .session
        .set_mode(req.mode.as_deref().unwrap_or_default());
    reply(&state.session, message)
}

async fn handle_reset(State(state): State<ApiState>) -> Json<ActionReply> {
    metrics::record_api_request("reset");
    let message = state.session.apply_command("reset");
    reply(&state.session, message)
}

async fn handle_shutdown(State(state): State<ApiState>) -> Json<MessageReply> {
    metrics::record_api_request("shutdown");
    info!("shutdown requested over control API");
    state.session.stop().await;
    state.shutdown.cancel();
    Json(MessageReply {
        message: SHUTDOWN_MESSAGE.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================
