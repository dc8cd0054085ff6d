//! `console` command handler
//!
//! Interactive drill on stdin/stdout. Each input line is either a console
//! verb (`step`, `status`, `help`, `quit`) or a defensive command passed
//! straight to the session.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::cli::args::ConsoleArgs;
use crate::error::CyberDrillError;
use crate::session::Session;

/// Printed for `help`.
pub const HELP: &str = "\
Console verbs:
  step | attack          run one attacker step now
  status                 print session status as JSON
  help                   show this text
  quit | exit            end the drill
Defensive commands:
  tail
  set stealth <low|medium|high>
  set mode <bruteforce|sqli|xss|phishing|portscan>
  ufw deny from <ip> to any port <port>
  reset";

/// What the console does with one input line.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    Print(String),
    Skip,
    Quit,
}

/// Run an interactive console session on stdin/stdout.
///
/// # Errors
///
/// Returns a config error if the session configuration is invalid, or an
/// I/O error if the terminal cannot be read or written.
pub async fn run(args: &ConsoleArgs, cancel: CancellationToken) -> Result<(), CyberDrillError> {
    let config = args.session.load_config()?;
    let session = Session::start(&config);
    tracing::info!(
        stealth = %config.stealth,
        mode = %config.mode,
        autostart = config.autostart,
        "console session started"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let result = drive(&session, stdin, &mut stdout, &cancel).await;

    session.stop().await;
    tracing::info!("drill session ended");
    result
}

/// Reads lines until EOF, `quit`, or cancellation, writing each reply.
async fn drive<R, W>(
    session: &Session,
    reader: R,
    writer: &mut W,
    cancel: &CancellationToken,
) -> Result<(), CyberDrillError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = tokio::select! {
            () = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };

        match respond(session, &line)? {
            Action::Print(text) => {
                writer.write_all(text.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Action::Skip => {}
            Action::Quit => break,
        }
    }
    Ok(())
}

fn respond(session: &Session, line: &str) -> Result<Action, CyberDrillError> {
    let action = match line.trim().to_lowercase().as_str() {
        "" => Action::Skip,
        "quit" | "exit" => Action::Quit,
        "step" | "attack" => Action::Print(session.step()),
        "status" => Action::Print(serde_json::to_string_pretty(&session.status())?),
        "help" => Action::Print(HELP.to_string()),
        _ => Action::Print(session.apply_command(line)),
    };
    Ok(action)
}
