//! Defensive command grammar.
//!
//! Operator text is decoded once into a [`Command`] and executed by the
//! session. Matching is case-insensitive and ignores surrounding and repeated
//! whitespace.
//!
//! ```text
//! ufw deny from <ip> to any port <port>
//! tail
//! set stealth <low|medium|high>
//! set mode <bruteforce|sqli|xss|phishing|portscan>
//! reset
//! ```

/// A decoded operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Firewall deny rule. Only `port` decides whether it stops the attacker.
    Block {
        /// Address after `from`, if given.
        source: Option<String>,
        /// Port after `port`.
        port: u16,
    },
    /// Show the most recent log lines.
    Tail,
    /// Change stealth level. `None` when the level was omitted.
    SetStealth(Option<String>),
    /// Change scenario. `None` when the mode was omitted.
    SetMode(Option<String>),
    /// Clear the block and reset the attacker.
    Reset,
    /// Anything else, normalized to lowercase.
    Unknown(String),
}

impl Command {
    /// Decodes operator input.
    ///
    /// A `ufw deny` rule without a numeric `port <n>` pair decodes as
    /// [`Command::Unknown`].
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let normalized = input.trim().to_lowercase();
        let tokens: Vec<&str> = normalized.split_whitespace().collect();

        match tokens.as_slice() {
            ["tail"] => Self::Tail,
            ["reset"] => Self::Reset,
            ["set", "stealth", rest @ ..] => Self::SetStealth(rest.first().map(|s| (*s).to_string())),
            ["set", "mode", rest @ ..] => Self::SetMode(rest.first().map(|s| (*s).to_string())),
            ["ufw", "deny", rest @ ..] => {
                parse_deny(rest).unwrap_or_else(|| Self::Unknown(normalized.clone()))
            }
            _ => Self::Unknown(normalized.clone()),
        }
    }

    /// Stable name of the command kind, used as a metrics label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Block { .. } => "block",
            Self::Tail => "tail",
            Self::SetStealth(_) => "set_stealth",
            Self::SetMode(_) => "set_mode",
            Self::Reset => "reset",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Parses the tail of `ufw deny ...`.
fn parse_deny(rest: &[&str]) -> Option<Command> {
    let value_after = |keyword: &str| {
        rest.iter()
            .position(|t| *t == keyword)
            .and_then(|i| rest.get(i + 1))
            .copied()
    };

    let port = value_after("port")?.parse::<u16>().ok()?;
    let source = value_after("from").map(str::to_string);
    Some(Command::Block { source, port })
}
