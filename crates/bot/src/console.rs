//! Operator console input.
//!
//! Each line is one command invocation:
//!
//! ```text
//! <user_id>[@role,role] /<command> [args...]
//! ```
//!
//! e.g. `1001@42 /add_score 2002 blagueurs 3`.
use ledger::UserId;
use thiserror::Error;

/// A parsed command invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub invoker: UserId,
    pub roles: Vec<String>,
    /// Command name without the leading slash.
    pub command: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|held| held == role)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing invoker")]
    MissingInvoker,

    #[error("missing command")]
    MissingCommand,

    #[error("expected a /command, got `{0}`")]
    NotACommand(String),
}

/// Parse one console line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Invocation>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = line.split_whitespace();

    let who = tokens.next().ok_or(ParseError::MissingInvoker)?;
    let (invoker, roles) = match who.split_once('@') {
        Some((id, roles)) => (
            id,
            roles
                .split(',')
                .filter(|role| !role.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        None => (who, Vec::new()),
    };
    if invoker.is_empty() {
        return Err(ParseError::MissingInvoker);
    }

    let command = tokens.next().ok_or(ParseError::MissingCommand)?;
    let command = command
        .strip_prefix('/')
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ParseError::NotACommand(command.to_string()))?;

    Ok(Some(Invocation {
        invoker: UserId::new(invoker),
        roles,
        command: command.to_string(),
        args: tokens.map(str::to_string).collect(),
    }))
}
