//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Exec error: {0}")]
    Exec(#[from] ExecError),

    #[error("Queue closed: {0}")]
    QueueClosed(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Exec protocol: {0}")]
    Exec(#[from] ExecError),

    #[error("Outgoing queue closed")]
    OutboxClosed,
}

/// Delimited exec protocol errors
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Unable to find start delimiter in tmux output")]
    MissingBegin,

    #[error("Unable to find end delimiter in tmux output")]
    MissingEnd,

    #[error("End delimiter precedes start delimiter in tmux output")]
    MarkersOutOfOrder,

    #[error("Delimited region has {lines} line(s), expected at least 4")]
    RegionTooShort { lines: usize },

    #[error("Failed to spawn tmux for step {step}: {source}")]
    Spawn {
        step: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("tmux step {step} exited with {status}: {stderr}")]
    Process {
        step: usize,
        status: String,
        stderr: String,
    },
}

/// Help text parsing errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HelpParseError {
    #[error("Unable to parse name from help text: {0}")]
    MissingName(String),

    #[error("Unable to parse short description from help text: {0}")]
    MissingShort(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
