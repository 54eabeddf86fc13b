//! Console adapter for development/testing
//!
//! Each stdin line is delivered as a `message` event in channel `console`,
//! addressed to a local bot identity; replies are printed to stdout.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};

use crate::application::errors::BotError;
use crate::domain::entities::Session;
use crate::domain::traits::{Frame, FrameSink, FrameSource};

pub const CONSOLE_CHANNEL: &str = "console";
const CONSOLE_SELF_ID: &str = "CONSOLE";

/// Local identity used in place of the handshake
pub fn console_session(name: &str) -> Result<Session, BotError> {
    let endpoint = Url::parse("console://local")
        .map_err(|e| BotError::Internal(e.to_string()))?;
    Session::new(name, CONSOLE_SELF_ID, "local", endpoint)
}

/// Wrap a typed line as an event addressed to the console bot
pub fn line_to_frame(line: &str) -> Frame {
    let text = format!("<@{}> {}", CONSOLE_SELF_ID, line.trim());
    Frame::Text(json!({"type": "message", "channel": CONSOLE_CHANNEL, "text": text}).to_string())
}

/// Reads frames from stdin
pub struct ConsoleSource {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleSource {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for ConsoleSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FrameSource for ConsoleSource {
    async fn read_frame(&mut self) -> Result<Option<Frame>, BotError> {
        loop {
            let line = self.lines
                .next_line()
                .await
                .map_err(|e| BotError::Transport(e.to_string()))?;

            match line {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return Ok(Some(line_to_frame(&line))),
                None => return Ok(None),
            }
        }
    }
}

/// Prints outgoing messages
pub struct ConsoleSink {
    out: Stdout,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self { out: tokio::io::stdout() }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FrameSink for ConsoleSink {
    async fn write_text(&mut self, text: String) -> Result<(), BotError> {
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| BotError::Parse(e.to_string()))?;
        let body = value.get("text").and_then(Value::as_str).unwrap_or_default();

        self.out
            .write_all(format!("[BOT] {}\n", body).as_bytes())
            .await
            .map_err(|e| BotError::Transport(e.to_string()))?;
        self.out.flush().await.map_err(|e| BotError::Transport(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), BotError> {
        tracing::info!("Console session closed");
        Ok(())
    }
}
