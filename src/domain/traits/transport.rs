use async_trait::async_trait;

use crate::application::errors::BotError;

/// One frame received from the duplex connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    /// Ping, pong, close and raw frames
    Control(&'static str),
}

impl Frame {
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Text(_) => "text",
            Frame::Binary(_) => "binary",
            Frame::Control(kind) => kind,
        }
    }
}

/// Read half of a duplex connection
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame; `Ok(None)` once the remote side has closed
    async fn read_frame(&mut self) -> Result<Option<Frame>, BotError>;
}

/// Write half of a duplex connection.
///
/// Not safe for concurrent use; callers go through
/// [`Connection`](crate::application::messaging::Connection), which holds
/// the write-exclusion token.
#[async_trait]
pub trait FrameSink: Send {
    async fn write_text(&mut self, text: String) -> Result<(), BotError>;

    /// Send a normal-closure close frame
    async fn close(&mut self) -> Result<(), BotError>;
}
