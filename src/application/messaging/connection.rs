//! Connection - Write side of the duplex transport, with write exclusion

use std::time::Duration;
use tokio::sync::Mutex;

use crate::application::errors::BotError;
use crate::domain::entities::OutboundMessage;
use crate::domain::traits::FrameSink;

/// Serializes every write to the transport.
///
/// The mutex is the write-exclusion token: it is taken for one frame and
/// released right after.
pub struct Connection {
    sink: Mutex<Box<dyn FrameSink>>,
    close_timeout: Duration,
}

impl Connection {
    pub fn new(sink: Box<dyn FrameSink>, close_timeout: Duration) -> Self {
        Self {
            sink: Mutex::new(sink),
            close_timeout,
        }
    }

    pub async fn write_frame(&self, text: String) -> Result<(), BotError> {
        let mut sink = self.sink.lock().await;
        sink.write_text(text).await
    }

    pub async fn send_message(&self, message: &OutboundMessage) -> Result<(), BotError> {
        let wire = message
            .to_wire()
            .map_err(|e| BotError::Parse(format!("Unable to marshal {}: {}", message, e)))?;
        tracing::debug!("Sending json: {}", wire);
        self.write_frame(wire).await
    }

    /// Best-effort close frame, bounded by the close timeout
    pub async fn close(&self) {
        let attempt = async {
            let mut sink = self.sink.lock().await;
            sink.close().await
        };

        match tokio::time::timeout(self.close_timeout, attempt).await {
            Ok(Ok(())) => tracing::debug!("Close frame sent"),
            Ok(Err(e)) => tracing::warn!("Failed to send close frame: {}", e),
            Err(_) => tracing::warn!("Timed out sending close frame after {:?}", self.close_timeout),
        }
    }
}
