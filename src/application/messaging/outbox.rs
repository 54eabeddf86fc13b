//! Outbox - Where commands put their replies

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::application::errors::CommandError;
use crate::application::services::Sequencer;
use crate::domain::entities::OutboundMessage;

/// Sending half of the outgoing queue.
///
/// Id assignment and enqueueing happen under one lock, so the queue is
/// always in id order and the single writer puts frames on the wire in the
/// order their ids were handed out.
#[derive(Clone)]
pub struct Outbox {
    sequencer: Sequencer,
    tx: mpsc::Sender<OutboundMessage>,
    order: Arc<Mutex<()>>,
}

impl Outbox {
    pub fn new(sequencer: Sequencer, capacity: usize) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let outbox = Self {
            sequencer,
            tx,
            order: Arc::new(Mutex::new(())),
        };
        (outbox, rx)
    }

    /// Queue a reply. Blocks while the outgoing queue is full.
    pub async fn send(&self, channel: impl Into<String>, text: impl Into<String>) -> Result<u64, CommandError> {
        let _order = self.order.lock().await;
        let message = OutboundMessage::new(&self.sequencer, channel, text);
        let id = message.id();
        tracing::debug!("Queued {}", message);

        self.tx.send(message).await.map_err(|_| CommandError::OutboxClosed)?;
        Ok(id)
    }
}
