use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;
use std::fmt;

use crate::application::services::Sequencer;

/// Event kind carried by chat messages, both directions
pub const MESSAGE_KIND: &str = "message";

/// One inbound frame, decoded eagerly into the shapes the dispatcher consults
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A chat message with text in a channel
    Message { channel: String, text: String },
    /// Anything else: presence changes, typing indicators, acks, hello...
    Other { kind: Option<String> },
}

impl InboundEvent {
    /// Decode a parsed JSON document.
    ///
    /// A `message` event missing either `text` or `channel` is reported as
    /// `Other` so the dispatcher drops it without touching the registry.
    pub fn from_value(value: &Value) -> Self {
        let kind = value.get("type").and_then(Value::as_str);
        let text = value.get("text").and_then(Value::as_str);
        let channel = value.get("channel").and_then(Value::as_str);

        match (kind, text, channel) {
            (Some(MESSAGE_KIND), Some(text), Some(channel)) => InboundEvent::Message {
                channel: channel.to_string(),
                text: text.to_string(),
            },
            (kind, _, _) => InboundEvent::Other {
                kind: kind.map(str::to_string),
            },
        }
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            InboundEvent::Message { .. } => Some(MESSAGE_KIND),
            InboundEvent::Other { kind } => kind.as_deref(),
        }
    }
}

/// An outgoing chat message.
///
/// The remote service orders messages on display by `id`, so ids must be
/// strictly increasing. The only way to build one is through a
/// [`Sequencer`], which hands out the next id at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    id: u64,
    channel: String,
    text: String,
}

impl OutboundMessage {
    pub fn new(sequencer: &Sequencer, channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: sequencer.next_id(),
            channel: channel.into(),
            text: text.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Render to the wire format
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for OutboundMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("OutboundMessage", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", MESSAGE_KIND)?;
        state.serialize_field("channel", &self.channel)?;
        state.serialize_field("text", &self.text)?;
        state.end()
    }
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OutboundMessage{{id: {}, channel: {}, text: {}}}",
            self.id, self.channel, self.text
        )
    }
}
