//! Message parser - Turns raw frames into inbound events and addressed text

use crate::application::errors::BotError;
use crate::domain::entities::{InboundEvent, Session};
use crate::domain::traits::Frame;

/// Text of a message addressed to the bot, mention prefix removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addressed {
    pub channel: String,
    pub text: String,
}

/// Decode a text frame. Non-text frames yield `Ok(None)`.
pub fn parse_frame(frame: &Frame) -> Result<Option<InboundEvent>, BotError> {
    let Frame::Text(raw) = frame else {
        return Ok(None);
    };

    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| BotError::Parse(format!("Invalid inbound frame: {}", e)))?;

    Ok(Some(InboundEvent::from_value(&value)))
}

/// Keep only chat messages that start with a mention of the bot
pub fn addressed_to(session: &Session, event: &InboundEvent) -> Option<Addressed> {
    let InboundEvent::Message { channel, text } = event else {
        return None;
    };

    session.strip_mention(text).map(|stripped| Addressed {
        channel: channel.clone(),
        text: stripped.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;

    fn session() -> Session {
        Session::new("bot", "BOTID", "team", Url::parse("wss://example.test").unwrap()).unwrap()
    }

    #[test]
    fn test_parse_text_frame() {
        let frame = Frame::Text(r#"{"type":"message","channel":"C1","text":"hi"}"#.to_string());
        let event = parse_frame(&frame).unwrap().unwrap();
        assert_eq!(event.kind(), Some("message"));
    }

    #[test]
    fn test_non_text_frames_are_skipped() {
        assert!(parse_frame(&Frame::Binary(vec![1, 2])).unwrap().is_none());
        assert!(parse_frame(&Frame::Control("ping")).unwrap().is_none());
    }

    #[test]
    fn test_malformed_frame_is_parse_error() {
        let err = parse_frame(&Frame::Text("{not json".to_string())).unwrap_err();
        assert!(matches!(err, BotError::Parse(_)));
    }

    #[test]
    fn test_addressed_strips_prefix() {
        let event = InboundEvent::Message {
            channel: "C1".to_string(),
            text: "<@BOTID>: add 1 2".to_string(),
        };
        assert_eq!(
            addressed_to(&session(), &event),
            Some(Addressed { channel: "C1".to_string(), text: "add 1 2".to_string() })
        );
    }

    #[test]
    fn test_ambient_chatter_is_not_addressed() {
        let event = InboundEvent::Message {
            channel: "C1".to_string(),
            text: "ping".to_string(),
        };
        assert!(addressed_to(&session(), &event).is_none());
        assert!(addressed_to(&session(), &InboundEvent::Other { kind: None }).is_none());
    }
}
