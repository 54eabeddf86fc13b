//! Slack real-time messaging adapter
//!
//! `rtm.start` exchanges the API token for a websocket URL and the bot's
//! identity; the websocket is then split into a frame source and sink.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, Url};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::application::errors::BotError;
use crate::domain::entities::Session;
use crate::domain::traits::{Frame, FrameSink, FrameSource};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Deserialize)]
struct RtmStartResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    url: Option<String>,
    team: Option<Named>,
    #[serde(rename = "self")]
    self_: Option<SelfInfo>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SelfInfo {
    id: String,
    name: String,
}

/// Handshake client for `rtm.start`
pub struct SlackConnector {
    client: Client,
    endpoint: String,
}

impl SlackConnector {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Exchange the token for a session
    pub async fn start(&self, token: &str) -> Result<Session, BotError> {
        if token.is_empty() {
            return Err(BotError::Handshake("API token is empty".to_string()));
        }

        tracing::info!("Calling Slack RTM start");
        let form = [("token", token), ("simple_latest", "true"), ("no_unreads", "true")];

        let response = self.client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| BotError::Network(format!("Unable to connect to RTM service: {}", e)))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!("RTM start returned {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BotError::Network(format!("Unable to read response body: {}", e)))?;

        parse_rtm_start(&body)
    }

    /// Open the websocket for a session
    pub async fn connect(&self, session: &Session) -> Result<(SlackSource, SlackSink), BotError> {
        tracing::info!("Dialing Slack at {}", session.endpoint);
        let (stream, _response) = connect_async(session.endpoint.as_str())
            .await
            .map_err(|e| BotError::Network(format!("Unable to open websocket to Slack: {}", e)))?;

        tracing::info!("Connected to {} as {}!", session.team_name, session.self_name);
        let (sink, source) = stream.split();
        Ok((SlackSource { inner: source }, SlackSink { inner: sink }))
    }
}

/// Decode an `rtm.start` response body into a session
pub fn parse_rtm_start(body: &str) -> Result<Session, BotError> {
    let parsed: RtmStartResponse = serde_json::from_str(body)
        .map_err(|e| BotError::Handshake(format!("Unable to parse response body: {}", e)))?;

    if !parsed.ok {
        return Err(BotError::Handshake(format!(
            "Bad response from RTM start call: {}",
            parsed.error.unwrap_or_else(|| "unknown error".to_string())
        )));
    }

    let missing = |field: &str| BotError::Handshake(format!("RTM start response missing {}", field));
    let url = parsed.url.ok_or_else(|| missing("url"))?;
    let team = parsed.team.ok_or_else(|| missing("team.name"))?;
    let me = parsed.self_.ok_or_else(|| missing("self"))?;

    let endpoint = Url::parse(&url)
        .map_err(|e| BotError::Handshake(format!("Unable to parse websocket endpoint URI: {}", e)))?;

    Session::new(me.name, me.id, team.name, endpoint)
}

/// Read half of the Slack websocket
pub struct SlackSource {
    inner: SplitStream<WsStream>,
}

#[async_trait]
impl FrameSource for SlackSource {
    async fn read_frame(&mut self) -> Result<Option<Frame>, BotError> {
        let Some(message) = self.inner.next().await else {
            return Ok(None);
        };
        let message = message.map_err(|e| BotError::Transport(e.to_string()))?;

        let frame = match message {
            WsMessage::Text(text) => Frame::Text(text.as_str().to_string()),
            WsMessage::Binary(bytes) => Frame::Binary(bytes.to_vec()),
            WsMessage::Ping(_) => Frame::Control("ping"),
            WsMessage::Pong(_) => Frame::Control("pong"),
            WsMessage::Close(_) => return Ok(None),
            WsMessage::Frame(_) => Frame::Control("raw"),
        };
        Ok(Some(frame))
    }
}

/// Write half of the Slack websocket
pub struct SlackSink {
    inner: SplitSink<WsStream, WsMessage>,
}

#[async_trait]
impl FrameSink for SlackSink {
    async fn write_text(&mut self, text: String) -> Result<(), BotError> {
        self.inner
            .send(WsMessage::Text(text.into()))
            .await
            .map_err(|e| BotError::Transport(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), BotError> {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        };
        self.inner
            .send(WsMessage::Close(Some(frame)))
            .await
            .map_err(|e| BotError::Transport(e.to_string()))
    }
}
