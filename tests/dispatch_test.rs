//! Dispatcher integration tests over an in-memory transport
//! Run with: cargo test --test dispatch_test

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;

use rtmbot::application::commands::{AddCommand, PingCommand};
use rtmbot::application::errors::{BotError, CommandError};
use rtmbot::application::messaging::{Dispatcher, Outbox, RuntimeState};
use rtmbot::domain::entities::{Command, CommandRegistry, Session};
use rtmbot::domain::traits::{Frame, FrameSink, FrameSource};
use rtmbot::infrastructure::config::RuntimeConfig;

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

const WAIT: Duration = Duration::from_secs(2);

struct ChannelSource(mpsc::Receiver<Frame>);

#[async_trait]
impl FrameSource for ChannelSource {
    async fn read_frame(&mut self) -> Result<Option<Frame>, BotError> {
        Ok(self.0.recv().await)
    }
}

#[derive(Debug, PartialEq)]
enum Written {
    Text(String),
    Close,
}

struct ChannelSink(mpsc::UnboundedSender<Written>);

#[async_trait]
impl FrameSink for ChannelSink {
    async fn write_text(&mut self, text: String) -> Result<(), BotError> {
        self.0
            .send(Written::Text(text))
            .map_err(|e| BotError::Transport(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), BotError> {
        self.0
            .send(Written::Close)
            .map_err(|e| BotError::Transport(e.to_string()))
    }
}

struct Harness {
    frames: Option<mpsc::Sender<Frame>>,
    written: mpsc::UnboundedReceiver<Written>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<RuntimeState>,
}

impl Harness {
    fn start(registry: CommandRegistry) -> Self {
        Self::start_with(registry, RuntimeConfig::default())
    }

    fn start_with(registry: CommandRegistry, config: RuntimeConfig) -> Self {
        ensure_init();
        let session = Session::new("bot", "BOTID", "team", Url::parse("wss://example.test/ws").unwrap()).unwrap();
        let (frame_tx, frame_rx) = mpsc::channel(16);
        let (written_tx, written_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let dispatcher = Dispatcher::new(session, registry, config);
        assert_eq!(dispatcher.state(), RuntimeState::Idle);

        let handle = tokio::spawn(dispatcher.run(
            Box::new(ChannelSource(frame_rx)),
            Box::new(ChannelSink(written_tx)),
            async move {
                let _ = shutdown_rx.await;
            },
        ));

        Self {
            frames: Some(frame_tx),
            written: written_rx,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    async fn send_raw(&self, frame: Frame) {
        self.frames.as_ref().unwrap().send(frame).await.unwrap();
    }

    async fn say(&self, channel: &str, text: &str) {
        let body = json!({"type": "message", "channel": channel, "user": "U1", "text": text});
        self.send_raw(Frame::Text(body.to_string())).await;
    }

    async fn next_message(&mut self) -> Value {
        let written = tokio::time::timeout(WAIT, self.written.recv())
            .await
            .expect("timed out waiting for an outgoing frame")
            .expect("sink closed");
        match written {
            Written::Text(text) => serde_json::from_str(&text).unwrap(),
            Written::Close => panic!("unexpected close frame"),
        }
    }

    /// Stop the dispatcher and return whatever it wrote while draining
    async fn stop(mut self) -> (RuntimeState, Vec<Written>) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let state = tokio::time::timeout(WAIT, self.handle)
            .await
            .expect("dispatcher did not stop")
            .unwrap();

        let mut rest = Vec::new();
        while let Ok(w) = self.written.try_recv() {
            rest.push(w);
        }
        (state, rest)
    }
}

fn builtins() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register(Arc::new(PingCommand));
    registry.register(Arc::new(AddCommand));
    registry
}

#[tokio::test]
async fn test_ping_produces_exactly_one_reply() {
    let mut harness = Harness::start(builtins());
    harness.say("C1", "<@BOTID> ping").await;

    let reply = harness.next_message().await;
    assert_eq!(reply, json!({"id": 1, "type": "message", "channel": "C1", "text": "Pong!"}));

    let (state, rest) = harness.stop().await;
    assert_eq!(state, RuntimeState::Stopped);
    assert_eq!(rest, vec![Written::Close]);
}

#[tokio::test]
async fn test_bare_help_lists_every_command() {
    let mut harness = Harness::start(builtins());
    harness.say("C1", "<@BOTID>: help").await;

    let reply = harness.next_message().await;
    let text = reply["text"].as_str().unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "_List Of Commands_",
            "*help*:  Displays this help message.",
            "*ping*: A simple response command to test connectivity",
            "*add*: Add two numbers together",
        ]
    );

    let (_, rest) = harness.stop().await;
    assert_eq!(rest, vec![Written::Close]);
}

#[tokio::test]
async fn test_help_topic_and_unknown_topic() {
    let mut harness = Harness::start(builtins());

    harness.say("C1", "<@BOTID> help add").await;
    let reply = harness.next_message().await;
    assert!(reply["text"].as_str().unwrap().starts_with("_ADD_\n\nAdd two numbers together\n"));

    harness.say("C1", "<@BOTID> help nosuchcmd").await;
    let reply = harness.next_message().await;
    assert_eq!(reply["text"], "Sorry, there's no command called nosuchcmd.");

    let (_, rest) = harness.stop().await;
    assert_eq!(rest, vec![Written::Close]);
}

#[tokio::test]
async fn test_help_takes_priority_over_commands() {
    struct Greedy;

    #[async_trait]
    impl Command for Greedy {
        fn help(&self) -> String {
            "*greedy*: Matches everything.".to_string()
        }

        fn matches(&self, _text: &str) -> bool {
            true
        }

        async fn run(&self, channel: &str, _text: &str, out: Outbox) -> Result<(), CommandError> {
            out.send(channel, "greedy").await?;
            Ok(())
        }
    }

    let mut registry = CommandRegistry::new();
    registry.register(Arc::new(Greedy));
    let mut harness = Harness::start(registry);

    harness.say("C1", "<@BOTID> help").await;
    let reply = harness.next_message().await;
    assert!(reply["text"].as_str().unwrap().contains("*greedy*: Matches everything"));

    harness.say("C1", "<@BOTID> anything").await;
    assert_eq!(harness.next_message().await["text"], "greedy");

    harness.stop().await;
}

#[tokio::test]
async fn test_unaddressed_and_foreign_frames_are_ignored() {
    let mut harness = Harness::start(builtins());

    harness.say("C1", "ping").await;
    harness.say("C1", "help").await;
    harness.say("C1", "<@SOMEONE> ping").await;
    harness.say("C1", "hey <@BOTID> ping").await;
    harness.send_raw(Frame::Text(json!({"type": "presence_change", "user": "U1"}).to_string())).await;
    harness.send_raw(Frame::Text(json!({"type": "message", "channel": "C1"}).to_string())).await;
    harness.send_raw(Frame::Text("{not json".to_string())).await;
    harness.send_raw(Frame::Binary(vec![0, 1, 2])).await;
    harness.send_raw(Frame::Control("ping")).await;
    harness.say("C2", "<@BOTID> ping").await;

    let reply = harness.next_message().await;
    assert_eq!(reply["id"], 1);
    assert_eq!(reply["channel"], "C2");

    let (_, rest) = harness.stop().await;
    assert_eq!(rest, vec![Written::Close]);
}

#[tokio::test]
async fn test_wire_order_follows_id_order() {
    let mut harness = Harness::start(builtins());
    let count = 25;

    for i in 0..count {
        harness.say("C1", &format!("<@BOTID> add {} 1", i)).await;
    }

    let mut ids = Vec::new();
    for _ in 0..count {
        ids.push(harness.next_message().await["id"].as_u64().unwrap());
    }
    assert_eq!(ids, (1..=count as u64).collect::<Vec<_>>());

    harness.stop().await;
}

struct Blocking {
    release: Arc<Notify>,
}

#[async_trait]
impl Command for Blocking {
    fn help(&self) -> String {
        "*slow*: Waits to be released.".to_string()
    }

    fn matches(&self, text: &str) -> bool {
        text == "slow"
    }

    async fn run(&self, channel: &str, _text: &str, out: Outbox) -> Result<(), CommandError> {
        self.release.notified().await;
        out.send(channel, "slow done").await?;
        Ok(())
    }
}

#[tokio::test]
async fn test_slow_command_does_not_stall_others() {
    let release = Arc::new(Notify::new());
    let mut registry = builtins();
    registry.register(Arc::new(Blocking { release: release.clone() }));
    let mut harness = Harness::start(registry);

    harness.say("C1", "<@BOTID> slow").await;
    harness.say("C1", "<@BOTID> ping").await;
    assert_eq!(harness.next_message().await["text"], "Pong!");

    release.notify_one();
    assert_eq!(harness.next_message().await["text"], "slow done");

    harness.stop().await;
}

#[tokio::test]
async fn test_shutdown_abandons_stuck_tasks_after_grace() {
    let release = Arc::new(Notify::new());
    let mut registry = CommandRegistry::new();
    registry.register(Arc::new(Blocking { release }));
    let config = RuntimeConfig {
        shutdown_grace_ms: 50,
        ..RuntimeConfig::default()
    };
    let harness = Harness::start_with(registry, config);

    harness.say("C1", "<@BOTID> slow").await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let (state, rest) = harness.stop().await;
    assert_eq!(state, RuntimeState::Stopped);
    assert_eq!(rest, vec![Written::Close]);
}

#[tokio::test]
async fn test_command_error_is_contained() {
    struct Failing;

    #[async_trait]
    impl Command for Failing {
        fn help(&self) -> String {
            "*fail*: Always fails.".to_string()
        }

        fn matches(&self, text: &str) -> bool {
            text == "fail"
        }

        async fn run(&self, _channel: &str, _text: &str, _out: Outbox) -> Result<(), CommandError> {
            Err(CommandError::ExecutionFailed("boom".to_string()))
        }
    }

    let mut registry = builtins();
    registry.register(Arc::new(Failing));
    let mut harness = Harness::start(registry);

    harness.say("C1", "<@BOTID> fail").await;
    harness.say("C1", "<@BOTID> ping").await;

    let reply = harness.next_message().await;
    assert_eq!(reply["text"], "Pong!");
    assert_eq!(reply["id"], 1);

    harness.stop().await;
}

#[tokio::test]
async fn test_remote_close_stops_dispatcher() {
    let mut harness = Harness::start(builtins());
    harness.say("C1", "<@BOTID> ping").await;
    assert_eq!(harness.next_message().await["text"], "Pong!");

    harness.frames.take();
    let state = tokio::time::timeout(WAIT, &mut harness.handle)
        .await
        .expect("dispatcher did not stop on remote close")
        .unwrap();
    assert_eq!(state, RuntimeState::Stopped);
    assert_eq!(harness.written.recv().await, Some(Written::Close));
}
