//! Message dispatcher - The bot's central event loop
//!
//! One reader task turns frames into inbound events, the dispatcher loop
//! takes one ready event per iteration and spawns its reaction, and a
//! single writer task puts replies on the wire in id order. A slow command
//! never holds up reading or writing.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use super::connection::Connection;
use super::outbox::Outbox;
use super::parser::{self, Addressed};
use crate::application::services::{HelpRequest, HelpService, Sequencer};
use crate::domain::entities::{Command, CommandRegistry, InboundEvent, OutboundMessage, Session};
use crate::domain::traits::{FrameSink, FrameSource};
use crate::infrastructure::config::RuntimeConfig;

/// Lifecycle of a dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Idle,
    Running,
    Draining,
    Stopped,
}

/// A matched command waiting to run
struct Invocation {
    command: Arc<dyn Command>,
    channel: String,
    text: String,
}

/// Everything an inbound handler task needs
struct HandlerContext {
    session: Arc<Session>,
    registry: CommandRegistry,
    help: HelpService,
    outbox: Outbox,
    invocations: mpsc::Sender<Invocation>,
}

impl HandlerContext {
    async fn handle_inbound(&self, event: InboundEvent) {
        let Some(Addressed { channel, text }) = parser::addressed_to(&self.session, &event) else {
            tracing::trace!("Ignoring {:?} event not addressed to the bot", event.kind());
            return;
        };

        tracing::debug!("New message in {}: {}", channel, text);

        if let Some(request) = HelpRequest::parse(&text) {
            tracing::debug!("HELP triggered by {}", text);
            let reply = self.help.respond(&request);
            if let Err(e) = self.outbox.send(channel, reply).await {
                tracing::warn!("Dropping help reply: {}", e);
            }
            return;
        }

        let Some(command) = self.registry.find(&text) else {
            tracing::debug!("No command matches {}", text);
            return;
        };

        tracing::debug!("{} triggered by {}", command.label(), text);
        let invocation = Invocation { command, channel, text };
        if self.invocations.send(invocation).await.is_err() {
            tracing::warn!("Invocation queue closed, dropping command");
        }
    }
}

/// The dispatch runtime
pub struct Dispatcher {
    session: Arc<Session>,
    registry: CommandRegistry,
    config: RuntimeConfig,
    sequencer: Sequencer,
    state: RuntimeState,
}

impl Dispatcher {
    pub fn new(session: Session, registry: CommandRegistry, config: RuntimeConfig) -> Self {
        Self {
            session: Arc::new(session),
            registry,
            config,
            sequencer: Sequencer::new(),
            state: RuntimeState::Idle,
        }
    }

    pub fn state(&self) -> RuntimeState {
        self.state
    }

    fn transition(&mut self, next: RuntimeState) {
        tracing::info!("Dispatcher {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run until `shutdown` resolves or the connection is closed by the
    /// remote side, then drain and stop.
    pub async fn run<F>(mut self, source: Box<dyn FrameSource>, sink: Box<dyn FrameSink>, shutdown: F) -> RuntimeState
    where
        F: Future<Output = ()> + Send,
    {
        self.transition(RuntimeState::Running);

        let help = HelpService::from_registry(&self.registry);
        tracing::info!(
            "{} commands registered, {} with help",
            self.registry.len(),
            help.len()
        );

        let connection = Arc::new(Connection::new(sink, self.config.close_timeout()));
        let (outbox, outgoing_rx) = Outbox::new(self.sequencer.clone(), self.config.outgoing_capacity);
        let (inbound_tx, mut inbound_rx) = mpsc::channel(self.config.inbound_capacity.max(1));
        let (invocation_tx, mut invocation_rx) = mpsc::channel(self.config.invocation_capacity.max(1));

        let reader = tokio::spawn(read_frames(source, inbound_tx));
        let writer = tokio::spawn(write_messages(connection.clone(), outgoing_rx));

        let context = Arc::new(HandlerContext {
            session: self.session.clone(),
            registry: self.registry.clone(),
            help,
            outbox: outbox.clone(),
            invocations: invocation_tx,
        });

        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                maybe_event = inbound_rx.recv() => {
                    let Some(event) = maybe_event else {
                        tracing::info!("Inbound stream ended");
                        break;
                    };
                    let context = context.clone();
                    tasks.spawn(async move { context.handle_inbound(event).await });
                }
                Some(invocation) = invocation_rx.recv() => {
                    tasks.spawn(invoke(invocation, outbox.clone()));
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!("Handler task failed: {}", e);
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Closing gracefully");
                    break;
                }
            }
        }

        self.transition(RuntimeState::Draining);
        reader.abort();
        drop(inbound_rx);
        drop(invocation_rx);
        drop(context);
        drop(outbox);

        let grace = self.config.shutdown_grace();
        settle(&mut tasks, writer, grace).await;
        connection.close().await;

        self.transition(RuntimeState::Stopped);
        self.state
    }
}

/// Wait for in-flight handlers and the writer, at most `grace` in total
async fn settle(tasks: &mut JoinSet<()>, mut writer: JoinHandle<()>, grace: Duration) {
    let drained = tokio::time::timeout(grace, async {
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Handler task failed: {}", e);
            }
        }
        let _ = (&mut writer).await;
    })
    .await;

    if drained.is_err() {
        tracing::warn!(
            "Abandoning {} in-flight task(s) after {:?}",
            tasks.len(),
            grace
        );
        tasks.abort_all();
        writer.abort();
    }
}

async fn invoke(invocation: Invocation, out: Outbox) {
    let Invocation { command, channel, text } = invocation;
    if let Err(e) = command.run(&channel, &text, out).await {
        tracing::error!("Error running command {}: {}", command.label(), e);
    }
}

async fn read_frames(mut source: Box<dyn FrameSource>, inbound: mpsc::Sender<InboundEvent>) {
    loop {
        let frame = match source.read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::info!("Connection closed by remote");
                return;
            }
            Err(e) => {
                tracing::error!("Error reading message: {}", e);
                return;
            }
        };

        match parser::parse_frame(&frame) {
            Ok(Some(event)) => {
                if inbound.send(event).await.is_err() {
                    return;
                }
            }
            Ok(None) => tracing::debug!("Ignoring {} frame", frame.kind()),
            Err(e) => tracing::error!("Error parsing message: {}", e),
        }
    }
}

async fn write_messages(connection: Arc<Connection>, mut outgoing: mpsc::Receiver<OutboundMessage>) {
    while let Some(message) = outgoing.recv().await {
        if let Err(e) = connection.send_message(&message).await {
            tracing::error!("Unable to send message {}: {}", message.id(), e);
        }
    }
}
