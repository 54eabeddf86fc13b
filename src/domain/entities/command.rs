use async_trait::async_trait;
use std::sync::Arc;

use crate::application::errors::CommandError;
use crate::application::messaging::Outbox;

/// A bot command.
///
/// `help` returns the help text, parsed once at startup:
///
/// ```text
/// *name*: A short description. Longer description, including argument details.
/// ```
///
/// The bolded name is listed by `help`; the first sentence is the short
/// description and must not contain line breaks; the rest is shown by
/// `help <name>` and may span lines.
///
/// `matches` only ever sees text already addressed to the bot, with the
/// mention prefix stripped.
///
/// `run` is called when `matches` returned true. Replies go through `out`.
#[async_trait]
pub trait Command: Send + Sync {
    fn help(&self) -> String;

    fn matches(&self, text: &str) -> bool;

    async fn run(&self, channel: &str, text: &str, out: Outbox) -> Result<(), CommandError>;

    /// Name used in logs
    fn label(&self) -> String {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("command")
            .to_string()
    }
}

/// Command registry, in registration order
#[derive(Default, Clone)]
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Arc<dyn Command>) {
        tracing::debug!("Registered command {}", command.label());
        self.commands.push(command);
    }

    /// First registered command whose predicate accepts `text`
    pub fn find(&self, text: &str) -> Option<Arc<dyn Command>> {
        self.commands.iter().find(|c| c.matches(text)).cloned()
    }

    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Command>> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
