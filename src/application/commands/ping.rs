use async_trait::async_trait;

use crate::application::errors::CommandError;
use crate::application::messaging::Outbox;
use crate::domain::entities::Command;

/// Replies `Pong!` to `ping`
#[derive(Debug, Default, Clone, Copy)]
pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    fn help(&self) -> String {
        "*ping*: A simple response command to test connectivity".to_string()
    }

    fn matches(&self, text: &str) -> bool {
        text == "ping"
    }

    async fn run(&self, channel: &str, _text: &str, out: Outbox) -> Result<(), CommandError> {
        out.send(channel, "Pong!").await?;
        Ok(())
    }

    fn label(&self) -> String {
        r#"PingCommand{ trigger: "ping" }"#.to_string()
    }
}
