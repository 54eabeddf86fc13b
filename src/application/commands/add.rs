use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::application::errors::CommandError;
use crate::application::messaging::Outbox;
use crate::domain::entities::Command;

static ADD_TRIGGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^add (?P<a>-?\d+) (?P<b>-?\d+)$").expect("add pattern is valid"));

/// Adds two integers: `add 1 2`
#[derive(Debug, Default, Clone, Copy)]
pub struct AddCommand;

#[async_trait]
impl Command for AddCommand {
    fn help(&self) -> String {
        "*add*: Add two numbers together.\n\tAdd takes two numbers and adds them together.\n\tex: @bot: add 1 2"
            .to_string()
    }

    fn matches(&self, text: &str) -> bool {
        ADD_TRIGGER.is_match(text)
    }

    async fn run(&self, channel: &str, text: &str, out: Outbox) -> Result<(), CommandError> {
        let captures = ADD_TRIGGER
            .captures(text)
            .ok_or_else(|| CommandError::InvalidArgs(text.to_string()))?;

        let operand = |name: &str| -> Result<i64, CommandError> {
            captures[name]
                .parse()
                .map_err(|e| CommandError::InvalidArgs(format!("{}: {}", &captures[name], e)))
        };
        let a = operand("a")?;
        let b = operand("b")?;
        let sum = a
            .checked_add(b)
            .ok_or_else(|| CommandError::ExecutionFailed(format!("{} + {} overflows", a, b)))?;

        out.send(channel, format!("{} + {} = {}", a, b, sum)).await?;
        Ok(())
    }

    fn label(&self) -> String {
        r#"AddCommand{ trigger: "add a b" }"#.to_string()
    }
}
