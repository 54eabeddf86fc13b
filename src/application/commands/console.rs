use async_trait::async_trait;
use std::sync::Arc;

use crate::application::errors::CommandError;
use crate::application::messaging::Outbox;
use crate::domain::entities::Command;
use crate::infrastructure::tmux::TmuxSession;

/// Forwards `<trigger> <line>` to a tmux-hosted console and replies with
/// what the line printed
pub struct ConsoleCommand {
    trigger: String,
    tmux: Arc<TmuxSession>,
}

impl ConsoleCommand {
    pub fn new(trigger: impl Into<String>, tmux: Arc<TmuxSession>) -> Self {
        Self {
            trigger: trigger.into(),
            tmux,
        }
    }

    fn line<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.strip_prefix(self.trigger.as_str())
            .and_then(|rest| rest.strip_prefix(char::is_whitespace))
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

#[async_trait]
impl Command for ConsoleCommand {
    fn help(&self) -> String {
        format!(
            "*{}*: Run a line on the {} console. Usage: {} <command>\nThe reply is whatever the console printed for that line.",
            self.trigger,
            self.tmux.server(),
            self.trigger
        )
    }

    fn matches(&self, text: &str) -> bool {
        self.line(text).is_some()
    }

    async fn run(&self, channel: &str, text: &str, out: Outbox) -> Result<(), CommandError> {
        let line = self
            .line(text)
            .ok_or_else(|| CommandError::InvalidArgs(text.to_string()))?;

        let output = self.tmux.send_keys_and_capture(line).await?;
        let reply = if output.is_empty() {
            "_(no output)_".to_string()
        } else {
            format!("```\n{}\n```", output)
        };

        out.send(channel, reply).await?;
        Ok(())
    }

    fn label(&self) -> String {
        format!("ConsoleCommand{{ trigger: \"{} <command>\", server: {} }}", self.trigger, self.tmux.server())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::ExecError;
    use crate::application::services::Sequencer;
    use crate::infrastructure::tmux::{ProcessOutput, ProcessRunner};
    use std::sync::Mutex as StdMutex;

    /// A console that prints `output` for whatever line it is given
    struct ScriptedConsole {
        output: &'static str,
        fail_step: Option<usize>,
        typed: StdMutex<Vec<String>>,
        calls: StdMutex<usize>,
    }

    impl ScriptedConsole {
        fn new(output: &'static str, fail_step: Option<usize>) -> Self {
            Self {
                output,
                fail_step,
                typed: StdMutex::new(Vec::new()),
                calls: StdMutex::new(0),
            }
        }
    }

    #[async_trait]
    impl ProcessRunner for ScriptedConsole {
        async fn run(&self, _program: &str, args: &[String]) -> std::io::Result<ProcessOutput> {
            let step = {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            if self.fail_step == Some(step) {
                return Ok(ProcessOutput {
                    success: false,
                    status: "exit status: 1".to_string(),
                    stderr: "no server running on /tmp/tmux-0/minecraft".to_string(),
                    ..Default::default()
                });
            }

            let mut typed = self.typed.lock().unwrap();
            match args[2].as_str() {
                "send-keys" => typed.push(args[3].clone()),
                "show-buffer" => {
                    let body = if self.output.is_empty() {
                        String::new()
                    } else {
                        format!("{}\n", self.output)
                    };
                    let pane = format!(
                        "> {}\nUnknown command.\n> {}\n{}> {}\nUnknown command.\n",
                        typed[0], typed[1], body, typed[2]
                    );
                    return Ok(ProcessOutput { success: true, stdout: pane, ..Default::default() });
                }
                _ => {}
            }
            Ok(ProcessOutput { success: true, ..Default::default() })
        }
    }

    fn console(runner: ScriptedConsole) -> ConsoleCommand {
        ConsoleCommand::new("mc", Arc::new(TmuxSession::with_runner("minecraft", Arc::new(runner))))
    }

    #[tokio::test]
    async fn test_output_is_wrapped_in_code_block() {
        let cmd = console(ScriptedConsole::new("There are 0 of a max 20 players online:", None));
        let (out, mut rx) = Outbox::new(Sequencer::new(), 4);

        cmd.run("C1", "mc list", out).await.unwrap();
        let reply = rx.recv().await.unwrap();
        assert_eq!(reply.channel(), "C1");
        assert_eq!(reply.text(), "```\nThere are 0 of a max 20 players online:\n```");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_empty_output_reply() {
        let cmd = console(ScriptedConsole::new("", None));
        let (out, mut rx) = Outbox::new(Sequencer::new(), 4);

        cmd.run("C1", "mc save-all", out).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().text(), "_(no output)_");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_tmux_step_is_command_error() {
        let cmd = console(ScriptedConsole::new("ignored", Some(1)));
        let (out, mut rx) = Outbox::new(Sequencer::new(), 4);

        let err = cmd.run("C1", "mc list", out).await.unwrap_err();
        match err {
            CommandError::Exec(ExecError::Process { step, stderr, .. }) => {
                assert_eq!(step, 1);
                assert!(stderr.contains("no server running"));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_trigger_requires_a_line() {
        let cmd = ConsoleCommand::new("mc", Arc::new(TmuxSession::new("minecraft")));
        assert!(cmd.matches("mc list"));
        assert!(cmd.matches("mc   say hello"));
        assert!(!cmd.matches("mc"));
        assert!(!cmd.matches("mc   "));
        assert!(!cmd.matches("mcx list"));
        assert_eq!(cmd.line("mc  say hello "), Some("say hello"));
    }
}
