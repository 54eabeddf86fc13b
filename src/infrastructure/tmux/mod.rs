//! Request/response over a tmux pane
//!
//! tmux has no framing of its own, so each operation types a unique begin
//! marker, the input line and an end marker into the pane, captures the
//! pane and cuts out what appeared between the markers. Only one operation
//! may be in flight per session: anything else typing into the pane
//! desynchronizes the capture.

use async_trait::async_trait;
use rand::RngExt;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::errors::ExecError;

const TMUX_BIN: &str = "tmux";

/// Captured result of one external process
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub success: bool,
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external processes; swapped out in tests
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<ProcessOutput>;
}

/// Spawns real processes with `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<ProcessOutput> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(ProcessOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Hex SHA-256 of 32 random bytes
pub fn random_hash() -> String {
    let mut buf = [0u8; 32];
    rand::rng().fill(&mut buf);
    hex::encode(Sha256::digest(buf))
}

pub fn delimiters(hash: &str) -> (String, String) {
    (format!("### {} ###", hash), format!("###/ {} ###", hash))
}

/// One framed exec: markers plus the tmux invocations that drive it
#[derive(Debug, Clone)]
pub struct TmuxOperation {
    pub hash: String,
    pub begin: String,
    pub end: String,
    pub pipeline: Vec<Vec<String>>,
}

impl TmuxOperation {
    pub fn new(server: &str, keys: &str) -> Self {
        Self::with_hash(server, keys, random_hash())
    }

    pub fn with_hash(server: &str, keys: &str, hash: String) -> Self {
        let (begin, end) = delimiters(&hash);
        let tmux = |rest: &[&str]| {
            ["-L", server]
                .iter()
                .chain(rest)
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
        };

        let pipeline = vec![
            tmux(&["send-keys", begin.as_str(), "Enter"]),
            tmux(&["send-keys", keys, "Enter"]),
            tmux(&["send-keys", end.as_str(), "Enter"]),
            tmux(&["capture-pane"]),
            tmux(&["show-buffer"]),
        ];

        Self { hash, begin, end, pipeline }
    }

    /// Cut this operation's response out of a captured pane
    pub fn extract(&self, captured: &str) -> Result<String, ExecError> {
        extract_output(captured, &self.begin, &self.end)
    }
}

/// Blank or a bare shell/console prompt
fn is_prompt(line: &str) -> bool {
    matches!(line.trim(), "" | ">" | "$" | "#")
}

/// Text between the markers, minus the first three lines of the region
/// (rest of the begin marker line, its echo, the input line echo) and
/// minus a prompt in front of the end marker. Output on the end marker's
/// line is kept.
pub fn extract_output(captured: &str, begin: &str, end: &str) -> Result<String, ExecError> {
    let start = captured.find(begin).ok_or(ExecError::MissingBegin)? + begin.len();
    let stop = captured.find(end).ok_or(ExecError::MissingEnd)?;
    if stop < start {
        return Err(ExecError::MarkersOutOfOrder);
    }

    let region = &captured[start..stop];
    let pieces: Vec<&str> = region.splitn(4, '\n').collect();
    let Some(&body) = pieces.get(3) else {
        return Err(ExecError::RegionTooShort { lines: pieces.len() });
    };

    let body = match body.rfind('\n') {
        Some(i) if is_prompt(&body[i + 1..]) => &body[..i],
        None if is_prompt(body) => "",
        _ => body,
    };
    Ok(body.trim_end().to_string())
}

/// A tmux server driven one operation at a time
pub struct TmuxSession {
    server: String,
    runner: Arc<dyn ProcessRunner>,
    in_flight: Mutex<()>,
}

impl TmuxSession {
    pub fn new(server: impl Into<String>) -> Self {
        Self::with_runner(server, Arc::new(SystemRunner))
    }

    pub fn with_runner(server: impl Into<String>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            server: server.into(),
            runner,
            in_flight: Mutex::new(()),
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Type `keys` into the pane and return the output it produced.
    ///
    /// The input is not sanitized. There is no timeout: a hung tmux call
    /// blocks every later operation on this session.
    pub async fn send_keys_and_capture(&self, keys: &str) -> Result<String, ExecError> {
        let _guard = self.in_flight.lock().await;
        let operation = TmuxOperation::new(&self.server, keys);
        tracing::debug!("tmux operation {} on {}: {}", operation.hash, self.server, keys);

        let mut captured = String::new();
        let steps = operation.pipeline.len();
        for (i, args) in operation.pipeline.iter().enumerate() {
            let step = i + 1;
            let output = self.runner
                .run(TMUX_BIN, args)
                .await
                .map_err(|source| ExecError::Spawn { step, source })?;

            if !output.success {
                return Err(ExecError::Process {
                    step,
                    status: output.status,
                    stderr: output.stderr.trim().to_string(),
                });
            }

            if step == steps {
                captured = output.stdout;
            }
        }

        operation.extract(&captured)
    }
}
