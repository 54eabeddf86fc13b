//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;

/// Environment variable holding the Slack API token
pub const TOKEN_ENV: &str = "SLACK_API_TOKEN";

/// Default handshake endpoint
pub const RTM_START_ENDPOINT: &str = "https://slack.com/api/rtm.start";

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub slack: SlackConfig,
    pub runtime: RuntimeConfig,
    pub tmux: TmuxConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SlackConfig {
    pub token: Option<String>,
    pub api_endpoint: String,
}

/// Queue sizes and shutdown timings of the dispatcher
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RuntimeConfig {
    pub inbound_capacity: usize,
    pub outgoing_capacity: usize,
    pub invocation_capacity: usize,
    pub shutdown_grace_ms: u64,
    pub close_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TmuxConfig {
    pub enabled: bool,
    /// Socket name passed to `tmux -L`
    pub server: String,
    /// First word that routes a message to the tmux session
    pub trigger: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "rtmbot".to_string(),
        }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_endpoint: RTM_START_ENDPOINT.to_string(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inbound_capacity: 10,
            outgoing_capacity: 10,
            invocation_capacity: 5,
            shutdown_grace_ms: 1000,
            close_timeout_ms: 1000,
        }
    }
}

impl RuntimeConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }
}

impl Default for TmuxConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            server: "minecraft".to_string(),
            trigger: "mc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some(PathBuf::from("rtmbot.log")),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Environment wins over file values
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                self.slack.token = Some(token);
            }
        }

        if let Ok(server) = std::env::var("RTMBOT_TMUX_SERVER") {
            self.tmux.server = server;
            self.tmux.enabled = true;
        }

        if let Ok(file) = std::env::var("RTMBOT_LOG_FILE") {
            self.logging.file = if file.is_empty() { None } else { Some(PathBuf::from(file)) };
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let runtime = &self.runtime;
        for (name, value) in [
            ("runtime.inbound-capacity", runtime.inbound_capacity),
            ("runtime.outgoing-capacity", runtime.outgoing_capacity),
            ("runtime.invocation-capacity", runtime.invocation_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue(format!("{} must be at least 1", name)));
            }
        }

        if self.tmux.enabled && self.tmux.server.trim().is_empty() {
            return Err(ConfigError::MissingField("tmux.server".to_string()));
        }

        Ok(())
    }

    /// The API token, or an error naming where it should come from
    pub fn token(&self) -> Result<&str, ConfigError> {
        self.slack
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingField(format!("slack.token (or {})", TOKEN_ENV)))
    }
}
