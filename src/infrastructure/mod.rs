//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Logging: Subscriber setup
//! - Adapters: Transports (Slack websocket, console)
//! - Tmux: Delimited exec over a tmux pane

pub mod config;
pub mod logging;
pub mod adapters;
pub mod tmux;
