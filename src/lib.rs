//! rtmbot - a Slack real-time messaging bot
//!
//! Keeps one websocket to Slack open, runs addressed messages past a
//! registry of commands and writes replies back with increasing ids. A tmux
//! pane can be driven as a request/response console through delimited
//! exec operations.

pub mod domain;
pub mod application;
pub mod infrastructure;
