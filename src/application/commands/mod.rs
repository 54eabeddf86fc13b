//! Built-in commands

pub mod add;
pub mod console;
pub mod ping;

pub use add::AddCommand;
pub use console::ConsoleCommand;
pub use ping::PingCommand;

use std::sync::Arc;

use crate::domain::entities::CommandRegistry;
use crate::infrastructure::config::TmuxConfig;
use crate::infrastructure::tmux::TmuxSession;

/// Register the stock commands. The console command is only added when
/// tmux is enabled.
pub fn register_builtins(registry: &mut CommandRegistry, tmux: &TmuxConfig) {
    registry.register(Arc::new(PingCommand));
    registry.register(Arc::new(AddCommand));

    if tmux.enabled {
        let session = Arc::new(TmuxSession::new(tmux.server.clone()));
        registry.register(Arc::new(ConsoleCommand::new(tmux.trigger.clone(), session)));
    }
}
