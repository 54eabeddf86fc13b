//! Domain entities - Core objects of the bot

pub mod command;
pub mod help;
pub mod message;
pub mod session;

pub use command::{Command, CommandRegistry};
pub use help::HelpEntry;
pub use message::{InboundEvent, OutboundMessage};
pub use session::Session;
