//! Message handling - Event-driven message processing

pub mod connection;
pub mod dispatcher;
pub mod outbox;
pub mod parser;

pub use connection::Connection;
pub use dispatcher::{Dispatcher, RuntimeState};
pub use outbox::Outbox;
