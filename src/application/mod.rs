//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Errors: Error taxonomy shared across layers
//! - Services: Sequencing and help rendering
//! - Messaging: Frame parsing, outbox, connection and the dispatch runtime
//! - Commands: Built-in command implementations

pub mod errors;
pub mod services;
pub mod messaging;
pub mod commands;
