//! Domain layer - Core types of the bot
//!
//! This layer contains:
//! - Entities: Session, inbound/outbound messages, commands, help entries
//! - Traits: Abstractions over the duplex transport

pub mod entities;
pub mod traits;
