//! Transport adapters

pub mod console;
pub mod slack;
