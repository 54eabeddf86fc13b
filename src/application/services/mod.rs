//! Application services - Id sequencing and help

pub mod help_service;
pub mod sequencer;

pub use help_service::{HelpRequest, HelpService};
pub use sequencer::Sequencer;
