use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Hands out outgoing message ids, starting at 1.
///
/// Clones share one counter. Ids are unique and increase with call order
/// across every clone and thread.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    last: Arc<AtomicU64>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> u64 {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last id handed out, 0 if none
    pub fn current(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}
