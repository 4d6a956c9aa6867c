//! Append-only transcript store shared between the send path and the
//! transport's inbound handler.

use mentor_types::TranscriptEntry;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Capacity of the per-conversation update broadcast.
const DEFAULT_UPDATE_BROADCAST_CAPACITY: usize = 256;

/// Ordered record of one conversation.
///
/// Entries are only ever pushed; readers get copies. Each append is also
/// broadcast to subscribers, in append order.
#[derive(Debug, Clone)]
pub struct Transcript {
    entries: Arc<RwLock<Vec<TranscriptEntry>>>,
    updates: broadcast::Sender<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(DEFAULT_UPDATE_BROADCAST_CAPACITY);
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            updates,
        }
    }

    /// Appends an entry and returns its index.
    pub fn append(&self, entry: TranscriptEntry) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.push(entry.clone());
        // Broadcast under the lock so subscribers see append order.
        let _ = self.updates.send(entry);
        entries.len() - 1
    }

    /// Copy of every entry, in order.
    pub fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn get(&self, index: usize) -> Option<TranscriptEntry> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(index)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receives every entry appended after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEntry> {
        self.updates.subscribe()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
