use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use super::types::{PlaybackError, PlaybackEvent, PlaybackState};

/// Latest published state, shared with anyone who prefers polling.
pub type SnapshotHandle = Arc<Mutex<PlaybackState>>;

/// Fan-out of state changes and failures to subscribers.
///
/// Subscribers whose receiver was dropped are pruned on the next publish.
pub(crate) struct Observers {
    subscribers: Vec<Sender<PlaybackEvent>>,
    snapshot: SnapshotHandle,
}

impl Observers {
    pub fn new(initial: PlaybackState) -> Self {
        Self {
            subscribers: Vec::new(),
            snapshot: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.snapshot.clone()
    }

    /// Register `tx`, starting it off with `current`.
    pub fn subscribe(&mut self, tx: Sender<PlaybackEvent>, current: &PlaybackState) {
        if tx.send(PlaybackEvent::Changed(current.clone())).is_ok() {
            self.subscribers.push(tx);
        }
    }

    pub fn publish_state(&mut self, state: &PlaybackState) {
        if let Ok(mut snapshot) = self.snapshot.lock() {
            *snapshot = state.clone();
        }
        self.broadcast(PlaybackEvent::Changed(state.clone()));
    }

    pub fn publish_failure(&mut self, error: PlaybackError) {
        self.broadcast(PlaybackEvent::Failed(error));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn broadcast(&mut self, event: PlaybackEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
