//! Refresh Notification Bus
//!
//! Payload-free refresh signals for UI observers. A signal only says that
//! something in its category changed; observers re-query the cache.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Category of cache state that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshKind {
    /// A message or conversation list needs re-querying.
    ListChanged,
    /// Per-label counters changed.
    CountersChanged,
    /// The page title (unread badge) needs updating.
    PageTitleChanged,
    /// The currently open detail view needs re-querying.
    DetailChanged,
}

/// Broadcast bus for refresh signals. Cheap to clone; senders without any
/// live receiver are silently dropped.
#[derive(Debug, Clone)]
pub struct RefreshBus {
    sender: broadcast::Sender<RefreshKind>,
}

impl RefreshBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshKind> {
        self.sender.subscribe()
    }

    pub fn emit(&self, kind: RefreshKind) {
        // No receivers is fine: the UI may not have subscribed yet.
        let _ = self.sender.send(kind);
    }
}

impl Default for RefreshBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_and_receive() {
        let bus = RefreshBus::new();
        let mut rx = bus.subscribe();

        bus.emit(RefreshKind::ListChanged);
        bus.emit(RefreshKind::CountersChanged);

        assert_eq!(rx.recv().await.unwrap(), RefreshKind::ListChanged);
        assert_eq!(rx.recv().await.unwrap(), RefreshKind::CountersChanged);
    }

    #[test]
    fn test_emit_without_receivers_is_noop() {
        let bus = RefreshBus::new();
        bus.emit(RefreshKind::PageTitleChanged);
    }
}
