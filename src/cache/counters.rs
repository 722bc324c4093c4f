//! Counter Ledger - per-label aggregate counts
//!
//! Tracks, per label, the message total, unread total and conversation
//! total. Counters are maintained by delta accumulation: each cache mutation
//! contributes the difference between the entity's membership vector before
//! and after, never a full recount. Authoritative remote counts periodically
//! overwrite the accumulated values to resynchronize drift.

use std::collections::HashMap;

use crate::models::Countable;
use crate::notify::{RefreshBus, RefreshKind};
use crate::transport::LabelCount;

/// Which counter family a delta applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Message,
    Conversation,
}

/// Per-label counter entry, lazily created at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    pub total: i64,
    pub unread: i64,
    pub conversations: i64,
}

/// Per-label counter ledger. Entries live for the session; they are
/// corrected by explicit updates, delta application, or an authoritative
/// recount — never recomputed from the store.
#[derive(Debug)]
pub struct CounterLedger {
    counters: HashMap<String, Counter>,
    bus: RefreshBus,
}

impl CounterLedger {
    pub fn new(bus: RefreshBus) -> Self {
        Self {
            counters: HashMap::new(),
            bus,
        }
    }

    /// Idempotently initialize a zeroed entry for the label.
    pub fn ensure(&mut self, label: &str) {
        self.counters.entry(label.to_string()).or_default();
    }

    /// Partial update: only provided fields change. Emits a counters-changed
    /// notification.
    pub fn update(
        &mut self,
        label: &str,
        total: Option<i64>,
        unread: Option<i64>,
        conversations: Option<i64>,
    ) {
        let entry = self.counters.entry(label.to_string()).or_default();

        if let Some(total) = total {
            entry.total = total;
        }
        if let Some(unread) = unread {
            entry.unread = unread;
        }
        if let Some(conversations) = conversations {
            entry.conversations = conversations;
        }

        self.bus.emit(RefreshKind::CountersChanged);
        self.bus.emit(RefreshKind::PageTitleChanged);
    }

    pub fn total(&self, label: &str) -> Option<i64> {
        self.counters.get(label).map(|c| c.total)
    }

    pub fn unread(&self, label: &str) -> Option<i64> {
        self.counters.get(label).map(|c| c.unread)
    }

    pub fn conversations(&self, label: &str) -> Option<i64> {
        self.counters.get(label).map(|c| c.conversations)
    }

    /// Zero a label's entry, keeping it known.
    pub fn reset(&mut self, label: &str) {
        if let Some(entry) = self.counters.get_mut(label) {
            *entry = Counter::default();
        }
    }

    /// Apply the membership delta of an `old -> new` entity transition to
    /// every label in the universe. Message deltas adjust total and unread;
    /// conversation deltas adjust the conversation total.
    ///
    /// Deltas are accumulated silently; callers emit one consolidated
    /// refresh per batch.
    pub fn apply_delta<T: Countable>(
        &mut self,
        old: &T,
        new: &T,
        kind: CounterKind,
        universe: &[String],
    ) {
        for label in universe {
            let delta_total = membership(new, label, false) - membership(old, label, false);
            let delta_unread = membership(new, label, true) - membership(old, label, true);

            if delta_total == 0 && delta_unread == 0 {
                continue;
            }

            let entry = self.counters.entry(label.clone()).or_default();
            match kind {
                CounterKind::Message => {
                    entry.total += delta_total;
                    entry.unread += delta_unread;
                }
                CounterKind::Conversation => {
                    entry.conversations += delta_total;
                }
            }
        }
    }

    /// Overwrite message totals from an authoritative remote recount.
    /// Silent: the caller emits the refresh once both recounts landed.
    pub fn absorb_message_counts(&mut self, counts: &[LabelCount]) {
        for count in counts {
            let entry = self.counters.entry(count.label_id.clone()).or_default();
            entry.total = count.total;
            entry.unread = count.unread;
        }
    }

    /// Overwrite conversation totals from an authoritative remote recount.
    pub fn absorb_conversation_counts(&mut self, counts: &[LabelCount]) {
        for count in counts {
            let entry = self.counters.entry(count.label_id.clone()).or_default();
            entry.conversations = count.total;
        }
    }
}

/// Membership vector component: 1 if the entity carries the label (and, in
/// unread mode, still counts as unread), else 0.
fn membership<T: Countable>(entity: &T, label: &str, unread: bool) -> i64 {
    let member = entity.labels().iter().any(|l| l == label);
    let condition = !unread || entity.counts_as_unread();
    i64::from(member && condition)
}
