//! Event Reconciler - incremental change application
//!
//! Applies ordered batches of change events against the entity stores,
//! accumulates counter deltas as each event resolves, and emits one
//! consolidated refresh per batch once every event has settled. Events that
//! turn out to be stale no-ops contribute neither deltas nor notifications.
//!
//! `skip_counter_update` marks a batch whose counters were already adjusted
//! elsewhere (bulk UI actions adjust optimistically); flag updates in such a
//! batch mutate the stores but skip delta application.

use crate::models::{
    ConversationEvent, ConversationPatch, ListFilter, MessageEvent, MessagePatch,
};

use super::{CounterKind, MailCache};

impl MailCache {
    /// Apply a batch of message-stream events in submission order.
    pub async fn apply_message_events(&self, events: Vec<MessageEvent>, skip_counter_update: bool) {
        let mut touched = false;

        for event in events {
            touched |= match event {
                MessageEvent::Delete { id } => {
                    let removed = self.messages.write().await.remove_where(|m| m.id == id);
                    removed > 0
                }
                MessageEvent::Create { message } => {
                    self.messages.write().await.upsert(vec![message]);
                    true
                }
                MessageEvent::UpdateDraft { id: _, message } => {
                    // A draft update is a content update: plain overlay.
                    self.messages.write().await.upsert(vec![message]);
                    true
                }
                MessageEvent::UpdateFlags { id, patch } => {
                    self.update_message_flags(&id, patch, skip_counter_update)
                        .await
                }
            };
        }

        if touched {
            self.emit_refresh().await;
        }
    }

    /// Apply a batch of conversation-stream events in submission order.
    pub async fn apply_conversation_events(
        &self,
        events: Vec<ConversationEvent>,
        skip_counter_update: bool,
    ) {
        let mut touched = false;

        for event in events {
            touched |= match event {
                ConversationEvent::Delete { id } => self.delete_conversation(&id).await,
                ConversationEvent::Create { id, patch } => {
                    self.create_conversation(&id, patch).await
                }
                ConversationEvent::UpdateDraft { id, patch }
                | ConversationEvent::UpdateFlags { id, patch } => {
                    self.update_conversation_flags(&id, patch, skip_counter_update)
                        .await
                }
            };
        }

        if touched {
            self.emit_refresh().await;
        }
    }

    /// Remove a conversation and cascade-remove its messages.
    async fn delete_conversation(&self, id: &str) -> bool {
        let removed_messages = self
            .messages
            .write()
            .await
            .remove_where(|m| m.conversation_id.as_deref() == Some(id));

        let removed = self
            .conversations
            .write()
            .await
            .remove_where(|c| c.id == id);

        removed + removed_messages > 0
    }

    /// Known conversation: overlay the event payload. Unknown conversation:
    /// resolve it through a scoped remote listing so the cache learns the
    /// authoritative payload and total. A failed lookup drops the event.
    async fn create_conversation(&self, id: &str, patch: Option<ConversationPatch>) -> bool {
        let overlaid = {
            let mut store = self.conversations.write().await;
            match store.find(id) {
                Some(current) => {
                    if let Some(patch) = &patch {
                        let next = patch.apply(current);
                        store.replace(next);
                    }
                    true
                }
                None => false,
            }
        };
        if overlaid {
            return true;
        }

        let filter = ListFilter {
            conversation_id: Some(id.to_string()),
            label: self.session.read().await.active_label.clone(),
            ..Default::default()
        };

        match self.transport.query_conversations(&filter).await {
            Ok(page) => {
                if let Some(label) = &filter.label {
                    self.counters
                        .write()
                        .await
                        .update(label, None, None, Some(page.total));
                }
                self.conversations.write().await.upsert(page.items);
                true
            }
            Err(err) => {
                // Best effort: not retried, corrected by the next listing.
                log::warn!("dropping create event for conversation {}: {}", id, err);
                true
            }
        }
    }

    /// Overlay a flag patch on a cached message. Unknown ids and stale
    /// no-ops are silent; real changes contribute a counter delta unless the
    /// batch is marked as already reconciled.
    async fn update_message_flags(
        &self,
        id: &str,
        patch: MessagePatch,
        skip_counter_update: bool,
    ) -> bool {
        let transition = {
            let mut store = self.messages.write().await;
            match store.find(id) {
                None => None,
                Some(current) => {
                    let next = patch.apply(current);
                    if next == *current {
                        None
                    } else {
                        let old = current.clone();
                        store.replace(next.clone());
                        Some((old, next))
                    }
                }
            }
        };

        match transition {
            Some((old, new)) => {
                if !skip_counter_update {
                    let universe = self.label_universe().await;
                    self.counters.write().await.apply_delta(
                        &old,
                        &new,
                        CounterKind::Message,
                        &universe,
                    );
                }
                true
            }
            None => false,
        }
    }

    /// Conversation flag overlay; an unknown id with a payload falls back to
    /// the create path.
    async fn update_conversation_flags(
        &self,
        id: &str,
        patch: ConversationPatch,
        skip_counter_update: bool,
    ) -> bool {
        let transition = {
            let mut store = self.conversations.write().await;
            match store.find(id) {
                None => None,
                Some(current) => {
                    let next = patch.apply(current);
                    if next == *current {
                        return false;
                    }
                    let old = current.clone();
                    store.replace(next.clone());
                    Some((old, next))
                }
            }
        };

        match transition {
            Some((old, new)) => {
                if !skip_counter_update {
                    let universe = self.label_universe().await;
                    self.counters.write().await.apply_delta(
                        &old,
                        &new,
                        CounterKind::Conversation,
                        &universe,
                    );
                }
                true
            }
            None => self.create_conversation(id, Some(patch)).await,
        }
    }
}
