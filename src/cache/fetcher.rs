//! Remote Fetcher - transport-backed queries
//!
//! Thin adapter over the [`RemoteTransport`]: every successful fetch feeds
//! its payload back into the entity stores and, for cacheable listings, the
//! authoritative total into the counter ledger. A failed call leaves the
//! cache untouched and propagates to the caller.
//!
//! [`RemoteTransport`]: crate::transport::RemoteTransport

use futures::future::try_join;

use crate::models::{labels, Conversation, ListFilter, Message};
use crate::notify::RefreshKind;

use super::{store, CacheError, MailCache};

impl MailCache {
    /// List messages remotely; record the label's authoritative total and
    /// absorb the items when the request shape is cacheable.
    pub(crate) async fn fetch_messages(
        &self,
        request: &ListFilter,
    ) -> Result<Vec<Message>, CacheError> {
        let page = self.transport.query_messages(request).await?;

        log::debug!(
            "fetched {} messages (total {}) for {:?}",
            page.items.len(),
            page.total,
            request.label
        );

        if request.is_cacheable() {
            if let Some(label) = &request.label {
                self.counters
                    .write()
                    .await
                    .update(label, Some(page.total), None, None);
            }
            self.messages.write().await.upsert(page.items.clone());
        }

        Ok(store::order(page.items))
    }

    /// List conversations remotely; the returned total feeds the label's
    /// conversation counter.
    pub(crate) async fn fetch_conversations(
        &self,
        request: &ListFilter,
    ) -> Result<Vec<Conversation>, CacheError> {
        let page = self.transport.query_conversations(request).await?;

        log::debug!(
            "fetched {} conversations (total {}) for {:?}",
            page.items.len(),
            page.total,
            request.label
        );

        if request.is_cacheable() {
            if let Some(label) = &request.label {
                self.counters
                    .write()
                    .await
                    .update(label, None, None, Some(page.total));
            }
            self.conversations.write().await.upsert(page.items.clone());
        }

        Ok(store::order(page.items))
    }

    /// Fetch one full message and store it as preloaded.
    pub(crate) async fn fetch_message(&self, id: &str) -> Result<Message, CacheError> {
        let mut message = self.transport.get_message(id).await?;
        message.preloaded = true;

        self.messages.write().await.upsert(vec![message.clone()]);
        Ok(message)
    }

    /// Fetch one conversation with its message list; both land in the cache
    /// and the conversation is marked preloaded.
    pub(crate) async fn fetch_conversation(&self, id: &str) -> Result<Conversation, CacheError> {
        let (mut conversation, messages) = self.transport.get_conversation(id).await?;
        conversation.preloaded = true;

        self.conversations
            .write()
            .await
            .upsert(vec![conversation.clone()]);
        self.messages.write().await.upsert(messages);

        Ok(conversation)
    }

    /// Fetch a conversation's message list, absorbing conversation and
    /// messages into the cache.
    pub(crate) async fn fetch_conversation_messages(
        &self,
        id: &str,
    ) -> Result<Vec<Message>, CacheError> {
        let (conversation, messages) = self.transport.get_conversation(id).await?;

        self.conversations.write().await.upsert(vec![conversation]);
        self.messages.write().await.upsert(messages.clone());

        Ok(store::order(messages))
    }

    /// Authoritative recount: overwrite the ledger from the remote per-label
    /// counts, resynchronizing any drift accumulated by deltas.
    pub async fn refresh_counts(&self) -> Result<(), CacheError> {
        let (message_counts, conversation_counts) = try_join(
            self.transport.message_counts(),
            self.transport.conversation_counts(),
        )
        .await?;

        {
            let mut ledger = self.counters.write().await;
            ledger.absorb_message_counts(&message_counts);
            ledger.absorb_conversation_counts(&conversation_counts);
        }

        log::info!(
            "absorbed authoritative counts for {} message / {} conversation labels",
            message_counts.len(),
            conversation_counts.len()
        );

        self.bus.emit(RefreshKind::CountersChanged);
        self.bus.emit(RefreshKind::PageTitleChanged);
        Ok(())
    }

    /// Warm the cache with the first page of inbox conversations and sent
    /// messages.
    pub async fn preload_inbox_and_sent(&self) -> Result<(), CacheError> {
        let inbox = ListFilter::for_label(labels::INBOX).with_page(0);
        let sent = ListFilter::for_label(labels::SENT).with_page(0);

        try_join(
            self.fetch_conversations(&inbox),
            self.fetch_messages(&sent),
        )
        .await?;

        Ok(())
    }
}
