//! Cache Module - entity store, counters and consistency reconciliation
//!
//! [`MailCache`] is the single owning component for all cached state: the
//! deduplicated message/conversation stores, the per-label counter ledger
//! and the session context. Every mutation routes through its public
//! operations (queries, event application, eviction); nothing outside this
//! module touches the stores directly.
//!
//! Submodules:
//! - store: deduplicated entity collections
//! - counters: per-label counter ledger with delta accumulation
//! - pagination: page-completeness decision (cache hit vs. remote fetch)
//! - fetcher: remote-backed queries that repopulate store and ledger
//! - reconciler: incremental change-event application
//! - sweeper: background eviction of expired messages

pub mod counters;
pub mod fetcher;
pub mod pagination;
pub mod reconciler;
pub mod store;
pub mod sweeper;


pub use counters::{Counter, CounterKind, CounterLedger};
pub use pagination::PageDecision;
pub use store::EntityStore;
pub use sweeper::{ExpirationSweeper, SweeperConfig, SweeperError};

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::{labels, Conversation, ListFilter, Message};
use crate::notify::{RefreshBus, RefreshKind};
use crate::transport::{RemoteTransport, TransportError};

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Server-side listing page size.
    pub page_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { page_size: 50 }
    }
}

/// Cache errors surfaced to callers. Everything else degrades to a remote
/// refetch instead of an error.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Per-session context the cache needs beyond the stores themselves.
#[derive(Debug, Default)]
struct Session {
    /// User-defined label ids, part of the counter universe.
    user_labels: Vec<String>,

    /// Label of the mailbox the UI is currently listing, if any. Scopes the
    /// remote lookup that resolves an unknown conversation on Create.
    active_label: Option<String>,

    /// Id of the entity currently open in a detail view, if any. Controls
    /// whether batch refreshes include a detail-changed signal.
    active_detail: Option<String>,
}

/// Client-side cache and consistency-reconciliation engine.
///
/// Lives for one authenticated session: constructed at login with the
/// session's transport, cleared at logout. Callers share it behind an `Arc`.
pub struct MailCache {
    config: CacheConfig,
    transport: Arc<dyn RemoteTransport>,
    messages: RwLock<EntityStore<Message>>,
    conversations: RwLock<EntityStore<Conversation>>,
    counters: RwLock<CounterLedger>,
    session: RwLock<Session>,
    bus: RefreshBus,
}

impl MailCache {
    pub fn new(transport: Arc<dyn RemoteTransport>) -> Self {
        Self::with_config(transport, CacheConfig::default())
    }

    pub fn with_config(transport: Arc<dyn RemoteTransport>, config: CacheConfig) -> Self {
        let bus = RefreshBus::new();
        Self {
            config,
            transport,
            messages: RwLock::new(EntityStore::new()),
            conversations: RwLock::new(EntityStore::new()),
            counters: RwLock::new(CounterLedger::new(bus.clone())),
            session: RwLock::new(Session::default()),
            bus,
        }
    }

    /// Subscribe to refresh signals.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<RefreshKind> {
        self.bus.subscribe()
    }

    /// Replace the session's user-defined labels (part of the counter
    /// universe).
    pub async fn set_user_labels(&self, labels: Vec<String>) {
        self.session.write().await.user_labels = labels;
    }

    /// Record which entity a detail view currently shows, or `None` when no
    /// detail view is open.
    pub async fn set_active_detail(&self, id: Option<String>) {
        self.session.write().await.active_detail = id;
    }

    /// Record the mailbox label the UI is currently listing.
    pub async fn set_active_label(&self, label: Option<String>) {
        self.session.write().await.active_label = label;
    }

    /// System folders plus the session's user labels.
    pub(crate) async fn label_universe(&self) -> Vec<String> {
        let session = self.session.read().await;
        labels::SYSTEM
            .iter()
            .map(|l| l.to_string())
            .chain(session.user_labels.iter().cloned())
            .collect()
    }

    // ========================================================================
    // Read API
    // ========================================================================

    /// Message listing: served from the cache when the request is a plain
    /// label listing and the cached page is provably complete, otherwise
    /// fetched remotely (which repopulates store and ledger).
    pub async fn query_messages(&self, request: &ListFilter) -> Result<Vec<Message>, CacheError> {
        if let Some(label) = cacheable_label(request) {
            let page = request.page.unwrap_or(0);

            let cached = {
                let store = self.messages.read().await;
                store.copy_where(|m| m.label_ids.iter().any(|l| l == &label))
            };
            let ordered = store::order(cached);
            let total = self.counters.read().await.total(&label);

            log::debug!(
                "query_messages label={} page={} cached={} total={:?}",
                label,
                page,
                ordered.len(),
                total
            );

            match pagination::decide(ordered, total, page, self.config.page_size) {
                PageDecision::Hit(items) => return Ok(items),
                PageDecision::Miss => {}
            }
        }

        self.fetch_messages(request).await
    }

    /// Conversation listing, same decision rule against the ledger's
    /// conversation total.
    pub async fn query_conversations(
        &self,
        request: &ListFilter,
    ) -> Result<Vec<Conversation>, CacheError> {
        if let Some(label) = cacheable_label(request) {
            let page = request.page.unwrap_or(0);

            let cached = {
                let store = self.conversations.read().await;
                store.copy_where(|c| c.label_ids.iter().any(|l| l == &label))
            };
            let ordered = store::order(cached);
            let total = self.counters.read().await.conversations(&label);

            log::debug!(
                "query_conversations label={} page={} cached={} total={:?}",
                label,
                page,
                ordered.len(),
                total
            );

            match pagination::decide(ordered, total, page, self.config.page_size) {
                PageDecision::Hit(items) => return Ok(items),
                PageDecision::Miss => {}
            }
        }

        self.fetch_conversations(request).await
    }

    /// A message is only a cache hit once its body has been fetched;
    /// summary-only entries still go remote.
    pub async fn get_message(&self, id: &str) -> Result<Message, CacheError> {
        {
            let store = self.messages.read().await;
            if let Some(message) = store.find(id) {
                if message.body.is_some() {
                    return Ok(message.clone());
                }
            }
        }

        self.fetch_message(id).await
    }

    pub async fn get_conversation(&self, id: &str) -> Result<Conversation, CacheError> {
        {
            let store = self.conversations.read().await;
            if let Some(conversation) = store.find(id) {
                return Ok(conversation.clone());
            }
        }

        self.fetch_conversation(id).await
    }

    /// Messages of one conversation: a hit only when the cached message set
    /// is exactly as large as the conversation claims.
    pub async fn conversation_messages(&self, id: &str) -> Result<Vec<Message>, CacheError> {
        let expected = {
            let store = self.conversations.read().await;
            store.find(id).map(|c| c.num_messages)
        };

        if let Some(expected) = expected {
            let cached = self.cached_conversation_messages(id).await;
            if cached.len() as i64 == expected {
                return Ok(store::order(cached));
            }
        }

        self.fetch_conversation_messages(id).await
    }

    /// Defensive copies of the cached messages of a conversation. Never
    /// falls back to the remote store.
    pub async fn cached_conversation_messages(&self, id: &str) -> Vec<Message> {
        let store = self.messages.read().await;
        store.copy_where(|m| m.conversation_id.as_deref() == Some(id))
    }

    // ========================================================================
    // Eviction & lifecycle
    // ========================================================================

    /// Evict every conversation carrying `label`, cascading to its messages,
    /// then signal a refresh. Label-scoped: other labels keep their cached
    /// entries.
    pub async fn empty(&self, label: &str) {
        let evicted: Vec<String> = {
            let mut conversations = self.conversations.write().await;
            let ids: Vec<String> = conversations
                .filter(|c| c.label_ids.iter().any(|l| l == label))
                .iter()
                .map(|c| c.id.clone())
                .collect();
            conversations.remove_where(|c| ids.iter().any(|id| id == &c.id));
            ids
        };

        if !evicted.is_empty() {
            let mut messages = self.messages.write().await;
            messages.remove_where(|m| match m.conversation_id.as_deref() {
                Some(cid) => evicted.iter().any(|id| id == cid),
                None => false,
            });
        }

        log::info!("evicted {} conversations for label {}", evicted.len(), label);
        self.emit_refresh().await;
    }

    /// Drop all cached entities. Counters survive: they are corrected by the
    /// next authoritative recount, not recomputed from the store.
    pub async fn clear(&self) {
        self.messages.write().await.clear();
        self.conversations.write().await.clear();
        log::info!("cache cleared");
    }

    /// Clear, then warm the cache with the default mailboxes.
    pub async fn reset(&self) -> Result<(), CacheError> {
        self.clear().await;
        self.preload_inbox_and_sent().await
    }

    /// Consolidated refresh after a settled mutation batch: lists, counters
    /// and page title always; the detail view only when one is open.
    pub(crate) async fn emit_refresh(&self) {
        self.bus.emit(RefreshKind::ListChanged);
        self.bus.emit(RefreshKind::CountersChanged);
        self.bus.emit(RefreshKind::PageTitleChanged);

        if self.session.read().await.active_detail.is_some() {
            self.bus.emit(RefreshKind::DetailChanged);
        }
    }
}

/// The label to serve from the cache, if the request shape allows caching
/// at all.
fn cacheable_label(request: &ListFilter) -> Option<String> {
    if request.is_cacheable() {
        request.label.clone()
    } else {
        None
    }
}
