//! # mailcache
//!
//! Client-side cache and consistency-reconciliation engine for a webmail
//! client: local copies of paginated message/conversation lists and
//! per-label counters, kept in sync with an authoritative remote store
//! while minimizing redundant fetches.
//!
//! The remote transport, UI layer and event delivery are external
//! collaborators; this crate owns the in-memory projection and the
//! decision of when that projection can be trusted.

pub mod cache;
pub mod models;
pub mod notify;
pub mod transport;

pub use cache::{
    CacheConfig, CacheError, CounterLedger, ExpirationSweeper, MailCache, SweeperConfig,
};
pub use models::{
    labels, Conversation, ConversationEvent, ConversationPatch, ListFilter, Message,
    MessageEvent, MessagePatch,
};
pub use notify::RefreshKind;
pub use transport::{LabelCount, ListPage, RemoteTransport, TransportError};
