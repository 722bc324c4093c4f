//! Remote Transport Seam
//!
//! The cache never talks to the network itself; it consumes an API client
//! implementing [`RemoteTransport`]. Implementations are expected to report
//! a `total` consistent with items ordered by time descending, otherwise the
//! pagination decision will keep missing for that label.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Conversation, ListFilter, Message};

/// One page of a remote listing plus the authoritative total for the filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// Authoritative per-label counts as reported by the remote `count` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelCount {
    pub label_id: String,
    pub total: i64,
    #[serde(default)]
    pub unread: i64,
}

/// Transport failures. The cache propagates these to the immediate caller
/// and leaves its state unchanged.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The API answered with a non-success status code.
    #[error("remote returned status {0}")]
    Status(u32),

    #[error("network error: {0}")]
    Network(String),
}

/// API client surface consumed by the cache.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn query_messages(&self, filter: &ListFilter) -> Result<ListPage<Message>, TransportError>;

    async fn query_conversations(
        &self,
        filter: &ListFilter,
    ) -> Result<ListPage<Conversation>, TransportError>;

    async fn get_message(&self, id: &str) -> Result<Message, TransportError>;

    /// Fetch a conversation together with its full message list.
    async fn get_conversation(
        &self,
        id: &str,
    ) -> Result<(Conversation, Vec<Message>), TransportError>;

    async fn message_counts(&self) -> Result<Vec<LabelCount>, TransportError>;

    async fn conversation_counts(&self) -> Result<Vec<LabelCount>, TransportError>;
}
