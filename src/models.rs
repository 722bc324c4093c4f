//! Cache Data Models
//!
//! Entities mirrored from the remote store plus the change-event types the
//! reconciler consumes:
//! - Message / Conversation: deduplicated cache entities keyed by id
//! - MessagePatch / ConversationPatch: partial overlays carried by flag events
//! - MessageEvent / ConversationEvent: tagged change notifications per stream
//! - ListFilter: request shape for list queries (decides cacheability)

use serde::{Deserialize, Serialize};

// ============================================================================
// Labels
// ============================================================================

/// System folder identifiers, matching the remote store's numeric label ids.
pub mod labels {
    pub const INBOX: &str = "0";
    pub const DRAFTS: &str = "1";
    pub const SENT: &str = "2";
    pub const TRASH: &str = "3";
    pub const SPAM: &str = "4";
    pub const ARCHIVE: &str = "6";
    pub const STARRED: &str = "10";

    /// Every system folder that participates in counter bookkeeping.
    pub const SYSTEM: [&str; 7] = [INBOX, DRAFTS, SENT, TRASH, SPAM, ARCHIVE, STARRED];
}

// ============================================================================
// Entities
// ============================================================================

/// Common behavior for cached entities: identity, ordering key and
/// field-wise merge of a newer payload onto the stored one.
pub trait CacheEntity: Clone {
    fn id(&self) -> &str;

    /// Epoch seconds, used for most-recent-first ordering.
    fn time(&self) -> i64;

    /// Overlay `incoming` onto `self`. Absent optional fields in `incoming`
    /// never erase values already present.
    fn merge_from(&mut self, incoming: Self);
}

/// A single message. Summary-only until `body` has been fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,

    /// Owning conversation, if the message belongs to one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_list: Option<Vec<String>>,

    /// Labels the message carries (system folders and user labels).
    #[serde(default)]
    pub label_ids: Vec<String>,

    #[serde(default)]
    pub is_read: bool,

    /// Epoch seconds, ordering key.
    #[serde(default)]
    pub time: i64,

    /// Epoch seconds, 0 = never expires.
    #[serde(default)]
    pub expiration_time: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,

    /// Absent until the full message has been fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// True once the full payload has been fetched, not just summary fields.
    #[serde(default)]
    pub preloaded: bool,
}

impl Message {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            conversation_id: None,
            subject: None,
            sender: None,
            to_list: None,
            label_ids: Vec::new(),
            is_read: false,
            time: 0,
            expiration_time: 0,
            size: None,
            body: None,
            preloaded: false,
        }
    }
}

impl CacheEntity for Message {
    fn id(&self) -> &str {
        &self.id
    }

    fn time(&self) -> i64 {
        self.time
    }

    fn merge_from(&mut self, incoming: Self) {
        if incoming.conversation_id.is_some() {
            self.conversation_id = incoming.conversation_id;
        }
        if incoming.subject.is_some() {
            self.subject = incoming.subject;
        }
        if incoming.sender.is_some() {
            self.sender = incoming.sender;
        }
        if incoming.to_list.is_some() {
            self.to_list = incoming.to_list;
        }
        if incoming.size.is_some() {
            self.size = incoming.size;
        }
        if incoming.body.is_some() {
            self.body = incoming.body;
        }
        // Every real payload carries at least one label and a timestamp;
        // their serde defaults mean the payload omitted the field, so a
        // merge must not erase what the cache already knows. Label removal
        // arrives as explicit patch sets, never as an empty replacement.
        if !incoming.label_ids.is_empty() {
            self.label_ids = incoming.label_ids;
        }
        if incoming.time != 0 {
            self.time = incoming.time;
        }
        self.is_read = incoming.is_read;
        self.expiration_time = incoming.expiration_time;
        self.preloaded = self.preloaded || incoming.preloaded;
    }
}

/// A conversation: aggregate labels and counts over its messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(default)]
    pub label_ids: Vec<String>,

    #[serde(default)]
    pub num_messages: i64,

    #[serde(default)]
    pub num_unread: i64,

    /// Epoch seconds, ordering key.
    #[serde(default)]
    pub time: i64,

    /// True once the full message list has been fetched.
    #[serde(default)]
    pub preloaded: bool,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: None,
            label_ids: Vec::new(),
            num_messages: 0,
            num_unread: 0,
            time: 0,
            preloaded: false,
        }
    }
}

impl CacheEntity for Conversation {
    fn id(&self) -> &str {
        &self.id
    }

    fn time(&self) -> i64 {
        self.time
    }

    fn merge_from(&mut self, incoming: Self) {
        if incoming.subject.is_some() {
            self.subject = incoming.subject;
        }
        if !incoming.label_ids.is_empty() {
            self.label_ids = incoming.label_ids;
        }
        if incoming.time != 0 {
            self.time = incoming.time;
        }
        self.num_messages = incoming.num_messages;
        self.num_unread = incoming.num_unread;
        self.preloaded = self.preloaded || incoming.preloaded;
    }
}

/// Counter-relevant view of an entity: label membership plus whether it
/// contributes to the unread count.
pub trait Countable {
    fn labels(&self) -> &[String];
    fn counts_as_unread(&self) -> bool;
}

impl Countable for Message {
    fn labels(&self) -> &[String] {
        &self.label_ids
    }

    fn counts_as_unread(&self) -> bool {
        !self.is_read
    }
}

impl Countable for Conversation {
    fn labels(&self) -> &[String] {
        &self.label_ids
    }

    fn counts_as_unread(&self) -> bool {
        self.num_unread > 0
    }
}

// ============================================================================
// Patches
// ============================================================================

/// Partial message overlay carried by flag-update events. Absent fields
/// leave the cached value untouched; label membership changes arrive as
/// explicit add/remove sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<i64>,

    /// Full label replacement, applied before add/remove sets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_ids: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_ids_added: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_ids_removed: Option<Vec<String>>,
}

impl MessagePatch {
    /// Overlay the patch onto `base`, returning the patched message.
    pub fn apply(&self, base: &Message) -> Message {
        let mut next = base.clone();

        if let Some(conversation_id) = &self.conversation_id {
            next.conversation_id = Some(conversation_id.clone());
        }
        if let Some(subject) = &self.subject {
            next.subject = Some(subject.clone());
        }
        if let Some(is_read) = self.is_read {
            next.is_read = is_read;
        }
        if let Some(time) = self.time {
            next.time = time;
        }
        if let Some(expiration_time) = self.expiration_time {
            next.expiration_time = expiration_time;
        }
        if let Some(label_ids) = &self.label_ids {
            next.label_ids = label_ids.clone();
        }
        if let Some(added) = &self.label_ids_added {
            next.label_ids = label_union(&next.label_ids, added);
        }
        if let Some(removed) = &self.label_ids_removed {
            next.label_ids = label_difference(&next.label_ids, removed);
        }

        next
    }
}

/// Partial conversation overlay carried by flag-update events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_messages: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_unread: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_ids: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_ids_added: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_ids_removed: Option<Vec<String>>,
}

impl ConversationPatch {
    /// Overlay the patch onto `base`, returning the patched conversation.
    pub fn apply(&self, base: &Conversation) -> Conversation {
        let mut next = base.clone();

        if let Some(subject) = &self.subject {
            next.subject = Some(subject.clone());
        }
        if let Some(num_messages) = self.num_messages {
            next.num_messages = num_messages;
        }
        if let Some(num_unread) = self.num_unread {
            next.num_unread = num_unread;
        }
        if let Some(time) = self.time {
            next.time = time;
        }
        if let Some(label_ids) = &self.label_ids {
            next.label_ids = label_ids.clone();
        }
        if let Some(added) = &self.label_ids_added {
            next.label_ids = label_union(&next.label_ids, added);
        }
        if let Some(removed) = &self.label_ids_removed {
            next.label_ids = label_difference(&next.label_ids, removed);
        }

        next
    }
}

/// Deduplicating union preserving first-seen order.
pub fn label_union(current: &[String], added: &[String]) -> Vec<String> {
    let mut result = current.to_vec();
    for label in added {
        if !result.contains(label) {
            result.push(label.clone());
        }
    }
    result
}

/// Set difference preserving order.
pub fn label_difference(current: &[String], removed: &[String]) -> Vec<String> {
    current
        .iter()
        .filter(|label| !removed.contains(label))
        .cloned()
        .collect()
}

// ============================================================================
// Change Events
// ============================================================================

/// Incremental change notification on the message stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MessageEvent {
    Delete { id: String },
    Create { message: Message },
    UpdateDraft { id: String, message: Message },
    UpdateFlags { id: String, patch: MessagePatch },
}

/// Incremental change notification on the conversation stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ConversationEvent {
    Delete {
        id: String,
    },
    Create {
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        patch: Option<ConversationPatch>,
    },
    UpdateDraft {
        id: String,
        patch: ConversationPatch,
    },
    UpdateFlags {
        id: String,
        patch: ConversationPatch,
    },
}

// ============================================================================
// List Requests
// ============================================================================

/// Shape of a list request against the remote store.
///
/// A plain label listing (no free-text filter, no conversation scope, no
/// time window, default page size) is simple enough to be answered from the
/// cache; anything else always goes remote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,

    /// Scope the listing to a single conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    /// Free-text search filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,

    /// Only elements older than this timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,

    /// Only elements newer than this timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub begin: Option<i64>,
}

impl ListFilter {
    /// Plain listing for a label.
    pub fn for_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    /// Whether the cache may attempt to answer this request locally.
    pub fn is_cacheable(&self) -> bool {
        self.label.is_some()
            && self.keyword.is_none()
            && self.conversation_id.is_none()
            && self.begin.is_none()
            && self.end.is_none()
            && self.page_size.is_none()
    }
}

// ============================================================================
// Tests
// ============================================================================
