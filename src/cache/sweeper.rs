//! Expiration Sweeper - background eviction of expired messages
//!
//! A fixed-interval tokio task polls a dirty flag set by producers that just
//! displayed or received messages carrying an expiration time. On a dirty
//! tick the tracked element set is examined and every expired message is
//! deleted by synthesizing delete events into the reconciler; clean ticks
//! are free.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::models::{Message, MessageEvent};

use super::MailCache;

/// Sweeper configuration
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Seconds between ticks.
    pub interval_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

/// Sweeper errors
#[derive(Debug, thiserror::Error)]
pub enum SweeperError {
    #[error("sweeper is already running")]
    AlreadyRunning,

    #[error("sweeper is not running")]
    NotRunning,
}

/// What the sweeper currently watches for expiration.
#[derive(Debug, Clone)]
enum Tracked {
    /// Messages observed directly (message list view).
    Messages(Vec<Message>),
    /// A conversation whose cached message set is examined on each sweep.
    Conversation(String),
}

/// Background sweeper evicting time-expired messages from the cache.
///
/// Process-scoped: started once per authenticated session, stopped at
/// logout. Not rescheduled per request.
#[derive(Clone)]
pub struct ExpirationSweeper {
    cache: Arc<MailCache>,
    config: SweeperConfig,
    tracked: Arc<StdMutex<Option<Tracked>>>,
    dirty: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    task_handle: Arc<StdMutex<Option<JoinHandle<()>>>>,
}

impl ExpirationSweeper {
    pub fn new(cache: Arc<MailCache>) -> Self {
        Self::with_config(cache, SweeperConfig::default())
    }

    pub fn with_config(cache: Arc<MailCache>, config: SweeperConfig) -> Self {
        Self {
            cache,
            config,
            tracked: Arc::new(StdMutex::new(None)),
            dirty: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            task_handle: Arc::new(StdMutex::new(None)),
        }
    }

    /// Track a freshly displayed/received message set and mark the next
    /// tick as needing work.
    pub fn watch_messages(&self, messages: Vec<Message>) {
        *self.tracked.lock().unwrap_or_else(|e| e.into_inner()) = Some(Tracked::Messages(messages));
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Track a conversation; its cached message set is examined on sweep.
    pub fn watch_conversation(&self, id: impl Into<String>) {
        *self.tracked.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(Tracked::Conversation(id.into()));
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// One sweep pass. A tick without the dirty flag set is a no-op.
    pub async fn sweep(&self) {
        if !self.dirty.load(Ordering::SeqCst) {
            return;
        }

        let tracked = self
            .tracked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        let candidates = match tracked {
            None => Vec::new(),
            Some(Tracked::Messages(messages)) => messages,
            Some(Tracked::Conversation(id)) => self.cache.cached_conversation_messages(&id).await,
        };

        let now = Utc::now().timestamp();
        let expired = expired_ids(&candidates, now);

        if !expired.is_empty() {
            log::info!("sweeping {} expired messages", expired.len());
            let events = expired
                .into_iter()
                .map(|id| MessageEvent::Delete { id })
                .collect();
            self.cache.apply_message_events(events, false).await;
        }

        self.dirty.store(false, Ordering::SeqCst);
    }

    /// Spawn the background tick loop.
    pub fn start(&self) -> Result<(), SweeperError> {
        if self.running.load(Ordering::Relaxed) {
            return Err(SweeperError::AlreadyRunning);
        }
        self.running.store(true, Ordering::Relaxed);

        let sweeper = self.clone();
        let running = self.running.clone();
        let interval_secs = self.config.interval_secs;

        let handle = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs));

            loop {
                interval.tick().await;

                if !running.load(Ordering::Relaxed) {
                    break;
                }

                sweeper.sweep().await;
            }
        });

        *self
            .task_handle
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(handle);

        log::info!("expiration sweeper started (interval: {}s)", interval_secs);
        Ok(())
    }

    /// Stop the background tick loop.
    pub fn stop(&self) -> Result<(), SweeperError> {
        if !self.running.load(Ordering::Relaxed) {
            return Err(SweeperError::NotRunning);
        }
        self.running.store(false, Ordering::Relaxed);

        if let Some(handle) = self
            .task_handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
        }

        log::info!("expiration sweeper stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

/// Ids of messages whose expiration time has passed. An expiration time of
/// zero means the message never expires.
fn expired_ids(messages: &[Message], now: i64) -> Vec<String> {
    messages
        .iter()
        .filter(|m| m.expiration_time != 0 && m.expiration_time < now)
        .map(|m| m.id.clone())
        .collect()
}
