//! Mock collaborators for tests: a channel that records what it was asked
//! to send, and a store that records every access and can be told to fail.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::channel::Channel;
use crate::error::{ChannelError, StoreError};
use crate::store::{MemoryStateStore, StateStore};
use crate::types::{ConversationKey, OutgoingActivity};

// ============================================================================
// Recording channel
// ============================================================================

#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<(ConversationKey, OutgoingActivity)>>,
    pub fail_typing: AtomicBool,
    pub fail_handoff: AtomicBool,
    pub fail_messages: AtomicBool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activities(&self, key: &ConversationKey) -> Vec<OutgoingActivity> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, a)| a.clone())
            .collect()
    }

    pub fn typing_count(&self, key: &ConversationKey) -> usize {
        self.activities(key)
            .iter()
            .filter(|a| **a == OutgoingActivity::Typing)
            .count()
    }

    pub fn messages(&self, key: &ConversationKey) -> Vec<String> {
        self.activities(key)
            .into_iter()
            .filter_map(|a| match a {
                OutgoingActivity::Message { text } => Some(text),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    async fn send(&self, key: &ConversationKey, activity: OutgoingActivity) -> Result<(), ChannelError> {
        let fail = match activity {
            OutgoingActivity::Typing => &self.fail_typing,
            OutgoingActivity::Handoff => &self.fail_handoff,
            OutgoingActivity::Message { .. } => &self.fail_messages,
        };
        if fail.load(Ordering::SeqCst) {
            return Err(ChannelError::Rejected(format!("{} refused", activity.activity_type())));
        }
        self.sent.lock().unwrap().push((key.clone(), activity));
        Ok(())
    }
}

// ============================================================================
// Recording store
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    Get { name: String, value: Option<Value> },
    Set { name: String, value: Value },
    Save,
}

#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStateStore,
    ops: Mutex<Vec<(ConversationKey, StoreOp)>>,
    failing_sets: Mutex<HashSet<String>>,
    pub offline: AtomicBool,
    /// Yield to the scheduler before every `get` and `set`, the way a
    /// store doing real I/O would.
    pub yielding: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `set` of `name` fail until `heal_set` is called.
    pub fn fail_set(&self, name: &str) {
        self.failing_sets.lock().unwrap().insert(name.to_string());
    }

    pub fn heal_set(&self, name: &str) {
        self.failing_sets.lock().unwrap().remove(name);
    }

    pub fn ops(&self, key: &ConversationKey) -> Vec<StoreOp> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, op)| op.clone())
            .collect()
    }

    async fn maybe_yield(&self) {
        if self.yielding.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for RecordingStore {
    async fn get(&self, key: &ConversationKey, name: &str) -> Result<Option<Value>, StoreError> {
        self.maybe_yield().await;
        self.check_online()?;
        let value = self.inner.get(key, name).await?;
        self.ops.lock().unwrap().push((
            key.clone(),
            StoreOp::Get {
                name: name.to_string(),
                value: value.clone(),
            },
        ));
        Ok(value)
    }

    async fn set(&self, key: &ConversationKey, name: &str, value: Value) -> Result<(), StoreError> {
        self.maybe_yield().await;
        self.check_online()?;
        if self.failing_sets.lock().unwrap().contains(name) {
            return Err(StoreError::Unavailable(format!("set {} refused", name)));
        }
        self.ops.lock().unwrap().push((
            key.clone(),
            StoreOp::Set {
                name: name.to_string(),
                value: value.clone(),
            },
        ));
        self.inner.set(key, name, value).await
    }

    async fn save_changes(&self, key: &ConversationKey) -> Result<(), StoreError> {
        self.check_online()?;
        self.ops.lock().unwrap().push((key.clone(), StoreOp::Save));
        Ok(())
    }
}
