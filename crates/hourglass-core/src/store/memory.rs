//! In-memory, write-through state store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::StateStore;
use crate::error::StoreError;
use crate::types::ConversationKey;

#[derive(Default)]
pub struct MemoryStateStore {
    conversations: RwLock<HashMap<ConversationKey, HashMap<String, Value>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &ConversationKey, name: &str) -> Result<Option<Value>, StoreError> {
        let conversations = self.conversations.read().await;
        Ok(conversations.get(key).and_then(|state| state.get(name)).cloned())
    }

    async fn set(&self, key: &ConversationKey, name: &str, value: Value) -> Result<(), StoreError> {
        let mut conversations = self.conversations.write().await;
        conversations
            .entry(key.clone())
            .or_default()
            .insert(name.to_string(), value);
        Ok(())
    }

    async fn save_changes(&self, _key: &ConversationKey) -> Result<(), StoreError> {
        Ok(())
    }
}
