//! Per-conversation state store contract plus the in-memory and file backends.

pub mod file;
pub mod memory;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StoreError;
use crate::types::ConversationKey;

/// Key/value state scoped by conversation. Implementations must be safe for
/// concurrent use across different conversations.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read a state value, `None` if it was never set.
    async fn get(&self, key: &ConversationKey, name: &str) -> Result<Option<Value>, StoreError>;

    /// Stage a state value for the conversation.
    async fn set(&self, key: &ConversationKey, name: &str, value: Value) -> Result<(), StoreError>;

    /// Persist everything staged for the conversation.
    async fn save_changes(&self, key: &ConversationKey) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    async fn get(&self, key: &ConversationKey, name: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key, name).await
    }

    async fn set(&self, key: &ConversationKey, name: &str, value: Value) -> Result<(), StoreError> {
        (**self).set(key, name, value).await
    }

    async fn save_changes(&self, key: &ConversationKey) -> Result<(), StoreError> {
        (**self).save_changes(key).await
    }
}

/// Typed get-or-default: when the entry is absent the default is stored and returned.
pub async fn get_or_default<T>(
    store: &dyn StateStore,
    key: &ConversationKey,
    name: &str,
) -> Result<T, StoreError>
where
    T: DeserializeOwned + Serialize + Default,
{
    match store.get(key, name).await? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => {
            let value = T::default();
            store.set(key, name, serde_json::to_value(&value)?).await?;
            Ok(value)
        }
    }
}

/// Typed set.
pub async fn set_state<T: Serialize>(
    store: &dyn StateStore,
    key: &ConversationKey,
    name: &str,
    value: &T,
) -> Result<(), StoreError> {
    store.set(key, name, serde_json::to_value(value)?).await
}
