//! SignalFlag accessor. The coordinator and the workers touch the shared
//! pending/done flag only through this type.
//!
//! Read-modify-write operations (`reset`, `mark_done`) hold the
//! conversation's flag lock, so a completion from an earlier turn can never
//! overwrite a newer turn's reset. Plain reads take no lock.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::store::{self, StateStore};
use crate::types::{ConversationKey, SignalFlag, SIGNAL_FLAG_NAME};

/// Result of a mark-done attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// pending → done for this version.
    Marked,
    /// Already done for this version; nothing written.
    AlreadyDone,
    /// The flag belongs to another turn; nothing written.
    Stale { current_version: u64 },
}

#[derive(Clone)]
pub struct SignalFlagAccessor {
    store: Arc<dyn StateStore>,
    key: ConversationKey,
    lock: Arc<Mutex<()>>,
}

impl SignalFlagAccessor {
    pub fn new(store: Arc<dyn StateStore>, key: ConversationKey, lock: Arc<Mutex<()>>) -> Self {
        Self { store, key, lock }
    }

    pub fn key(&self) -> &ConversationKey {
        &self.key
    }

    /// Current flag, or the default if none was ever stored. Never writes.
    pub async fn read(&self) -> Result<SignalFlag, StoreError> {
        match self.store.get(&self.key, SIGNAL_FLAG_NAME).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(SignalFlag::default()),
        }
    }

    /// Start a new turn: persist `{done: false, version: previous + 1}`.
    pub async fn reset(&self) -> Result<SignalFlag, StoreError> {
        let _guard = self.lock.lock().await;
        let current: SignalFlag =
            store::get_or_default(self.store.as_ref(), &self.key, SIGNAL_FLAG_NAME).await?;
        let next = current.next_turn();
        store::set_state(self.store.as_ref(), &self.key, SIGNAL_FLAG_NAME, &next).await?;
        self.store.save_changes(&self.key).await?;
        Ok(next)
    }

    /// Set `done` for `version`. Idempotent, and a no-op if a newer turn
    /// has already reset the flag.
    pub async fn mark_done(&self, version: u64) -> Result<MarkOutcome, StoreError> {
        let _guard = self.lock.lock().await;
        let current: SignalFlag =
            store::get_or_default(self.store.as_ref(), &self.key, SIGNAL_FLAG_NAME).await?;
        if current.version != version {
            return Ok(MarkOutcome::Stale {
                current_version: current.version,
            });
        }
        if current.done {
            return Ok(MarkOutcome::AlreadyDone);
        }
        let done = SignalFlag {
            done: true,
            version,
        };
        store::set_state(self.store.as_ref(), &self.key, SIGNAL_FLAG_NAME, &done).await?;
        self.store.save_changes(&self.key).await?;
        Ok(MarkOutcome::Marked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStateStore;

    fn accessor() -> SignalFlagAccessor {
        SignalFlagAccessor::new(
            Arc::new(MemoryStateStore::new()),
            ConversationKey::new("c1"),
            Arc::new(Mutex::new(())),
        )
    }

    #[tokio::test]
    async fn test_read_missing_flag_is_pending() {
        let flag = accessor().read().await.unwrap();
        assert_eq!(flag, SignalFlag { done: false, version: 0 });
    }

    #[tokio::test]
    async fn test_reset_bumps_version() {
        let flag = accessor();
        assert_eq!(flag.reset().await.unwrap().version, 1);
        assert_eq!(flag.reset().await.unwrap().version, 2);
        assert_eq!(flag.read().await.unwrap(), SignalFlag { done: false, version: 2 });
    }

    #[tokio::test]
    async fn test_mark_done_is_idempotent() {
        let flag = accessor();
        let turn = flag.reset().await.unwrap();

        assert_eq!(flag.mark_done(turn.version).await.unwrap(), MarkOutcome::Marked);
        assert_eq!(flag.mark_done(turn.version).await.unwrap(), MarkOutcome::AlreadyDone);
        assert!(flag.read().await.unwrap().is_done_for(turn.version));
    }

    #[tokio::test]
    async fn test_stale_mark_does_not_touch_newer_turn() {
        let flag = accessor();
        let first = flag.reset().await.unwrap();
        let second = flag.reset().await.unwrap();

        assert_eq!(
            flag.mark_done(first.version).await.unwrap(),
            MarkOutcome::Stale { current_version: second.version }
        );
        assert_eq!(flag.read().await.unwrap(), second);
    }
}
