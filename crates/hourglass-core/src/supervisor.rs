//! TurnSupervisor — owns every conversation's in-flight workers.
//!
//! Token tree: root → conversation → turn. Starting a turn cancels the
//! previous turn's token, ending a conversation cancels the conversation
//! token, and `shutdown` cancels the root and joins every handle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::types::ConversationKey;

struct ConversationSlot {
    token: CancellationToken,
    turn: CancellationToken,
    turn_lock: Arc<tokio::sync::Mutex<()>>,
    flag_lock: Arc<tokio::sync::Mutex<()>>,
    handles: Vec<JoinHandle<()>>,
}

impl ConversationSlot {
    fn new(root: &CancellationToken) -> Self {
        let token = root.child_token();
        let turn = token.child_token();
        Self {
            token,
            turn,
            turn_lock: Arc::new(tokio::sync::Mutex::new(())),
            flag_lock: Arc::new(tokio::sync::Mutex::new(())),
            handles: Vec::new(),
        }
    }
}

pub struct TurnSupervisor {
    root: CancellationToken,
    slots: Mutex<HashMap<ConversationKey, ConversationSlot>>,
}

impl TurnSupervisor {
    pub fn new() -> Self {
        Self {
            root: CancellationToken::new(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<ConversationKey, ConversationSlot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Lock serializing turns on one conversation, held from the counter
    /// read until the counter write is saved.
    pub fn turn_lock(&self, key: &ConversationKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut slots = self.slots();
        let slot = slots
            .entry(key.clone())
            .or_insert_with(|| ConversationSlot::new(&self.root));
        Arc::clone(&slot.turn_lock)
    }

    /// Lock serializing state writes (`set` followed by `save_changes`) for
    /// one conversation: SignalFlag read-modify-writes and the counter write.
    pub fn flag_lock(&self, key: &ConversationKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut slots = self.slots();
        let slot = slots
            .entry(key.clone())
            .or_insert_with(|| ConversationSlot::new(&self.root));
        Arc::clone(&slot.flag_lock)
    }

    /// Cancel the previous turn's workers and hand out a token for the next.
    pub fn begin_turn(&self, key: &ConversationKey) -> CancellationToken {
        let mut slots = self.slots();
        let slot = slots
            .entry(key.clone())
            .or_insert_with(|| ConversationSlot::new(&self.root));

        slot.turn.cancel();
        slot.handles.retain(|h| !h.is_finished());
        if !slot.handles.is_empty() {
            debug!("[{}] cancelled {} worker(s) from previous turn", key, slot.handles.len());
        }
        slot.turn = slot.token.child_token();
        slot.turn.clone()
    }

    /// Remember a worker's handle so shutdown can join it.
    pub fn track(&self, key: &ConversationKey, handle: JoinHandle<()>) {
        let mut slots = self.slots();
        match slots.get_mut(key) {
            Some(slot) => {
                slot.handles.retain(|h| !h.is_finished());
                slot.handles.push(handle);
            }
            None => {
                warn!("[{}] worker started without a turn, aborting it", key);
                handle.abort();
            }
        }
    }

    /// Workers of `key` that have not finished yet.
    pub fn active_workers(&self, key: &ConversationKey) -> usize {
        self.slots()
            .get(key)
            .map(|slot| slot.handles.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }

    /// Cancel a conversation's workers. Both locks survive so a worker
    /// still finishing a write stays serialized against the next reset.
    pub fn end_conversation(&self, key: &ConversationKey) {
        let mut slots = self.slots();
        if let Some(slot) = slots.get_mut(key) {
            slot.token.cancel();
            slot.token = self.root.child_token();
            slot.turn = slot.token.child_token();
            slot.handles.clear();
            info!("[{}] conversation ended, workers cancelled", key);
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Cancel everything and wait for all workers to exit.
    pub async fn shutdown(&self) {
        self.root.cancel();
        let handles: Vec<JoinHandle<()>> = {
            let mut slots = self.slots();
            slots
                .values_mut()
                .flat_map(|slot| slot.handles.drain(..))
                .collect()
        };
        info!("Shutting down, joining {} worker(s)", handles.len());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Worker exited abnormally: {}", e);
            }
        }
    }
}

impl Default for TurnSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
