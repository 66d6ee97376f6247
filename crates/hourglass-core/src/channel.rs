//! Outbound side of the messaging boundary.
//!
//! The core only ever talks to a `Channel`; frontends subscribe to a
//! `BroadcastChannel` and render or forward what it emits.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::ChannelError;
use crate::events::ChannelEvent;
use crate::types::{ConversationKey, OutgoingActivity};

#[async_trait]
pub trait Channel: Send + Sync {
    /// Deliver one activity to a conversation.
    async fn send(&self, key: &ConversationKey, activity: OutgoingActivity) -> Result<(), ChannelError>;

    async fn send_text(&self, key: &ConversationKey, text: &str) -> Result<(), ChannelError> {
        self.send(key, OutgoingActivity::Message { text: text.to_string() }).await
    }

    async fn send_typing(&self, key: &ConversationKey) -> Result<(), ChannelError> {
        self.send(key, OutgoingActivity::Typing).await
    }

    async fn send_handoff(&self, key: &ConversationKey) -> Result<(), ChannelError> {
        self.send(key, OutgoingActivity::Handoff).await
    }
}

#[async_trait]
impl<T: Channel + ?Sized> Channel for Arc<T> {
    async fn send(&self, key: &ConversationKey, activity: OutgoingActivity) -> Result<(), ChannelError> {
        (**self).send(key, activity).await
    }
}

/// Fans every outgoing activity out to all current subscribers.
/// Sending with no subscribers drops the event and is not an error.
pub struct BroadcastChannel {
    tx: broadcast::Sender<ChannelEvent>,
}

impl BroadcastChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastChannel {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Channel for BroadcastChannel {
    async fn send(&self, key: &ConversationKey, activity: OutgoingActivity) -> Result<(), ChannelError> {
        let _ = self.tx.send(ChannelEvent::new(key.clone(), activity));
        Ok(())
    }
}
