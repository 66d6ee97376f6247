//! ChannelEvent — broadcast from the core to web/TUI frontends via tokio::broadcast.

use serde::{Deserialize, Serialize};

use crate::types::{ConversationKey, OutgoingActivity};

/// One outgoing activity addressed to a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelEvent {
    pub conversation: ConversationKey,
    pub timestamp: String,
    pub activity: OutgoingActivity,
}

impl ChannelEvent {
    pub fn new(conversation: ConversationKey, activity: OutgoingActivity) -> Self {
        Self {
            conversation,
            timestamp: chrono::Utc::now().to_rfc3339(),
            activity,
        }
    }

    /// Serialize to the JSON format the frontend expects:
    /// `{"event": "activity", "data": {...}}`
    pub fn to_ws_json(&self) -> serde_json::Value {
        serde_json::json!({
            "event": "activity",
            "data": serde_json::to_value(self).unwrap_or_default(),
        })
    }
}
