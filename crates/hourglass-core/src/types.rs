//! Core types — ConversationKey, activities, CounterState, SignalFlag.

use serde::{Deserialize, Serialize};

// ── Conversation ──

/// Opaque identifier scoping all state to one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationKey(String);

impl ConversationKey {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationKey {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConversationKey {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ── Activities ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    Message,
    ConversationUpdate,
    ContactRelationUpdate,
    Typing,
    Handoff,
    EndOfConversation,
    Event,
    Invoke,
    DeleteUserData,
    MessageUpdate,
    MessageDelete,
    InstallationUpdate,
    MessageReaction,
    Suggestion,
    Trace,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Message => "message",
            ActivityType::ConversationUpdate => "conversationUpdate",
            ActivityType::ContactRelationUpdate => "contactRelationUpdate",
            ActivityType::Typing => "typing",
            ActivityType::Handoff => "handoff",
            ActivityType::EndOfConversation => "endOfConversation",
            ActivityType::Event => "event",
            ActivityType::Invoke => "invoke",
            ActivityType::DeleteUserData => "deleteUserData",
            ActivityType::MessageUpdate => "messageUpdate",
            ActivityType::MessageDelete => "messageDelete",
            ActivityType::InstallationUpdate => "installationUpdate",
            ActivityType::MessageReaction => "messageReaction",
            ActivityType::Suggestion => "suggestion",
            ActivityType::Trace => "trace",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An activity received from the channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingActivity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub conversation: ConversationKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl IncomingActivity {
    pub fn message(conversation: impl Into<ConversationKey>, text: impl Into<String>) -> Self {
        Self {
            activity_type: ActivityType::Message,
            conversation: conversation.into(),
            text: Some(text.into()),
        }
    }
}

/// An activity the core asks the channel to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutgoingActivity {
    Message { text: String },
    Typing,
    Handoff,
}

impl OutgoingActivity {
    pub fn activity_type(&self) -> ActivityType {
        match self {
            OutgoingActivity::Message { .. } => ActivityType::Message,
            OutgoingActivity::Typing => ActivityType::Typing,
            OutgoingActivity::Handoff => ActivityType::Handoff,
        }
    }
}

// ── Conversation state ──

pub const COUNTER_STATE_NAME: &str = "counter_state";
pub const SIGNAL_FLAG_NAME: &str = "signal_flag";

/// Per-conversation turn counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    pub turn_count: u64,
}

/// Shared pending/done indicator for one turn's background work.
///
/// `version` is bumped by every reset, so a reader can tell this turn's
/// pending value apart from a done value left over by an earlier turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalFlag {
    pub done: bool,
    pub version: u64,
}

impl SignalFlag {
    /// The pending flag for the turn after this one.
    pub fn next_turn(&self) -> Self {
        Self {
            done: false,
            version: self.version + 1,
        }
    }

    pub fn is_done_for(&self, version: u64) -> bool {
        self.done && self.version == version
    }
}
