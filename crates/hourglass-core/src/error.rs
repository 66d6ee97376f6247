//! Error types for the turn path, the state store and the channel.

use thiserror::Error;

/// Failure of a StateStore get/set/save.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store unavailable: {0}")]
    Unavailable(String),

    #[error("state value could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("state store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to deliver an outgoing activity.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel closed")]
    Closed,

    #[error("channel rejected activity: {0}")]
    Rejected(String),
}

/// Errors surfaced by a turn (or by building its collaborators).
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error("reply delivery failed: {0}")]
    ChannelSendFailure(#[from] ChannelError),

    #[error("empty delay range [1, {max_delay_seconds})")]
    InvalidDelayRange { max_delay_seconds: u64 },
}

pub type TurnResult<T> = std::result::Result<T, TurnError>;
