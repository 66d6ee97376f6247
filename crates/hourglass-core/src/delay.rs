//! How long a CompletionWorker waits before marking its turn done.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{TurnError, TurnResult};

/// What to do when the uniform range `[1, max)` is empty (`max <= 1`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayBoundary {
    /// Refuse to build the strategy.
    #[default]
    Reject,
    /// Always wait exactly one second.
    Clamp,
}

pub trait DelayStrategy: Send + Sync {
    fn next_delay(&self) -> Duration;
}

/// Whole seconds drawn uniformly from `[1, max_delay_seconds)`; the upper
/// bound is exclusive.
#[derive(Debug, Clone)]
pub struct UniformDelay {
    max_delay_seconds: u64,
    clamped: bool,
}

impl UniformDelay {
    pub fn new(max_delay_seconds: u64, boundary: DelayBoundary) -> TurnResult<Self> {
        if max_delay_seconds > 1 {
            return Ok(Self {
                max_delay_seconds,
                clamped: false,
            });
        }
        match boundary {
            DelayBoundary::Reject => Err(TurnError::InvalidDelayRange { max_delay_seconds }),
            DelayBoundary::Clamp => Ok(Self {
                max_delay_seconds,
                clamped: true,
            }),
        }
    }

    pub fn max_delay_seconds(&self) -> u64 {
        self.max_delay_seconds
    }
}

impl DelayStrategy for UniformDelay {
    fn next_delay(&self) -> Duration {
        if self.clamped {
            return Duration::from_secs(1);
        }
        let secs = rand::thread_rng().gen_range(1..self.max_delay_seconds);
        Duration::from_secs(secs)
    }
}

/// Always the same delay. Handy for tests and demos.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl DelayStrategy for FixedDelay {
    fn next_delay(&self) -> Duration {
        self.0
    }
}
