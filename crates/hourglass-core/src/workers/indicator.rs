//! IndicatorWorker keeps the user's "typing…" indicator alive until the
//! turn's SignalFlag reads done.
//!
//! Polling → Done is the normal path. A worker also stops when its optional
//! max wait runs out (the completion stalled), when a newer turn has reset
//! the flag, or when its cancellation token fires. With no max wait the loop
//! is unbounded.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::channel::Channel;
use crate::signal::SignalFlagAccessor;
use crate::types::SignalFlag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Done,
    Expired,
    Superseded,
    Cancelled,
}

/// Last flag value the worker observed, and why it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollResult {
    pub value: SignalFlag,
    pub reason: StopReason,
    pub typing_sent: u32,
}

impl PollResult {
    pub fn expired(&self) -> bool {
        self.reason == StopReason::Expired
    }
}

pub struct IndicatorWorker {
    channel: Arc<dyn Channel>,
    flag: SignalFlagAccessor,
    version: u64,
    poll_interval: Duration,
    max_wait: Option<Duration>,
}

impl IndicatorWorker {
    pub fn new(
        channel: Arc<dyn Channel>,
        flag: SignalFlagAccessor,
        version: u64,
        poll_interval: Duration,
        max_wait: Option<Duration>,
    ) -> Self {
        Self {
            channel,
            flag,
            version,
            poll_interval,
            max_wait,
        }
    }

    pub async fn run(self, cancel: CancellationToken) -> PollResult {
        let key = self.flag.key().clone();
        let deadline = self.max_wait.map(|wait| Instant::now() + wait);
        let mut result = PollResult {
            value: SignalFlag {
                done: false,
                version: self.version,
            },
            reason: StopReason::Cancelled,
            typing_sent: 0,
        };

        loop {
            match self.channel.send_typing(&key).await {
                Ok(()) => result.typing_sent += 1,
                Err(e) => warn!("[{}] typing notification failed: {}", key, e),
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("[{}] indicator for turn {} cancelled", key, self.version);
                    result.reason = StopReason::Cancelled;
                    return result;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            match self.flag.read().await {
                Ok(flag) => {
                    result.value = flag;
                    if flag.version > self.version {
                        debug!(
                            "[{}] indicator for turn {} superseded by turn {}",
                            key, self.version, flag.version
                        );
                        result.reason = StopReason::Superseded;
                        return result;
                    }
                    if flag.is_done_for(self.version) {
                        info!(
                            "[{}] turn {} finished after {} typing notification(s)",
                            key, self.version, result.typing_sent
                        );
                        result.reason = StopReason::Done;
                        return result;
                    }
                }
                Err(e) => warn!("[{}] could not read signal flag: {}", key, e),
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                warn!(
                    "[{}] turn {} still pending after {:?}, giving up on completion",
                    key,
                    self.version,
                    self.max_wait.unwrap_or_default()
                );
                result.reason = StopReason::Expired;
                return result;
            }
        }
    }
}
