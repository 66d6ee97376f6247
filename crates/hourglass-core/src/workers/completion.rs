//! CompletionWorker — waits a drawn delay, then marks its turn done.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::delay::DelayStrategy;
use crate::signal::{MarkOutcome, SignalFlagAccessor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Marked,
    AlreadyDone,
    Stale,
    Cancelled,
    /// The store refused the write. Logged, never surfaced.
    Failed,
}

pub struct CompletionWorker {
    flag: SignalFlagAccessor,
    version: u64,
    delay: Arc<dyn DelayStrategy>,
}

impl CompletionWorker {
    pub fn new(flag: SignalFlagAccessor, version: u64, delay: Arc<dyn DelayStrategy>) -> Self {
        Self {
            flag,
            version,
            delay,
        }
    }

    pub async fn run(self, cancel: CancellationToken) -> CompletionOutcome {
        let delay = self.delay.next_delay();
        debug!(
            "[{}] completion for turn {} in {:?}",
            self.flag.key(),
            self.version,
            delay
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("[{}] completion for turn {} cancelled", self.flag.key(), self.version);
                return CompletionOutcome::Cancelled;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        self.mark_done().await
    }

    /// The write half on its own; safe to call more than once.
    pub async fn mark_done(&self) -> CompletionOutcome {
        match self.flag.mark_done(self.version).await {
            Ok(MarkOutcome::Marked) => {
                info!("[{}] turn {} done", self.flag.key(), self.version);
                CompletionOutcome::Marked
            }
            Ok(MarkOutcome::AlreadyDone) => CompletionOutcome::AlreadyDone,
            Ok(MarkOutcome::Stale { current_version }) => {
                debug!(
                    "[{}] turn {} superseded by turn {}, not marking",
                    self.flag.key(),
                    self.version,
                    current_version
                );
                CompletionOutcome::Stale
            }
            Err(e) => {
                error!(
                    "[{}] failed to mark turn {} done: {}",
                    self.flag.key(),
                    self.version,
                    e
                );
                CompletionOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::sync::Mutex;

    use crate::delay::FixedDelay;
    use crate::store::MemoryStateStore;
    use crate::types::ConversationKey;

    fn accessor() -> SignalFlagAccessor {
        SignalFlagAccessor::new(
            Arc::new(MemoryStateStore::new()),
            ConversationKey::new("c1"),
            Arc::new(Mutex::new(())),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_marks_done_after_delay() {
        let flag = accessor();
        let turn = flag.reset().await.unwrap();
        let worker = CompletionWorker::new(
            flag.clone(),
            turn.version,
            Arc::new(FixedDelay(Duration::from_secs(3))),
        );

        let started = tokio::time::Instant::now();
        let outcome = worker.run(CancellationToken::new()).await;

        assert_eq!(outcome, CompletionOutcome::Marked);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        assert!(flag.read().await.unwrap().is_done_for(turn.version));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_done_twice_is_noop() {
        let flag = accessor();
        let turn = flag.reset().await.unwrap();
        let worker = CompletionWorker::new(
            flag.clone(),
            turn.version,
            Arc::new(FixedDelay(Duration::from_secs(1))),
        );

        assert_eq!(worker.mark_done().await, CompletionOutcome::Marked);
        assert_eq!(worker.mark_done().await, CompletionOutcome::AlreadyDone);
        assert!(flag.read().await.unwrap().is_done_for(turn.version));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_delay_leaves_flag_pending() {
        let flag = accessor();
        let turn = flag.reset().await.unwrap();
        let worker = CompletionWorker::new(
            flag.clone(),
            turn.version,
            Arc::new(FixedDelay(Duration::from_secs(10))),
        );

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(worker.run(cancel.clone()));
        tokio::time::sleep(Duration::from_secs(2)).await;
        cancel.cancel();

        assert_eq!(handle.await.unwrap(), CompletionOutcome::Cancelled);
        assert!(!flag.read().await.unwrap().done);
    }
}
