//! TurnCoordinator: one message in, one echo reply out, and two supervised
//! background workers left running behind it.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::channel::Channel;
use crate::config::{Config, TurnSettings};
use crate::delay::DelayStrategy;
use crate::error::TurnResult;
use crate::signal::SignalFlagAccessor;
use crate::store::{self, StateStore};
use crate::supervisor::TurnSupervisor;
use crate::types::{ConversationKey, CounterState, COUNTER_STATE_NAME};
use crate::workers::{CompletionWorker, IndicatorWorker};

pub struct TurnCoordinator {
    store: Arc<dyn StateStore>,
    channel: Arc<dyn Channel>,
    supervisor: Arc<TurnSupervisor>,
    delay: Arc<dyn DelayStrategy>,
    settings: TurnSettings,
}

impl TurnCoordinator {
    pub fn new(
        store: Arc<dyn StateStore>,
        channel: Arc<dyn Channel>,
        delay: Arc<dyn DelayStrategy>,
        settings: TurnSettings,
    ) -> Self {
        Self {
            store,
            channel,
            supervisor: Arc::new(TurnSupervisor::new()),
            delay,
            settings,
        }
    }

    pub fn from_config(
        config: &Config,
        store: Arc<dyn StateStore>,
        channel: Arc<dyn Channel>,
    ) -> TurnResult<Self> {
        Ok(Self::new(
            store,
            channel,
            config.delay_strategy()?,
            config.turn_settings(),
        ))
    }

    pub fn supervisor(&self) -> &Arc<TurnSupervisor> {
        &self.supervisor
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    pub fn signal_flag(&self, key: &ConversationKey) -> SignalFlagAccessor {
        SignalFlagAccessor::new(Arc::clone(&self.store), key.clone(), self.supervisor.flag_lock(key))
    }

    pub async fn counter(&self, key: &ConversationKey) -> TurnResult<CounterState> {
        let counter = match self.store.get(key, COUNTER_STATE_NAME).await? {
            Some(value) => serde_json::from_value(value).map_err(crate::error::StoreError::from)?,
            None => CounterState::default(),
        };
        Ok(counter)
    }

    /// Handle one message turn and return the echo reply that was sent.
    ///
    /// The SignalFlag reset is persisted before either worker is spawned;
    /// the reply goes out without waiting for the workers. Turns on one
    /// conversation run one at a time up to the counter write.
    pub async fn handle_turn(&self, key: &ConversationKey, text: &str) -> TurnResult<String> {
        let turn_lock = self.supervisor.turn_lock(key);
        let serialized = turn_lock.lock().await;

        let mut counter: CounterState =
            store::get_or_default(self.store.as_ref(), key, COUNTER_STATE_NAME).await?;

        let flag = self.signal_flag(key);
        let cancel = self.supervisor.begin_turn(key);
        let turn = match flag.reset().await {
            Ok(turn) => turn,
            Err(e) => {
                cancel.cancel();
                return Err(e.into());
            }
        };

        if let Err(e) = self.channel.send_handoff(key).await {
            warn!("[{}] turn-accepted notification failed: {}", key, e);
        }

        self.spawn_workers(&flag, turn.version, cancel);

        counter.turn_count += 1;
        self.save_counter(key, &counter).await?;
        drop(serialized);

        let reply = format!("Turn {}: you sent '{}'", counter.turn_count, text);
        self.channel.send_text(key, &reply).await?;
        info!("[{}] turn {} replied", key, counter.turn_count);
        Ok(reply)
    }

    // The counter shares a staged document with the flag, so its set and save
    // run under the same lock as the flag's.
    async fn save_counter(&self, key: &ConversationKey, counter: &CounterState) -> TurnResult<()> {
        let state_lock = self.supervisor.flag_lock(key);
        let _writing = state_lock.lock().await;
        store::set_state(self.store.as_ref(), key, COUNTER_STATE_NAME, counter).await?;
        self.store.save_changes(key).await?;
        Ok(())
    }

    fn spawn_workers(&self, flag: &SignalFlagAccessor, version: u64, cancel: CancellationToken) {
        let key = flag.key().clone();

        let indicator = IndicatorWorker::new(
            Arc::clone(&self.channel),
            flag.clone(),
            version,
            self.settings.poll_interval,
            self.settings.max_wait,
        );
        let indicator_cancel = cancel.clone();
        let indicator_key = key.clone();
        let handle = tokio::spawn(async move {
            let result = indicator.run(indicator_cancel).await;
            debug!(
                "[{}] indicator for turn {} stopped: {:?}",
                indicator_key, version, result.reason
            );
        });
        self.supervisor.track(&key, handle);

        let completion = CompletionWorker::new(flag.clone(), version, Arc::clone(&self.delay));
        let completion_key = key.clone();
        let handle = tokio::spawn(async move {
            let outcome = completion.run(cancel).await;
            debug!(
                "[{}] completion for turn {} stopped: {:?}",
                completion_key, version, outcome
            );
        });
        self.supervisor.track(&key, handle);
    }
}
