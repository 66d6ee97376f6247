//! Activity dispatch: the entry point frontends hand incoming activities to.

use std::sync::Arc;

use tracing::info;

use crate::coordinator::TurnCoordinator;
use crate::error::TurnResult;
use crate::types::{ActivityType, IncomingActivity};

pub struct Bot {
    coordinator: Arc<TurnCoordinator>,
}

impl Bot {
    pub fn new(coordinator: Arc<TurnCoordinator>) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &Arc<TurnCoordinator> {
        &self.coordinator
    }

    /// Messages run a full turn and return the echo reply. Every other
    /// activity type is acknowledged with "<type> event detected".
    pub async fn on_activity(&self, activity: IncomingActivity) -> TurnResult<Option<String>> {
        let key = &activity.conversation;
        match activity.activity_type {
            ActivityType::Message => {
                let text = activity.text.as_deref().unwrap_or("");
                let reply = self.coordinator.handle_turn(key, text).await?;
                Ok(Some(reply))
            }
            other => {
                if other == ActivityType::EndOfConversation {
                    self.coordinator.supervisor().end_conversation(key);
                }
                info!("[{}] {} activity", key, other);
                let reply = format!("{} event detected", other);
                self.coordinator.channel().send_text(key, &reply).await?;
                Ok(Some(reply))
            }
        }
    }
}
