//! App state, input handling, channel event intake.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hourglass_core::bot::Bot;
use hourglass_core::events::ChannelEvent;
use hourglass_core::types::{ActivityType, ConversationKey, IncomingActivity, OutgoingActivity};

/// A message in the chat feed.
#[derive(Clone)]
pub struct ChatMessage {
    pub side: ChatSide,
    pub text: String,
}

#[derive(Clone, PartialEq)]
pub enum ChatSide {
    User,
    Bot,
    System,
}

/// Per-conversation state for the TUI.
pub struct ConversationView {
    pub key: ConversationKey,
    pub messages: Vec<ChatMessage>,
    pub scroll_offset: usize,
    pub turn_count: u64,
    pub typing_seen: u32,
    pub last_typing: Option<Instant>,
}

impl ConversationView {
    fn new(key: ConversationKey) -> Self {
        Self {
            key,
            messages: Vec::new(),
            scroll_offset: 0,
            turn_count: 0,
            typing_seen: 0,
            last_typing: None,
        }
    }

    fn push(&mut self, side: ChatSide, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            side,
            text: text.into(),
        });
        // Auto-scroll to bottom
        self.scroll_offset = 0;
    }
}

/// The main application state.
pub struct App {
    pub conversations: Vec<ConversationView>,
    pub active_tab: usize,
    pub input: String,
    pub input_focused: bool,
    pub should_quit: bool,
    /// How long after a typing notification the indicator stays lit
    pub typing_window: Duration,
    bot: Arc<Bot>,
}

impl App {
    pub fn new(bot: Arc<Bot>, poll_interval: Duration) -> Self {
        let mut app = App {
            conversations: Vec::new(),
            active_tab: 0,
            input: String::new(),
            input_focused: true,
            should_quit: false,
            typing_window: poll_interval + Duration::from_secs(1),
            bot,
        };
        app.new_conversation();
        app
    }

    /// Open a fresh conversation in a new tab and switch to it.
    pub fn new_conversation(&mut self) {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let key = ConversationKey::new(format!("tui-{}", &id[..8]));
        self.conversations.push(ConversationView::new(key));
        self.active_tab = self.conversations.len() - 1;
    }

    pub fn active_view(&self) -> Option<&ConversationView> {
        self.conversations.get(self.active_tab)
    }

    pub fn active_view_mut(&mut self) -> Option<&mut ConversationView> {
        self.conversations.get_mut(self.active_tab)
    }

    /// Input is accepted only while a conversation tab is open.
    pub fn input_enabled(&self) -> bool {
        self.active_view().is_some()
    }

    /// Input bar title: where the next line goes and which turn it starts.
    pub fn input_title(&self) -> String {
        match self.active_view() {
            Some(view) if self.is_typing(view) => format!(
                " {} · turn {} · previous turn still working ",
                view.key,
                view.turn_count + 1
            ),
            Some(view) => format!(" {} · turn {} ", view.key, view.turn_count + 1),
            None => " No conversation · Ctrl+N to start one ".to_string(),
        }
    }

    pub fn is_typing(&self, view: &ConversationView) -> bool {
        view.last_typing
            .is_some_and(|at| at.elapsed() <= self.typing_window)
    }

    /// Apply an outgoing activity from the channel to its conversation.
    pub fn handle_event(&mut self, event: ChannelEvent) {
        let Some(view) = self
            .conversations
            .iter_mut()
            .find(|v| v.key == event.conversation)
        else {
            return;
        };

        match event.activity {
            OutgoingActivity::Message { text } => {
                view.push(ChatSide::Bot, text);
            }
            OutgoingActivity::Typing => {
                view.typing_seen += 1;
                view.last_typing = Some(Instant::now());
            }
            OutgoingActivity::Handoff => {
                view.last_typing = None;
                view.typing_seen = 0;
            }
        }
    }

    /// Send the input line to the active conversation as a message turn.
    pub async fn send_message(&mut self) {
        if self.input.trim().is_empty() || !self.input_enabled() {
            return;
        }
        let text = std::mem::take(&mut self.input);
        let Some(view) = self.conversations.get_mut(self.active_tab) else {
            return;
        };
        view.push(ChatSide::User, format!("You: {}", text));

        let key = view.key.clone();
        let result = self
            .bot
            .on_activity(IncomingActivity::message(key.clone(), text))
            .await;
        let counter = self.bot.coordinator().counter(&key).await;

        if let Some(view) = self.conversations.get_mut(self.active_tab) {
            if let Err(e) = result {
                view.push(ChatSide::System, format!("Turn failed: {}", e));
            }
            if let Ok(counter) = counter {
                view.turn_count = counter.turn_count;
            }
        }
    }

    /// End the active conversation and close its tab. Its workers are
    /// cancelled; on failure the tab stays open with the error shown.
    pub async fn end_conversation(&mut self) {
        let Some(view) = self.active_view() else {
            return;
        };
        let activity = IncomingActivity {
            activity_type: ActivityType::EndOfConversation,
            conversation: view.key.clone(),
            text: None,
        };
        match self.bot.on_activity(activity).await {
            Ok(_) => {
                self.conversations.remove(self.active_tab);
                if self.active_tab >= self.conversations.len() {
                    self.active_tab = self.conversations.len().saturating_sub(1);
                }
            }
            Err(e) => {
                if let Some(view) = self.active_view_mut() {
                    view.last_typing = None;
                    view.push(ChatSide::System, format!("Failed to end conversation: {}", e));
                }
            }
        }
    }

    pub fn next_tab(&mut self) {
        if !self.conversations.is_empty() {
            self.active_tab = (self.active_tab + 1) % self.conversations.len();
        }
    }

    pub fn prev_tab(&mut self) {
        if !self.conversations.is_empty() {
            if self.active_tab == 0 {
                self.active_tab = self.conversations.len() - 1;
            } else {
                self.active_tab -= 1;
            }
        }
    }

    pub fn scroll_up(&mut self) {
        if let Some(view) = self.active_view_mut() {
            view.scroll_offset = view.scroll_offset.saturating_add(3);
        }
    }

    pub fn scroll_down(&mut self) {
        if let Some(view) = self.active_view_mut() {
            view.scroll_offset = view.scroll_offset.saturating_sub(3);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hourglass_core::channel::BroadcastChannel;
    use hourglass_core::config::TurnSettings;
    use hourglass_core::coordinator::TurnCoordinator;
    use hourglass_core::delay::FixedDelay;
    use hourglass_core::store::MemoryStateStore;

    fn app() -> App {
        let coordinator = TurnCoordinator::new(
            Arc::new(MemoryStateStore::new()),
            Arc::new(BroadcastChannel::default()),
            Arc::new(FixedDelay(Duration::from_secs(1))),
            TurnSettings {
                poll_interval: Duration::from_secs(1),
                max_wait: None,
            },
        );
        App::new(Arc::new(Bot::new(Arc::new(coordinator))), Duration::from_secs(1))
    }

    #[test]
    fn test_events_route_to_their_conversation() {
        let mut app = app();
        app.new_conversation();
        let first = app.conversations[0].key.clone();

        app.handle_event(ChannelEvent::new(first.clone(), OutgoingActivity::Typing));
        app.handle_event(ChannelEvent::new(
            first,
            OutgoingActivity::Message { text: "Turn 1: you sent 'x'".into() },
        ));

        assert_eq!(app.conversations[0].typing_seen, 1);
        assert!(app.is_typing(&app.conversations[0]));
        assert_eq!(app.conversations[0].messages.len(), 1);
        assert!(app.conversations[1].messages.is_empty());
    }

    #[test]
    fn test_events_for_unknown_conversation_ignored() {
        let mut app = app();
        app.handle_event(ChannelEvent::new("elsewhere".into(), OutgoingActivity::Typing));
        assert_eq!(app.conversations[0].typing_seen, 0);
    }

    #[test]
    fn test_tabs_wrap() {
        let mut app = app();
        app.new_conversation();
        assert_eq!(app.active_tab, 1);
        app.next_tab();
        assert_eq!(app.active_tab, 0);
        app.prev_tab();
        assert_eq!(app.active_tab, 1);
    }

    #[tokio::test]
    async fn test_send_message_updates_turn_count() {
        let mut app = app();
        app.input = "hello".into();
        app.send_message().await;

        let view = app.active_view().unwrap();
        assert_eq!(view.turn_count, 1);
        assert!(app.input.is_empty());
        app.bot.coordinator().supervisor().shutdown().await;
    }

    #[tokio::test]
    async fn test_end_conversation_closes_tab_and_disables_input() {
        let mut app = app();
        let key = app.conversations[0].key.clone();
        assert!(app.input_enabled());
        assert_eq!(app.input_title(), format!(" {} · turn 1 ", key));

        app.end_conversation().await;
        assert!(app.conversations.is_empty());
        assert!(!app.input_enabled());
        assert!(app.input_title().contains("No conversation"));

        app.input = "hello".into();
        app.send_message().await;
        assert_eq!(app.input, "hello");
        app.bot.coordinator().supervisor().shutdown().await;
    }

    #[test]
    fn test_input_title_tracks_turn_in_progress() {
        let mut app = app();
        let key = app.conversations[0].key.clone();
        app.conversations[0].turn_count = 2;
        app.handle_event(ChannelEvent::new(key.clone(), OutgoingActivity::Typing));

        assert_eq!(
            app.input_title(),
            format!(" {} · turn 3 · previous turn still working ", key)
        );
    }
}
