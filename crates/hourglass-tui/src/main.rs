//! hourglass-tui — chat with the bot in-process from the terminal.
//! Uses Ratatui + Crossterm for rendering.

mod app;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tracing::info;

use hourglass_core::bot::Bot;
use hourglass_core::channel::BroadcastChannel;
use hourglass_core::config::Config;
use hourglass_core::coordinator::TurnCoordinator;

use app::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing to a file (not stdout, since we own the terminal)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("hourglass-tui.log")?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .try_init();

    let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = Config::load_or_default(&project_root)?;

    let store = config.open_store()?;
    let channel = Arc::new(BroadcastChannel::default());
    let mut events = channel.subscribe();
    let coordinator = Arc::new(TurnCoordinator::from_config(&config, store, channel)?);
    let bot = Arc::new(Bot::new(Arc::clone(&coordinator)));

    let mut app = App::new(bot, config.turn_settings().poll_interval);
    info!("Starting TUI");

    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    // Main event loop
    loop {
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Drain channel events (non-blocking)
        loop {
            match events.try_recv() {
                Ok(event) => app.handle_event(event),
                Err(tokio::sync::broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }

        // Handle terminal events
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                match (key.code, key.modifiers) {
                    // Quit
                    (KeyCode::Char('c'), KeyModifiers::CONTROL)
                    | (KeyCode::Char('q'), KeyModifiers::CONTROL) => {
                        app.should_quit = true;
                    }
                    // Conversations
                    (KeyCode::Char('n'), KeyModifiers::CONTROL) => app.new_conversation(),
                    (KeyCode::Char('w'), KeyModifiers::CONTROL) => app.end_conversation().await,
                    (KeyCode::Right, KeyModifiers::ALT) => app.next_tab(),
                    (KeyCode::Left, KeyModifiers::ALT) => app.prev_tab(),
                    // Focus toggle
                    (KeyCode::Tab, _) => {
                        app.input_focused = !app.input_focused;
                    }
                    // Input handling
                    (KeyCode::Enter, _) if app.input_focused => {
                        app.send_message().await;
                    }
                    (KeyCode::Char(c), _) if app.input_focused => {
                        app.input.push(c);
                    }
                    (KeyCode::Backspace, _) if app.input_focused => {
                        app.input.pop();
                    }
                    // Scroll
                    (KeyCode::Up, _) if !app.input_focused => app.scroll_up(),
                    (KeyCode::Down, _) if !app.input_focused => app.scroll_down(),
                    (KeyCode::PageUp, _) => app.scroll_up(),
                    (KeyCode::PageDown, _) => app.scroll_down(),
                    _ => {}
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    // Cleanup
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;

    coordinator.supervisor().shutdown().await;
    Ok(())
}
