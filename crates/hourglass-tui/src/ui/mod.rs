//! TUI layout compositing — assembles all UI panels.

mod chat;
mod input;
mod status;
mod switcher;

use ratatui::prelude::*;
use ratatui::widgets::Block;

use crate::app::App;

/// Render the full TUI layout.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // ┌──────────────────────────────────┐
    // │ Tabs (conversations)             │
    // ├──────────────────────────────────┤
    // │ Chat feed                        │
    // │                                  │
    // ├──────────────────────────────────┤
    // │ Status bar                       │
    // ├──────────────────────────────────┤
    // │ Input                            │
    // └──────────────────────────────────┘

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // tabs
            Constraint::Min(10),   // chat
            Constraint::Length(1), // status
            Constraint::Length(3), // input
        ])
        .split(area);

    switcher::draw(frame, app, main_layout[0]);

    if let Some(view) = app.active_view() {
        chat::draw(frame, view, main_layout[1]);
        status::draw(frame, app, view, main_layout[2]);
    } else {
        let empty = Block::default().title(" No conversation (Ctrl+N to start one) ");
        frame.render_widget(empty, main_layout[1]);
    }

    input::draw(frame, app, main_layout[3]);
}
