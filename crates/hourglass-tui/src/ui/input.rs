//! Input line for the active conversation.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::App;

const KEYS_HINT: &str = " Enter send · Tab focus · Ctrl+N new · Ctrl+W end ";

pub fn draw(frame: &mut Frame, app: &App, area: Rect) {
    let enabled = app.input_enabled();
    let border = match (enabled, app.input_focused) {
        (false, _) => Color::DarkGray,
        (true, true) => Color::Cyan,
        (true, false) => Color::Gray,
    };

    let block = Block::default()
        .title(app.input_title())
        .title_bottom(Line::from(KEYS_HINT).right_aligned())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if !enabled {
        return;
    }
    frame.render_widget(Paragraph::new(app.input.as_str()), inner);

    if app.input_focused {
        let col = (app.input.chars().count() as u16).min(inner.width.saturating_sub(1));
        frame.set_cursor_position(Position::new(inner.x + col, inner.y));
    }
}
