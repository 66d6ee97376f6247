//! Status bar — turn count and the typing indicator.

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{App, ConversationView};

pub fn draw(frame: &mut Frame, app: &App, view: &ConversationView, area: Rect) {
    let (label, color) = if app.is_typing(view) {
        ("typing", Color::Green)
    } else {
        ("idle", Color::DarkGray)
    };

    let mut spans = vec![
        Span::styled(
            format!(" {} ", label),
            Style::default().fg(Color::Black).bg(color),
        ),
        Span::raw(format!(" turns: {} ", view.turn_count)),
    ];

    if view.typing_seen > 0 {
        spans.push(Span::styled(
            format!(" typing x{} ", view.typing_seen),
            Style::default().fg(Color::Yellow),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
