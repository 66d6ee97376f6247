//! Scrollable chat feed — user messages, bot replies, system notes.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::{ChatSide, ConversationView};

pub fn draw(frame: &mut Frame, view: &ConversationView, area: Rect) {
    let block = Block::default()
        .title(format!(" {} ", view.key))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if view.messages.is_empty() {
        let empty = Paragraph::new("Say something...")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    // Bottom-up with scroll offset
    let visible_height = inner.height as usize;
    let total = view.messages.len();
    let end = total.saturating_sub(view.scroll_offset);
    let start = end.saturating_sub(visible_height * 2); // overshoot for wrapping

    let mut lines: Vec<Line> = Vec::new();
    for msg in &view.messages[start..end] {
        let (fg, prefix) = match msg.side {
            ChatSide::User => (Color::Yellow, "< "),
            ChatSide::Bot => (Color::Green, "> "),
            ChatSide::System => (Color::DarkGray, "  "),
        };

        let display: String = msg.text.chars().take(500).collect();
        for line in display.lines() {
            lines.push(Line::styled(
                format!("{}{}", prefix, line),
                Style::default().fg(fg),
            ));
        }
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner);
}
