//! Conversation history display component

use crate::events::{Role, Turn};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Renders a log snapshot, newest lines at the bottom
pub struct ConversationHistory<'a> {
    turns: &'a [Turn],
    thinking: Option<&'a str>,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(turns: &'a [Turn]) -> Self {
        Self {
            turns,
            thinking: None,
        }
    }

    /// Show a trailing "thinking" line below the last turn
    pub fn thinking(mut self, indicator: Option<&'a str>) -> Self {
        self.thinking = indicator;
        self
    }

    /// All lines for the current snapshot at the given width
    pub fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let mut all_lines = Vec::new();
        for turn in self.turns {
            all_lines.extend(render_turn(turn, width));
            // spacing between turns
            all_lines.push(Line::from(""));
        }
        if let Some(indicator) = self.thinking {
            all_lines.push(Line::from(vec![Span::styled(
                indicator.to_string(),
                Style::default().fg(Color::Green).add_modifier(Modifier::ITALIC),
            )]));
        }
        all_lines
    }
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("💬 D-Bot");

        let inner_area = block.inner(area);
        block.render(area, buf);

        let all_lines = self.lines(inner_area.width);

        // Determine the range of lines to display from the bottom
        let height = inner_area.height as usize;
        let start = all_lines.len().saturating_sub(height);
        for (i, line) in all_lines[start..].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

/// Render a single turn into lines
fn render_turn(turn: &Turn, width: u16) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let role_icon = match turn.role {
        Role::User => "👤",
        Role::Assistant => "🤖",
    };
    let timestamp = turn.timestamp.format("%H:%M:%S").to_string();
    let header = format!("{} {} {} {}", role_icon, turn.role.display_name(), timestamp, "─".repeat(12));
    lines.push(Line::from(vec![Span::styled(
        header,
        Style::default().fg(Color::DarkGray),
    )]));

    let content_style = content_style(turn.role);
    let content_lines = wrap_text(&turn.content, width.saturating_sub(2) as usize);
    let last = content_lines.len().saturating_sub(1);
    for (i, content_line) in content_lines.into_iter().enumerate() {
        let mut spans = vec![Span::raw("  "), Span::styled(content_line, content_style)];
        if turn.animating && i == last {
            spans.push(Span::styled("▋", Style::default().fg(Color::Yellow)));
        }
        lines.push(Line::from(spans));
    }

    for source in &turn.sources {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled("📅 ", Style::default().fg(Color::Cyan)),
            Span::styled(source.summary(), Style::default().fg(Color::Cyan)),
        ]));
    }

    lines
}

/// Get content style based on role
fn content_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Blue),
        Role::Assistant => Style::default().fg(Color::Green),
    }
}

/// Wrap text to fit within the given width, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = word.chars().count();
            if current_width > 0 && current_width + 1 + word_width > width {
                lines.push(std::mem::take(&mut current_line));
                current_width = 0;
            }
            if current_width > 0 {
                current_line.push(' ');
                current_width += 1;
            }
            current_line.push_str(word);
            current_width += word_width;
        }

        lines.push(current_line);
    }

    lines
}
