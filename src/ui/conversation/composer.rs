use crate::ui::conversation::commands::{parse_slash_command, ParsedCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(ParsedCommand),
    /// The text changed
    Edited,
    None,
}

/// Single-line input box. The cursor counts characters, not bytes.
#[derive(Debug, Clone, Default)]
pub struct ConversationComposer {
    content: String,
    cursor: usize,
    enabled: bool,
}

impl ConversationComposer {
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if !self.enabled || self.content.trim().is_empty() {
                    return ComposerResult::None;
                }
                let content = std::mem::take(&mut self.content);
                self.cursor = 0;
                if let Some(command) = parse_slash_command(&content) {
                    return ComposerResult::Command(command);
                }
                return ComposerResult::Submitted(content);
            }
            KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                let at = self.byte_index(self.cursor);
                self.content.insert(at, c);
                self.cursor += 1;
                return ComposerResult::Edited;
            }
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                let at = self.byte_index(self.cursor);
                self.content.remove(at);
                return ComposerResult::Edited;
            }
            KeyCode::Delete if self.cursor < self.char_len() => {
                let at = self.byte_index(self.cursor);
                self.content.remove(at);
                return ComposerResult::Edited;
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.char_len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.char_len(),
            _ => {}
        }

        ComposerResult::None
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    /// Replace the content, cursor at the end
    pub fn set_content(&mut self, content: &str) {
        self.content = content.to_string();
        self.cursor = self.char_len();
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Enter is ignored while disabled; editing still works
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (title, border) = if self.enabled {
            ("✏️  Ask about events", Style::default().fg(Color::Green))
        } else {
            ("⏳ Waiting for D-Bot", Style::default().fg(Color::Gray))
        };
        let block = Block::default().borders(Borders::ALL).title(title).style(border);

        let inner_area = block.inner(area);
        block.render(area, buf);

        let line = if self.content.is_empty() {
            Line::from(vec![Span::styled(
                "Enter your message...",
                Style::default().fg(Color::DarkGray),
            )])
        } else {
            let mut shown = self.content.clone();
            shown.insert(self.byte_index(self.cursor), '▌');
            Line::from(vec![Span::raw(shown)])
        };
        buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
    }
}
