use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Side panel listing recent queries, most recent first
pub struct RecentSearches<'a> {
    queries: &'a [String],
}

impl<'a> RecentSearches<'a> {
    pub fn new(queries: &'a [String]) -> Self {
        Self { queries }
    }
}

impl Widget for RecentSearches<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("🕒 Recent Searches");
        let inner = block.inner(area);
        block.render(area, buf);

        if self.queries.is_empty() {
            let hint = Line::from(vec![Span::styled(
                "Nothing yet",
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner.x, inner.y, &hint, inner.width);
            return;
        }

        let label_width = (inner.width as usize).saturating_sub(4);
        for (index, query) in self.queries.iter().enumerate() {
            let y = index as u16 * 2;
            if y >= inner.height {
                break;
            }
            let line = Line::from(vec![
                Span::styled(format!("{} ", index + 1), Style::default().fg(Color::Yellow)),
                Span::raw(truncate(query, label_width)),
            ]);
            buf.set_line(inner.x + 1, inner.y + y, &line, inner.width.saturating_sub(1));
        }
    }
}

/// Shorten to `width` characters, ending in an ellipsis when cut
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut short: String = text.chars().take(width - 1).collect();
    short.push('…');
    short
}
