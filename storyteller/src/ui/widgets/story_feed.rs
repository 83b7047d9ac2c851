//! Story feed widget
//!
//! Renders the session history newest-first, with any in-flight streaming
//! text pinned above the completed entries.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols::scrollbar,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
        StatefulWidget, Widget, Wrap,
    },
};

use storyteller_core::StoryEntry;

use crate::ui::theme::StoryTheme;

/// Widget for displaying the story history
pub struct StoryFeedWidget<'a> {
    entries: &'a [StoryEntry],
    streaming_text: Option<&'a str>,
    scroll: usize,
    theme: &'a StoryTheme,
}

impl<'a> StoryFeedWidget<'a> {
    pub fn new(entries: &'a [StoryEntry], theme: &'a StoryTheme) -> Self {
        Self {
            entries,
            streaming_text: None,
            scroll: 0,
            theme,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn streaming(mut self, text: Option<&'a str>) -> Self {
        self.streaming_text = text;
        self
    }

    fn entry_header(&self, entry: &StoryEntry) -> String {
        match entry.genre.as_deref() {
            Some(genre) => format!("#{} · {} · {}", entry.sequence, entry.length, genre),
            None => format!("#{} · {}", entry.sequence, entry.length),
        }
    }
}

impl Widget for StoryFeedWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.entries.is_empty() {
            " Stories ".to_string()
        } else {
            format!(" Stories ({}) ", self.entries.len())
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = Vec::new();

        // In-flight story first, so the user watches it grow at the top
        if let Some(streaming) = self.streaming_text {
            lines.push(Line::from(Span::styled(
                "— writing —",
                self.theme.system_style(),
            )));
            for line in streaming.lines() {
                lines.push(Line::from(Span::styled(
                    line.to_string(),
                    self.theme.streaming_style(),
                )));
            }
            lines.push(Line::from(Span::styled("▌", self.theme.streaming_style())));
            lines.push(Line::from(""));
        }

        for entry in self.entries {
            lines.push(Line::from(Span::styled(
                self.entry_header(entry),
                self.theme.meta_style(),
            )));
            lines.push(Line::from(Span::styled(
                format!("> {}", entry.prompt),
                self.theme.prompt_style(),
            )));
            for line in entry.story.lines() {
                lines.push(Line::from(Span::styled(
                    line.to_string(),
                    self.theme.story_style(),
                )));
            }
            lines.push(Line::from(""));
        }

        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                "Tell me what kind of story you want to hear, and I will write it for you.",
                self.theme.system_style(),
            )));
        }

        let visible_height = inner.height as usize;
        let total_lines = lines.len();
        let max_scroll = total_lines.saturating_sub(visible_height);
        let scroll = self.scroll.min(max_scroll);

        let paragraph = Paragraph::new(lines)
            .scroll((scroll as u16, 0))
            .wrap(Wrap { trim: false });

        paragraph.render(inner, buf);

        if total_lines > visible_height {
            let scrollbar_area = Rect {
                x: inner.x + inner.width.saturating_sub(1),
                y: inner.y,
                width: 1,
                height: inner.height,
            };

            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .thumb_style(Style::default().fg(Color::DarkGray))
                .track_style(Style::default().fg(Color::Black))
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));

            let mut scrollbar_state = ScrollbarState::new(max_scroll).position(scroll);
            scrollbar.render(scrollbar_area, buf, &mut scrollbar_state);
        }
    }
}
