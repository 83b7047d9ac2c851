//! Genre/length selector bar

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use storyteller_core::StoryLength;

use crate::ui::theme::StoryTheme;

/// One-line bar showing the current selector values and their keys.
pub struct PickerWidget<'a> {
    genre: &'a str,
    length: StoryLength,
    streaming: bool,
    theme: &'a StoryTheme,
}

impl<'a> PickerWidget<'a> {
    pub fn new(genre: &'a str, length: StoryLength, streaming: bool, theme: &'a StoryTheme) -> Self {
        Self {
            genre,
            length,
            streaming,
            theme,
        }
    }
}

impl Widget for PickerWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line = Line::from(vec![
            Span::styled(" Genre ", self.theme.system_style()),
            Span::styled("◂ ", self.theme.system_style()),
            Span::styled(self.genre, self.theme.selector_style()),
            Span::styled(" ▸", self.theme.system_style()),
            Span::raw("   "),
            Span::styled("Length ", self.theme.system_style()),
            Span::styled("◂ ", self.theme.system_style()),
            Span::styled(self.length.label(), self.theme.selector_style()),
            Span::styled(" ▸", self.theme.system_style()),
            Span::raw("   "),
            Span::styled("Stream ", self.theme.system_style()),
            Span::styled(
                if self.streaming { "on" } else { "off" },
                self.theme.selector_style(),
            ),
            Span::raw("   "),
            Span::styled(
                "[/] genre  l length  e example  x save  c clear",
                self.theme.system_style(),
            ),
        ]);

        Paragraph::new(line).render(area, buf);
    }
}
