//! Color theme and styling for the Storyteller TUI

use ratatui::style::{Color, Modifier, Style};

/// UI color theme
#[derive(Debug, Clone)]
pub struct StoryTheme {
    // Base colors
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,

    // Text colors
    pub prompt_text: Color,
    pub story_text: Color,
    pub meta_text: Color,
    pub system_text: Color,
    pub error_text: Color,
    pub accent: Color,
}

impl Default for StoryTheme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::Cyan,

            prompt_text: Color::Cyan,
            story_text: Color::White,
            meta_text: Color::Yellow,
            system_text: Color::DarkGray,
            error_text: Color::LightRed,
            accent: Color::Magenta,
        }
    }
}

impl StoryTheme {
    /// Style for user prompts
    pub fn prompt_style(&self) -> Style {
        Style::default()
            .fg(self.prompt_text)
            .add_modifier(Modifier::ITALIC)
    }

    /// Style for generated story text
    pub fn story_style(&self) -> Style {
        Style::default().fg(self.story_text)
    }

    /// Style for in-flight streaming text
    pub fn streaming_style(&self) -> Style {
        Style::default()
            .fg(self.story_text)
            .add_modifier(Modifier::DIM)
    }

    /// Style for entry metadata (sequence, genre, length)
    pub fn meta_style(&self) -> Style {
        Style::default()
            .fg(self.meta_text)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for system messages
    pub fn system_style(&self) -> Style {
        Style::default()
            .fg(self.system_text)
            .add_modifier(Modifier::DIM)
    }

    /// Style for error messages - visually distinct from story content
    pub fn error_style(&self) -> Style {
        Style::default()
            .fg(self.error_text)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for the active value of a selector
    pub fn selector_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    /// Get border style
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    /// Title bar style
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.foreground)
            .add_modifier(Modifier::BOLD)
    }
}
