//! Render orchestration for the Storyteller TUI

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode};
use crate::ui::layout::{centered_rect_fixed, AppLayout};
use crate::ui::widgets::{InputWidget, PickerWidget, StoryFeedWidget};

/// Overlay types
#[derive(Debug, Clone, Copy)]
pub enum Overlay {
    Help,
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let layout = AppLayout::calculate(area);

    render_title_bar(frame, app, layout.title_area);

    let feed = StoryFeedWidget::new(app.session.state().entries(), &app.theme)
        .scroll(app.feed_scroll)
        .streaming(app.streaming_text.as_deref());
    frame.render_widget(feed, layout.feed_area);

    let picker = PickerWidget::new(
        app.selected_genre(),
        app.selected_length(),
        app.streaming_enabled,
        &app.theme,
    );
    frame.render_widget(picker, layout.picker_area);

    render_status_bar(frame, app, layout.status_area);
    render_input(frame, app, layout.input_area);

    if let Some(overlay) = app.overlay() {
        render_overlay(frame, app, overlay, area);
    }
}

/// Render the title bar
fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Insert => "INSERT",
        InputMode::Command => "COMMAND",
    };

    let line = Line::from(vec![
        Span::styled(" 📚 Storyteller ", app.theme.title_style()),
        Span::styled(
            format!("· {mode} "),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();

    if app.session.state().is_generating() {
        spans.push(Span::styled(
            format!(" {} ", app.spinner()),
            app.theme.selector_style(),
        ));
    } else {
        spans.push(Span::raw(" "));
    }

    if let Some(message) = app.status_message() {
        let style = if app.status_is_error() {
            app.theme.error_style()
        } else {
            app.theme.system_style()
        };
        spans.push(Span::styled(message.to_string(), style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the input area
fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = matches!(app.input_mode, InputMode::Insert | InputMode::Command);
    let is_command = matches!(app.input_mode, InputMode::Command);

    let placeholder = if app.session.state().is_generating() {
        "Thinking of a story for you..."
    } else {
        "Tell me what kind of story you want to hear..."
    };

    let input = InputWidget::new(app.input_buffer(), &app.theme)
        .cursor_position(app.cursor_position())
        .active(is_active)
        .command_mode(is_command)
        .placeholder(placeholder);

    frame.render_widget(input, area);
}

/// Render overlay
fn render_overlay(frame: &mut Frame, app: &App, overlay: &Overlay, area: Rect) {
    match overlay {
        Overlay::Help => render_help_overlay(frame, app, area),
    }
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(52, 22, area);

    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            " Storyteller - Help ",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Input Modes:",
            Style::default().add_modifier(Modifier::UNDERLINED),
        )),
        Line::from("  i       Enter INSERT mode (type your prompt)"),
        Line::from("  :       Enter COMMAND mode"),
        Line::from("  Esc     Return to NORMAL mode"),
        Line::from("  Enter   Submit the prompt (INSERT mode)"),
        Line::from(""),
        Line::from(Span::styled(
            "Story controls (NORMAL mode):",
            Style::default().add_modifier(Modifier::UNDERLINED),
        )),
        Line::from("  [ / ]   Previous / next genre"),
        Line::from("  l / L   Next / previous length"),
        Line::from("  e       Load an example prompt"),
        Line::from("  x       Save the latest story to a file"),
        Line::from("  c       Clear the history"),
        Line::from(""),
        Line::from(Span::styled(
            "Navigation / Commands:",
            Style::default().add_modifier(Modifier::UNDERLINED),
        )),
        Line::from("  j/k, wheel   Scroll stories  ·  g top"),
        Line::from("  :export [n]  Save story n  ·  :stream on|off"),
        Line::from("  :clear  :q   Clear history, quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or q to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}
