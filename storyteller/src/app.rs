//! Main application state and logic

use std::collections::VecDeque;

use storyteller_core::{
    StoryLength, StorySession, Storyteller, EXAMPLE_PROMPTS, GENRES, NO_GENRE,
};

use crate::ui::theme::StoryTheme;
use crate::ui::Overlay;

/// Vim-style input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Normal mode - navigation and hotkeys (default)
    #[default]
    Normal,
    /// Insert mode - free text input
    Insert,
    /// Command mode - entering : commands
    Command,
}

/// Spinner frames shown while a story is being generated
const SPINNER: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Main application state
pub struct App {
    pub session: StorySession<Storyteller>,

    // UI state
    pub theme: StoryTheme,
    overlay: Option<Overlay>,

    // Story feed
    pub feed_scroll: usize,
    pub streaming_text: Option<String>,

    // Selector state
    pub genre_index: usize,
    pub length_index: usize,
    pub example_index: usize,
    pub streaming_enabled: bool,

    // Input state
    pub input_mode: InputMode,
    input_buffer: String,
    cursor_position: usize,
    pub input_history: VecDeque<String>,
    pub history_index: Option<usize>,
    pub saved_input: Option<String>,

    // Status
    status_message: Option<String>,
    status_is_error: bool,
    pub should_quit: bool,

    // Work deferred to the run loop
    pub pending_submit: bool,
    pub pending_export: Option<u64>,

    // Animation
    pub animation_frame: u8,
}

impl App {
    /// Create a new application around a session.
    pub fn new(session: StorySession<Storyteller>) -> Self {
        let mut app = Self {
            session,
            theme: StoryTheme::default(),
            overlay: None,
            feed_scroll: 0,
            streaming_text: None,
            genre_index: 0,
            length_index: 1, // Medium
            example_index: 0,
            streaming_enabled: true,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            cursor_position: 0,
            input_history: VecDeque::with_capacity(100),
            history_index: None,
            saved_input: None,
            status_message: None,
            status_is_error: false,
            should_quit: false,
            pending_submit: false,
            pending_export: None,
            animation_frame: 0,
        };

        app.set_status("Press 'i' to type a prompt, 'e' for an example, '?' for help");
        app
    }

    // =========================================================================
    // Selectors
    // =========================================================================

    /// Cycle the genre selector and push the selection into the session.
    pub fn cycle_genre(&mut self, delta: isize) {
        let len = GENRES.len() as isize;
        self.genre_index = (self.genre_index as isize + delta).rem_euclid(len) as usize;
        let genre = GENRES[self.genre_index];
        self.session
            .set_genre((genre != NO_GENRE).then(|| genre.to_string()));
    }

    /// Cycle the length selector and push the selection into the session.
    pub fn cycle_length(&mut self, delta: isize) {
        let lengths = StoryLength::all();
        let len = lengths.len() as isize;
        self.length_index = (self.length_index as isize + delta).rem_euclid(len) as usize;
        self.session.set_length(lengths[self.length_index]);
    }

    pub fn selected_genre(&self) -> &'static str {
        GENRES[self.genre_index]
    }

    pub fn selected_length(&self) -> StoryLength {
        StoryLength::all()[self.length_index]
    }

    /// Copy the next canned example into the input buffer (and the session's
    /// pending prompt). Cycles through the examples on repeated presses.
    pub fn pick_next_example(&mut self) {
        let index = self.example_index;
        if let Some(example) = self.session.pick_example(index) {
            self.example_index = (index + 1) % EXAMPLE_PROMPTS.len();
            self.set_input(example);
            self.input_mode = InputMode::Insert;
            self.set_status("Example prompt loaded - press Enter to generate");
        }
    }

    // =========================================================================
    // Session-wide actions
    // =========================================================================

    /// Clear history, pending fields, selectors, and the input buffer.
    pub fn clear_session(&mut self) {
        self.session.clear_history();
        self.genre_index = 0;
        self.length_index = 1;
        self.streaming_text = None;
        self.feed_scroll = 0;
        self.clear_input();
        self.set_status("History cleared");
    }

    /// Queue an export of the most recent story.
    pub fn export_latest(&mut self) {
        match self.session.latest_entry() {
            Some(entry) => self.pending_export = Some(entry.sequence),
            None => self.set_error("No story to save yet"),
        }
    }

    pub fn request_submit(&mut self) {
        self.pending_submit = true;
    }

    // =========================================================================
    // Streaming buffer
    // =========================================================================

    /// Append text to the streaming buffer
    pub fn append_streaming_text(&mut self, text: &str) {
        match &mut self.streaming_text {
            Some(existing) => existing.push_str(text),
            None => self.streaming_text = Some(text.to_string()),
        }
    }

    /// Take the assembled streaming text, leaving the buffer empty.
    pub fn take_streaming_text(&mut self) -> String {
        self.streaming_text.take().unwrap_or_default()
    }

    // =========================================================================
    // Feed scrolling
    // =========================================================================

    pub fn scroll_up(&mut self, lines: usize) {
        self.feed_scroll = self.feed_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        // The widget caps this to the actual content height
        self.feed_scroll = self.feed_scroll.saturating_add(lines).min(usize::MAX / 2);
    }

    pub fn scroll_to_top(&mut self) {
        self.feed_scroll = 0;
    }

    // =========================================================================
    // Input editing (unicode-safe)
    // =========================================================================

    /// Take the input buffer for submission, recording it in the recall
    /// history. The buffer may be empty - validation is the session's job.
    pub fn take_input(&mut self) -> String {
        let input = std::mem::take(&mut self.input_buffer);
        self.cursor_position = 0;

        if !input.trim().is_empty() {
            self.input_history.push_front(input.clone());
            if self.input_history.len() > 100 {
                self.input_history.pop_back();
            }
        }
        self.history_index = None;
        self.saved_input = None;

        input
    }

    /// Handle a typed character (unicode-safe)
    pub fn type_char(&mut self, c: char) {
        let byte_pos = self
            .input_buffer
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.input_buffer.len());
        self.input_buffer.insert(byte_pos, c);
        self.cursor_position += 1;
    }

    /// Handle backspace (unicode-safe)
    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            if let Some((byte_pos, ch)) = self.input_buffer.char_indices().nth(self.cursor_position)
            {
                self.input_buffer
                    .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
            }
        }
    }

    /// Handle delete (unicode-safe)
    pub fn delete(&mut self) {
        let char_count = self.input_buffer.chars().count();
        if self.cursor_position < char_count {
            if let Some((byte_pos, ch)) = self.input_buffer.char_indices().nth(self.cursor_position)
            {
                self.input_buffer
                    .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
            }
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input_buffer.chars().count();
        self.cursor_position = (self.cursor_position + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_position = self.input_buffer.chars().count();
    }

    /// Navigate to previous input in history
    pub fn history_prev(&mut self) {
        if self.input_history.is_empty() {
            return;
        }

        if self.history_index.is_none() && !self.input_buffer.is_empty() {
            self.saved_input = Some(self.input_buffer.clone());
        }

        let new_index = match self.history_index {
            None => Some(0),
            Some(i) if i + 1 < self.input_history.len() => Some(i + 1),
            Some(i) => Some(i), // Already at oldest
        };

        if let Some(idx) = new_index {
            if let Some(entry) = self.input_history.get(idx) {
                self.input_buffer = entry.clone();
                self.cursor_position = self.input_buffer.chars().count();
                self.history_index = new_index;
            }
        }
    }

    /// Navigate to next input in history
    pub fn history_next(&mut self) {
        match self.history_index {
            None => {}
            Some(0) => {
                self.input_buffer = self.saved_input.take().unwrap_or_default();
                self.cursor_position = self.input_buffer.chars().count();
                self.history_index = None;
            }
            Some(i) => {
                if let Some(entry) = self.input_history.get(i - 1) {
                    self.input_buffer = entry.clone();
                    self.cursor_position = self.input_buffer.chars().count();
                    self.history_index = Some(i - 1);
                }
            }
        }
    }

    /// Set input buffer content and move cursor to end (unicode-safe)
    pub fn set_input(&mut self, content: impl Into<String>) {
        self.input_buffer = content.into();
        self.cursor_position = self.input_buffer.chars().count();
    }

    pub fn clear_input(&mut self) {
        self.input_buffer.clear();
        self.cursor_position = 0;
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    // =========================================================================
    // Modes, overlay, status
    // =========================================================================

    /// Enter command mode (starts with :)
    pub fn enter_command_mode(&mut self) {
        self.input_mode = InputMode::Command;
        self.input_buffer.clear();
        self.input_buffer.push(':');
        self.cursor_position = 1;
    }

    /// Exit to normal mode
    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        if self.input_buffer.starts_with(':') {
            self.input_buffer.clear();
            self.cursor_position = 0;
        }
    }

    pub fn toggle_help(&mut self) {
        if matches!(self.overlay, Some(Overlay::Help)) {
            self.overlay = None;
        } else {
            self.overlay = Some(Overlay::Help);
        }
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    /// Set an informational status message
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_is_error = false;
    }

    /// Set an error status message - rendered distinctly from stories
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_is_error = true;
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn status_is_error(&self) -> bool {
        self.status_is_error
    }

    /// Current spinner frame, shown while generating.
    pub fn spinner(&self) -> char {
        SPINNER[self.animation_frame as usize % SPINNER.len()]
    }

    /// Tick for animations
    pub fn tick(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1);
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Process a colon command. Returns true if the command was recognized.
    pub fn process_command(&mut self, command: &str) -> bool {
        let cmd = command.trim_start_matches(':');
        let parts: Vec<&str> = cmd.split_whitespace().collect();

        if parts.is_empty() {
            return false;
        }

        match parts[0] {
            "q" | "quit" | "exit" => {
                self.should_quit = true;
                true
            }
            "clear" => {
                self.clear_session();
                true
            }
            "export" | "w" => {
                match parts.get(1) {
                    Some(arg) => match arg.parse::<u64>() {
                        Ok(sequence) => self.pending_export = Some(sequence),
                        Err(_) => self.set_error(format!("Not a story number: {arg}")),
                    },
                    None => self.export_latest(),
                }
                true
            }
            "stream" => {
                match parts.get(1).copied() {
                    Some("on") => {
                        self.streaming_enabled = true;
                        self.set_status("Streaming display on");
                    }
                    Some("off") => {
                        self.streaming_enabled = false;
                        self.set_status("Streaming display off");
                    }
                    _ => self.set_status(format!(
                        "Streaming is {} (use :stream on|off)",
                        if self.streaming_enabled { "on" } else { "off" }
                    )),
                }
                true
            }
            "example" => {
                self.pick_next_example();
                true
            }
            "help" | "h" => {
                self.toggle_help();
                true
            }
            _ => {
                self.set_error(format!("Unknown command: {}", parts[0]));
                false
            }
        }
    }
}
