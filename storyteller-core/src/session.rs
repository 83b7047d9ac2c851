//! Per-session mutable state.
//!
//! `SessionState` is the single container for everything a session
//! accumulates: pending UI field values, the newest-first story history,
//! the ordered conversation log, and the generation-in-progress flag. All
//! operations are synchronous and apply atomically from the session's point
//! of view; the only non-append mutation is the full [`SessionState::clear`].

use crate::history::{StoryEntry, Turn};
use crate::prompt::StoryLength;

/// Mutable state for one user session. Memory-only; nothing survives the
/// process.
#[derive(Debug)]
pub struct SessionState {
    pending_prompt: String,
    pending_genre: Option<String>,
    pending_length: StoryLength,
    /// Newest-first: index 0 is the most recent story.
    entries: Vec<StoryEntry>,
    /// Oldest-first conversation log replayed to the backend.
    turns: Vec<Turn>,
    next_order: u64,
    next_sequence: u64,
    generating: bool,
}

impl SessionState {
    /// A fresh session with every field at its defined default.
    pub fn new() -> Self {
        Self {
            pending_prompt: String::new(),
            pending_genre: None,
            pending_length: StoryLength::default(),
            entries: Vec::new(),
            turns: Vec::new(),
            next_order: 0,
            next_sequence: 1,
            generating: false,
        }
    }

    // ------------------------------------------------------------------
    // Pending fields
    // ------------------------------------------------------------------

    pub fn pending_prompt(&self) -> &str {
        &self.pending_prompt
    }

    pub fn set_pending_prompt(&mut self, prompt: impl Into<String>) {
        self.pending_prompt = prompt.into();
    }

    pub fn pending_genre(&self) -> Option<&str> {
        self.pending_genre.as_deref()
    }

    pub fn set_pending_genre(&mut self, genre: Option<String>) {
        self.pending_genre = genre;
    }

    pub fn pending_length(&self) -> StoryLength {
        self.pending_length
    }

    pub fn set_pending_length(&mut self, length: StoryLength) {
        self.pending_length = length;
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Story history, newest first.
    pub fn entries(&self) -> &[StoryEntry] {
        &self.entries
    }

    /// Entry by display index (0 = newest).
    pub fn entry(&self, index: usize) -> Option<&StoryEntry> {
        self.entries.get(index)
    }

    /// Entry by its stable creation sequence.
    pub fn entry_by_sequence(&self, sequence: u64) -> Option<&StoryEntry> {
        self.entries.iter().find(|e| e.sequence == sequence)
    }

    /// Conversation log in creation order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // ------------------------------------------------------------------
    // Generation lifecycle
    // ------------------------------------------------------------------

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub(crate) fn begin_generation(&mut self) {
        self.generating = true;
    }

    pub(crate) fn finish_generation(&mut self) {
        self.generating = false;
    }

    /// Record a completed exchange: insert the entry at the head and append
    /// the user/assistant turn pair to the conversation log.
    ///
    /// `effective_prompt` is what was actually sent to the backend and is
    /// what the log replays; `prompt` is the user's literal text.
    pub(crate) fn record_story(
        &mut self,
        prompt: String,
        effective_prompt: String,
        story: String,
        genre: Option<String>,
        length: StoryLength,
    ) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let user_order = self.next_order;
        let assistant_order = self.next_order + 1;
        self.next_order += 2;

        self.turns.push(Turn::user(effective_prompt, user_order));
        self.turns
            .push(Turn::assistant(story.clone(), assistant_order));

        self.entries.insert(
            0,
            StoryEntry {
                sequence,
                prompt,
                story,
                genre,
                length,
            },
        );

        sequence
    }

    /// Reset every field to its initial value in one step: pending text,
    /// pending selections, full history, counters, and the in-progress flag.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let state = SessionState::new();
        assert_eq!(state.pending_prompt(), "");
        assert_eq!(state.pending_genre(), None);
        assert_eq!(state.pending_length(), StoryLength::Medium);
        assert!(state.is_empty());
        assert!(!state.is_generating());
    }

    #[test]
    fn test_record_story_inserts_at_head() {
        let mut state = SessionState::new();
        state.record_story(
            "P1".into(),
            "composed P1".into(),
            "S1".into(),
            None,
            StoryLength::Short,
        );
        state.record_story(
            "P2".into(),
            "composed P2".into(),
            "S2".into(),
            Some("Mystery".into()),
            StoryLength::Long,
        );

        assert_eq!(state.len(), 2);
        assert_eq!(state.entry(0).unwrap().prompt, "P2");
        assert_eq!(state.entry(1).unwrap().prompt, "P1");
    }

    #[test]
    fn test_sequences_are_monotonic() {
        let mut state = SessionState::new();
        let first = state.record_story("a".into(), "a".into(), "s".into(), None, StoryLength::Medium);
        let second = state.record_story("b".into(), "b".into(), "s".into(), None, StoryLength::Medium);

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(state.entry_by_sequence(1).unwrap().prompt, "a");
    }

    #[test]
    fn test_turn_log_orders_by_creation() {
        let mut state = SessionState::new();
        state.record_story("a".into(), "ask a".into(), "story a".into(), None, StoryLength::Medium);
        state.record_story("b".into(), "ask b".into(), "story b".into(), None, StoryLength::Medium);

        let orders: Vec<u64> = state.turns().iter().map(|t| t.created_order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
        assert_eq!(state.turns()[0].content, "ask a");
        assert_eq!(state.turns()[3].content, "story b");
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut state = SessionState::new();
        state.set_pending_prompt("draft");
        state.set_pending_genre(Some("Horror".into()));
        state.set_pending_length(StoryLength::Long);
        state.record_story("p".into(), "p".into(), "s".into(), None, StoryLength::Short);
        state.begin_generation();

        state.clear();

        assert_eq!(state.pending_prompt(), "");
        assert_eq!(state.pending_genre(), None);
        assert_eq!(state.pending_length(), StoryLength::Medium);
        assert!(state.is_empty());
        assert!(state.turns().is_empty());
        assert!(!state.is_generating());

        // Counters restart too: the next story is sequence 1 again
        let seq = state.record_story("p".into(), "p".into(), "s".into(), None, StoryLength::Medium);
        assert_eq!(seq, 1);
    }
}
