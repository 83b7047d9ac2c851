//! Interaction controller.
//!
//! `StorySession` is the primary public API: it owns the per-session state
//! and a story backend, and turns user-triggered events (submit, clear, pick
//! example, select option) into state transitions. Per session the machine
//! cycles `Idle -> AwaitingGeneration -> Idle`; the generating flag marks
//! the awaiting state and structurally serializes submissions.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::engine::{EngineError, StoryBackend, StoryRequest};
use crate::export::{self, ExportError};
use crate::history::{StoryEntry, Turn};
use crate::prompt::{compose_prompt, StoryLength, EXAMPLE_PROMPTS};
use crate::session::SessionState;

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Generation failed: {0}")]
    Engine(#[from] EngineError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("No story with sequence {0}")]
    UnknownStory(u64),
}

/// Why a submission was not accepted. Rejections have no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    /// The pending prompt text was empty.
    EmptyPrompt,
    /// A generation is already in progress for this session.
    Busy,
}

impl std::fmt::Display for SubmitRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitRejected::EmptyPrompt => f.write_str("Please enter a prompt for your story"),
            SubmitRejected::Busy => f.write_str("A story is already being generated"),
        }
    }
}

/// Result of a batch submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A story was generated and recorded with this sequence number.
    Generated { sequence: u64 },
    /// The submission was rejected before any backend call.
    Rejected(SubmitRejected),
}

/// An accepted submission awaiting its generation result.
///
/// Produced by [`StorySession::prepare_submission`]; closed by
/// `complete_submission` or `fail_submission`. The pending prompt has
/// already been reset by the time a `Submission` exists.
#[derive(Debug)]
pub struct Submission {
    user_prompt: String,
    effective_prompt: String,
    genre: Option<String>,
    length: StoryLength,
    history: Vec<Turn>,
}

impl Submission {
    /// The composed prompt that will be sent to the backend.
    pub fn effective_prompt(&self) -> &str {
        &self.effective_prompt
    }

    /// Build the backend request: composed prompt plus replayed history.
    pub fn to_request(&self) -> StoryRequest {
        StoryRequest::new(self.effective_prompt.clone()).with_history(self.history.clone())
    }
}

/// A story-generation session: state plus backend.
pub struct StorySession<B> {
    state: SessionState,
    backend: B,
}

impl<B: StoryBackend> StorySession<B> {
    /// Create a session with all fields at defined defaults.
    pub fn new(backend: B) -> Self {
        Self {
            state: SessionState::new(),
            backend,
        }
    }

    /// The session state (read-only).
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The backend, for callers that drive streaming themselves.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ------------------------------------------------------------------
    // Pending-field events
    // ------------------------------------------------------------------

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.state.set_pending_prompt(prompt);
    }

    pub fn set_genre(&mut self, genre: Option<String>) {
        self.state.set_pending_genre(genre);
    }

    pub fn set_length(&mut self, length: StoryLength) {
        self.state.set_pending_length(length);
    }

    /// Overwrite the pending prompt with a fixed example string. No
    /// generation is triggered. Returns the example, or `None` for an
    /// out-of-range index.
    pub fn pick_example(&mut self, index: usize) -> Option<&'static str> {
        let example = EXAMPLE_PROMPTS.get(index)?;
        self.state.set_pending_prompt(*example);
        Some(example)
    }

    /// Atomically reset history and every pending field.
    pub fn clear_history(&mut self) {
        debug!(entries = self.state.len(), "clearing session");
        self.state.clear();
    }

    // ------------------------------------------------------------------
    // Submission lifecycle
    // ------------------------------------------------------------------

    /// Validate and accept the pending submission.
    ///
    /// On acceptance the pending prompt is reset immediately - before any
    /// generation result, success or failure - and the generating flag is
    /// raised. Rejections leave the session untouched.
    pub fn prepare_submission(&mut self) -> Result<Submission, SubmitRejected> {
        if self.state.is_generating() {
            return Err(SubmitRejected::Busy);
        }
        let user_prompt = self.state.pending_prompt().trim().to_string();
        if user_prompt.is_empty() {
            return Err(SubmitRejected::EmptyPrompt);
        }

        let genre = self.state.pending_genre().map(str::to_string);
        let length = self.state.pending_length();
        let effective_prompt = compose_prompt(&user_prompt, length, genre.as_deref());

        self.state.set_pending_prompt("");
        self.state.begin_generation();

        debug!(%effective_prompt, "submission accepted");

        Ok(Submission {
            user_prompt,
            effective_prompt,
            genre,
            length,
            history: self.state.turns().to_vec(),
        })
    }

    /// Record the generated story for an accepted submission and return its
    /// sequence number.
    pub fn complete_submission(&mut self, submission: Submission, story: String) -> u64 {
        let sequence = self.state.record_story(
            submission.user_prompt,
            submission.effective_prompt,
            story,
            submission.genre,
            submission.length,
        );
        self.state.finish_generation();
        debug!(sequence, "story recorded");
        sequence
    }

    /// Close an accepted submission whose generation failed. No history
    /// entry is created; the pending prompt stays empty.
    pub fn fail_submission(&mut self, submission: Submission) {
        debug!(prompt = %submission.user_prompt, "generation failed");
        self.state.finish_generation();
    }

    /// One full request cycle in batch mode: validate, compose, call the
    /// backend, record the result.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, SessionError> {
        let submission = match self.prepare_submission() {
            Ok(submission) => submission,
            Err(rejected) => return Ok(SubmitOutcome::Rejected(rejected)),
        };

        let result = self.backend.generate(submission.to_request()).await;
        match result {
            Ok(story) => {
                let sequence = self.complete_submission(submission, story);
                Ok(SubmitOutcome::Generated { sequence })
            }
            Err(e) => {
                self.fail_submission(submission);
                Err(SessionError::Engine(e))
            }
        }
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Write the story with the given sequence number as a plain-text file
    /// in `dir`, returning the path written.
    pub async fn export_story(
        &self,
        sequence: u64,
        dir: impl AsRef<Path>,
    ) -> Result<PathBuf, SessionError> {
        let entry = self
            .state
            .entry_by_sequence(sequence)
            .ok_or(SessionError::UnknownStory(sequence))?;
        let path = export::write_story(dir, entry).await?;
        Ok(path)
    }

    /// The most recently generated entry, if any.
    pub fn latest_entry(&self) -> Option<&StoryEntry> {
        self.state.entry(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    #[tokio::test]
    async fn test_empty_prompt_never_reaches_backend() {
        let mut session = StorySession::new(MockBackend::new());

        let outcome = session.submit().await.unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Rejected(SubmitRejected::EmptyPrompt)
        );
        assert_eq!(session.backend().call_count(), 0);
        assert!(session.state().is_empty());
    }

    #[tokio::test]
    async fn test_submit_records_and_resets() {
        let backend = MockBackend::new();
        backend.queue_story("Once upon a time...");
        let mut session = StorySession::new(backend);

        session.set_prompt("A shy dragon");
        let outcome = session.submit().await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Generated { sequence: 1 });
        assert_eq!(session.state().pending_prompt(), "");
        assert_eq!(session.state().len(), 1);
        assert_eq!(session.latest_entry().unwrap().story, "Once upon a time...");
    }

    #[tokio::test]
    async fn test_failed_generation_leaves_no_entry() {
        let backend = MockBackend::new();
        backend.fail_next("quota exceeded");
        let mut session = StorySession::new(backend);

        session.set_prompt("A doomed request");
        let result = session.submit().await;

        assert!(matches!(result, Err(SessionError::Engine(_))));
        assert!(session.state().is_empty());
        assert_eq!(session.state().pending_prompt(), "");
        assert!(!session.state().is_generating());
    }

    #[test]
    fn test_busy_session_rejects_submit() {
        let mut session = StorySession::new(MockBackend::new());
        session.set_prompt("first");
        let pending = session.prepare_submission().unwrap();

        session.set_prompt("second");
        assert_eq!(
            session.prepare_submission().unwrap_err(),
            SubmitRejected::Busy
        );

        session.complete_submission(pending, "done".into());
        assert!(session.prepare_submission().is_ok());
    }

    #[test]
    fn test_pick_example_overwrites_prompt() {
        let mut session = StorySession::new(MockBackend::new());
        session.set_prompt("half-typed thought");

        let example = session.pick_example(0).unwrap();
        assert_eq!(session.state().pending_prompt(), example);
        assert!(session.pick_example(usize::MAX).is_none());
    }
}
