//! Testing utilities.
//!
//! `MockBackend` is a deterministic [`StoryBackend`] for tests: scripted
//! stories, call counting, and fragment-split streaming whose concatenation
//! equals the batch result. `TestHarness` wires one into a `StorySession`
//! for scripted interaction flows without API calls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::controller::{StorySession, SubmitOutcome};
use crate::engine::{EngineError, StoryBackend, StoryRequest, StoryStream};

/// Fragment size (in characters) the mock stream splits stories into.
const DEFAULT_FRAGMENT_CHARS: usize = 8;

/// A story backend that returns scripted responses.
pub struct MockBackend {
    stories: Mutex<VecDeque<String>>,
    failures: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<StoryRequest>>,
    calls: AtomicUsize,
    fragment_chars: usize,
}

impl MockBackend {
    /// Create a mock with no scripted stories yet.
    pub fn new() -> Self {
        Self {
            stories: Mutex::new(VecDeque::new()),
            failures: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fragment_chars: DEFAULT_FRAGMENT_CHARS,
        }
    }

    /// Set how many characters each streamed fragment carries.
    pub fn with_fragment_chars(mut self, chars: usize) -> Self {
        self.fragment_chars = chars.max(1);
        self
    }

    /// Queue a story to return on the next call.
    pub fn queue_story(&self, story: impl Into<String>) {
        self.stories.lock().unwrap().push_back(story.into());
    }

    /// Make the next call fail with a stream error carrying this message.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.failures.lock().unwrap().push_back(message.into());
    }

    /// How many generation calls (batch or streaming) have been made.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The request passed to the most recent call.
    pub fn last_request(&self) -> Option<StoryRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn next_story(&self, request: StoryRequest) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        if let Some(message) = self.failures.lock().unwrap().pop_front() {
            return Err(EngineError::Stream(message));
        }

        Ok(self
            .stories
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "The mock backend has no more scripted stories.".to_string()))
    }

    fn split_fragments(&self, story: &str) -> Vec<String> {
        let chars: Vec<char> = story.chars().collect();
        chars
            .chunks(self.fragment_chars)
            .map(|chunk| chunk.iter().collect())
            .collect()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoryBackend for MockBackend {
    async fn generate(&self, request: StoryRequest) -> Result<String, EngineError> {
        self.next_story(request)
    }

    async fn generate_stream(&self, request: StoryRequest) -> Result<StoryStream, EngineError> {
        let story = self.next_story(request)?;
        let fragments = self.split_fragments(&story);
        Ok(Box::pin(futures::stream::iter(
            fragments.into_iter().map(Ok),
        )))
    }
}

/// Harness for scripted session flows.
pub struct TestHarness {
    pub session: StorySession<MockBackend>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            session: StorySession::new(MockBackend::new()),
        }
    }

    /// Queue a story for the next submission.
    pub fn expect_story(&mut self, story: impl Into<String>) -> &mut Self {
        self.session.backend().queue_story(story);
        self
    }

    /// Set the pending prompt and submit in batch mode.
    pub async fn submit_prompt(
        &mut self,
        prompt: &str,
    ) -> Result<SubmitOutcome, crate::controller::SessionError> {
        self.session.set_prompt(prompt);
        self.session.submit().await
    }

    /// Number of backend calls made so far.
    pub fn backend_calls(&self) -> usize {
        self.session.backend().call_count()
    }

    /// The most recent story, if any.
    pub fn last_story(&self) -> Option<&str> {
        self.session.latest_entry().map(|e| e.story.as_str())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_mock_scripted_order() {
        let backend = MockBackend::new();
        backend.queue_story("first");
        backend.queue_story("second");

        assert_eq!(
            backend.generate(StoryRequest::new("a")).await.unwrap(),
            "first"
        );
        assert_eq!(
            backend.generate(StoryRequest::new("b")).await.unwrap(),
            "second"
        );
        assert!(backend
            .generate(StoryRequest::new("c"))
            .await
            .unwrap()
            .contains("no more scripted"));
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_stream_concatenation_matches_batch() {
        let story = "Once upon a time, in a quiet valley, a dragon learned to sing.";

        let batch = MockBackend::new();
        batch.queue_story(story);
        let full = batch.generate(StoryRequest::new("p")).await.unwrap();

        let streaming = MockBackend::new().with_fragment_chars(5);
        streaming.queue_story(story);
        let stream = streaming
            .generate_stream(StoryRequest::new("p"))
            .await
            .unwrap();
        let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;

        assert!(fragments.len() > 1);
        assert_eq!(fragments.concat(), full);
    }

    #[tokio::test]
    async fn test_fail_next() {
        let backend = MockBackend::new();
        backend.fail_next("boom");
        backend.queue_story("after the failure");

        assert!(matches!(
            backend.generate(StoryRequest::new("p")).await,
            Err(EngineError::Stream(_))
        ));
        assert_eq!(
            backend.generate(StoryRequest::new("p")).await.unwrap(),
            "after the failure"
        );
    }

    #[tokio::test]
    async fn test_last_request_records_history() {
        let backend = MockBackend::new();
        let request = StoryRequest::new("prompt").with_history(vec![
            crate::history::Turn::user("earlier", 0),
            crate::history::Turn::assistant("story", 1),
        ]);
        backend.generate(request).await.unwrap();

        let recorded = backend.last_request().unwrap();
        assert_eq!(recorded.effective_prompt, "prompt");
        assert_eq!(recorded.history.len(), 2);
    }
}
