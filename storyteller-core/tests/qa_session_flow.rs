//! End-to-end session flows against the mock backend.
//!
//! These tests exercise the full interaction cycle - field edits, submit,
//! streaming, clear, export - without any API calls.

use futures::StreamExt;
use storyteller_core::{
    MockBackend, SessionError, StoryBackend, StoryLength, StorySession, SubmitOutcome,
    SubmitRejected, TestHarness, EXAMPLE_PROMPTS, NO_GENRE,
};

#[tokio::test]
async fn submit_appends_entry_and_resets_prompt() {
    let mut harness = TestHarness::new();
    harness.expect_story("Once upon a time...");

    harness.session.set_genre(Some("Fantasy".into()));
    harness.session.set_length(StoryLength::Short);
    let outcome = harness.submit_prompt("A shy dragon").await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Generated { sequence: 1 });
    assert_eq!(harness.session.state().pending_prompt(), "");
    assert_eq!(harness.session.state().len(), 1);

    let entry = harness.session.state().entry(0).unwrap();
    assert_eq!(entry.prompt, "A shy dragon");
    assert_eq!(entry.story, "Once upon a time...");
    assert_eq!(entry.genre.as_deref(), Some("Fantasy"));
    assert_eq!(entry.length, StoryLength::Short);
}

#[tokio::test]
async fn composed_prompt_reaches_backend_verbatim() {
    let mut harness = TestHarness::new();
    harness.expect_story("story");

    harness.session.set_genre(Some("Fantasy".into()));
    harness.session.set_length(StoryLength::Short);
    harness.submit_prompt("A shy dragon").await.unwrap();

    let request = harness.session.backend().last_request().unwrap();
    assert_eq!(
        request.effective_prompt,
        "Tell me a Short-length story in the Fantasy genre about: A shy dragon"
    );
}

#[tokio::test]
async fn empty_prompt_is_rejected_without_side_effects() {
    let mut harness = TestHarness::new();

    let outcome = harness.submit_prompt("").await.unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Rejected(SubmitRejected::EmptyPrompt)
    );

    let outcome = harness.submit_prompt("   ").await.unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Rejected(SubmitRejected::EmptyPrompt)
    );

    assert_eq!(harness.backend_calls(), 0);
    assert!(harness.session.state().is_empty());
}

#[tokio::test]
async fn history_is_newest_first() {
    let mut harness = TestHarness::new();
    harness.expect_story("S1").expect_story("S2");

    harness.submit_prompt("P1").await.unwrap();
    harness.submit_prompt("P2").await.unwrap();

    let state = harness.session.state();
    assert_eq!(state.entry(0).unwrap().prompt, "P2");
    assert_eq!(state.entry(1).unwrap().prompt, "P1");
}

#[tokio::test]
async fn clear_history_resets_everything() {
    let mut harness = TestHarness::new();
    harness
        .expect_story("S1")
        .expect_story("S2")
        .expect_story("S3");

    for prompt in ["P1", "P2", "P3"] {
        harness.submit_prompt(prompt).await.unwrap();
    }
    harness.session.set_prompt("a draft");
    harness.session.set_genre(Some("Horror".into()));
    harness.session.set_length(StoryLength::Long);
    assert_eq!(harness.session.state().len(), 3);

    harness.session.clear_history();

    let state = harness.session.state();
    assert_eq!(state.len(), 0);
    assert_eq!(state.pending_prompt(), "");
    assert_eq!(state.pending_genre(), None);
    assert_eq!(state.pending_length(), StoryLength::Medium);
    assert!(state.turns().is_empty());
}

#[tokio::test]
async fn follow_up_submissions_replay_history() {
    let mut harness = TestHarness::new();
    harness
        .expect_story("Chapter one.")
        .expect_story("Chapter two.");

    harness.submit_prompt("Start a story").await.unwrap();
    harness.submit_prompt("Continue the story").await.unwrap();

    let request = harness.session.backend().last_request().unwrap();
    // The second request carries the first exchange as prior turns
    assert_eq!(request.history.len(), 2);
    assert!(request.history[0].content.contains("Start a story"));
    assert_eq!(request.history[1].content, "Chapter one.");
}

#[tokio::test]
async fn no_genre_sentinel_never_reaches_backend() {
    let mut harness = TestHarness::new();
    harness.expect_story("story");

    harness.session.set_genre(Some(NO_GENRE.into()));
    harness.submit_prompt("A quiet town").await.unwrap();

    let request = harness.session.backend().last_request().unwrap();
    assert!(!request.effective_prompt.contains(NO_GENRE));
}

#[tokio::test]
async fn streaming_concatenation_equals_batch_result() {
    let story = "In the beginning there was a prompt, and the prompt became a story.";

    // Batch path
    let mut batch = TestHarness::new();
    batch.expect_story(story);
    batch.submit_prompt("P").await.unwrap();
    let batch_story = batch.last_story().unwrap().to_string();

    // Streaming path, driven the way a view would drive it
    let backend = MockBackend::new().with_fragment_chars(7);
    backend.queue_story(story);
    let mut session = StorySession::new(backend);
    session.set_prompt("P");

    let submission = session.prepare_submission().unwrap();
    assert!(session.state().is_generating());

    let mut stream = session
        .backend()
        .generate_stream(submission.to_request())
        .await
        .unwrap();
    let mut assembled = String::new();
    while let Some(fragment) = stream.next().await {
        assembled.push_str(&fragment.unwrap());
    }
    drop(stream);
    let sequence = session.complete_submission(submission, assembled);

    assert_eq!(sequence, 1);
    assert!(!session.state().is_generating());
    assert_eq!(session.latest_entry().unwrap().story, batch_story);
}

#[tokio::test]
async fn generation_failure_is_an_error_not_a_story() {
    let mut harness = TestHarness::new();
    harness.session.backend().fail_next("rate limited");

    harness.session.set_prompt("P");
    let result = harness.session.submit().await;

    assert!(matches!(result, Err(SessionError::Engine(_))));
    assert!(harness.session.state().is_empty());
    assert!(!harness.session.state().is_generating());
}

#[tokio::test]
async fn pick_example_fills_prompt_without_generating() {
    let mut harness = TestHarness::new();

    harness.session.pick_example(1).unwrap();

    assert_eq!(
        harness.session.state().pending_prompt(),
        EXAMPLE_PROMPTS[1]
    );
    assert_eq!(harness.backend_calls(), 0);
    assert!(harness.session.state().is_empty());
}

#[tokio::test]
async fn export_writes_named_text_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = TestHarness::new();
    harness.expect_story("S1").expect_story("S2");
    harness.submit_prompt("P1").await.unwrap();
    harness.submit_prompt("P2").await.unwrap();

    let path = harness.session.export_story(1, dir.path()).await.unwrap();

    assert_eq!(path, dir.path().join("story_1.txt"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "S1");

    let missing = harness.session.export_story(99, dir.path()).await;
    assert!(matches!(missing, Err(SessionError::UnknownStory(99))));
}

#[tokio::test]
async fn sequences_survive_head_insertion() {
    let mut harness = TestHarness::new();
    harness.expect_story("S1").expect_story("S2");

    harness.submit_prompt("P1").await.unwrap();
    harness.submit_prompt("P2").await.unwrap();

    // Display order is newest-first, but sequences are by creation
    let state = harness.session.state();
    assert_eq!(state.entry(0).unwrap().sequence, 2);
    assert_eq!(state.entry(1).unwrap().sequence, 1);
    assert_eq!(state.entry_by_sequence(1).unwrap().prompt, "P1");
}
