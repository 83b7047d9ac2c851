//! Story generation engine with session history and prompt composition.
//!
//! This crate provides:
//! - A per-session history store for prompts, stories, and conversation turns
//! - Prompt composition from free text plus length/genre modifiers
//! - A story backend seam with batch and streaming Gemini implementations
//! - Plain-text export of generated stories
//!
//! # Quick Start
//!
//! ```ignore
//! use storyteller_core::{Storyteller, StorySession, SubmitOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = StorySession::new(Storyteller::from_env()?);
//!
//!     session.set_prompt("A shy dragon who is afraid of fire");
//!     if let SubmitOutcome::Generated { sequence } = session.submit().await? {
//!         println!("{}", session.latest_entry().unwrap().story);
//!         session.export_story(sequence, ".").await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod controller;
pub mod engine;
pub mod export;
pub mod history;
pub mod prompt;
pub mod session;
pub mod testing;

// Primary public API
pub use controller::{
    SessionError, StorySession, Submission, SubmitOutcome, SubmitRejected,
};
pub use engine::{
    EngineError, StoryBackend, StoryRequest, StoryStream, Storyteller, StorytellerConfig,
};
pub use history::{Role, StoryEntry, Turn};
pub use prompt::{
    compose_prompt, StoryLength, EXAMPLE_PROMPTS, GENRES, NO_GENRE, STORYTELLER_INSTRUCTION,
};
pub use session::SessionState;
pub use testing::{MockBackend, TestHarness};
