//! Story generation backends.
//!
//! The [`StoryBackend`] trait is the seam between the interaction controller
//! and whatever produces story text. [`Storyteller`] is the Gemini-backed
//! implementation; `testing::MockBackend` is the deterministic one.
//!
//! Failures are values: a backend returns `Err(EngineError)` rather than an
//! error message dressed up as story content, so callers can always tell a
//! story apart from a failure.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tracing::debug;

use crate::history::{Role, Turn};
use crate::prompt::STORYTELLER_INSTRUCTION;

/// Errors from a story backend.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Gemini API error: {0}")]
    Api(#[from] gemini::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("The model returned an empty response")]
    EmptyResponse,

    #[error("No API key configured - set GEMINI_API_KEY environment variable")]
    NoApiKey,
}

/// A finite, non-restartable sequence of text fragments. Concatenating every
/// fragment in arrival order reproduces the batch-mode result.
pub type StoryStream = Pin<Box<dyn Stream<Item = Result<String, EngineError>> + Send>>;

/// One generation request: the composed prompt plus the prior turns replayed
/// as conversation context.
#[derive(Debug, Clone)]
pub struct StoryRequest {
    pub effective_prompt: String,
    pub history: Vec<Turn>,
}

impl StoryRequest {
    pub fn new(effective_prompt: impl Into<String>) -> Self {
        Self {
            effective_prompt: effective_prompt.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }
}

/// Produces story text for composed prompts.
#[async_trait]
pub trait StoryBackend: Send + Sync {
    /// Generate the full story, blocking until it is complete.
    async fn generate(&self, request: StoryRequest) -> Result<String, EngineError>;

    /// Generate the story as a stream of text fragments. The caller must
    /// consume the stream to completion to obtain the final text.
    async fn generate_stream(&self, request: StoryRequest) -> Result<StoryStream, EngineError>;
}

/// Configuration for the Gemini-backed storyteller.
#[derive(Debug, Clone)]
pub struct StorytellerConfig {
    /// The model to use (defaults to the client's default).
    pub model: Option<String>,

    /// Maximum tokens for generated stories.
    pub max_output_tokens: usize,

    /// Temperature for generation.
    pub temperature: Option<f32>,

    /// System instruction override.
    pub custom_system_prompt: Option<String>,
}

impl Default for StorytellerConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_output_tokens: 4096,
            temperature: Some(0.9),
            custom_system_prompt: None,
        }
    }
}

impl StorytellerConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: usize) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.custom_system_prompt = Some(prompt.into());
        self
    }
}

/// The Gemini-backed storyteller.
pub struct Storyteller {
    client: gemini::Gemini,
    config: StorytellerConfig,
}

impl Storyteller {
    /// Create a storyteller with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: gemini::Gemini::new(api_key),
            config: StorytellerConfig::default(),
        }
    }

    /// Create a storyteller from the GEMINI_API_KEY environment variable.
    pub fn from_env() -> Result<Self, EngineError> {
        let client = gemini::Gemini::from_env().map_err(|_| EngineError::NoApiKey)?;
        Ok(Self {
            client,
            config: StorytellerConfig::default(),
        })
    }

    /// Configure the storyteller.
    pub fn with_config(mut self, config: StorytellerConfig) -> Self {
        self.config = config;
        self
    }

    fn system_prompt(&self) -> &str {
        self.config
            .custom_system_prompt
            .as_deref()
            .unwrap_or(STORYTELLER_INSTRUCTION)
    }

    fn build_request(&self, request: &StoryRequest) -> gemini::Request {
        let mut contents: Vec<gemini::Content> = request
            .history
            .iter()
            .map(|turn| match turn.role {
                Role::User => gemini::Content::user(&turn.content),
                Role::Assistant => gemini::Content::model(&turn.content),
            })
            .collect();
        contents.push(gemini::Content::user(&request.effective_prompt));

        let mut api_request = gemini::Request::new(contents)
            .with_system(self.system_prompt())
            .with_max_output_tokens(self.config.max_output_tokens);

        if let Some(ref model) = self.config.model {
            api_request = api_request.with_model(model);
        }
        if let Some(temperature) = self.config.temperature {
            api_request = api_request.with_temperature(temperature);
        }

        api_request
    }
}

#[async_trait]
impl StoryBackend for Storyteller {
    async fn generate(&self, request: StoryRequest) -> Result<String, EngineError> {
        debug!(
            prompt_len = request.effective_prompt.len(),
            history_turns = request.history.len(),
            "requesting story"
        );

        let response = self.client.complete(self.build_request(&request)).await?;
        let story = response.text();
        if story.is_empty() {
            return Err(EngineError::EmptyResponse);
        }

        debug!(story_len = story.len(), "story received");
        Ok(story)
    }

    async fn generate_stream(&self, request: StoryRequest) -> Result<StoryStream, EngineError> {
        debug!(
            prompt_len = request.effective_prompt.len(),
            history_turns = request.history.len(),
            "requesting story stream"
        );

        let events = self.client.stream(self.build_request(&request)).await?;

        let fragments = events.filter_map(|event| {
            futures::future::ready(match event {
                Ok(gemini::StreamEvent::TextDelta { text }) => Some(Ok(text)),
                Ok(gemini::StreamEvent::Finished { .. }) => None,
                Ok(gemini::StreamEvent::Error { message }) => {
                    Some(Err(EngineError::Stream(message)))
                }
                Err(e) => Some(Err(EngineError::Api(e))),
            })
        });

        Ok(Box::pin(fragments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = StorytellerConfig::default()
            .with_model("gemini-2.0-flash")
            .with_max_output_tokens(2048)
            .with_temperature(0.5);

        assert_eq!(config.model.as_deref(), Some("gemini-2.0-flash"));
        assert_eq!(config.max_output_tokens, 2048);
        assert_eq!(config.temperature, Some(0.5));
    }

    #[test]
    fn test_default_system_prompt() {
        let storyteller = Storyteller::new("test-key");
        assert!(storyteller.system_prompt().contains("master storyteller"));

        let custom = Storyteller::new("test-key")
            .with_config(StorytellerConfig::default().with_system_prompt("Be terse."));
        assert_eq!(custom.system_prompt(), "Be terse.");
    }

    #[test]
    fn test_build_request_replays_history() {
        let storyteller = Storyteller::new("test-key");
        let request = StoryRequest::new("Tell me more")
            .with_history(vec![
                Turn::user("Tell me a story", 0),
                Turn::assistant("Once upon a time.", 1),
            ]);

        let api_request = storyteller.build_request(&request);
        assert_eq!(api_request.contents.len(), 3);
        assert_eq!(api_request.contents[0].role, gemini::Role::User);
        assert_eq!(api_request.contents[1].role, gemini::Role::Model);
        assert_eq!(api_request.contents[2].text(), "Tell me more");
        assert!(api_request.system.is_some());
    }
}
