//! Capability-provider contracts for embedding and generation backends.
//!
//! Both providers are consumed as opaque, concurrency-safe shared resources
//! behind object-safe traits, so pipelines can be wired against HTTP
//! adapters in production and deterministic mocks in tests.

pub mod embedding;
pub mod generation;

pub use embedding::AzureEmbeddingClient;
pub use generation::AzureGenerationClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Text-to-vector capability provider
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text. Blank input maps to a zero vector of the
    /// provider's dimension rather than failing.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed multiple texts, preserving input order. Blank entries map to
    /// zero vectors.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Fixed embedding dimension D
    fn dimension(&self) -> usize;
}

/// One prior message of conversation context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// A single completion request
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_message: Option<String>,
    /// Sampling temperature in [0, 1]
    pub temperature: f32,
    pub max_tokens: u32,
    /// Prior conversation context, oldest first
    pub context: Vec<ChatMessage>,
}

impl GenerationRequest {
    /// Request with pipeline defaults and no system message
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_message: None,
            temperature: 0.7,
            max_tokens: 4096,
            context: Vec::new(),
        }
    }

    pub fn with_system_message(mut self, system_message: impl Into<String>) -> Self {
        self.system_message = Some(system_message.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Prompt-to-text capability provider
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion. Transport and quota failures surface as
    /// `RagError::Provider` and are not retried here.
    async fn generate(&self, request: GenerationRequest) -> Result<String>;

    /// Model identifier reported to callers
    fn model(&self) -> &str;
}
