//! # Overture Providers
//!
//! Backend chat-completion providers: a local Ollama-style endpoint over
//! reqwest and an OpenAI-compatible remote endpoint over async-openai.

pub mod ollama;
pub mod openai;

// Re-exports
pub use ollama::OllamaProvider;
pub use openai::{OpenAiBuilder, OpenAiProvider};

use overture_core::error::EngineError;

/// Create a provider for a local LM Studio server (OpenAI-compatible)
///
/// LM Studio speaks the OpenAI API protocol on a local port without
/// authentication. This is a convenience function that creates an OpenAI
/// provider configured for its default endpoint.
///
/// # Example
///
/// ```ignore
/// use overture_provider::lm_studio;
///
/// let provider = lm_studio("qwen2.5-7b-instruct")?;
/// ```
pub fn lm_studio(model: impl Into<String>) -> Result<OpenAiProvider, EngineError> {
    OpenAiProvider::builder()
        .api_key("lm-studio")
        .api_base("http://localhost:1234/v1")
        .model(model)
        .build_with_id("lm-studio", "LM Studio")
}
