//! Provider trait and stream aliases.

use crate::error::EngineError;
use crate::types::*;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt::Debug;
use std::sync::Arc;

/// Raw provider chunks, kept as JSON values so normalization stays
/// shape-tolerant across incompatible wire formats.
pub type RawChunkStream = BoxStream<'static, Result<serde_json::Value, EngineError>>;

/// Uniform output: a finite, pull-driven sequence of text fragments.
pub type FragmentStream = BoxStream<'static, String>;

/// Backend chat-completion provider.
///
/// Providers are configured per request from the header (endpoint, model,
/// credentials) and expose exactly the `chat`/`stream_chat` contract the
/// dispatcher needs. Replies stay in wire shape; the stream normalizer is
/// responsible for decoding them.
#[async_trait]
pub trait Provider: Send + Sync + Debug + 'static {
    /// Get provider information
    fn info(&self) -> Arc<ProviderInfo>;

    /// Chat completion (non-streaming), returning the provider's raw reply
    async fn chat(&self, req: ChatRequest) -> Result<serde_json::Value, EngineError>;

    /// Stream chat completion, returning raw chunks as they arrive
    async fn stream_chat(&self, req: ChatRequest) -> Result<RawChunkStream, EngineError>;
}

/// Constructs providers for the backends the header can select.
///
/// The pipeline core never names a concrete provider; the facade wires this
/// seam to the real implementations (and wraps them in layers).
pub trait ProviderFactory: Send + Sync {
    /// Local-endpoint backend (`ollama_url` + `model`)
    fn local(&self, base_url: &str, model: &str) -> Result<Arc<dyn Provider>, EngineError>;

    /// Remote backend (`open_ai_api_key` + `model`, optional endpoint override)
    fn remote(
        &self,
        api_key: &str,
        endpoint: Option<&str>,
        model: &str,
    ) -> Result<Arc<dyn Provider>, EngineError>;
}
