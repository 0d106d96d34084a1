//! Layer trait and abstractions.
//!
//! Layers provide a composable way to wrap providers with cross-cutting
//! concerns like logging and retry without touching dispatch logic.

use crate::error::EngineError;
use crate::provider::{Provider, RawChunkStream};
use crate::types::*;
use async_trait::async_trait;
use std::sync::Arc;

/// Layer trait for wrapping providers.
///
/// Each layer wraps an inner provider and returns a new provider with
/// enhanced capabilities, using static dispatch at composition time.
pub trait Layer<P: Provider> {
    /// The type of the layered provider
    type LayeredProvider: Provider;

    /// Wrap the inner provider with this layer
    fn layer(&self, inner: P) -> Self::LayeredProvider;
}

/// Helper trait for layered providers.
///
/// Provides default forwarding implementations so layers only override the
/// methods they want to intercept.
#[async_trait]
pub trait LayeredProvider: Sized + Provider {
    /// The inner provider type
    type Inner: Provider;

    /// Get a reference to the inner provider
    fn inner(&self) -> &Self::Inner;

    /// Default implementation for info - forwards to inner
    fn layered_info(&self) -> Arc<ProviderInfo> {
        self.inner().info()
    }

    /// Default implementation for chat - forwards to inner
    async fn layered_chat(&self, req: ChatRequest) -> Result<serde_json::Value, EngineError> {
        self.inner().chat(req).await
    }

    /// Default implementation for stream_chat - forwards to inner
    async fn layered_stream_chat(&self, req: ChatRequest) -> Result<RawChunkStream, EngineError> {
        self.inner().stream_chat(req).await
    }
}

