//! Logging layer for provider operations.

use async_trait::async_trait;
use overture_core::error::EngineError;
use overture_core::layer::{Layer, LayeredProvider};
use overture_core::provider::{Provider, RawChunkStream};
use overture_core::types::*;
use std::sync::Arc;

/// Logging layer that logs provider operations.
#[derive(Debug, Clone)]
pub struct LoggingLayer {
    prefix: String,
}

impl LoggingLayer {
    /// Create a new logging layer
    pub fn new() -> Self {
        Self {
            prefix: "[overture]".to_string(),
        }
    }

    /// Create a logging layer with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Provider> Layer<P> for LoggingLayer {
    type LayeredProvider = LoggingProvider<P>;

    fn layer(&self, inner: P) -> Self::LayeredProvider {
        LoggingProvider {
            inner,
            prefix: self.prefix.clone(),
        }
    }
}

/// Provider wrapped with logging
#[derive(Debug)]
pub struct LoggingProvider<P> {
    inner: P,
    prefix: String,
}

#[async_trait]
impl<P: Provider> LayeredProvider for LoggingProvider<P> {
    type Inner = P;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_chat(&self, req: ChatRequest) -> Result<serde_json::Value, EngineError> {
        tracing::debug!(
            "{} chat request: provider={}, messages={}",
            self.prefix,
            self.inner.info().id,
            req.messages.len()
        );

        let start = std::time::Instant::now();
        let result = self.inner.chat(req).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(_) => {
                tracing::debug!("{} chat success, elapsed={:?}", self.prefix, elapsed);
            }
            Err(e) => {
                tracing::error!("{} chat error: {:?}, elapsed={:?}", self.prefix, e, elapsed);
            }
        }

        result
    }

    async fn layered_stream_chat(&self, req: ChatRequest) -> Result<RawChunkStream, EngineError> {
        tracing::debug!(
            "{} stream_chat request: provider={}, messages={}",
            self.prefix,
            self.inner.info().id,
            req.messages.len()
        );

        let start = std::time::Instant::now();
        let result = self.inner.stream_chat(req).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(_) => {
                tracing::debug!(
                    "{} stream_chat established, elapsed={:?}",
                    self.prefix,
                    elapsed
                );
            }
            Err(e) => {
                tracing::error!(
                    "{} stream_chat error: {:?}, elapsed={:?}",
                    self.prefix,
                    e,
                    elapsed
                );
            }
        }

        result
    }
}

#[async_trait]
impl<P: Provider> Provider for LoggingProvider<P> {
    fn info(&self) -> Arc<ProviderInfo> {
        LayeredProvider::layered_info(self)
    }

    async fn chat(&self, req: ChatRequest) -> Result<serde_json::Value, EngineError> {
        LayeredProvider::layered_chat(self, req).await
    }

    async fn stream_chat(&self, req: ChatRequest) -> Result<RawChunkStream, EngineError> {
        LayeredProvider::layered_stream_chat(self, req).await
    }
}
