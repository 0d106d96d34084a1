//! Default provider wiring.
//!
//! The pipeline core only knows the [`ProviderFactory`] seam; this module
//! supplies the stock wiring: Ollama for the local backend, async-openai for
//! the remote backend, each wrapped in logging and optional retry.

use overture_core::error::EngineError;
use overture_core::layer::Layer;
use overture_core::provider::{Provider, ProviderFactory};
use overture_layer::{LoggingLayer, RetryLayer};
use overture_provider::{OllamaProvider, OpenAiProvider};
use std::sync::Arc;

/// Factory producing layered stock providers.
#[derive(Debug, Clone)]
pub struct DefaultProviderFactory {
    logging: LoggingLayer,
    retry: Option<RetryLayer>,
}

impl DefaultProviderFactory {
    /// Stock wiring: logging plus retry with default backoff
    pub fn new() -> Self {
        Self {
            logging: LoggingLayer::new(),
            retry: Some(RetryLayer::new()),
        }
    }

    /// Disable the retry layer
    pub fn without_retry(mut self) -> Self {
        self.retry = None;
        self
    }

    /// Replace the retry configuration
    pub fn with_retry(mut self, retry: RetryLayer) -> Self {
        self.retry = Some(retry);
        self
    }

    fn stack<P: Provider>(&self, inner: P) -> Arc<dyn Provider> {
        match &self.retry {
            Some(retry) => Arc::new(self.logging.layer(retry.layer(inner))),
            None => Arc::new(self.logging.layer(inner)),
        }
    }
}

impl Default for DefaultProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderFactory for DefaultProviderFactory {
    fn local(&self, base_url: &str, model: &str) -> Result<Arc<dyn Provider>, EngineError> {
        Ok(self.stack(OllamaProvider::new(base_url, model)))
    }

    fn remote(
        &self,
        api_key: &str,
        endpoint: Option<&str>,
        model: &str,
    ) -> Result<Arc<dyn Provider>, EngineError> {
        let mut builder = OpenAiProvider::builder().api_key(api_key).model(model);
        if let Some(endpoint) = endpoint {
            builder = builder.api_base(endpoint);
        }
        Ok(self.stack(builder.build()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_wiring_reports_the_ollama_provider() {
        let factory = DefaultProviderFactory::new();
        let provider = factory.local("http://localhost:11434", "llama3.1").unwrap();
        assert_eq!(provider.info().id, "ollama");
    }

    #[test]
    fn remote_wiring_reports_the_openai_provider() {
        let factory = DefaultProviderFactory::new().without_retry();
        let provider = factory
            .remote("sk-test", Some("https://proxy.example/v1"), "gpt-4o")
            .unwrap();
        assert_eq!(provider.info().id, "openai");
    }

    #[test]
    fn remote_wiring_accepts_any_nonmissing_key() {
        // Key presence is the header's concern; the factory passes it through.
        let factory = DefaultProviderFactory::new();
        assert!(factory.remote("", None, "gpt-4o").is_ok());
    }
}
