//! Local provider speaking the Ollama chat protocol over reqwest.
//!
//! The streaming endpoint replies with newline-delimited JSON objects; the
//! provider reframes the byte stream into one raw JSON value per line. A
//! malformed line yields an error item but does not end the stream.

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use overture_core::error::EngineError;
use overture_core::provider::{Provider, RawChunkStream};
use overture_core::types::*;
use serde_json::json;
use std::sync::Arc;

/// Local provider against an Ollama-style `/api/chat` endpoint
#[derive(Clone)]
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    info: Arc<ProviderInfo>,
}

impl std::fmt::Debug for OllamaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OllamaProvider {
    /// Create a new provider for the given base URL and model
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client: reqwest::Client::new(),
            base_url,
            model: model.into(),
            info: Arc::new(ProviderInfo {
                id: "ollama".to_string(),
                name: "Ollama".to_string(),
            }),
        }
    }

    /// Reuse an existing HTTP client instead of creating one
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    fn body(&self, req: &ChatRequest, stream: bool) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": req.messages,
            "stream": stream,
        })
    }
}

/// Pop one newline-terminated line off the front of the buffer.
fn take_line(buf: &mut Vec<u8>) -> Option<Vec<u8>> {
    let pos = buf.iter().position(|&b| b == b'\n')?;
    let mut line: Vec<u8> = buf.drain(..=pos).collect();
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Some(line)
}

#[async_trait]
impl Provider for OllamaProvider {
    fn info(&self) -> Arc<ProviderInfo> {
        self.info.clone()
    }

    async fn chat(&self, req: ChatRequest) -> Result<serde_json::Value, EngineError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&self.body(&req, false))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    async fn stream_chat(&self, req: ChatRequest) -> Result<RawChunkStream, EngineError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&self.body(&req, true))
            .send()
            .await?
            .error_for_status()?;

        let mut bytes = response.bytes_stream();
        let chunks = stream! {
            let mut buf: Vec<u8> = Vec::new();
            while let Some(piece) = bytes.next().await {
                let piece = match piece {
                    Ok(piece) => piece,
                    Err(e) => {
                        yield Err(EngineError::from(e));
                        return;
                    }
                };
                buf.extend_from_slice(&piece);
                while let Some(line) = take_line(&mut buf) {
                    if line.is_empty() {
                        continue;
                    }
                    yield serde_json::from_slice(&line).map_err(EngineError::from);
                }
            }
            // Trailing data without a final newline is still one chunk.
            if !buf.iter().all(u8::is_ascii_whitespace) {
                yield serde_json::from_slice(&buf).map_err(EngineError::from);
            }
        };

        Ok(chunks.boxed())
    }
}
