//! OpenAI-compatible remote provider using the async-openai crate.
//!
//! This provider implements the simplified Provider trait, only exposing
//! chat() and stream_chat(). Replies are passed back as raw JSON values;
//! shape interpretation is the normalizer's job, not the provider's.

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use futures::StreamExt;
use overture_core::error::EngineError;
use overture_core::provider::{Provider, RawChunkStream};
use overture_core::types::*;
use std::sync::Arc;

/// Remote provider speaking the OpenAI chat-completions protocol
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
    info: Arc<ProviderInfo>,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("model", &self.model)
            .field("info", &self.info)
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a new provider against the default OpenAI endpoint
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);

        Self {
            client: Client::with_config(config),
            model: model.into(),
            info: Arc::new(ProviderInfo {
                id: "openai".to_string(),
                name: "OpenAI".to_string(),
            }),
        }
    }

    /// Create a builder for more configuration options
    pub fn builder() -> OpenAiBuilder {
        OpenAiBuilder::default()
    }

    /// Convert our Message type to OpenAI's ChatCompletionRequestMessage
    fn convert_message(msg: &Message) -> Result<ChatCompletionRequestMessage, EngineError> {
        let content = msg.content.clone();

        match msg.role {
            Role::System => {
                let msg = ChatCompletionRequestSystemMessageArgs::default()
                    .content(content)
                    .build()
                    .map_err(|e| {
                        EngineError::provider(format!("Failed to build system message: {}", e))
                    })?;
                Ok(ChatCompletionRequestMessage::System(msg))
            }
            Role::User => {
                let msg = ChatCompletionRequestUserMessageArgs::default()
                    .content(content)
                    .build()
                    .map_err(|e| {
                        EngineError::provider(format!("Failed to build user message: {}", e))
                    })?;
                Ok(ChatCompletionRequestMessage::User(msg))
            }
            Role::Assistant => {
                let msg = ChatCompletionRequestAssistantMessageArgs::default()
                    .content(content)
                    .build()
                    .map_err(|e| {
                        EngineError::provider(format!("Failed to build assistant message: {}", e))
                    })?;
                Ok(ChatCompletionRequestMessage::Assistant(msg))
            }
        }
    }

    /// Build CreateChatCompletionRequest from our ChatRequest
    fn build_request(&self, req: &ChatRequest) -> Result<CreateChatCompletionRequest, EngineError> {
        let messages: Result<Vec<_>, _> = req.messages.iter().map(Self::convert_message).collect();

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages?)
            .stream(req.stream)
            .build()
            .map_err(|e| EngineError::provider(format!("Failed to build request: {}", e)))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn info(&self) -> Arc<ProviderInfo> {
        self.info.clone()
    }

    async fn chat(&self, req: ChatRequest) -> Result<serde_json::Value, EngineError> {
        let openai_req = self.build_request(&req)?;

        let response = self
            .client
            .chat()
            .create(openai_req)
            .await
            .map_err(|e| EngineError::provider(format!("OpenAI API error: {}", e)))?;

        Ok(serde_json::to_value(response)?)
    }

    async fn stream_chat(&self, req: ChatRequest) -> Result<RawChunkStream, EngineError> {
        let mut openai_req = self.build_request(&req)?;
        openai_req.stream = Some(true);

        let stream = self
            .client
            .chat()
            .create_stream(openai_req)
            .await
            .map_err(|e| EngineError::provider(format!("OpenAI API error: {}", e)))?;

        // Re-serialize each chunk so downstream sees the wire shape, not
        // async-openai's typed view of it.
        let chunks = stream.map(|result| match result {
            Ok(response) => serde_json::to_value(response).map_err(EngineError::from),
            Err(e) => Err(EngineError::provider(format!("Stream error: {}", e))),
        });

        Ok(chunks.boxed())
    }
}

/// Builder for the remote provider with custom configuration
#[derive(Default)]
pub struct OpenAiBuilder {
    api_key: Option<String>,
    api_base: Option<String>,
    model: Option<String>,
}

impl OpenAiBuilder {
    /// Set API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set API base URL (for OpenAI-compatible endpoints)
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set the model identifier sent with each request
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Build the provider
    pub fn build(self) -> Result<OpenAiProvider, EngineError> {
        self.build_with_id("openai", "OpenAI")
    }

    /// Build a provider with a custom provider ID and name
    ///
    /// Useful for OpenAI-compatible services that use the same protocol
    /// but a different endpoint.
    pub fn build_with_id(
        self,
        provider_id: impl Into<String>,
        provider_name: impl Into<String>,
    ) -> Result<OpenAiProvider, EngineError> {
        let api_key = self
            .api_key
            .ok_or_else(|| EngineError::config_parse("API key is required"))?;
        let model = self
            .model
            .ok_or_else(|| EngineError::config_parse("model is required"))?;

        let mut config = OpenAIConfig::new().with_api_key(api_key);

        if let Some(api_base) = self.api_base {
            config = config.with_api_base(api_base);
        }

        Ok(OpenAiProvider {
            client: Client::with_config(config),
            model,
            info: Arc::new(ProviderInfo {
                id: provider_id.into(),
                name: provider_name.into(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_message_maps_all_roles() {
        let system = OpenAiProvider::convert_message(&Message::system("rules")).unwrap();
        assert!(matches!(system, ChatCompletionRequestMessage::System(_)));

        let user = OpenAiProvider::convert_message(&Message::user("hi")).unwrap();
        assert!(matches!(user, ChatCompletionRequestMessage::User(_)));

        let assistant = OpenAiProvider::convert_message(&Message::assistant("sure")).unwrap();
        assert!(matches!(
            assistant,
            ChatCompletionRequestMessage::Assistant(_)
        ));
    }

    #[test]
    fn build_request_carries_model_and_stream_flag() {
        let provider = OpenAiProvider::new("sk-test", "gpt-4o");
        let req = ChatRequest {
            messages: vec![Message::user("hello")],
            stream: true,
        };
        let built = provider.build_request(&req).unwrap();
        assert_eq!(built.model, "gpt-4o");
        assert_eq!(built.stream, Some(true));
        assert_eq!(built.messages.len(), 1);
    }

    #[test]
    fn builder_requires_key_and_model() {
        assert!(OpenAiProvider::builder().model("m").build().is_err());
        assert!(OpenAiProvider::builder().api_key("k").build().is_err());
        assert!(OpenAiProvider::builder()
            .api_key("k")
            .model("m")
            .build()
            .is_ok());
    }
}
