//! Pipeline executor.
//!
//! Runs one request start-to-end: split the embedded prompt, check declared
//! requirements, materialize resources, render the template, shape the
//! request, dispatch to a backend (or a `pipe` hook), and normalize the
//! reply. `run` never returns an error: every failure path ends in a stream
//! carrying at least one diagnostic fragment.

use crate::dispatch::{select_backend, Backend};
use crate::error::EngineError;
use crate::header::{split_system_prompt, SplitPrompt};
use crate::hooks::{HookRegistry, HookSet, PipeOutput};
use crate::materialize::materialize_files;
use crate::normalize::{normalize, RawReply};
use crate::provider::{FragmentStream, Provider, ProviderFactory};
use crate::template::{render, Rendered};
use crate::types::{ChatRequest, IncomingChat, Message, Role};
use crate::workarea::WorkArea;
use async_stream::stream;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;

/// Builder for a [`Pipeline`].
pub struct PipelineBuilder {
    factory: Arc<dyn ProviderFactory>,
    registry: HookRegistry,
    work_root: Option<PathBuf>,
    client: reqwest::Client,
}

impl PipelineBuilder {
    /// Create a builder around a provider factory
    pub fn new(factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            factory,
            registry: HookRegistry::new(),
            work_root: None,
            client: reqwest::Client::new(),
        }
    }

    /// Set the hook registry resolved at startup
    pub fn hooks(mut self, registry: HookRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Override the parent directory for per-request work areas
    pub fn work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }

    /// Use a pre-configured HTTP client for resource fetches
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Finish building
    pub fn finish(self) -> Pipeline {
        Pipeline {
            factory: self.factory,
            registry: self.registry,
            work_root: self.work_root,
            client: self.client,
        }
    }
}

/// The request-time prompt-assembly and response-normalization engine.
pub struct Pipeline {
    factory: Arc<dyn ProviderFactory>,
    registry: HookRegistry,
    work_root: Option<PathBuf>,
    client: reqwest::Client,
}

impl Pipeline {
    /// Create a new builder
    pub fn builder(factory: Arc<dyn ProviderFactory>) -> PipelineBuilder {
        PipelineBuilder::new(factory)
    }

    /// Process one request into the uniform output stream.
    ///
    /// Short-circuit failures (malformed header, unsatisfied requirement,
    /// directory creation, inlet rejection) collapse into a single
    /// diagnostic fragment; everything else degrades inline.
    pub async fn run(&self, chat: IncomingChat) -> FragmentStream {
        match self.execute(chat).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("request aborted: {}", e);
                futures::stream::once(async move { e.to_string() }).boxed()
            }
        }
    }

    async fn execute(&self, chat: IncomingChat) -> Result<FragmentStream, EngineError> {
        let area = match &self.work_root {
            Some(root) => WorkArea::new_in(root)?,
            None => WorkArea::new()?,
        };

        let SplitPrompt { mut header, body } = split_system_prompt(&chat.request, &area)?;

        for requirement in &header.requirements {
            if !self.registry.satisfies(requirement) {
                return Err(EngineError::capability(requirement.clone()));
            }
        }

        materialize_files(&mut header.files, area.path(), &self.client).await?;

        let Rendered { prompt, hooks } = match render(&body, &header, area.path(), &self.registry)
        {
            Ok(rendered) => rendered,
            Err(e) => {
                // The conversation still receives content: a readable
                // diagnostic prompt with no hooks.
                tracing::warn!("template render failed: {}", e);
                Rendered {
                    prompt: format!("Template rendering failed: {}", e),
                    hooks: HookSet::default(),
                }
            }
        };

        let request = match &hooks.inlet {
            Some(inlet) => inlet
                .shape(chat.request.clone(), &prompt)
                .await
                .map_err(|e| EngineError::hook("inlet", e.to_string()))?,
            None => default_shape(chat.request.clone(), &prompt),
        };

        if let Some(pipe) = hooks.pipe.clone() {
            tracing::debug!("delegating request to pipe hook");
            let output = pipe
                .run(&chat.user_message, &chat.model_id, &chat.history, request)
                .await
                .map_err(|e| EngineError::hook("pipe", e.to_string()))?;
            let stream = match output {
                PipeOutput::Complete(text) => futures::stream::once(async move { text }).boxed(),
                PipeOutput::Stream(stream) => stream,
            };
            return Ok(hold_area(stream, area));
        }

        let stream = match select_backend(&header) {
            Backend::Local { base_url, model } => {
                let provider = self.factory.local(base_url, model)?;
                let reply = call_provider(provider, request).await?;
                normalize(reply, hooks.processor())
            }
            Backend::Remote {
                api_key,
                endpoint,
                model,
            } => {
                let provider = self.factory.remote(api_key, endpoint, model)?;
                let reply = call_provider(provider, request).await?;
                normalize(reply, hooks.processor())
            }
            Backend::Echo => {
                tracing::debug!("no backend selected; echoing rendered prompt");
                futures::stream::once(async move { prompt }).boxed()
            }
        };

        Ok(hold_area(stream, area))
    }
}

async fn call_provider(
    provider: Arc<dyn Provider>,
    request: ChatRequest,
) -> Result<RawReply, EngineError> {
    tracing::debug!(
        "dispatching to {}: messages={}, stream={}",
        provider.info().id,
        request.messages.len(),
        request.stream
    );
    if request.stream {
        Ok(RawReply::Stream(provider.stream_chat(request).await?))
    } else {
        Ok(RawReply::Complete(provider.chat(request).await?))
    }
}

/// Default shaping policy: drop every system message, then prepend the
/// rendered prompt as the single system message.
fn default_shape(mut request: ChatRequest, prompt: &str) -> ChatRequest {
    request.messages.retain(|m| m.role != Role::System);
    request.messages.insert(0, Message::system(prompt));
    request
}

/// Keep the work area alive until the host finishes consuming the stream,
/// then let Drop remove it.
fn hold_area(inner: FragmentStream, area: WorkArea) -> FragmentStream {
    stream! {
        let _area = area;
        let mut inner = inner;
        while let Some(fragment) = inner.next().await {
            yield fragment;
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{InletHook, PipeHook, ResponseProcessor};
    use crate::types::ProviderInfo;
    use async_trait::async_trait;
    use serde_json::json;

    #[derive(Debug)]
    struct StubProvider {
        reply: serde_json::Value,
        chunks: Vec<serde_json::Value>,
    }

    #[async_trait]
    impl Provider for StubProvider {
        fn info(&self) -> Arc<ProviderInfo> {
            Arc::new(ProviderInfo {
                id: "stub".to_string(),
                name: "Stub".to_string(),
            })
        }

        async fn chat(&self, _req: ChatRequest) -> Result<serde_json::Value, EngineError> {
            Ok(self.reply.clone())
        }

        async fn stream_chat(
            &self,
            _req: ChatRequest,
        ) -> Result<crate::provider::RawChunkStream, EngineError> {
            Ok(futures::stream::iter(self.chunks.clone().into_iter().map(Ok)).boxed())
        }
    }

    struct StubFactory {
        provider: Arc<dyn Provider>,
    }

    impl ProviderFactory for StubFactory {
        fn local(&self, _base_url: &str, _model: &str) -> Result<Arc<dyn Provider>, EngineError> {
            Ok(self.provider.clone())
        }

        fn remote(
            &self,
            _api_key: &str,
            _endpoint: Option<&str>,
            _model: &str,
        ) -> Result<Arc<dyn Provider>, EngineError> {
            Ok(self.provider.clone())
        }
    }

    struct NoFactory;

    impl ProviderFactory for NoFactory {
        fn local(&self, _base_url: &str, _model: &str) -> Result<Arc<dyn Provider>, EngineError> {
            Err(EngineError::dispatch("no providers in this test"))
        }

        fn remote(
            &self,
            _api_key: &str,
            _endpoint: Option<&str>,
            _model: &str,
        ) -> Result<Arc<dyn Provider>, EngineError> {
            Err(EngineError::dispatch("no providers in this test"))
        }
    }

    fn incoming(system_payload: Option<&str>, stream: bool) -> IncomingChat {
        let mut messages = Vec::new();
        if let Some(payload) = system_payload {
            messages.push(Message::system(payload));
        }
        messages.push(Message::user("hello"));
        IncomingChat {
            user_message: "hello".to_string(),
            model_id: "host-model".to_string(),
            history: messages.clone(),
            request: ChatRequest::new(messages, stream),
        }
    }

    fn pipeline(registry: HookRegistry) -> Pipeline {
        Pipeline::builder(Arc::new(NoFactory)).hooks(registry).finish()
    }

    async fn collect(stream: FragmentStream) -> Vec<String> {
        stream.collect().await
    }

    #[test]
    fn default_shape_leaves_exactly_one_system_message() {
        let request = ChatRequest::new(
            vec![
                Message::system("old prompt"),
                Message::user("hi"),
                Message::system("another old prompt"),
            ],
            false,
        );
        let shaped = default_shape(request, "rendered");
        let systems: Vec<_> = shaped
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .collect();
        assert_eq!(systems.len(), 1);
        assert_eq!(shaped.messages[0], Message::system("rendered"));
    }

    #[tokio::test]
    async fn no_backend_echoes_the_rendered_prompt() {
        let p = pipeline(HookRegistry::new());
        let chat = incoming(Some("---\ntone: dry\n---\nBe {tone}."), false);
        let out = collect(p.run(chat).await).await;
        assert_eq!(out, vec!["Be dry."]);
    }

    #[tokio::test]
    async fn malformed_header_yields_one_diagnostic_fragment() {
        let p = pipeline(HookRegistry::new());
        let chat = incoming(Some("---\nmodel: [broken\n---\nbody"), false);
        let out = collect(p.run(chat).await).await;
        assert_eq!(out.len(), 1);
        assert!(out[0].contains("Config parse error"));
    }

    #[tokio::test]
    async fn unsatisfied_requirement_fails_cleanly() {
        let p = pipeline(HookRegistry::new());
        let chat = incoming(Some("---\nrequirements: [weather]\n---\nbody"), false);
        let out = collect(p.run(chat).await).await;
        assert_eq!(out.len(), 1);
        assert!(out[0].contains("weather"));
    }

    #[tokio::test]
    async fn parent_directory_failure_yields_one_diagnostic_fragment() {
        let p = pipeline(HookRegistry::new());
        // "f.txt" is written first, then "f.txt/sub.txt" needs it as a
        // directory; that creation failure is fatal for the whole request.
        let chat = incoming(
            Some(
                "---\nfiles:\n  f.txt:\n    url: data:application/octet-stream,eA==\n  f.txt/sub.txt:\n    url: data:application/octet-stream,eA==\n---\nbody",
            ),
            false,
        );
        let out = collect(p.run(chat).await).await;
        assert_eq!(out.len(), 1);
        assert!(out[0].contains("Resource error"));
    }

    #[tokio::test]
    async fn satisfied_requirement_proceeds() {
        let mut registry = HookRegistry::new();
        registry.provide("weather");
        let p = pipeline(registry);
        let chat = incoming(Some("---\nrequirements: [weather]\n---\nok"), false);
        let out = collect(p.run(chat).await).await;
        assert_eq!(out, vec!["ok"]);
    }

    #[tokio::test]
    async fn render_failure_degrades_to_a_diagnostic_prompt() {
        let p = pipeline(HookRegistry::new());
        let chat = incoming(Some("{undefined_variable}"), false);
        let out = collect(p.run(chat).await).await;
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("Template rendering failed"));
    }

    #[derive(Debug)]
    struct RecordingPipe;

    #[async_trait]
    impl PipeHook for RecordingPipe {
        async fn run(
            &self,
            user_message: &str,
            model_id: &str,
            _history: &[Message],
            request: ChatRequest,
        ) -> Result<PipeOutput, EngineError> {
            let system = request.system_content().unwrap_or_default().to_string();
            Ok(PipeOutput::Complete(format!(
                "{}|{}|{}",
                user_message, model_id, system
            )))
        }
    }

    #[tokio::test]
    async fn pipe_hook_outranks_a_configured_backend() {
        let mut registry = HookRegistry::new();
        registry.register_pipe("delegate", Arc::new(RecordingPipe));
        // NoFactory would error if a provider were constructed.
        let p = pipeline(registry);
        let chat = incoming(
            Some("---\nollama_url: http://localhost:11434\nmodel: m\n---\n@pipe delegate\nprompt"),
            false,
        );
        let out = collect(p.run(chat).await).await;
        assert_eq!(out, vec!["hello|host-model|prompt"]);
    }

    #[derive(Debug)]
    struct RejectingInlet;

    #[async_trait]
    impl InletHook for RejectingInlet {
        async fn shape(
            &self,
            _request: ChatRequest,
            _prompt: &str,
        ) -> Result<ChatRequest, EngineError> {
            Err(EngineError::other("request rejected by policy"))
        }
    }

    #[tokio::test]
    async fn inlet_rejection_short_circuits() {
        let mut registry = HookRegistry::new();
        registry.register_inlet("gate", Arc::new(RejectingInlet));
        let p = pipeline(registry);
        let chat = incoming(Some("@inlet gate\nprompt"), false);
        let out = collect(p.run(chat).await).await;
        assert_eq!(out.len(), 1);
        assert!(out[0].contains("rejected by policy"));
    }

    #[tokio::test]
    async fn local_backend_reply_is_normalized() {
        let factory = StubFactory {
            provider: Arc::new(StubProvider {
                reply: json!({"message": {"content": "non-streamed"}, "done": true}),
                chunks: Vec::new(),
            }),
        };
        let p = Pipeline::builder(Arc::new(factory)).finish();
        let chat = incoming(
            Some("---\nollama_url: http://localhost:11434\nmodel: m\n---\nprompt"),
            false,
        );
        let out = collect(p.run(chat).await).await;
        assert_eq!(out, vec!["non-streamed"]);
    }

    #[tokio::test]
    async fn streaming_backend_reply_is_normalized_incrementally() {
        let factory = StubFactory {
            provider: Arc::new(StubProvider {
                reply: json!(null),
                chunks: vec![
                    json!({"message": {"content": "A"}, "done": false}),
                    json!({"message": {"content": "B"}, "done": true}),
                ],
            }),
        };
        let p = Pipeline::builder(Arc::new(factory)).finish();
        let chat = incoming(
            Some("---\nollama_url: http://localhost:11434\nmodel: m\n---\nprompt"),
            true,
        );
        let out = collect(p.run(chat).await).await;
        assert_eq!(out, vec!["A", "B"]);
    }

    struct UpperOutlet;

    struct UpperProcessor;

    impl ResponseProcessor for UpperProcessor {
        fn process(&mut self, fragment: &str) -> Vec<String> {
            vec![fragment.to_uppercase()]
        }

        fn finish(&mut self) -> Vec<String> {
            vec!["!".to_string()]
        }
    }

    impl crate::hooks::OutletHook for UpperOutlet {
        fn processor(&self) -> Box<dyn ResponseProcessor> {
            Box::new(UpperProcessor)
        }
    }

    #[tokio::test]
    async fn outlet_hook_transforms_backend_fragments() {
        let factory = StubFactory {
            provider: Arc::new(StubProvider {
                reply: json!(null),
                chunks: vec![
                    json!({"message": {"content": "ab"}, "done": false}),
                    json!({"message": {"content": "cd"}, "done": true}),
                ],
            }),
        };
        let mut registry = HookRegistry::new();
        registry.register_outlet("shout", Arc::new(UpperOutlet));
        let p = Pipeline::builder(Arc::new(factory)).hooks(registry).finish();
        let chat = incoming(
            Some("---\nollama_url: http://localhost:11434\nmodel: m\n---\n@outlet shout\nprompt"),
            true,
        );
        let out = collect(p.run(chat).await).await;
        assert_eq!(out, vec!["AB", "CD", "!"]);
    }
}
