//! Built-in pipe hooks.

use async_trait::async_trait;
use futures::StreamExt;
use overture_core::error::EngineError;
use overture_core::hooks::{PipeHook, PipeOutput};
use overture_core::types::{ChatRequest, Message};

/// Pipe that answers every request with a fixed reply.
///
/// Useful for maintenance pages, canned announcements, and wiring tests.
/// The reply may reference `{user_message}` and `{model_id}`, substituted
/// per request.
#[derive(Debug, Clone)]
pub struct StaticPipe {
    reply: String,
    streamed: bool,
}

impl StaticPipe {
    /// Reply as one complete response
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            streamed: false,
        }
    }

    /// Reply as a word-by-word fragment stream
    pub fn streamed(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            streamed: true,
        }
    }

    fn render(&self, user_message: &str, model_id: &str) -> String {
        self.reply
            .replace("{user_message}", user_message)
            .replace("{model_id}", model_id)
    }
}

#[async_trait]
impl PipeHook for StaticPipe {
    async fn run(
        &self,
        user_message: &str,
        model_id: &str,
        _history: &[Message],
        _request: ChatRequest,
    ) -> Result<PipeOutput, EngineError> {
        let reply = self.render(user_message, model_id);

        if !self.streamed {
            return Ok(PipeOutput::Complete(reply));
        }

        let words: Vec<String> = reply
            .split_inclusive(' ')
            .map(str::to_string)
            .collect();
        Ok(PipeOutput::Stream(
            futures::stream::iter(words).boxed(),
        ))
    }
}
