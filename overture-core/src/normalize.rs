//! Stream normalizer.
//!
//! Converts a provider's raw reply, streaming or single-shot, in either of
//! two incompatible wire shapes, into the uniform fragment stream the host
//! consumes. Chunk decoding is an explicit ordered table of parser variants;
//! the first structurally valid match wins, and a chunk no variant accepts
//! is skipped with a diagnostic fragment instead of ending the stream.

use crate::error::EngineError;
use crate::hooks::ResponseProcessor;
use crate::provider::{FragmentStream, RawChunkStream};
use async_stream::stream;
use futures::StreamExt;
use serde_json::Value;

/// A provider's raw reply before normalization.
pub enum RawReply {
    /// Single-shot response value
    Complete(Value),
    /// Incremental chunk stream
    Stream(RawChunkStream),
}

/// Delta extracted from one raw chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDelta {
    pub content: Option<String>,
    pub done: bool,
}

type DecodeFn = fn(&Value) -> Option<ChunkDelta>;

/// Ordered chunk decoders, tried in sequence.
pub const CHUNK_DECODERS: &[(&str, DecodeFn)] = &[
    ("ollama", decode_ollama_chunk),
    ("openai", decode_openai_chunk),
];

/// Local-provider chunk shape: `{message: {content}, done}`.
fn decode_ollama_chunk(value: &Value) -> Option<ChunkDelta> {
    let content = value.get("message")?.get("content")?.as_str()?.to_string();
    let done = value.get("done").and_then(Value::as_bool).unwrap_or(false);
    Some(ChunkDelta {
        content: Some(content),
        done,
    })
}

/// Remote-provider chunk shape: `{choices: [{delta: {content}, finish_reason}]}`.
fn decode_openai_chunk(value: &Value) -> Option<ChunkDelta> {
    let choice = value.get("choices")?.get(0)?;
    let delta = choice.get("delta")?;
    let content = delta.get("content").and_then(Value::as_str).map(str::to_string);
    let done = choice.get("finish_reason").and_then(Value::as_str) == Some("stop");
    Some(ChunkDelta { content, done })
}

/// Try each decoder in order; `None` means no variant accepted the chunk.
pub fn decode_chunk(value: &Value) -> Option<ChunkDelta> {
    for (name, decode) in CHUNK_DECODERS {
        if let Some(delta) = decode(value) {
            tracing::trace!("chunk decoded as {}", name);
            return Some(delta);
        }
    }
    None
}

/// Extract the message text from a non-streaming reply, shape-tolerantly.
pub fn extract_message_text(value: &Value) -> Option<String> {
    if let Some(text) = value
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
    {
        return Some(text.to_string());
    }
    value
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

/// Normalize a raw reply into the uniform fragment stream.
///
/// Every fragment passes through the processor's per-fragment transform and
/// is yielded as soon as it is produced; the finalization step runs once,
/// when completion is detected (or when the provider stream simply ends).
/// Dropping the returned stream abandons the provider stream with it.
pub fn normalize(reply: RawReply, mut processor: Box<dyn ResponseProcessor>) -> FragmentStream {
    match reply {
        RawReply::Complete(value) => stream! {
            match extract_message_text(&value) {
                Some(text) => {
                    for fragment in processor.process(&text) {
                        yield fragment;
                    }
                }
                None => {
                    tracing::warn!("unrecognized response shape: {}", value);
                    yield "[unrecognized response shape]".to_string();
                }
            }
            for fragment in processor.finish() {
                yield fragment;
            }
        }
        .boxed(),
        RawReply::Stream(mut chunks) => stream! {
            while let Some(item) = chunks.next().await {
                let value = match item {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::warn!("stream transport error: {}", e);
                        yield format!("[stream error: {}]", e);
                        continue;
                    }
                };
                let Some(delta) = decode_chunk(&value) else {
                    tracing::warn!("skipping unrecognized chunk: {}", value);
                    yield "[skipped unrecognized chunk]".to_string();
                    continue;
                };
                if let Some(content) = delta.content {
                    if !content.is_empty() {
                        for fragment in processor.process(&content) {
                            yield fragment;
                        }
                    }
                }
                if delta.done {
                    for fragment in processor.finish() {
                        yield fragment;
                    }
                    return;
                }
            }
            // Provider stream ended without a completion marker; still run
            // finalization so buffered processor state is not lost.
            for fragment in processor.finish() {
                yield fragment;
            }
        }
        .boxed(),
    }
}
