//! # Overture Core
//!
//! Core abstractions and pipeline for Overture, a request-time
//! prompt-assembly and response-normalization engine.
//!
//! An incoming chat request carries an embedded, possibly templated, system
//! prompt. The pipeline splits it into a YAML front-matter header and a
//! template body, materializes declared resources into a per-request work
//! area, renders the template into the final prompt plus an optional hook
//! override set, shapes the outgoing request, dispatches to exactly one
//! backend provider (or a `pipe` hook), and normalizes the provider's
//! streaming or single-shot reply into one uniform fragment stream.

pub mod dispatch;
pub mod error;
pub mod header;
pub mod hooks;
pub mod layer;
pub mod materialize;
pub mod normalize;
pub mod pipeline;
pub mod provider;
pub mod template;
pub mod types;
pub mod workarea;

// Re-exports
pub use dispatch::{select_backend, Backend, DEFAULT_REMOTE_ENDPOINT};
pub use error::EngineError;
pub use header::{split_system_prompt, SplitPrompt};
pub use hooks::{
    HookRegistry, HookSet, InletHook, OutletHook, Passthrough, PipeHook, PipeOutput,
    ResponseProcessor,
};
pub use layer::{Layer, LayeredProvider};
pub use materialize::materialize_files;
pub use normalize::{decode_chunk, normalize, ChunkDelta, RawReply};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use provider::{FragmentStream, Provider, ProviderFactory, RawChunkStream};
pub use template::{render, Rendered};
pub use types::*;
pub use workarea::WorkArea;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, EngineError>;
