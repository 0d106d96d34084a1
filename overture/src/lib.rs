//! # Overture
//!
//! Request-time prompt assembly and response normalization for chat
//! backends.
//!
//! A chat request arrives carrying an embedded, possibly templated, system
//! prompt. Overture splits it into a YAML front-matter header and a template
//! body, materializes declared resources into a per-request work area,
//! renders the template, shapes the outgoing request, dispatches to a local
//! or remote backend (or a registered `pipe` hook), and normalizes the reply
//! into one uniform fragment stream regardless of the backend's wire shape.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! overture = { version = "0.1", features = ["providers", "layers"] }
//! ```
//!
//! ```ignore
//! use overture::{DefaultProviderFactory, IncomingChat, Message, Pipeline};
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let pipeline = Pipeline::builder(Arc::new(DefaultProviderFactory::new())).finish();
//!
//! let prompt = "---\nollama_url: http://localhost:11434\nmodel: llama3.1\n---\nBe terse.";
//! let chat = IncomingChat {
//!     user_message: "What is Rust?".to_string(),
//!     model_id: "assistant".to_string(),
//!     history: vec![],
//!     request: overture::ChatRequest::new(
//!         vec![Message::system(prompt), Message::user("What is Rust?")],
//!         true,
//!     ),
//! };
//!
//! let mut fragments = pipeline.run(chat).await;
//! while let Some(fragment) = fragments.next().await {
//!     print!("{}", fragment);
//! }
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: providers, layers, and built-in hooks
//! - `providers`: Ollama and OpenAI-compatible backend providers
//! - `layers`: logging and retry layers
//! - `hooks`: built-in inlet/outlet/pipe hooks
//! - `full`: all features enabled

// Re-export core types and traits
pub use overture_core::*;

// Re-export providers under `provider` module
#[cfg(feature = "overture-provider")]
pub mod provider {
    //! Backend provider implementations.
    pub use overture_provider::*;
}

// Re-export layers under `layer` module
#[cfg(feature = "overture-layer")]
pub mod layer {
    //! Built-in middleware layers.
    pub use overture_layer::*;
}

// Re-export built-in hooks under `hook` module
#[cfg(feature = "overture-hook")]
pub mod hook {
    //! Built-in hook implementations.
    pub use overture_hook::*;
}

#[cfg(all(feature = "overture-provider", feature = "overture-layer"))]
mod factory;

#[cfg(all(feature = "overture-provider", feature = "overture-layer"))]
pub use factory::DefaultProviderFactory;

/// Prelude module for convenient imports
pub mod prelude {
    //! Prelude module containing the most commonly used types and traits.
    //!
    //! ```
    //! use overture::prelude::*;
    //! ```

    pub use crate::{
        ChatRequest, EngineError, FragmentStream, Header, HookRegistry, HookSet, IncomingChat,
        InletHook, Layer, Message, OutletHook, Pipeline, PipelineBuilder, PipeHook, PipeOutput,
        Provider, ProviderFactory, ResponseProcessor, Result, Role,
    };

    #[cfg(feature = "overture-provider")]
    pub use crate::provider::*;

    #[cfg(feature = "overture-layer")]
    pub use crate::layer::*;

    #[cfg(feature = "overture-hook")]
    pub use crate::hook::*;

    #[cfg(all(feature = "overture-provider", feature = "overture-layer"))]
    pub use crate::DefaultProviderFactory;
}
