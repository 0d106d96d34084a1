//! # Overture Layers
//!
//! Built-in layers for Overture providers.
//!
//! Currently implemented layers:
//! - `LoggingLayer`: Logs provider operations with timing information
//! - `RetryLayer`: Automatic retry with exponential backoff for retryable errors
//!
//! ## Usage
//!
//! ```ignore
//! use overture_core::Layer;
//! use overture_layer::{LoggingLayer, RetryLayer};
//! use overture_provider::OllamaProvider;
//!
//! let inner = OllamaProvider::new("http://localhost:11434", "llama3.1");
//! let provider = LoggingLayer::new().layer(RetryLayer::new().with_max_retries(3).layer(inner));
//! ```

pub mod logging;
pub mod retry;

// Re-exports
pub use logging::LoggingLayer;
pub use retry::RetryLayer;
