//! # Overture Hooks
//!
//! Built-in hook implementations for the three template-selectable slots:
//! - `SystemlessInlet`: folds the rendered prompt into the first user message
//! - `LineBufferedOutlet`: re-frames the fragment stream on line boundaries
//! - `EnvelopeOutlet`: wraps the response in a fixed prefix and suffix
//! - `StaticPipe`: answers with a canned reply instead of calling a backend
//!
//! Register them under names at startup; templates select them with
//! `@inlet`, `@outlet`, and `@pipe` directive lines.

pub mod inlet;
pub mod outlet;
pub mod pipe;

// Re-exports
pub use inlet::SystemlessInlet;
pub use outlet::{EnvelopeOutlet, LineBufferedOutlet};
pub use pipe::StaticPipe;

use overture_core::hooks::HookRegistry;
use std::sync::Arc;

/// Registry preloaded with the argument-free built-ins under canonical
/// names. `EnvelopeOutlet` and `StaticPipe` take constructor arguments, so
/// callers register those themselves.
pub fn builtin_registry() -> HookRegistry {
    let mut registry = HookRegistry::new();
    registry.register_inlet("systemless", Arc::new(SystemlessInlet::new()));
    registry.register_outlet("line-buffered", Arc::new(LineBufferedOutlet::new()));
    registry
}
