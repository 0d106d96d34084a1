//! Hook capability interfaces and the startup registry.
//!
//! Templates customize per-request behavior through three optional named
//! slots: `inlet` (request pre-processing), `outlet` (response
//! post-processing), and `pipe` (full custom execution). Implementations are
//! registered under a name at startup; a template selects them by name with
//! directive lines, so no code is ever evaluated at request time.

use crate::error::EngineError;
use crate::provider::FragmentStream;
use crate::types::{ChatRequest, Message};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Request pre-processing hook.
///
/// Has full authority to rewrite the outgoing request; returning an error
/// rejects the request.
#[async_trait]
pub trait InletHook: Send + Sync {
    /// Shape the outgoing request given the rendered prompt
    async fn shape(&self, request: ChatRequest, prompt: &str) -> Result<ChatRequest, EngineError>;
}

/// Per-fragment response transform plus a finalization step.
///
/// This is the single seam by which templates customize output formatting
/// (buffering, filtering, reformatting) without touching dispatch logic.
pub trait ResponseProcessor: Send {
    /// Transform one incoming fragment into zero or more output fragments
    fn process(&mut self, fragment: &str) -> Vec<String>;

    /// Emit any trailing fragments at end of stream
    fn finish(&mut self) -> Vec<String>;
}

/// Response post-processing hook: a factory for per-request processors.
pub trait OutletHook: Send + Sync {
    /// Create a fresh processor for one request
    fn processor(&self) -> Box<dyn ResponseProcessor>;
}

/// What a `pipe` hook produces in place of a provider call.
pub enum PipeOutput {
    /// A complete response value
    Complete(String),
    /// A lazily-produced fragment sequence
    Stream(FragmentStream),
}

/// Full-delegation hook: replaces provider selection and execution entirely.
#[async_trait]
pub trait PipeHook: Send + Sync {
    /// Produce the output representation for this request
    async fn run(
        &self,
        user_message: &str,
        model_id: &str,
        history: &[Message],
        request: ChatRequest,
    ) -> Result<PipeOutput, EngineError>;
}

/// Default pass-through processor: echoes each fragment, finishes empty.
#[derive(Debug, Default)]
pub struct Passthrough;

impl ResponseProcessor for Passthrough {
    fn process(&mut self, fragment: &str) -> Vec<String> {
        vec![fragment.to_string()]
    }

    fn finish(&mut self) -> Vec<String> {
        Vec::new()
    }
}

/// The override set a template resolved: at most one hook per slot.
#[derive(Default, Clone)]
pub struct HookSet {
    pub inlet: Option<Arc<dyn InletHook>>,
    pub outlet: Option<Arc<dyn OutletHook>>,
    pub pipe: Option<Arc<dyn PipeHook>>,
}

impl HookSet {
    /// Processor from the outlet slot, or the default pass-through
    pub fn processor(&self) -> Box<dyn ResponseProcessor> {
        match &self.outlet {
            Some(outlet) => outlet.processor(),
            None => Box::new(Passthrough),
        }
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet")
            .field("inlet", &self.inlet.is_some())
            .field("outlet", &self.outlet.is_some())
            .field("pipe", &self.pipe.is_some())
            .finish()
    }
}

/// Startup registry of named hooks and plain capabilities.
///
/// Header `requirements` are checked against this registry instead of
/// installing anything at request time; an unsatisfied requirement fails the
/// request cleanly.
#[derive(Default, Clone)]
pub struct HookRegistry {
    inlets: HashMap<String, Arc<dyn InletHook>>,
    outlets: HashMap<String, Arc<dyn OutletHook>>,
    pipes: HashMap<String, Arc<dyn PipeHook>>,
    capabilities: HashSet<String>,
}

impl HookRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an inlet hook under a name
    pub fn register_inlet(&mut self, name: impl Into<String>, hook: Arc<dyn InletHook>) {
        let name = name.into();
        self.capabilities.insert(name.clone());
        self.inlets.insert(name, hook);
    }

    /// Register an outlet hook under a name
    pub fn register_outlet(&mut self, name: impl Into<String>, hook: Arc<dyn OutletHook>) {
        let name = name.into();
        self.capabilities.insert(name.clone());
        self.outlets.insert(name, hook);
    }

    /// Register a pipe hook under a name
    pub fn register_pipe(&mut self, name: impl Into<String>, hook: Arc<dyn PipeHook>) {
        let name = name.into();
        self.capabilities.insert(name.clone());
        self.pipes.insert(name, hook);
    }

    /// Declare a plain capability with no hook attached
    pub fn provide(&mut self, name: impl Into<String>) {
        self.capabilities.insert(name.into());
    }

    /// Whether a declared requirement is satisfied
    pub fn satisfies(&self, name: &str) -> bool {
        self.capabilities.contains(name)
    }

    /// Look up an inlet hook by name
    pub fn inlet(&self, name: &str) -> Option<Arc<dyn InletHook>> {
        self.inlets.get(name).cloned()
    }

    /// Look up an outlet hook by name
    pub fn outlet(&self, name: &str) -> Option<Arc<dyn OutletHook>> {
        self.outlets.get(name).cloned()
    }

    /// Look up a pipe hook by name
    pub fn pipe(&self, name: &str) -> Option<Arc<dyn PipeHook>> {
        self.pipes.get(name).cloned()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("inlets", &self.inlets.keys().collect::<Vec<_>>())
            .field("outlets", &self.outlets.keys().collect::<Vec<_>>())
            .field("pipes", &self.pipes.keys().collect::<Vec<_>>())
            .field("capabilities", &self.capabilities.len())
            .finish()
    }
}
