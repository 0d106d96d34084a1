//! Core types for the prompt-assembly pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Message role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a new system message
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    /// Create a new user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Outgoing chat request: ordered messages plus the streaming flag.
///
/// The pipeline rewrites the message list before dispatch (default policy
/// replaces any system message with the rendered prompt); an inlet hook may
/// rewrite it arbitrarily.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    /// Create a new chat request
    pub fn new(messages: Vec<Message>, stream: bool) -> Self {
        Self { messages, stream }
    }

    /// Content of the first system message, if any
    pub fn system_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }
}

/// What the host hands the pipeline for one request.
#[derive(Debug, Clone)]
pub struct IncomingChat {
    /// The latest user message, passed through to `pipe` hooks
    pub user_message: String,
    /// The host-side model identifier, passed through to `pipe` hooks
    pub model_id: String,
    /// Full message history, passed through to `pipe` hooks
    pub history: Vec<Message>,
    /// The request to shape and dispatch
    pub request: ChatRequest,
}

/// Provider information
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
}

fn default_true() -> bool {
    true
}

/// A declared external resource to materialize before rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// Source locator: a remote URL or an inline `data:<mime>,<base64>` payload.
    ///
    /// Stripped after resolution when `save` is false, so downstream consumers
    /// see a resolved resource rather than a re-fetchable reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Persist to disk (true) or keep the bytes in memory (false)
    #[serde(default = "default_true")]
    pub save: bool,

    /// Replace existing content at the target
    #[serde(default = "default_true")]
    pub overwrite: bool,

    /// Unpack a `.zip`-suffixed target instead of writing it verbatim
    #[serde(default = "default_true")]
    pub extract: bool,

    /// Outcome of materialization, recorded once per request
    #[serde(skip)]
    pub outcome: Option<Outcome>,
}

impl Default for FileEntry {
    fn default() -> Self {
        Self {
            url: None,
            save: true,
            overwrite: true,
            extract: true,
            outcome: None,
        }
    }
}

/// Per-entry materialization outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Bytes written verbatim to this path
    Written(PathBuf),
    /// Archive unpacked into this directory
    Extracted(PathBuf),
    /// Bytes kept in memory (`save: false`)
    InMemory(Vec<u8>),
    /// Existing content left untouched
    SkippedExisting,
    /// Isolated failure; other entries proceed
    Failed(String),
}

/// Configuration header parsed from the front-matter block.
///
/// Absence of a header yields `Header::default()`: every field empty and the
/// template body untouched. Unrecognized keys are retained in `extra` and
/// exposed to the template namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Header {
    /// Local provider endpoint (selects the local backend together with `model`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama_url: Option<String>,

    /// Remote provider API key (selects the remote backend together with `model`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_ai_api_key: Option<String>,

    /// Backend model name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Remote endpoint override; defaults to `https://api.openai.com/v1`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Capability names this template requires; checked against the registry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,

    /// Declared resources, keyed by target relative path
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, FileEntry>,

    /// Everything else from the front-matter, available to the template
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Header {
    /// Build the template variable namespace from the header.
    ///
    /// Scalars render directly; compound values render as YAML. The caller
    /// injects the work-area path under `workdir` on top of this.
    pub fn template_namespace(&self) -> BTreeMap<String, String> {
        let mut ns = BTreeMap::new();
        if let Some(v) = &self.ollama_url {
            ns.insert("ollama_url".to_string(), v.clone());
        }
        if let Some(v) = &self.open_ai_api_key {
            ns.insert("open_ai_api_key".to_string(), v.clone());
        }
        if let Some(v) = &self.model {
            ns.insert("model".to_string(), v.clone());
        }
        if let Some(v) = &self.url {
            ns.insert("url".to_string(), v.clone());
        }
        for (key, value) in &self.extra {
            ns.insert(key.clone(), yaml_to_string(value));
        }
        ns
    }
}

fn yaml_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
