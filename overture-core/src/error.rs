//! Error types for pipeline operations.

/// The main error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Front-matter header could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(String),

    /// Per-entry resource fetch/decode/extract/write failure
    #[error("Resource error: {0}")]
    Resource(String),

    /// Template execution failure
    #[error("Template render error: {0}")]
    TemplateRender(String),

    /// No usable backend for the request
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Unrecognized chunk shape during streaming
    #[error("Chunk decode error: {0}")]
    ChunkDecode(String),

    /// A declared requirement has no registered capability
    #[error("Unsatisfied capability: {0}")]
    Capability(String),

    /// Hook execution failure
    #[error("Hook error ({hook}): {message}")]
    Hook { hook: String, message: String },

    /// Provider-specific errors
    #[error("Provider error: {0}")]
    Provider(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive errors
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Inline payload decode errors
    #[error("Decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Stream errors
    #[error("Stream error: {0}")]
    Stream(String),

    /// Generic errors
    #[error("Error: {0}")]
    Other(String),
}

impl EngineError {
    /// Create a config parse error
    pub fn config_parse(msg: impl Into<String>) -> Self {
        Self::ConfigParse(msg.into())
    }

    /// Create a resource error
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Create a template render error
    pub fn template_render(msg: impl Into<String>) -> Self {
        Self::TemplateRender(msg.into())
    }

    /// Create a dispatch error
    pub fn dispatch(msg: impl Into<String>) -> Self {
        Self::Dispatch(msg.into())
    }

    /// Create a chunk decode error
    pub fn chunk_decode(msg: impl Into<String>) -> Self {
        Self::ChunkDecode(msg.into())
    }

    /// Create a capability error
    pub fn capability(msg: impl Into<String>) -> Self {
        Self::Capability(msg.into())
    }

    /// Create a hook error
    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Network(_))
    }
}

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for EngineError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}
