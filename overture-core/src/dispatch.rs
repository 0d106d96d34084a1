//! Backend selection from the configuration header.
//!
//! Selection is a pure function over the header so the precedence rules are
//! testable in isolation. A `pipe` hook outranks everything here: the
//! pipeline delegates to it before consulting this table.

use crate::types::Header;

/// Default remote chat-completions endpoint, used when the header carries an
/// API key but no `url` override.
pub const DEFAULT_REMOTE_ENDPOINT: &str = "https://api.openai.com/v1";

/// The backend a header selects. First match wins, mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend<'a> {
    /// Local endpoint: `ollama_url` + `model`
    Local { base_url: &'a str, model: &'a str },
    /// Remote endpoint: `open_ai_api_key` + `model`, optional `url` override
    Remote {
        api_key: &'a str,
        endpoint: Option<&'a str>,
        model: &'a str,
    },
    /// Nothing selected: echo the rendered prompt as a single fragment
    Echo,
}

/// Select the backend the header's provider-selector cluster names.
pub fn select_backend(header: &Header) -> Backend<'_> {
    if let (Some(base_url), Some(model)) = (&header.ollama_url, &header.model) {
        return Backend::Local {
            base_url,
            model,
        };
    }
    if let (Some(api_key), Some(model)) = (&header.open_ai_api_key, &header.model) {
        return Backend::Remote {
            api_key,
            endpoint: header.url.as_deref(),
            model,
        };
    }
    Backend::Echo
}
