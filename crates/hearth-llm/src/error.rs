//! Error types for the generation layer.
//!
//! Uses `thiserror` for typed errors. [`LlmError`] is the transport-level
//! failure of a single backend round trip; [`DecodeError`] is a payload that
//! arrived but did not match the expected shape. Neither is ever fatal to a
//! tick: the orchestrator downgrades the affected stage to its fallback.

/// A single generation call failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    /// The backend could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The credential was rejected, or no credential is configured.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The backend is throttling this credential.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The call did not complete in time.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The backend answered with a non-success status not covered above.
    #[error("backend returned {status}: {body}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// The response envelope did not carry any text content.
    #[error("malformed response envelope: {0}")]
    Malformed(String),
}

/// The backend's text could not be decoded into the expected structure.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The response was empty.
    #[error("empty response")]
    Empty,

    /// Every recovery strategy failed; carries the last parser error.
    #[error("payload did not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// A prompt template could not be loaded or rendered.
#[derive(Debug, thiserror::Error)]
#[error("template error: {0}")]
pub struct PromptError(pub String);

/// Pool configuration is invalid.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(pub String);
