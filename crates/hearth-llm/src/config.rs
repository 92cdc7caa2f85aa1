//! Worker pool configuration.
//!
//! Credentials come from environment variables. Every pool member shares one
//! backend type, base URL, and model; members differ only by API key. Keys
//! are listed in two comma-separated variables:
//!
//! - `LLM_FIXED_KEYS` -- fixed-assignment members. Index 0 is the arbiter,
//!   index `n + 1` serves intent batch `n`.
//! - `LLM_SHARED_KEYS` -- random-assignment members (narrators). Empty
//!   entries are kept as unconfigured slots and never selected.

use std::time::Duration;

use crate::error::ConfigError;

/// Default request timeout for one backend round trip.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 20_000;

/// Complete pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Backend wire protocol shared by all members.
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// Model identifier.
    pub model: String,
    /// Keys for fixed-assignment members, in role order.
    pub fixed_keys: Vec<String>,
    /// Keys for random-assignment members. May contain empty entries.
    pub shared_keys: Vec<String>,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Directory with prompt template overrides, if any.
    pub templates_dir: Option<String>,
}

/// Configuration for a single backend client.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// The backend type.
    pub backend_type: BackendType,
    /// Base API URL.
    pub api_url: String,
    /// API key for authentication. Empty means unconfigured.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

/// Supported backend wire protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible chat completions (`OpenAI`, `DeepSeek`, Ollama).
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
}

impl BackendType {
    /// Parse a backend name as written in the environment.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_lowercase().as_str() {
            "openai" | "deepseek" | "ollama" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(ConfigError(format!("unknown backend type: {other}"))),
        }
    }
}

impl PoolConfig {
    /// Load configuration from process environment variables.
    ///
    /// Optional variables (all of them):
    /// - `LLM_BACKEND` -- backend type (default `openai`)
    /// - `LLM_API_URL` -- base URL (default `https://api.openai.com/v1`)
    /// - `LLM_MODEL` -- model name (default `gpt-4o-mini`)
    /// - `LLM_FIXED_KEYS` -- comma-separated fixed-assignment keys
    /// - `LLM_SHARED_KEYS` -- comma-separated random-assignment keys
    /// - `LLM_REQUEST_TIMEOUT_MS` -- per-request timeout (default 20000)
    /// - `TEMPLATES_DIR` -- prompt template override directory
    ///
    /// Missing keys are not an error: unconfigured roles are served by an
    /// inert client and their stages fall back.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend_type =
            BackendType::parse(&lookup("LLM_BACKEND").unwrap_or_else(|| "openai".to_owned()))?;
        let api_url = lookup("LLM_API_URL")
            .unwrap_or_else(|| "https://api.openai.com/v1".to_owned())
            .trim_end_matches('/')
            .to_owned();
        let model = lookup("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_owned());

        let request_timeout_ms: u64 = lookup("LLM_REQUEST_TIMEOUT_MS")
            .map_or(Ok(DEFAULT_REQUEST_TIMEOUT_MS), |raw| raw.trim().parse())
            .map_err(|e| ConfigError(format!("invalid LLM_REQUEST_TIMEOUT_MS: {e}")))?;

        Ok(Self {
            backend_type,
            api_url,
            model,
            fixed_keys: split_keys(lookup("LLM_FIXED_KEYS").as_deref()),
            shared_keys: split_keys(lookup("LLM_SHARED_KEYS").as_deref()),
            request_timeout: Duration::from_millis(request_timeout_ms),
            templates_dir: lookup("TEMPLATES_DIR").filter(|d| !d.trim().is_empty()),
        })
    }

    /// Backend configuration for the member holding `api_key`.
    pub fn member(&self, api_key: &str) -> LlmBackendConfig {
        LlmBackendConfig {
            backend_type: self.backend_type,
            api_url: self.api_url.clone(),
            api_key: api_key.trim().to_owned(),
            model: self.model.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

/// Split a comma-separated key list, keeping empty slots as empty strings.
fn split_keys(raw: Option<&str>) -> Vec<String> {
    match raw {
        None => Vec::new(),
        Some(s) if s.trim().is_empty() => Vec::new(),
        Some(s) => s.split(',').map(|k| k.trim().to_owned()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = PoolConfig::from_lookup(lookup_from(&[]));
        assert!(config.is_ok());
        let config = match config {
            Ok(c) => c,
            Err(_) => return,
        };
        assert_eq!(config.backend_type, BackendType::OpenAi);
        assert_eq!(config.request_timeout, Duration::from_millis(20_000));
        assert!(config.fixed_keys.is_empty());
        assert!(config.shared_keys.is_empty());
        assert!(config.templates_dir.is_none());
    }

    #[test]
    fn key_lists_keep_empty_slots() {
        let config = PoolConfig::from_lookup(lookup_from(&[
            ("LLM_FIXED_KEYS", "arbiter, batch0,batch1"),
            ("LLM_SHARED_KEYS", "n1,,n3"),
            ("LLM_API_URL", "http://localhost:11434/v1/"),
        ]));
        let config = match config {
            Ok(c) => c,
            Err(e) => panic!("config should load: {e}"),
        };
        assert_eq!(config.fixed_keys, vec!["arbiter", "batch0", "batch1"]);
        assert_eq!(config.shared_keys, vec!["n1", "", "n3"]);
        assert_eq!(config.api_url, "http://localhost:11434/v1");
    }

    #[test]
    fn backend_type_parsing() {
        assert_eq!(BackendType::parse("Claude").ok(), Some(BackendType::Anthropic));
        assert_eq!(BackendType::parse("ollama").ok(), Some(BackendType::OpenAi));
        assert!(BackendType::parse("carrier-pigeon").is_err());
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let config = PoolConfig::from_lookup(lookup_from(&[("LLM_REQUEST_TIMEOUT_MS", "soon")]));
        assert!(config.is_err());
    }
}
