//! Generation clients.
//!
//! A [`GenerationClient`] wraps exactly one credential and performs one
//! network round trip per call, with no retry. Backends use enum dispatch
//! instead of trait objects because async methods are not dyn-compatible.
//!
//! Besides the two HTTP protocols there are two local backends:
//! [`LlmBackend::Inert`] stands in for a missing credential and always fails
//! with [`LlmError::Auth`], and [`LlmBackend::Scripted`] answers from a
//! closure so whole ticks can run offline.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use crate::config::{BackendType, LlmBackendConfig};
use crate::error::LlmError;
use crate::prompt::RenderedPrompt;

/// Upper bound on generated tokens per call.
const MAX_TOKENS: u32 = 512;

/// One credential bound to one backend.
#[derive(Debug)]
pub struct GenerationClient {
    label: String,
    backend: LlmBackend,
}

impl GenerationClient {
    /// Build a client from backend configuration.
    ///
    /// An empty API key yields an inert client.
    pub fn from_config(label: impl Into<String>, config: &LlmBackendConfig) -> Self {
        let backend = if config.api_key.is_empty() {
            LlmBackend::Inert
        } else {
            match config.backend_type {
                BackendType::OpenAi => LlmBackend::OpenAi(HttpBackend::new(config)),
                BackendType::Anthropic => LlmBackend::Anthropic(HttpBackend::new(config)),
            }
        };
        Self {
            label: label.into(),
            backend,
        }
    }

    /// A client with no credential. Every call fails with [`LlmError::Auth`].
    pub fn inert(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            backend: LlmBackend::Inert,
        }
    }

    /// A client answering from `responder` instead of the network.
    pub fn scripted(label: impl Into<String>, responder: ScriptedBackend) -> Self {
        Self {
            label: label.into(),
            backend: LlmBackend::Scripted(responder),
        }
    }

    /// Pool label, used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether this client holds a usable credential.
    pub const fn is_configured(&self) -> bool {
        !matches!(self.backend, LlmBackend::Inert)
    }

    /// Backend name, used in logs.
    pub const fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Send one prompt and return the backend's text.
    ///
    /// # Errors
    ///
    /// Returns the [`LlmError`] category matching the failure. The caller
    /// decides the fallback.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, LlmError> {
        debug!(client = %self.label, backend = self.backend.name(), "generation call");
        self.backend.complete(prompt).await
    }
}

/// Backend dispatch.
pub enum LlmBackend {
    /// `OpenAI`-compatible chat completions API.
    OpenAi(HttpBackend),
    /// Anthropic Messages API.
    Anthropic(HttpBackend),
    /// Canned responder.
    Scripted(ScriptedBackend),
    /// No credential configured.
    Inert,
}

impl fmt::Debug for LlmBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl LlmBackend {
    async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, LlmError> {
        match self {
            Self::OpenAi(http) => http.complete_openai(prompt).await,
            Self::Anthropic(http) => http.complete_anthropic(prompt).await,
            Self::Scripted(scripted) => scripted.complete(prompt).await,
            Self::Inert => Err(LlmError::Auth("no credential configured".to_owned())),
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
            Self::Scripted(_) => "scripted",
            Self::Inert => "inert",
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP backends
// ---------------------------------------------------------------------------

/// Shared HTTP state for both wire protocols.
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpBackend {
    /// Create an HTTP backend with the configured request timeout.
    pub fn new(config: &LlmBackendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// `POST {api_url}/chat/completions` with bearer auth.
    async fn complete_openai(&self, prompt: &RenderedPrompt) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.api_url);

        let body = openai_request_body(&self.model, prompt);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let json = read_success(response).await?;
        extract_openai_content(&json)
    }

    /// `POST {api_url}/messages` with `x-api-key` auth.
    async fn complete_anthropic(&self, prompt: &RenderedPrompt) -> Result<String, LlmError> {
        let url = format!("{}/messages", self.api_url);

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": prompt.system,
            "messages": [
                {"role": "user", "content": prompt.user}
            ]
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let json = read_success(response).await?;
        extract_anthropic_content(&json)
    }
}

/// Chat completions request body. Structured prompts ask for JSON mode.
fn openai_request_body(model: &str, prompt: &RenderedPrompt) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": model,
        "messages": [
            {"role": "system", "content": prompt.system},
            {"role": "user", "content": prompt.user}
        ],
        "temperature": 0.8,
        "max_tokens": MAX_TOKENS,
    });
    if prompt.structured {
        body["response_format"] = serde_json::json!({"type": "json_object"});
    }
    body
}

/// Map a non-success status to its error category, else read the JSON body.
async fn read_success(response: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(classify_status(status, body));
    }

    response
        .json()
        .await
        .map_err(|e| LlmError::Malformed(format!("response body is not JSON: {e}")))
}

fn classify_status(status: StatusCode, body: String) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::Auth(format!("{status}: {body}"))
        }
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited(body),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            LlmError::Timeout(format!("{status}"))
        }
        other => LlmError::Backend {
            status: other.as_u16(),
            body,
        },
    }
}

fn classify_transport(error: reqwest::Error) -> LlmError {
    if error.is_timeout() {
        LlmError::Timeout(error.to_string())
    } else {
        LlmError::Network(error.to_string())
    }
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, LlmError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| LlmError::Malformed("missing choices[0].message.content".to_owned()))
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &serde_json::Value) -> Result<String, LlmError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| LlmError::Malformed("missing content[0].text".to_owned()))
}

// ---------------------------------------------------------------------------
// Scripted backend
// ---------------------------------------------------------------------------

/// Responder signature for [`ScriptedBackend`].
pub type Responder = dyn Fn(&RenderedPrompt) -> Result<String, LlmError> + Send + Sync;

/// A backend that answers from a closure, optionally after a delay.
#[derive(Clone)]
pub struct ScriptedBackend {
    responder: Arc<Responder>,
    latency: Option<Duration>,
}

impl ScriptedBackend {
    /// Answer every prompt with `responder`.
    pub fn new(
        responder: impl Fn(&RenderedPrompt) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Arc::new(responder),
            latency: None,
        }
    }

    /// Answer every prompt with the same text.
    pub fn fixed(reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self::new(move |_| Ok(reply.clone()))
    }

    /// Fail every prompt with `error`.
    pub fn failing(error: LlmError) -> Self {
        Self::new(move |_| Err(error.clone()))
    }

    /// Sleep for `latency` before answering.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, LlmError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        (self.responder)(prompt)
    }
}

impl fmt::Debug for ScriptedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedBackend")
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}
