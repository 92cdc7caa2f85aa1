//! One generation call, bounded by the tick deadline.
//!
//! Every stage goes through [`StageCaller`]: render the stage prompt, send it
//! to the acquired client, and cut the call short when the tick's wall-clock
//! budget runs out. Failures come back as [`CallError`] for the stage to
//! turn into its fallback.

use hearth_llm::{
    DecodeError, GenerationClient, LlmError, PromptEngine, PromptError, Stage, WorkerPool,
    try_decode,
};
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::debug;

/// Why a stage call produced no usable value.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The prompt template failed to render.
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// The backend call failed or ran past the deadline.
    #[error(transparent)]
    Backend(#[from] LlmError),

    /// The reply arrived but could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The reply decoded but its content is unusable.
    #[error("reply rejected: {0}")]
    Rejected(String),
}

/// Shared call context for one tick.
#[derive(Debug, Clone, Copy)]
pub struct StageCaller<'a> {
    /// The pool clients are acquired from.
    pub pool: &'a WorkerPool,
    /// Prompt templates.
    pub prompts: &'a PromptEngine,
    /// Instant after which no call may still be in flight.
    pub deadline: Instant,
}

impl StageCaller<'_> {
    /// Render `stage` with `context` and return the raw reply.
    pub async fn call_raw(
        &self,
        client: &GenerationClient,
        stage: Stage,
        context: &serde_json::Value,
    ) -> Result<String, CallError> {
        let prompt = self.prompts.render(stage, context)?;
        debug!(client = client.label(), stage = stage.as_str(), "stage call");
        let reply = tokio::time::timeout_at(self.deadline, client.complete(&prompt))
            .await
            .map_err(|_| LlmError::Timeout(String::from("tick budget exhausted")))??;
        Ok(reply)
    }

    /// Render, call, and strictly decode the reply.
    pub async fn call_decoded<T: DeserializeOwned>(
        &self,
        client: &GenerationClient,
        stage: Stage,
        context: &serde_json::Value,
    ) -> Result<T, CallError> {
        let raw = self.call_raw(client, stage, context).await?;
        Ok(try_decode(&raw)?)
    }
}
