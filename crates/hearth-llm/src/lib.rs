//! Generation layer for the Hearthstead tick orchestrator.
//!
//! Everything that talks to a text-generation backend lives here:
//!
//! - [`config`] -- Pool credentials and backend settings from the environment
//! - [`llm`] -- [`GenerationClient`]: one credential, one round trip per call
//! - [`pool`] -- [`WorkerPool`]: fixed and random role assignment
//! - [`prompt`] -- `minijinja` templates per tick stage
//! - [`parse`] -- Lenient decoding of untrusted replies
//! - [`error`] -- Error types
//!
//! The orchestrator in `hearth-core` never sees HTTP or wire formats; it
//! acquires a client for a role, renders a prompt, and decodes the text.

pub mod config;
pub mod error;
pub mod llm;
pub mod parse;
pub mod pool;
pub mod prompt;

pub use config::{BackendType, LlmBackendConfig, PoolConfig};
pub use error::{ConfigError, DecodeError, LlmError, PromptError};
pub use llm::{GenerationClient, ScriptedBackend};
pub use parse::{Decodable, decode, try_decode};
pub use pool::{Assignment, FixedIndex, RandomPick, Role, WorkerPool};
pub use prompt::{PromptEngine, RenderedPrompt, Stage};
