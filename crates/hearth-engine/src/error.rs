//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup so `main` can
//! propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Tick configuration could not be loaded.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: hearth_core::config::ConfigError,
    },

    /// Worker pool environment was invalid.
    #[error("pool config error: {source}")]
    Pool {
        /// The underlying pool config error.
        #[from]
        source: hearth_llm::ConfigError,
    },

    /// Prompt templates failed to load.
    #[error("prompt error: {source}")]
    Prompt {
        /// The underlying template error.
        #[from]
        source: hearth_llm::PromptError,
    },

    /// The world store could not be opened.
    #[error("database error: {source}")]
    Db {
        /// The underlying data layer error.
        #[from]
        source: hearth_db::DbError,
    },

    /// Bootstrapping the world failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: hearth_core::StoreError,
    },

    /// The tick API server failed.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: hearth_observer::ServerError,
    },
}
