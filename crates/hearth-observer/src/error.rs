//! Error types for the tick API.
//!
//! [`ObserverError`] converts into an Axum response with a
//! `{"success": false, "error": ...}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hearth_core::{StoreError, TickError};

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The store holds no world document.
    #[error("no world")]
    NoWorld,

    /// The world store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<TickError> for ObserverError {
    fn from(error: TickError) -> Self {
        match error {
            TickError::MissingWorld => Self::NoWorld,
            TickError::Store { source } => Self::Store(source),
        }
    }
}

impl ObserverError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NoWorld => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
