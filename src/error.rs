//! Error taxonomy
//!
//! Every failure carries the context needed to locate it: the attribute path
//! and kinds for shape errors, the server's message/description for
//! rejections, the HTTP status and body for transport failures.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, CdnError>;

/// Errors raised while converting, encoding or reconciling a CDN resource
#[derive(Debug, Error)]
pub enum CdnError {
    /// Desired tree does not match the schema (caller-fixable)
    #[error("Schema mismatch at {path}: expected {expected}, found {actual}")]
    SchemaMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// Server returned a document that does not decode against the schema
    #[error("Malformed payload at {path}: expected {expected}, found {actual}")]
    MalformedPayload {
        path: String,
        expected: String,
        actual: String,
    },

    /// Non-success HTTP status from the management API
    #[error("Transport error {status}: {body}")]
    Transport { status: u16, body: String },

    /// Connection, timeout or TLS failure before any status was received
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Token exchange failed
    #[error("Authentication failed with status {status}: {message}")]
    Auth { status: u16, message: String },

    /// Create acknowledgment carried a status other than "accept"
    #[error("Create rejected - message: {message}, description: {description}")]
    CreateRejected {
        message: String,
        description: String,
    },

    /// Update or deactivation acknowledgment carried a status other than "accept"
    #[error("Update rejected - message: {message}, description: {description}")]
    UpdateRejected {
        message: String,
        description: String,
    },

    /// Create was accepted but the follow-up read failed. The resource exists
    /// on the server under `id`; creating it again would duplicate it.
    #[error("Resource {id} was created but could not be read back: {source}")]
    CreatedButUnread {
        id: String,
        #[source]
        source: Box<CdnError>,
    },

    /// Read against an identifier the server does not know
    #[error("Resource not found: {id}")]
    NotFound { id: String },

    /// Provider configuration is incomplete
    #[error("Invalid configuration for {field}: {message}")]
    Config { field: String, message: String },

    /// Lifecycle operation not permitted from the current state
    #[error("Cannot {operation} a resource in state {state}")]
    InvalidTransition { state: String, operation: String },

    /// Internal JSON serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CdnError {
    /// True when the server explicitly declined the request
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            CdnError::CreateRejected { .. } | CdnError::UpdateRejected { .. }
        )
    }

    /// Identifier of a resource this failure left behind on the server
    pub fn created_id(&self) -> Option<&str> {
        match self {
            CdnError::CreatedButUnread { id, .. } => Some(id),
            _ => None,
        }
    }
}
