//! Shopify error types.
//!
//! Every error raised past the GraphQL boundary carries the platform's
//! per-call request id so callers can debug without server-side log access.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for Shopify operations.
pub type ShopifyResult<T> = Result<T, ShopifyError>;

/// One entry of a GraphQL top-level `errors` array.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphqlErrorEntry {
    pub message: String,
}

/// A field-level user error reported by a mutation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Errors raised by the Admin API client and the staged upload.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP-level failure from the GraphQL endpoint (status >= 400).
    #[error("Shopify HTTP error {status}: {body} (request id: {})", display_id(.request_id))]
    Transport {
        status: u16,
        body: String,
        request_id: Option<String>,
    },

    /// The response carried a top-level `errors` array.
    #[error("Shopify GraphQL error: {} (request id: {})", join_messages(.errors), display_id(.request_id))]
    GraphQl {
        errors: Vec<GraphqlErrorEntry>,
        request_id: Option<String>,
    },

    /// A mutation reported field-level user errors.
    #[error("{operation} reported user errors: {} (request id: {})", join_user_errors(.user_errors), display_id(.request_id))]
    Validation {
        operation: &'static str,
        user_errors: Vec<UserError>,
        request_id: Option<String>,
    },

    /// The multipart POST to the staged target was rejected.
    #[error("upload to staged target failed: {status} {body}")]
    Upload { status: u16, body: String },

    /// The remote asset pipeline reported a terminal failure.
    #[error("video processing failed with status {status}")]
    Processing { status: String },

    /// The readiness deadline elapsed.
    #[error("timed out waiting for READY (last status: {last_status})")]
    Timeout { last_status: String },

    /// A well-formed response was missing the data this operation needs.
    #[error("unexpected Shopify response: {0}")]
    Decode(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShopifyError {
    /// The request id attached to this error, when the failing call got far
    /// enough to receive one.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ShopifyError::Transport { request_id, .. }
            | ShopifyError::GraphQl { request_id, .. }
            | ShopifyError::Validation { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }
}

fn display_id(request_id: &Option<String>) -> &str {
    request_id.as_deref().unwrap_or("none")
}

fn join_messages(errors: &[GraphqlErrorEntry]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
