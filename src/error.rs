//! Top-level error taxonomy.
//!
//! Every fallible boundary in this crate returns its own `thiserror`-derived
//! enum (see [`crypto`](crate::crypto), [`signing`](crate::signing),
//! [`credentials`](crate::credentials), [`config_file`](crate::config_file),
//! [`pipeline`](crate::pipeline), [`waiter`](crate::waiter)); [`SdkError`] is
//! the union a caller driving a full `execute()` round trip actually sees.

use std::collections::HashMap;
use thiserror::Error;

use crate::credentials::CredentialError;
use crate::crypto::CryptoError;
use crate::pipeline::PipelineError;
use crate::signing::SigningError;
use crate::waiter::WaiterError;

/// Additional context carried by a decoded server/protocol error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub message: String,
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub additional_fields: HashMap<String, String>,
    pub extended: Option<String>,
}

/// The full, exhaustive error surface of a request execution.
#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Waiter(#[from] WaiterError),

    /// A decoded server-side (5xx) error.
    #[error("{code}: {}", .context.message)]
    Server { code: String, context: ErrorContext },

    /// A decoded client-protocol (4xx) error with a known code.
    #[error("{code}: {}", .context.message)]
    Response { code: String, context: ErrorContext },

    /// A non-2xx response whose body could not be decoded into a known shape.
    #[error("Unhandled error, code: {status}, body: {raw}")]
    Raw { status: u16, raw: String },

    /// Transport-level failure (connection reset, DNS, TLS, timeout). Always retryable.
    #[error("transport error: {0}")]
    Transport(String),

    /// The in-flight operation or waiter was cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

impl SdkError {
    /// True for every error kind the default retry policy is allowed to retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            SdkError::Transport(_) => true,
            SdkError::Server { .. } => true,
            SdkError::Response { code, .. } => code == "ThrottlingException" || code == "Throttling",
            SdkError::Raw { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }

    /// The protocol-level error code, when this error carries one. Used by
    /// waiter `ErrorCode` acceptors and by retry-policy classification.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            SdkError::Server { code, .. } => Some(code),
            SdkError::Response { code, .. } => Some(code),
            _ => None,
        }
    }

    /// The HTTP status code, when this error carries one. Used by waiter
    /// `ErrorStatus` acceptors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SdkError::Server { context, .. } => Some(context.status),
            SdkError::Response { context, .. } => Some(context.status),
            SdkError::Raw { status, .. } => Some(*status),
            _ => None,
        }
    }
}
