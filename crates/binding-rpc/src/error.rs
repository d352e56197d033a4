//! Error types for RPC invocation
//!
//! Every failure that leaves the adapter is an [`RpcError`] with a stable
//! [`RpcErrorCode`]. Errors raised by a service implementation are wrapped
//! as [`RpcErrorCode::InvocationFailed`] before they are handed back.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};
use yang_binding::{CodecError, QName};

/// Error codes for RPC failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum RpcErrorCode {
    /// The service implementation failed
    InvocationFailed,
    /// The generic input could not be decoded into the facade input
    DecodeFailed,
    /// The facade output could not be encoded into the generic tree
    EncodeFailed,
    /// No implementation is registered for the operation
    OperationNotFound,
    /// The operation cannot be served right now
    Unavailable,
    /// Unexpected internal failure
    Internal,
}

impl RpcErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvocationFailed => "INVOCATION_FAILED",
            Self::DecodeFailed => "DECODE_FAILED",
            Self::EncodeFailed => "ENCODE_FAILED",
            Self::OperationNotFound => "OPERATION_NOT_FOUND",
            Self::Unavailable => "UNAVAILABLE",
            Self::Internal => "INTERNAL",
        }
    }

    /// Whether the caller is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::DecodeFailed | Self::OperationNotFound)
    }

    /// Whether the serving side is at fault.
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }
}

impl fmt::Display for RpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured RPC failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("[{code}] {message}")]
pub struct RpcError {
    /// Error code
    pub code: RpcErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional structured details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// The underlying failure, for debugging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl RpcError {
    /// Create a new RPC error.
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            cause: None,
        }
    }

    /// Attach structured details. Values that fail to serialize are dropped.
    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    /// Attach the underlying cause.
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Prepare the error for a caller according to `config`.
    ///
    /// Production mode drops the cause and replaces the message and details
    /// of server errors.
    pub fn apply_config(mut self, config: &ErrorConfig) -> Self {
        trace!(
            code = %self.code,
            development_mode = config.development_mode,
            "Applying error configuration"
        );
        if config.development_mode {
            return self;
        }
        self.cause = None;
        if self.code.is_server_error() {
            debug!(
                original_code = %self.code,
                original_message = %self.message,
                "Sanitizing server error for production"
            );
            self.message = "An internal error occurred".to_string();
            self.details = None;
        }
        self
    }

    /// Wrap a failure raised by a service implementation.
    ///
    /// Errors the service built itself keep their message as the cause.
    pub fn invocation_failed(operation: &QName, cause: impl fmt::Display) -> Self {
        Self::new(
            RpcErrorCode::InvocationFailed,
            format!("invocation of {operation} failed"),
        )
        .with_cause(cause.to_string())
    }

    /// Create a DECODE_FAILED error from a codec failure.
    pub fn decode_failed(err: &CodecError) -> Self {
        Self::new(RpcErrorCode::DecodeFailed, "cannot decode RPC input").with_cause(err.to_string())
    }

    /// Create an ENCODE_FAILED error from a codec failure.
    pub fn encode_failed(err: &CodecError) -> Self {
        Self::new(RpcErrorCode::EncodeFailed, "cannot encode RPC output").with_cause(err.to_string())
    }

    /// Create an OPERATION_NOT_FOUND error.
    pub fn operation_not_found(operation: &QName) -> Self {
        Self::new(
            RpcErrorCode::OperationNotFound,
            format!("no implementation for operation {operation}"),
        )
    }

    /// Create an UNAVAILABLE error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::Unavailable, message)
    }

    /// Create an INTERNAL error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::Internal, message)
    }
}

impl From<CodecError> for RpcError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::MissingContext => Self::unavailable(err.to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}

/// Result type alias for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

// =============================================================================
// Error Configuration
// =============================================================================

/// How errors are prepared before they reach a caller.
///
/// # Example
/// ```rust,ignore
/// use binding_rpc::ErrorConfig;
///
/// let dev = ErrorConfig::development();
/// let prod = ErrorConfig::production();
/// let config = ErrorConfig::new().with_development_mode(cfg!(debug_assertions));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorConfig {
    /// Keep causes and server error messages
    pub development_mode: bool,
}

impl ErrorConfig {
    /// Development mode in debug builds, production otherwise.
    pub fn new() -> Self {
        Self {
            development_mode: cfg!(debug_assertions),
        }
    }

    pub fn development() -> Self {
        Self {
            development_mode: true,
        }
    }

    pub fn production() -> Self {
        Self {
            development_mode: false,
        }
    }

    pub fn with_development_mode(mut self, enabled: bool) -> Self {
        self.development_mode = enabled;
        self
    }
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self::new()
    }
}
