//! Outcome of a service method
//!
//! A service reports expected failures by returning a failed [`RpcOutcome`]
//! carrying [`OperationError`]s. Returning `Err` instead means the
//! invocation itself broke.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of an operation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Error,
    Warning,
}

/// Layer an operation error originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Transport,
    Rpc,
    Protocol,
    Application,
}

/// A structured error reported by a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    pub severity: ErrorSeverity,
    pub error_type: ErrorType,
    /// Machine-readable error tag, e.g. `operation-failed`
    pub tag: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl OperationError {
    /// An error-severity application error.
    pub fn application(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorSeverity::Error, ErrorType::Application, tag, message)
    }

    pub fn new(
        severity: ErrorSeverity,
        error_type: ErrorType,
        tag: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            error_type,
            tag: tag.into(),
            message: message.into(),
            info: None,
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        self.severity == ErrorSeverity::Warning
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.tag, self.message)
    }
}

/// Success flag, optional result and reported errors of one invocation.
///
/// A successful outcome may still carry warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcOutcome<T> {
    successful: bool,
    result: Option<T>,
    errors: Vec<OperationError>,
}

impl<T> RpcOutcome<T> {
    /// A successful outcome with a result.
    pub fn success(result: T) -> Self {
        Self {
            successful: true,
            result: Some(result),
            errors: Vec::new(),
        }
    }

    /// A successful outcome for an operation without output.
    pub fn success_empty() -> Self {
        Self {
            successful: true,
            result: None,
            errors: Vec::new(),
        }
    }

    /// A failed outcome.
    pub fn failed(errors: impl IntoIterator<Item = OperationError>) -> Self {
        Self {
            successful: false,
            result: None,
            errors: errors.into_iter().collect(),
        }
    }

    /// Add a reported error, typically a warning on success.
    #[must_use]
    pub fn with_error(mut self, error: OperationError) -> Self {
        self.errors.push(error);
        self
    }

    pub fn is_successful(&self) -> bool {
        self.successful
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    pub fn errors(&self) -> &[OperationError] {
        &self.errors
    }

    pub fn into_parts(self) -> (bool, Option<T>, Vec<OperationError>) {
        (self.successful, self.result, self.errors)
    }

    /// Convert the result, keeping flag and errors.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<RpcOutcome<U>, E> {
        let result = self.result.map(f).transpose()?;
        Ok(RpcOutcome {
            successful: self.successful,
            result,
            errors: self.errors,
        })
    }
}
