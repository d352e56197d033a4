//! Codec error types

use thiserror::Error;

use crate::generator::GeneratorError;
use crate::identifier::IdentifierError;
use crate::qname::QName;
use crate::type_ref::TypeName;

/// Errors raised by the binding runtime context and the codec registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// No codec context has been installed yet
    #[error("no codec context is installed")]
    MissingContext,

    /// Type generation failed while building a runtime context
    #[error(transparent)]
    Generation(#[from] GeneratorError),

    /// Identifier construction failed
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// The type is not known to the runtime context
    #[error("type {0} is not bound in the current context")]
    UnknownType(TypeName),

    /// A codec unit could not be built for the type
    #[error("cannot build codec for {type_name}: {reason}")]
    Synthesis { type_name: TypeName, reason: String },

    /// A path does not follow the schema
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A key does not match the key leaves of its list
    #[error("invalid key for {list}: {reason}")]
    InvalidKey { list: TypeName, reason: String },

    /// A value does not fit its property type
    #[error("invalid value for '{property}': {reason}")]
    InvalidValue { property: String, reason: String },

    /// A textual value violates a pattern restriction
    #[error("value '{value}' does not match pattern '{pattern}'")]
    PatternMismatch { value: String, pattern: String },

    /// Strict decoding met a child the type does not declare
    #[error("unknown child {0}")]
    UnknownChild(QName),

    /// The generic node has the wrong shape for the target type
    #[error("expected {expected} node, found {found}")]
    UnexpectedNode { expected: &'static str, found: String },

    /// Nesting exceeded the configured limit
    #[error("nesting deeper than {0} levels")]
    DepthExceeded(usize),

    /// The facade object could not be converted to or from its property tree
    #[error("facade conversion failed: {0}")]
    Facade(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::Facade(err.to_string())
    }
}

/// Result type alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
