//! RPC results
//!
//! A result produced by a binding service keeps the facade output and
//! encodes it into the generic tree only when the result node is read.
//! Failed outcomes are never encoded.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{trace, warn};
use yang_binding::{CodecContext, NormalizedNode, TypeRef};

use crate::error::{RpcError, RpcResult};
use crate::outcome::{OperationError, RpcOutcome};

/// Service outcome whose output is encoded on first read.
///
/// Encoding uses the codec context the invocation decoded its input with.
pub struct LazySerializedRpcResult {
    outcome: RpcOutcome<serde_json::Value>,
    output: Option<TypeRef>,
    context: Arc<CodecContext>,
    encoded: OnceLock<RpcResult<Option<NormalizedNode>>>,
}

impl LazySerializedRpcResult {
    pub(crate) fn new(
        outcome: RpcOutcome<serde_json::Value>,
        output: Option<TypeRef>,
        context: Arc<CodecContext>,
    ) -> Self {
        Self {
            outcome,
            output,
            context,
            encoded: OnceLock::new(),
        }
    }

    pub fn is_successful(&self) -> bool {
        self.outcome.is_successful()
    }

    pub fn errors(&self) -> &[OperationError] {
        self.outcome.errors()
    }

    /// The facade output as returned by the service.
    pub fn binding_result(&self) -> Option<&serde_json::Value> {
        self.outcome.result()
    }

    /// Whether the output has been encoded yet.
    pub fn is_encoded(&self) -> bool {
        self.encoded.get().is_some()
    }

    /// The output container, encoded on first call.
    pub fn result(&self) -> RpcResult<Option<&NormalizedNode>> {
        match self.encoded.get_or_init(|| self.encode()) {
            Ok(node) => Ok(node.as_ref()),
            Err(err) => Err(err.clone()),
        }
    }

    fn encode(&self) -> RpcResult<Option<NormalizedNode>> {
        if !self.outcome.is_successful() {
            return Ok(None);
        }
        let Some(value) = self.outcome.result().filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        let Some(output) = &self.output else {
            warn!("Service returned output for an operation without output");
            return Ok(None);
        };
        trace!(type_name = %output.name(), "Encoding RPC output");
        self.context
            .encode_value(output, value)
            .map(Some)
            .map_err(|e| RpcError::encode_failed(&e))
    }
}

impl fmt::Debug for LazySerializedRpcResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySerializedRpcResult")
            .field("successful", &self.outcome.is_successful())
            .field("output", &self.output)
            .field("encoded", &self.is_encoded())
            .finish()
    }
}

/// Result of an RPC invocation in generic form.
#[derive(Debug)]
pub enum DomRpcResult {
    /// Result whose node is already known
    Value {
        result: Option<NormalizedNode>,
        errors: Vec<OperationError>,
    },
    /// Result of a binding service, encoded on demand
    Lazy(LazySerializedRpcResult),
}

impl DomRpcResult {
    /// A successful result.
    pub fn success(result: Option<NormalizedNode>) -> Self {
        Self::Value {
            result,
            errors: Vec::new(),
        }
    }

    /// A failed result.
    pub fn failed(errors: impl IntoIterator<Item = OperationError>) -> Self {
        Self::Value {
            result: None,
            errors: errors.into_iter().collect(),
        }
    }

    pub fn errors(&self) -> &[OperationError] {
        match self {
            Self::Value { errors, .. } => errors,
            Self::Lazy(lazy) => lazy.errors(),
        }
    }

    /// Successful when no error-severity error was reported.
    pub fn is_successful(&self) -> bool {
        match self {
            Self::Value { errors, .. } => errors.iter().all(OperationError::is_warning),
            Self::Lazy(lazy) => lazy.is_successful(),
        }
    }

    /// The output node.
    ///
    /// # Errors
    ///
    /// Returns `ENCODE_FAILED` when a lazy output cannot be encoded.
    pub fn result(&self) -> RpcResult<Option<&NormalizedNode>> {
        match self {
            Self::Value { result, .. } => Ok(result.as_ref()),
            Self::Lazy(lazy) => lazy.result(),
        }
    }

    /// The facade output, when the result came from a binding service.
    pub fn binding_result(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Value { .. } => None,
            Self::Lazy(lazy) => lazy.binding_result(),
        }
    }
}

impl From<LazySerializedRpcResult> for DomRpcResult {
    fn from(lazy: LazySerializedRpcResult) -> Self {
        Self::Lazy(lazy)
    }
}
