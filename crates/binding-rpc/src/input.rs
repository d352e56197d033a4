//! RPC identifiers and inputs

use std::fmt;
use std::sync::{Arc, OnceLock};

use yang_binding::{
    BindingCodecRegistry, CodecResult, DynDataObject, NormalizedNode, QName,
    YangInstanceIdentifier,
};

/// An operation, optionally bound to the data subtree it acts on.
///
/// Implementations registered without a context path serve every context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomRpcIdentifier {
    operation: QName,
    context: Option<YangInstanceIdentifier>,
}

impl DomRpcIdentifier {
    /// A global operation identifier.
    pub fn new(operation: QName) -> Self {
        Self {
            operation,
            context: None,
        }
    }

    /// An identifier bound to a data subtree.
    pub fn with_context(operation: QName, context: YangInstanceIdentifier) -> Self {
        Self {
            operation,
            context: Some(context),
        }
    }

    pub fn operation(&self) -> &QName {
        &self.operation
    }

    pub fn context(&self) -> Option<&YangInstanceIdentifier> {
        self.context.as_ref()
    }

    /// The same operation without a context path.
    pub fn global(&self) -> Self {
        Self::new(self.operation.clone())
    }
}

impl fmt::Display for DomRpcIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{} @ {}", self.operation, context),
            None => write!(f, "{}", self.operation),
        }
    }
}

/// Input node built from a facade object.
///
/// The facade object travels along, so an adapter on the same process can
/// use it directly. The generic node is encoded only when someone asks for
/// it.
pub struct LazySerializedContainerNode {
    operation: QName,
    binding: Arc<dyn DynDataObject>,
    registry: Arc<BindingCodecRegistry>,
    node: OnceLock<CodecResult<NormalizedNode>>,
}

impl LazySerializedContainerNode {
    pub fn create(
        operation: QName,
        binding: Arc<dyn DynDataObject>,
        registry: Arc<BindingCodecRegistry>,
    ) -> Self {
        Self {
            operation,
            binding,
            registry,
            node: OnceLock::new(),
        }
    }

    pub fn operation(&self) -> &QName {
        &self.operation
    }

    /// The facade object this node was built from.
    pub fn binding_data(&self) -> &Arc<dyn DynDataObject> {
        &self.binding
    }

    /// Whether the generic node has been produced yet.
    pub fn is_serialized(&self) -> bool {
        self.node.get().is_some()
    }

    /// The generic node, encoded on first access.
    pub fn node(&self) -> CodecResult<&NormalizedNode> {
        self.node
            .get_or_init(|| self.registry.encode_dyn(self.binding.as_ref()))
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl fmt::Debug for LazySerializedContainerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySerializedContainerNode")
            .field("operation", &self.operation)
            .field("binding", &self.binding)
            .field("serialized", &self.is_serialized())
            .finish()
    }
}

/// Input handed to an RPC implementation.
#[derive(Debug)]
pub enum DomRpcInput {
    /// The operation takes no input
    Empty,
    /// A generic input container
    Node(NormalizedNode),
    /// A facade object with its lazily encoded node
    Lazy(LazySerializedContainerNode),
}

impl DomRpcInput {
    /// Generic form of the input, encoding a lazy input if needed.
    pub fn node(&self) -> CodecResult<Option<&NormalizedNode>> {
        match self {
            Self::Empty => Ok(None),
            Self::Node(node) => Ok(Some(node)),
            Self::Lazy(lazy) => lazy.node().map(Some),
        }
    }
}

impl From<NormalizedNode> for DomRpcInput {
    fn from(node: NormalizedNode) -> Self {
        Self::Node(node)
    }
}

impl From<LazySerializedContainerNode> for DomRpcInput {
    fn from(lazy: LazySerializedContainerNode) -> Self {
        Self::Lazy(lazy)
    }
}
