//! Schema-generic data tree and paths
//!
//! This is the representation the data store and RPC transport work with:
//! self-describing nodes addressed by [`QName`], independent of any generated
//! facade type.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::qname::QName;

/// Scalar value held by a leaf, a leaf-set entry or a key predicate.
///
/// Enumeration values travel as their schema label in [`LeafValue::String`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LeafValue {
    /// Textual value
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Any signed integer width
    Int(i64),
    /// Any unsigned integer width
    Uint(u64),
    /// decimal64 in its canonical textual form
    Decimal(String),
    /// Presence of an `empty` leaf
    Empty,
    /// Raw bytes
    Binary(Vec<u8>),
    /// Names of the bits that are set
    Bits(BTreeSet<String>),
    /// Identity reference
    Identity(QName),
}

impl LeafValue {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Decimal(_) => "decimal",
            Self::Empty => "empty",
            Self::Binary(_) => "binary",
            Self::Bits(_) => "bits",
            Self::Identity(_) => "identity",
        }
    }

    /// The textual value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for LeafValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for LeafValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for LeafValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for LeafValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for LeafValue {
    fn from(value: u64) -> Self {
        Self::Uint(value)
    }
}

impl fmt::Display for LeafValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) | Self::Decimal(s) => f.write_str(s),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Uint(u) => write!(f, "{u}"),
            Self::Empty => f.write_str("[empty]"),
            Self::Binary(bytes) => write!(f, "[{} bytes]", bytes.len()),
            Self::Bits(bits) => {
                let names: Vec<&str> = bits.iter().map(String::as_str).collect();
                f.write_str(&names.join(" "))
            }
            Self::Identity(qname) => write!(f, "{qname}"),
        }
    }
}

/// Key predicates of a list entry: key leaf name to value.
pub type Predicates = BTreeMap<QName, LeafValue>;

// =============================================================================
// Generic path
// =============================================================================

/// One step of a [`YangInstanceIdentifier`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// A container, a list as a whole, or a leaf
    Node(QName),
    /// A single list entry selected by its key
    NodeWithKey(QName, Predicates),
    /// An augmentation, named by the set of children it contributes
    Augmentation(BTreeSet<QName>),
}

impl PathStep {
    /// Node type of the step. Augmentation steps have none.
    pub fn node_type(&self) -> Option<&QName> {
        match self {
            Self::Node(qname) | Self::NodeWithKey(qname, _) => Some(qname),
            Self::Augmentation(_) => None,
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(qname) => write!(f, "{qname}"),
            Self::NodeWithKey(qname, predicates) => {
                write!(f, "{qname}[")?;
                for (i, (key, value)) in predicates.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}={}", key.local_name(), value)?;
                }
                f.write_str("]")
            }
            Self::Augmentation(children) => {
                let names: Vec<&str> = children.iter().map(QName::local_name).collect();
                write!(f, "augmentation({})", names.join(","))
            }
        }
    }
}

/// Path into the generic tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct YangInstanceIdentifier {
    steps: Vec<PathStep>,
}

impl YangInstanceIdentifier {
    /// The empty (root) path.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a path from its steps.
    pub fn create(steps: impl IntoIterator<Item = PathStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    /// Path consisting of a single node step.
    pub fn of(qname: QName) -> Self {
        Self {
            steps: vec![PathStep::Node(qname)],
        }
    }

    /// Append a node step.
    #[must_use]
    pub fn node(mut self, qname: QName) -> Self {
        self.steps.push(PathStep::Node(qname));
        self
    }

    /// Append a keyed list entry step.
    #[must_use]
    pub fn node_with_key(mut self, qname: QName, predicates: Predicates) -> Self {
        self.steps.push(PathStep::NodeWithKey(qname, predicates));
        self
    }

    /// The steps in order.
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// The last step, if the path is not empty.
    pub fn last_step(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    /// Whether this is the root path.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for YangInstanceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Generic tree
// =============================================================================

/// Children of a container or list entry, keyed by node type.
pub type Children = BTreeMap<QName, NormalizedNode>;

/// A container (also used for RPC input and output).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerNode {
    /// Node type
    pub name: QName,
    /// Child nodes
    pub children: Children,
}

impl ContainerNode {
    /// An empty container.
    pub fn new(name: QName) -> Self {
        Self {
            name,
            children: Children::new(),
        }
    }

    /// Add or replace a child.
    #[must_use]
    pub fn with_child(mut self, child: NormalizedNode) -> Self {
        self.children.insert(child.node_type().clone(), child);
        self
    }

    /// Look up a child by node type.
    pub fn child(&self, name: &QName) -> Option<&NormalizedNode> {
        self.children.get(name)
    }
}

/// A single list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntryNode {
    /// Node type (the list name)
    pub name: QName,
    /// Key leaf values identifying the entry
    pub predicates: Predicates,
    /// Child nodes, including the key leaves
    pub children: Children,
}

impl MapEntryNode {
    /// Look up a child by node type.
    pub fn child(&self, name: &QName) -> Option<&NormalizedNode> {
        self.children.get(name)
    }
}

/// A keyed list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapNode {
    /// Node type (the list name)
    pub name: QName,
    /// Entries in insertion order
    pub entries: Vec<MapEntryNode>,
}

impl MapNode {
    /// Look up an entry by key predicates.
    pub fn entry(&self, predicates: &Predicates) -> Option<&MapEntryNode> {
        self.entries.iter().find(|e| &e.predicates == predicates)
    }
}

/// A list without a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnkeyedListNode {
    /// Node type (the list name)
    pub name: QName,
    /// Entries in order
    pub entries: Vec<ContainerNode>,
}

/// A leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    /// Node type
    pub name: QName,
    /// Leaf value
    pub value: LeafValue,
}

/// A leaf-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafSetNode {
    /// Node type
    pub name: QName,
    /// Values in order
    pub values: Vec<LeafValue>,
}

/// A node of the generic tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedNode {
    /// Container
    Container(ContainerNode),
    /// Keyed list entry
    MapEntry(MapEntryNode),
    /// Keyed list
    Map(MapNode),
    /// List without key
    UnkeyedList(UnkeyedListNode),
    /// Leaf
    Leaf(LeafNode),
    /// Leaf-list
    LeafSet(LeafSetNode),
}

impl NormalizedNode {
    /// Node type of this node.
    pub fn node_type(&self) -> &QName {
        match self {
            Self::Container(n) => &n.name,
            Self::MapEntry(n) => &n.name,
            Self::Map(n) => &n.name,
            Self::UnkeyedList(n) => &n.name,
            Self::Leaf(n) => &n.name,
            Self::LeafSet(n) => &n.name,
        }
    }

    /// Short name of the node kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Container(_) => "container",
            Self::MapEntry(_) => "map-entry",
            Self::Map(_) => "map",
            Self::UnkeyedList(_) => "unkeyed-list",
            Self::Leaf(_) => "leaf",
            Self::LeafSet(_) => "leaf-set",
        }
    }

    /// Shorthand for building a leaf node.
    pub fn leaf(name: QName, value: impl Into<LeafValue>) -> Self {
        Self::Leaf(LeafNode {
            name,
            value: value.into(),
        })
    }

    /// Children of a container or list entry.
    pub fn children(&self) -> Option<&Children> {
        match self {
            Self::Container(n) => Some(&n.children),
            Self::MapEntry(n) => Some(&n.children),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qname(local: &str) -> QName {
        QName::new("urn:test", None, local).unwrap()
    }

    #[test]
    fn container_children_are_keyed_by_node_type() {
        let container = ContainerNode::new(qname("c"))
            .with_child(NormalizedNode::leaf(qname("a"), "one"))
            .with_child(NormalizedNode::leaf(qname("a"), "two"));
        assert_eq!(container.children.len(), 1);
        assert_eq!(
            container.child(&qname("a")),
            Some(&NormalizedNode::leaf(qname("a"), "two"))
        );
    }

    #[test]
    fn path_display_renders_predicates() {
        let mut predicates = Predicates::new();
        predicates.insert(qname("name"), LeafValue::from("foo"));
        let path = YangInstanceIdentifier::of(qname("top"))
            .node(qname("list"))
            .node_with_key(qname("list"), predicates);
        assert_eq!(
            path.to_string(),
            "/(urn:test)top/(urn:test)list/(urn:test)list[name=foo]"
        );
    }
}
