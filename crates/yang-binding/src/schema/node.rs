//! Data, identity, RPC and augmentation nodes

use crate::qname::QName;

use super::{SchemaPath, TypeDefinition};

/// A container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSchema {
    pub qname: QName,
    pub path: SchemaPath,
    pub children: Vec<DataSchemaNode>,
}

/// A list. Lists with an empty `key` are unkeyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSchema {
    pub qname: QName,
    pub path: SchemaPath,
    /// Key leaf names in declaration order
    pub key: Vec<QName>,
    pub children: Vec<DataSchemaNode>,
}

/// A leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafSchema {
    pub qname: QName,
    pub path: SchemaPath,
    pub type_def: TypeDefinition,
}

/// A leaf-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafListSchema {
    pub qname: QName,
    pub path: SchemaPath,
    pub type_def: TypeDefinition,
}

/// A node of the data tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSchemaNode {
    Container(ContainerSchema),
    List(ListSchema),
    Leaf(LeafSchema),
    LeafList(LeafListSchema),
}

impl DataSchemaNode {
    /// Node type.
    pub fn qname(&self) -> &QName {
        match self {
            Self::Container(n) => &n.qname,
            Self::List(n) => &n.qname,
            Self::Leaf(n) => &n.qname,
            Self::LeafList(n) => &n.qname,
        }
    }

    /// Schema location.
    pub fn path(&self) -> &SchemaPath {
        match self {
            Self::Container(n) => &n.path,
            Self::List(n) => &n.path,
            Self::Leaf(n) => &n.path,
            Self::LeafList(n) => &n.path,
        }
    }

    /// Child nodes. Leaves have none.
    pub fn children(&self) -> &[DataSchemaNode] {
        match self {
            Self::Container(n) => &n.children,
            Self::List(n) => &n.children,
            Self::Leaf(_) | Self::LeafList(_) => &[],
        }
    }

    /// Direct child by node type.
    pub fn find_child(&self, qname: &QName) -> Option<&DataSchemaNode> {
        self.children().iter().find(|c| c.qname() == qname)
    }

    /// Type of a leaf or leaf-list.
    pub fn type_def(&self) -> Option<&TypeDefinition> {
        match self {
            Self::Leaf(n) => Some(&n.type_def),
            Self::LeafList(n) => Some(&n.type_def),
            _ => None,
        }
    }
}

/// An identity declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySchema {
    pub qname: QName,
    pub path: SchemaPath,
    pub base: Option<QName>,
}

/// An RPC with its optional input and output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcSchema {
    pub qname: QName,
    pub path: SchemaPath,
    pub input: Option<ContainerSchema>,
    pub output: Option<ContainerSchema>,
}

/// Nodes a module adds to a node defined elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentationSchema {
    /// Path of the augmented container or list
    pub target: SchemaPath,
    pub children: Vec<DataSchemaNode>,
}

impl AugmentationSchema {
    /// Node types of the added children.
    pub fn child_names(&self) -> impl Iterator<Item = &QName> {
        self.children.iter().map(DataSchemaNode::qname)
    }
}
