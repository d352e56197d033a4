//! Binding runtime context
//!
//! Joins the schema with the types generated from it: for every data
//! record it knows the schema node, the node type and the child a property
//! maps to. Built once per schema and shared read-only.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::generator::{
    BindingGenerator, GeneratedTypes, Property, PropertyType, RecordKind, RecordType,
};
use crate::qname::QName;
use crate::schema::{ContainerSchema, DataSchemaNode, SchemaContext, SchemaPath};
use crate::type_ref::{TypeName, TypeRef};

use super::error::{CodecError, CodecResult};

/// How a child is represented in the generic tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildShape {
    Container,
    List { keyed: bool },
    Leaf,
    LeafList,
}

/// A property of a bound record together with the schema child it maps to.
#[derive(Debug, Clone)]
pub struct BoundChild {
    pub qname: QName,
    pub property: Property,
    pub shape: ChildShape,
    /// Record type of a container or list child
    pub target: Option<TypeRef>,
}

/// A data record bound to its schema node.
#[derive(Debug)]
pub struct BoundNode {
    pub record: Arc<RecordType>,
    /// Node type; for an augmentation, the node type of its target
    pub qname: QName,
    /// Schema path; for an augmentation, the path of its target
    pub path: SchemaPath,
    /// Key leaves of a keyed list
    pub key: Vec<QName>,
    pub children: Vec<BoundChild>,
    /// Augmentations that add children to this node
    pub augmentations: Vec<TypeName>,
}

impl BoundNode {
    pub fn type_ref(&self) -> TypeRef {
        self.record.type_ref()
    }

    pub fn name(&self) -> &TypeName {
        &self.record.name
    }

    pub fn is_augmentation(&self) -> bool {
        matches!(self.record.kind, RecordKind::Augmentation { .. })
    }

    pub fn is_list(&self) -> bool {
        matches!(self.record.kind, RecordKind::List { .. })
    }

    /// Child by node type.
    pub fn child(&self, qname: &QName) -> Option<&BoundChild> {
        self.children.iter().find(|c| &c.qname == qname)
    }

    /// Node types of the children, used to name an augmentation in paths.
    pub fn child_names(&self) -> BTreeSet<QName> {
        self.children.iter().map(|c| c.qname.clone()).collect()
    }
}

/// Input and output types of an RPC.
#[derive(Debug, Clone, Default)]
pub struct RpcBinding {
    pub input: Option<TypeRef>,
    pub output: Option<TypeRef>,
}

/// Schema plus generated types, indexed for the codecs.
#[derive(Debug)]
pub struct BindingRuntimeContext {
    schema: Arc<SchemaContext>,
    types: GeneratedTypes,
    nodes: HashMap<TypeName, Arc<BoundNode>>,
    roots: HashMap<QName, TypeName>,
    identity_qnames: HashMap<TypeName, QName>,
    identity_types: HashMap<QName, TypeName>,
    rpcs: HashMap<QName, RpcBinding>,
}

impl BindingRuntimeContext {
    /// Generate the types of `schema` and bind them.
    #[instrument(skip_all)]
    pub fn create(schema: Arc<SchemaContext>) -> CodecResult<Self> {
        let types = BindingGenerator::generate(&schema)?;

        let mut augmentations: HashMap<TypeName, Vec<TypeName>> = HashMap::new();
        for augmentation in types.augmentations() {
            let RecordKind::Augmentation { target, .. } = &augmentation.kind else {
                continue;
            };
            if let Some(target) = types.data_type(target) {
                augmentations
                    .entry(target.name.clone())
                    .or_default()
                    .push(augmentation.name.clone());
            }
        }

        let mut nodes = HashMap::new();
        let mut roots = HashMap::new();
        for (path, record) in types.data_types() {
            let Some((qname, children)) = schema_children(&schema, path) else {
                warn!(path = %path, "Generated record without schema node");
                continue;
            };
            let key = match &record.kind {
                RecordKind::List { key, .. } => key.clone(),
                _ => Vec::new(),
            };
            let node = BoundNode {
                record: record.clone(),
                qname: qname.clone(),
                path: path.clone(),
                key,
                children: bind_children(record, children.iter()),
                augmentations: augmentations.remove(&record.name).unwrap_or_default(),
            };
            if path.len() == 1 {
                roots.insert(qname, record.name.clone());
            }
            nodes.insert(record.name.clone(), Arc::new(node));
        }

        for augmentation in types.augmentations() {
            let RecordKind::Augmentation { target, children } = &augmentation.kind else {
                continue;
            };
            let Some(target_qname) = target.last() else {
                continue;
            };
            let schema_children: Vec<&DataSchemaNode> = children
                .iter()
                .filter_map(|child| schema.find_child(target, child))
                .collect();
            let node = BoundNode {
                record: augmentation.clone(),
                qname: target_qname.clone(),
                path: target.clone(),
                key: Vec::new(),
                children: bind_children(augmentation, schema_children.into_iter()),
                augmentations: Vec::new(),
            };
            nodes.insert(augmentation.name.clone(), Arc::new(node));
        }

        let mut identity_qnames = HashMap::new();
        let mut identity_types = HashMap::new();
        let mut rpcs = HashMap::new();
        for module in schema.modules() {
            for identity in &module.identities {
                if let Some(record) = types.identity(&identity.qname) {
                    identity_qnames.insert(record.name.clone(), identity.qname.clone());
                    identity_types.insert(identity.qname.clone(), record.name.clone());
                }
            }
            for rpc in &module.rpcs {
                let container_type = |container: &Option<ContainerSchema>| {
                    container
                        .as_ref()
                        .and_then(|c| types.data_type(&c.path))
                        .map(|r| r.type_ref())
                };
                rpcs.insert(
                    rpc.qname.clone(),
                    RpcBinding {
                        input: container_type(&rpc.input),
                        output: container_type(&rpc.output),
                    },
                );
            }
        }

        debug!(
            nodes = nodes.len(),
            roots = roots.len(),
            identities = identity_qnames.len(),
            rpcs = rpcs.len(),
            "Created binding runtime context"
        );
        Ok(Self {
            schema,
            types,
            nodes,
            roots,
            identity_qnames,
            identity_types,
            rpcs,
        })
    }

    pub fn schema(&self) -> &Arc<SchemaContext> {
        &self.schema
    }

    pub fn types(&self) -> &GeneratedTypes {
        &self.types
    }

    /// Bound record by type name.
    pub fn bound(&self, name: &TypeName) -> Option<&Arc<BoundNode>> {
        self.nodes.get(name)
    }

    /// Bound record for a type reference, failing when the type is unknown.
    pub fn bound_ref(&self, type_ref: &TypeRef) -> CodecResult<&Arc<BoundNode>> {
        self.bound(type_ref.name())
            .ok_or_else(|| CodecError::UnknownType(type_ref.name().clone()))
    }

    /// Bound record of a top-level node.
    pub fn root(&self, qname: &QName) -> Option<&Arc<BoundNode>> {
        self.roots.get(qname).and_then(|name| self.nodes.get(name))
    }

    pub fn identity_qname(&self, name: &TypeName) -> Option<&QName> {
        self.identity_qnames.get(name)
    }

    pub fn identity_type(&self, qname: &QName) -> Option<&TypeName> {
        self.identity_types.get(qname)
    }

    /// Whether the identity `qname` is `base` or derives from it, directly or
    /// through intermediate identities.
    pub fn identity_derives_from(&self, qname: &QName, base: &TypeName) -> bool {
        let mut current = self.types.identity(qname);
        while let Some(record) = current {
            if &record.name == base {
                return true;
            }
            current = record.extends.as_ref();
        }
        false
    }

    pub fn rpc(&self, qname: &QName) -> Option<&RpcBinding> {
        self.rpcs.get(qname)
    }
}

/// Node type and children of the data node at `path`, including nodes
/// inside RPC input and output.
fn schema_children<'a>(
    schema: &'a SchemaContext,
    path: &SchemaPath,
) -> Option<(QName, &'a [DataSchemaNode])> {
    if let Some(node) = schema.find_data_node(path) {
        return Some((node.qname().clone(), node.children()));
    }
    let [rpc, io, rest @ ..] = path.steps() else {
        return None;
    };
    let rpc = schema.find_rpc(rpc)?;
    let container = match io.local_name() {
        "input" => rpc.input.as_ref()?,
        "output" => rpc.output.as_ref()?,
        _ => return None,
    };
    let mut qname = &container.qname;
    let mut children: &[DataSchemaNode] = &container.children;
    for step in rest {
        let child = children.iter().find(|c| c.qname() == step)?;
        qname = child.qname();
        children = child.children();
    }
    Some((qname.clone(), children))
}

fn bind_children<'a>(
    record: &RecordType,
    children: impl Iterator<Item = &'a DataSchemaNode>,
) -> Vec<BoundChild> {
    children
        .filter_map(|child| {
            let local = child.qname().local_name();
            let property = record.properties.iter().find(|p| p.yang_name == local)?;
            let shape = match child {
                DataSchemaNode::Container(_) => ChildShape::Container,
                DataSchemaNode::List(list) => ChildShape::List {
                    keyed: !list.key.is_empty(),
                },
                DataSchemaNode::Leaf(_) => ChildShape::Leaf,
                DataSchemaNode::LeafList(_) => ChildShape::LeafList,
            };
            let target = match (&property.ty, shape) {
                (PropertyType::Generated(generated), ChildShape::Container) => {
                    generated.as_record().map(|r| r.type_ref())
                }
                (PropertyType::List(inner), ChildShape::List { .. }) => inner
                    .generated()
                    .and_then(|g| g.as_record())
                    .map(|r| r.type_ref()),
                _ => None,
            };
            Some(BoundChild {
                qname: child.qname().clone(),
                property: property.clone(),
                shape,
                target,
            })
        })
        .collect()
}
