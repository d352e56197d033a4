//! Per-type codec units
//!
//! A [`DataObjectCodec`] is the conversion plan of one data record: an
//! ordered list of (property, child codec) pairs. Nested records are not
//! part of the plan; they are looked up by type when reached, so building a
//! unit never needs another unit.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::trace;

use crate::node::{
    Children, ContainerNode, LeafNode, LeafSetNode, MapEntryNode, MapNode, NormalizedNode,
    Predicates, UnkeyedListNode,
};
use crate::qname::QName;
use crate::type_ref::{TypeName, TypeRef};

use super::context::{BindingRuntimeContext, BoundNode, ChildShape};
use super::error::{CodecError, CodecResult};
use super::registry::CodecContext;
use super::value::{ValueCodec, ValueScope};

/// Facade property holding augmentation data, keyed by augmentation type.
pub const AUGMENTATIONS_PROPERTY: &str = "augmentations";

#[derive(Debug)]
enum ChildPlan {
    Container { target: TypeRef },
    List { target: TypeRef, keyed: bool },
    Leaf(ValueCodec),
    LeafList(ValueCodec),
}

#[derive(Debug)]
struct ChildCodec {
    qname: QName,
    property: String,
    plan: ChildPlan,
}

/// Codec unit of one data record.
#[derive(Debug)]
pub struct DataObjectCodec {
    node: Arc<BoundNode>,
    children: Vec<ChildCodec>,
}

impl DataObjectCodec {
    /// Build the plan for `type_ref` from its bound record.
    pub fn synthesize(runtime: &BindingRuntimeContext, type_ref: &TypeRef) -> CodecResult<Self> {
        let node = runtime.bound_ref(type_ref)?.clone();
        let failed = |reason: String| CodecError::Synthesis {
            type_name: type_ref.name().clone(),
            reason,
        };

        let mut children = Vec::with_capacity(node.children.len());
        for child in &node.children {
            let plan = match child.shape {
                ChildShape::Container | ChildShape::List { .. } => {
                    let target = child.target.clone().ok_or_else(|| {
                        failed(format!("child {} has no record type", child.qname))
                    })?;
                    match child.shape {
                        ChildShape::List { keyed } => ChildPlan::List { target, keyed },
                        _ => ChildPlan::Container { target },
                    }
                }
                ChildShape::Leaf => ChildPlan::Leaf(
                    ValueCodec::for_property(&child.property.ty).map_err(&failed)?,
                ),
                ChildShape::LeafList => ChildPlan::LeafList(
                    ValueCodec::for_property(&child.property.ty).map_err(&failed)?,
                ),
            };
            children.push(ChildCodec {
                qname: child.qname.clone(),
                property: child.property.name.clone(),
                plan,
            });
        }

        trace!(type_name = %type_ref.name(), children = children.len(), "Synthesized codec");
        Ok(Self { node, children })
    }

    pub fn type_ref(&self) -> TypeRef {
        self.node.type_ref()
    }

    pub fn node(&self) -> &Arc<BoundNode> {
        &self.node
    }

    /// Encode a facade property tree into a generic node.
    pub fn encode_node(
        &self,
        ctx: &CodecContext,
        value: &Value,
        depth: usize,
    ) -> CodecResult<NormalizedNode> {
        if self.node.is_augmentation() {
            return Err(CodecError::UnexpectedNode {
                expected: "data record",
                found: format!("augmentation {}", self.node.name()),
            });
        }

        let mut children = Children::new();
        self.encode_children(ctx, value, depth, &mut children)?;
        let name = self.node.qname.clone();
        if self.node.key.is_empty() {
            return Ok(NormalizedNode::Container(ContainerNode { name, children }));
        }

        let mut predicates = Predicates::new();
        for key in &self.node.key {
            match children.get(key) {
                Some(NormalizedNode::Leaf(leaf)) => {
                    predicates.insert(key.clone(), leaf.value.clone());
                }
                _ => {
                    return Err(CodecError::InvalidKey {
                        list: self.node.name().clone(),
                        reason: format!("key leaf {} is missing", key.local_name()),
                    });
                }
            }
        }
        Ok(NormalizedNode::MapEntry(MapEntryNode {
            name,
            predicates,
            children,
        }))
    }

    /// Encode the properties of `value` into `out`, augmentations included.
    pub fn encode_children(
        &self,
        ctx: &CodecContext,
        value: &Value,
        depth: usize,
        out: &mut Children,
    ) -> CodecResult<()> {
        if depth > ctx.config().max_depth {
            return Err(CodecError::DepthExceeded(ctx.config().max_depth));
        }
        let object = value.as_object().ok_or_else(|| CodecError::InvalidValue {
            property: self.node.name().to_string(),
            reason: format!("expected object, found {value}"),
        })?;

        for child in &self.children {
            let Some(value) = object.get(&child.property).filter(|v| !v.is_null()) else {
                continue;
            };
            let node = self.encode_child(ctx, child, value, depth)?;
            out.insert(child.qname.clone(), node);
        }

        if let Some(augmentations) = object.get(AUGMENTATIONS_PROPERTY).and_then(Value::as_object)
        {
            for (name, value) in augmentations {
                let type_name = TypeName::parse(name)
                    .filter(|n| self.node.augmentations.contains(n))
                    .ok_or_else(|| CodecError::InvalidValue {
                        property: AUGMENTATIONS_PROPERTY.to_string(),
                        reason: format!("{name} does not augment {}", self.node.name()),
                    })?;
                let codec = ctx.codec(&TypeRef::new(type_name))?;
                codec.encode_children(ctx, value, depth, out)?;
            }
        }
        Ok(())
    }

    fn encode_child(
        &self,
        ctx: &CodecContext,
        child: &ChildCodec,
        value: &Value,
        depth: usize,
    ) -> CodecResult<NormalizedNode> {
        let scope = ValueScope {
            runtime: ctx.runtime(),
            enforce_patterns: ctx.config().enforce_patterns,
            property: &child.property,
        };
        let name = child.qname.clone();

        let node = match &child.plan {
            ChildPlan::Leaf(codec) => NormalizedNode::Leaf(LeafNode {
                name,
                value: codec.encode(&scope, value)?,
            }),
            ChildPlan::LeafList(codec) => {
                let values = expect_array(&child.property, value)?
                    .iter()
                    .map(|v| codec.encode(&scope, v))
                    .collect::<CodecResult<Vec<_>>>()?;
                NormalizedNode::LeafSet(LeafSetNode { name, values })
            }
            ChildPlan::Container { target } => {
                ctx.codec(target)?.encode_node(ctx, value, depth + 1)?
            }
            ChildPlan::List { target, keyed } => {
                let codec = ctx.codec(target)?;
                let items = expect_array(&child.property, value)?;
                if *keyed {
                    let mut entries = Vec::with_capacity(items.len());
                    for item in items {
                        match codec.encode_node(ctx, item, depth + 1)? {
                            NormalizedNode::MapEntry(entry) => entries.push(entry),
                            other => {
                                return Err(CodecError::UnexpectedNode {
                                    expected: "map-entry",
                                    found: other.kind().to_string(),
                                });
                            }
                        }
                    }
                    NormalizedNode::Map(MapNode { name, entries })
                } else {
                    let mut entries = Vec::with_capacity(items.len());
                    for item in items {
                        let mut children = Children::new();
                        codec.encode_children(ctx, item, depth + 1, &mut children)?;
                        entries.push(ContainerNode {
                            name: name.clone(),
                            children,
                        });
                    }
                    NormalizedNode::UnkeyedList(UnkeyedListNode { name, entries })
                }
            }
        };
        Ok(node)
    }

    /// Decode a container or list entry into a facade property tree.
    pub fn decode_node(
        &self,
        ctx: &CodecContext,
        node: &NormalizedNode,
        depth: usize,
    ) -> CodecResult<Value> {
        let children = match node {
            NormalizedNode::Container(container) => &container.children,
            NormalizedNode::MapEntry(entry) => &entry.children,
            other => {
                return Err(CodecError::UnexpectedNode {
                    expected: "container or map-entry",
                    found: other.kind().to_string(),
                });
            }
        };
        if node.node_type() != &self.node.qname {
            return Err(CodecError::UnexpectedNode {
                expected: "node of the requested type",
                found: node.node_type().to_string(),
            });
        }
        self.decode_children(ctx, children, depth).map(Value::Object)
    }

    /// Decode children into properties. Children added by augmentations are
    /// grouped under [`AUGMENTATIONS_PROPERTY`].
    pub fn decode_children(
        &self,
        ctx: &CodecContext,
        children: &Children,
        depth: usize,
    ) -> CodecResult<Map<String, Value>> {
        if depth > ctx.config().max_depth {
            return Err(CodecError::DepthExceeded(ctx.config().max_depth));
        }

        let mut object = Map::new();
        let mut augmented: BTreeMap<TypeName, Children> = BTreeMap::new();

        for (qname, node) in children {
            if let Some(child) = self.children.iter().find(|c| &c.qname == qname) {
                let value = self.decode_child(ctx, child, node, depth)?;
                object.insert(child.property.clone(), value);
                continue;
            }

            let owner = self.node.augmentations.iter().find(|name| {
                ctx.runtime()
                    .bound(name)
                    .is_some_and(|aug| aug.child(qname).is_some())
            });
            match owner {
                Some(name) => {
                    augmented
                        .entry(name.clone())
                        .or_default()
                        .insert(qname.clone(), node.clone());
                }
                None if ctx.config().strict_decode => {
                    return Err(CodecError::UnknownChild(qname.clone()));
                }
                None => {
                    trace!(child = %qname, type_name = %self.node.name(), "Skipping unknown child");
                }
            }
        }

        if !augmented.is_empty() {
            let mut augmentations = Map::new();
            for (name, children) in augmented {
                let codec = ctx.codec(&TypeRef::new(name.clone()))?;
                let value = codec.decode_children(ctx, &children, depth)?;
                augmentations.insert(name.to_string(), Value::Object(value));
            }
            object.insert(
                AUGMENTATIONS_PROPERTY.to_string(),
                Value::Object(augmentations),
            );
        }
        Ok(object)
    }

    fn decode_child(
        &self,
        ctx: &CodecContext,
        child: &ChildCodec,
        node: &NormalizedNode,
        depth: usize,
    ) -> CodecResult<Value> {
        let scope = ValueScope {
            runtime: ctx.runtime(),
            enforce_patterns: ctx.config().enforce_patterns,
            property: &child.property,
        };
        let unexpected = |expected: &'static str| CodecError::UnexpectedNode {
            expected,
            found: node.kind().to_string(),
        };

        match (&child.plan, node) {
            (ChildPlan::Leaf(codec), NormalizedNode::Leaf(leaf)) => codec.decode(&scope, &leaf.value),
            (ChildPlan::LeafList(codec), NormalizedNode::LeafSet(set)) => set
                .values
                .iter()
                .map(|v| codec.decode(&scope, v))
                .collect::<CodecResult<Vec<_>>>()
                .map(Value::Array),
            (ChildPlan::Container { target }, NormalizedNode::Container(_)) => {
                ctx.codec(target)?.decode_node(ctx, node, depth + 1)
            }
            (ChildPlan::List { target, .. }, NormalizedNode::Map(map)) => {
                let codec = ctx.codec(target)?;
                map.entries
                    .iter()
                    .map(|entry| {
                        codec
                            .decode_children(ctx, &entry.children, depth + 1)
                            .map(Value::Object)
                    })
                    .collect::<CodecResult<Vec<_>>>()
                    .map(Value::Array)
            }
            (ChildPlan::List { target, .. }, NormalizedNode::UnkeyedList(list)) => {
                let codec = ctx.codec(target)?;
                list.entries
                    .iter()
                    .map(|entry| {
                        codec
                            .decode_children(ctx, &entry.children, depth + 1)
                            .map(Value::Object)
                    })
                    .collect::<CodecResult<Vec<_>>>()
                    .map(Value::Array)
            }
            (ChildPlan::Leaf(_), _) => Err(unexpected("leaf")),
            (ChildPlan::LeafList(_), _) => Err(unexpected("leaf-set")),
            (ChildPlan::Container { .. }, _) => Err(unexpected("container")),
            (ChildPlan::List { .. }, _) => Err(unexpected("map or unkeyed-list")),
        }
    }
}

fn expect_array<'v>(property: &str, value: &'v Value) -> CodecResult<&'v Vec<Value>> {
    value.as_array().ok_or_else(|| CodecError::InvalidValue {
        property: property.to_string(),
        reason: format!("expected array, found {value}"),
    })
}
