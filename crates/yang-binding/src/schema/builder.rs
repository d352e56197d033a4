//! Builders for schema modules
//!
//! Types are described with [`TypeSpec`] and resolved to
//! [`TypeDefinition`]s when the module is built: typedef references are
//! looked up (earlier typedefs of the same module, or typedefs of imported
//! modules), prefixes are resolved and every node receives its schema path.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::qname::{QName, QNameModule};

use super::{
    AugmentationSchema, Bit, BuiltinType, ContainerSchema, DataSchemaNode, EnumPair,
    IdentitySchema, LeafListSchema, LeafSchema, ListSchema, Module, PathExpression, PathSegment,
    RpcSchema, SchemaError, SchemaPath, SchemaResult, TypeDefinition, TypeKind,
};

/// Unresolved description of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    Builtin(BuiltinType),
    Restricted {
        base: Box<TypeSpec>,
        patterns: Vec<String>,
    },
    Enumeration(Vec<(String, i32)>),
    Bits(Vec<(String, u32)>),
    Union(Vec<TypeSpec>),
    Leafref(String),
    /// Identity name, optionally prefixed
    Identityref(String),
    /// Typedef name, optionally prefixed
    Typedef(String),
}

impl TypeSpec {
    pub fn string() -> Self {
        Self::Builtin(BuiltinType::String)
    }

    pub fn boolean() -> Self {
        Self::Builtin(BuiltinType::Boolean)
    }

    pub fn int32() -> Self {
        Self::Builtin(BuiltinType::Int32)
    }

    pub fn int64() -> Self {
        Self::Builtin(BuiltinType::Int64)
    }

    pub fn uint32() -> Self {
        Self::Builtin(BuiltinType::Uint32)
    }

    pub fn uint64() -> Self {
        Self::Builtin(BuiltinType::Uint64)
    }

    pub fn decimal64() -> Self {
        Self::Builtin(BuiltinType::Decimal64)
    }

    pub fn enumeration<S: Into<String>>(values: impl IntoIterator<Item = (S, i32)>) -> Self {
        Self::Enumeration(values.into_iter().map(|(n, v)| (n.into(), v)).collect())
    }

    pub fn bits<S: Into<String>>(bits: impl IntoIterator<Item = (S, u32)>) -> Self {
        Self::Bits(bits.into_iter().map(|(n, p)| (n.into(), p)).collect())
    }

    pub fn union(members: impl IntoIterator<Item = TypeSpec>) -> Self {
        Self::Union(members.into_iter().collect())
    }

    pub fn leafref(path: impl Into<String>) -> Self {
        Self::Leafref(path.into())
    }

    pub fn identityref(base: impl Into<String>) -> Self {
        Self::Identityref(base.into())
    }

    pub fn typedef(name: impl Into<String>) -> Self {
        Self::Typedef(name.into())
    }

    /// Add a pattern restriction.
    #[must_use]
    pub fn pattern(self, pattern: impl Into<String>) -> Self {
        match self {
            Self::Restricted { base, mut patterns } => {
                patterns.push(pattern.into());
                Self::Restricted { base, patterns }
            }
            other => Self::Restricted {
                base: Box::new(other),
                patterns: vec![pattern.into()],
            },
        }
    }
}

#[derive(Debug, Clone)]
enum NodeSpec {
    Container {
        name: String,
        body: DataNodeBuilder,
    },
    List {
        name: String,
        key: Vec<String>,
        body: DataNodeBuilder,
    },
    Leaf {
        name: String,
        ty: TypeSpec,
    },
    LeafList {
        name: String,
        ty: TypeSpec,
    },
}

/// Accumulates the children of a container, list, RPC input or output, or
/// augmentation.
#[derive(Debug, Clone, Default)]
pub struct DataNodeBuilder {
    nodes: Vec<NodeSpec>,
}

impl DataNodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn container(
        mut self,
        name: impl Into<String>,
        body: impl FnOnce(DataNodeBuilder) -> DataNodeBuilder,
    ) -> Self {
        self.nodes.push(NodeSpec::Container {
            name: name.into(),
            body: body(DataNodeBuilder::new()),
        });
        self
    }

    /// Add a list. An empty key makes the list unkeyed.
    #[must_use]
    pub fn list<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        key: impl IntoIterator<Item = S>,
        body: impl FnOnce(DataNodeBuilder) -> DataNodeBuilder,
    ) -> Self {
        self.nodes.push(NodeSpec::List {
            name: name.into(),
            key: key.into_iter().map(Into::into).collect(),
            body: body(DataNodeBuilder::new()),
        });
        self
    }

    #[must_use]
    pub fn leaf(mut self, name: impl Into<String>, ty: TypeSpec) -> Self {
        self.nodes.push(NodeSpec::Leaf {
            name: name.into(),
            ty,
        });
        self
    }

    #[must_use]
    pub fn leaf_list(mut self, name: impl Into<String>, ty: TypeSpec) -> Self {
        self.nodes.push(NodeSpec::LeafList {
            name: name.into(),
            ty,
        });
        self
    }
}

/// Input and output of an RPC being built.
#[derive(Debug, Clone, Default)]
pub struct RpcBuilder {
    input: Option<DataNodeBuilder>,
    output: Option<DataNodeBuilder>,
}

impl RpcBuilder {
    #[must_use]
    pub fn input(mut self, body: impl FnOnce(DataNodeBuilder) -> DataNodeBuilder) -> Self {
        self.input = Some(body(DataNodeBuilder::new()));
        self
    }

    #[must_use]
    pub fn output(mut self, body: impl FnOnce(DataNodeBuilder) -> DataNodeBuilder) -> Self {
        self.output = Some(body(DataNodeBuilder::new()));
        self
    }
}

/// Builder for a [`Module`].
#[derive(Debug, Clone)]
pub struct ModuleBuilder {
    name: String,
    qname_module: QNameModule,
    prefix: String,
    imports: Vec<Arc<Module>>,
    typedefs: Vec<(String, TypeSpec)>,
    data: DataNodeBuilder,
    identities: Vec<(String, Option<String>)>,
    rpcs: Vec<(String, RpcBuilder)>,
    augments: Vec<(String, DataNodeBuilder)>,
}

impl ModuleBuilder {
    /// Start a module. The prefix defaults to the module name.
    pub fn new(
        name: impl Into<String>,
        namespace: &str,
        revision: Option<&str>,
    ) -> SchemaResult<Self> {
        let name = name.into();
        Ok(Self {
            qname_module: QNameModule::new(namespace, revision)?,
            prefix: name.clone(),
            name,
            imports: Vec::new(),
            typedefs: Vec::new(),
            data: DataNodeBuilder::new(),
            identities: Vec::new(),
            rpcs: Vec::new(),
            augments: Vec::new(),
        })
    }

    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Import a module, making its prefix, typedefs and identities usable.
    #[must_use]
    pub fn import(mut self, module: &Module) -> Self {
        self.imports.push(Arc::new(module.clone()));
        self
    }

    #[must_use]
    pub fn typedef(mut self, name: impl Into<String>, spec: TypeSpec) -> Self {
        self.typedefs.push((name.into(), spec));
        self
    }

    #[must_use]
    pub fn identity(mut self, name: impl Into<String>, base: Option<&str>) -> Self {
        self.identities.push((name.into(), base.map(str::to_string)));
        self
    }

    #[must_use]
    pub fn container(
        mut self,
        name: impl Into<String>,
        body: impl FnOnce(DataNodeBuilder) -> DataNodeBuilder,
    ) -> Self {
        self.data = self.data.container(name, body);
        self
    }

    #[must_use]
    pub fn list<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        key: impl IntoIterator<Item = S>,
        body: impl FnOnce(DataNodeBuilder) -> DataNodeBuilder,
    ) -> Self {
        self.data = self.data.list(name, key, body);
        self
    }

    #[must_use]
    pub fn leaf(mut self, name: impl Into<String>, ty: TypeSpec) -> Self {
        self.data = self.data.leaf(name, ty);
        self
    }

    #[must_use]
    pub fn rpc(
        mut self,
        name: impl Into<String>,
        body: impl FnOnce(RpcBuilder) -> RpcBuilder,
    ) -> Self {
        self.rpcs.push((name.into(), body(RpcBuilder::default())));
        self
    }

    /// Augment the node at an absolute, prefixed path.
    #[must_use]
    pub fn augment(
        mut self,
        target: impl Into<String>,
        body: impl FnOnce(DataNodeBuilder) -> DataNodeBuilder,
    ) -> Self {
        self.augments
            .push((target.into(), body(DataNodeBuilder::new())));
        self
    }

    /// Resolve every type and path and produce the module.
    pub fn build(self) -> SchemaResult<Module> {
        let mut prefixes = BTreeMap::new();
        prefixes.insert(self.prefix.clone(), self.qname_module.clone());
        for import in &self.imports {
            prefixes.insert(import.prefix.clone(), import.qname_module.clone());
        }

        let mut scope = Scope {
            module_name: &self.name,
            qname_module: &self.qname_module,
            prefixes: &prefixes,
            imports: &self.imports,
            typedefs: Vec::new(),
        };

        for (name, spec) in &self.typedefs {
            let typedef = scope.resolve_typedef_declaration(name, spec)?;
            scope.typedefs.push(typedef);
        }

        let data = scope.resolve_nodes(&self.data, &SchemaPath::root())?;

        let mut identities = Vec::with_capacity(self.identities.len());
        for (name, base) in &self.identities {
            let qname = self.qname_module.qname(name)?;
            let base = base
                .as_deref()
                .map(|b| scope.resolve_prefixed(b))
                .transpose()?;
            identities.push(IdentitySchema {
                path: SchemaPath::create([qname.clone()]),
                qname,
                base,
            });
        }

        let mut rpcs = Vec::with_capacity(self.rpcs.len());
        for (name, rpc) in &self.rpcs {
            let qname = self.qname_module.qname(name)?;
            let path = SchemaPath::create([qname.clone()]);
            let input = rpc
                .input
                .as_ref()
                .map(|body| scope.resolve_container("input", body, &path))
                .transpose()?;
            let output = rpc
                .output
                .as_ref()
                .map(|body| scope.resolve_container("output", body, &path))
                .transpose()?;
            rpcs.push(RpcSchema {
                qname,
                path,
                input,
                output,
            });
        }

        let mut augmentations = Vec::with_capacity(self.augments.len());
        for (target, body) in &self.augments {
            let target = scope.resolve_absolute_path(target)?;
            let children = scope.resolve_nodes(body, &target)?;
            augmentations.push(AugmentationSchema { target, children });
        }

        let typedefs = scope.typedefs;
        Ok(Module {
            imports: self.imports.iter().map(|m| m.name.clone()).collect(),
            name: self.name,
            qname_module: self.qname_module,
            prefix: self.prefix,
            prefixes,
            typedefs,
            data,
            identities,
            rpcs,
            augmentations,
        })
    }
}

struct Scope<'a> {
    module_name: &'a str,
    qname_module: &'a QNameModule,
    prefixes: &'a BTreeMap<String, QNameModule>,
    imports: &'a [Arc<Module>],
    typedefs: Vec<TypeDefinition>,
}

impl Scope<'_> {
    fn qname(&self, local: &str) -> SchemaResult<QName> {
        Ok(self.qname_module.qname(local)?)
    }

    fn resolve_prefixed(&self, name: &str) -> SchemaResult<QName> {
        match name.split_once(':') {
            Some((prefix, local)) => {
                let module = self
                    .prefixes
                    .get(prefix)
                    .ok_or_else(|| SchemaError::UnknownPrefix {
                        module: self.module_name.to_string(),
                        prefix: prefix.to_string(),
                    })?;
                Ok(module.qname(local)?)
            }
            None => self.qname(name),
        }
    }

    fn resolve_typedef_declaration(
        &self,
        name: &str,
        spec: &TypeSpec,
    ) -> SchemaResult<TypeDefinition> {
        let qname = self.qname(name)?;
        let path = SchemaPath::create([qname.clone()]);
        let (base, patterns) = match spec {
            TypeSpec::Restricted { base, patterns } => {
                (self.resolve_type(base, &path)?, patterns.clone())
            }
            other => (self.resolve_type(other, &path)?, Vec::new()),
        };
        Ok(TypeDefinition {
            qname,
            path,
            kind: TypeKind::Derived {
                base: Box::new(base),
                patterns,
            },
        })
    }

    fn resolve_type(&self, spec: &TypeSpec, parent: &SchemaPath) -> SchemaResult<TypeDefinition> {
        let inline = |keyword: &str, kind: TypeKind| -> SchemaResult<TypeDefinition> {
            let qname = self.qname(keyword)?;
            Ok(TypeDefinition {
                path: parent.child(qname.clone()),
                qname,
                kind,
            })
        };

        match spec {
            TypeSpec::Builtin(b) => inline(b.name(), TypeKind::Builtin(*b)),
            TypeSpec::Restricted { base, patterns } => {
                let base = self.resolve_type(base, parent)?;
                Ok(TypeDefinition {
                    qname: base.qname.clone(),
                    path: base.path.clone(),
                    kind: TypeKind::Derived {
                        base: Box::new(base),
                        patterns: patterns.clone(),
                    },
                })
            }
            TypeSpec::Enumeration(values) => inline(
                "enumeration",
                TypeKind::Enumeration(
                    values
                        .iter()
                        .map(|(name, value)| EnumPair {
                            name: name.clone(),
                            value: *value,
                        })
                        .collect(),
                ),
            ),
            TypeSpec::Bits(bits) => inline(
                "bits",
                TypeKind::Bits(
                    bits.iter()
                        .map(|(name, position)| Bit {
                            name: name.clone(),
                            position: *position,
                        })
                        .collect(),
                ),
            ),
            TypeSpec::Union(members) => {
                let members = members
                    .iter()
                    .map(|m| self.resolve_type(m, parent))
                    .collect::<SchemaResult<Vec<_>>>()?;
                inline("union", TypeKind::Union(members))
            }
            TypeSpec::Leafref(path) => inline("leafref", TypeKind::Leafref(path.clone())),
            TypeSpec::Identityref(base) => {
                let base = self.resolve_prefixed(base)?;
                inline("identityref", TypeKind::Identityref(base))
            }
            TypeSpec::Typedef(name) => self.lookup_typedef(name),
        }
    }

    fn lookup_typedef(&self, name: &str) -> SchemaResult<TypeDefinition> {
        let qname = self.resolve_prefixed(name)?;
        let found = if qname.module() == self.qname_module {
            self.typedefs.iter().find(|t| t.qname == qname)
        } else {
            self.imports
                .iter()
                .find(|m| &m.qname_module == qname.module())
                .and_then(|m| m.find_typedef(qname.local_name()))
        };
        found.cloned().ok_or_else(|| SchemaError::UnknownTypedef {
            module: self.module_name.to_string(),
            name: name.to_string(),
        })
    }

    fn resolve_nodes(
        &self,
        body: &DataNodeBuilder,
        parent: &SchemaPath,
    ) -> SchemaResult<Vec<DataSchemaNode>> {
        body.nodes
            .iter()
            .map(|node| self.resolve_node(node, parent))
            .collect()
    }

    fn resolve_container(
        &self,
        name: &str,
        body: &DataNodeBuilder,
        parent: &SchemaPath,
    ) -> SchemaResult<ContainerSchema> {
        let qname = self.qname(name)?;
        let path = parent.child(qname.clone());
        Ok(ContainerSchema {
            children: self.resolve_nodes(body, &path)?,
            qname,
            path,
        })
    }

    fn resolve_node(&self, node: &NodeSpec, parent: &SchemaPath) -> SchemaResult<DataSchemaNode> {
        let node = match node {
            NodeSpec::Container { name, body } => {
                DataSchemaNode::Container(self.resolve_container(name, body, parent)?)
            }
            NodeSpec::List { name, key, body } => {
                let qname = self.qname(name)?;
                let path = parent.child(qname.clone());
                let children = self.resolve_nodes(body, &path)?;
                let mut key_names = Vec::with_capacity(key.len());
                for k in key {
                    let key_qname = self.qname(k)?;
                    let is_leaf = children
                        .iter()
                        .any(|c| matches!(c, DataSchemaNode::Leaf(l) if l.qname == key_qname));
                    if !is_leaf {
                        return Err(SchemaError::InvalidKey {
                            list: path.to_string(),
                            key: k.clone(),
                        });
                    }
                    key_names.push(key_qname);
                }
                DataSchemaNode::List(ListSchema {
                    qname,
                    path,
                    key: key_names,
                    children,
                })
            }
            NodeSpec::Leaf { name, ty } => {
                let qname = self.qname(name)?;
                let path = parent.child(qname.clone());
                DataSchemaNode::Leaf(LeafSchema {
                    type_def: self.resolve_type(ty, &path)?,
                    qname,
                    path,
                })
            }
            NodeSpec::LeafList { name, ty } => {
                let qname = self.qname(name)?;
                let path = parent.child(qname.clone());
                DataSchemaNode::LeafList(LeafListSchema {
                    type_def: self.resolve_type(ty, &path)?,
                    qname,
                    path,
                })
            }
        };
        Ok(node)
    }

    fn resolve_absolute_path(&self, expression: &str) -> SchemaResult<SchemaPath> {
        let invalid = || SchemaError::InvalidPath {
            module: self.module_name.to_string(),
            path: expression.to_string(),
        };
        let parsed = PathExpression::parse(expression).ok_or_else(invalid)?;
        if !parsed.absolute {
            return Err(invalid());
        }
        let mut steps = Vec::with_capacity(parsed.segments.len());
        for segment in parsed.segments {
            match segment {
                PathSegment::Parent => return Err(invalid()),
                PathSegment::Node { prefix, name } => {
                    let module = match prefix {
                        Some(p) => self.prefixes.get(p).ok_or_else(|| {
                            SchemaError::UnknownPrefix {
                                module: self.module_name.to_string(),
                                prefix: p.to_string(),
                            }
                        })?,
                        None => self.qname_module,
                    };
                    steps.push(module.qname(name)?);
                }
            }
        }
        Ok(SchemaPath::create(steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typedef_patterns_move_onto_the_typedef() {
        let module = ModuleBuilder::new("t", "urn:t", None)
            .unwrap()
            .typedef("word", TypeSpec::string().pattern("a+"))
            .build()
            .unwrap();
        let typedef = module.find_typedef("word").unwrap();
        match &typedef.kind {
            TypeKind::Derived { base, patterns } => {
                assert_eq!(patterns, &vec!["a+".to_string()]);
                assert_eq!(base.kind, TypeKind::Builtin(BuiltinType::String));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn unknown_typedef_is_reported() {
        let err = ModuleBuilder::new("t", "urn:t", None)
            .unwrap()
            .leaf("x", TypeSpec::typedef("missing"))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownTypedef { .. }));
    }

    #[test]
    fn list_key_must_be_a_child_leaf() {
        let err = ModuleBuilder::new("t", "urn:t", None)
            .unwrap()
            .list("entries", ["id"], |l| l.leaf("name", TypeSpec::string()))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidKey { .. }));
    }

    #[test]
    fn imported_typedefs_resolve_by_prefix() {
        let types = ModuleBuilder::new("types", "urn:types", None)
            .unwrap()
            .prefix("ty")
            .typedef("counter", TypeSpec::uint32())
            .build()
            .unwrap();
        let user = ModuleBuilder::new("user", "urn:user", None)
            .unwrap()
            .import(&types)
            .leaf("hits", TypeSpec::typedef("ty:counter"))
            .build()
            .unwrap();

        assert_eq!(user.imports, vec!["types".to_string()]);
        let leaf = &user.data[0];
        assert_eq!(
            leaf.type_def().unwrap().qname,
            types.qname_module.qname("counter").unwrap()
        );
    }
}
