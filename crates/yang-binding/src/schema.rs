//! Schema context model
//!
//! The resolved view of a set of schema modules: type definitions, data
//! nodes, identities, RPCs and augmentations, each addressed by [`QName`] and
//! [`SchemaPath`]. Parsing schema sources is not done here; a parser, or a
//! test, fills the model through [`ModuleBuilder`].
//!
//! # Example
//! ```rust,ignore
//! use yang_binding::schema::{ModuleBuilder, SchemaContext, TypeSpec};
//!
//! let top = ModuleBuilder::new("top", "urn:test:top", Some("2015-11-12"))?
//!     .container("container-top", |c| {
//!         c.leaf("name", TypeSpec::string())
//!             .list("top-level-list", ["name"], |l| l.leaf("name", TypeSpec::string()))
//!     })
//!     .build()?;
//! let context = SchemaContext::new([top])?;
//! ```

mod builder;
mod node;
mod path;
mod types;

pub use builder::{DataNodeBuilder, ModuleBuilder, RpcBuilder, TypeSpec};
pub use node::{
    AugmentationSchema, ContainerSchema, DataSchemaNode, IdentitySchema, LeafListSchema,
    LeafSchema, ListSchema, RpcSchema,
};
pub use path::{PathExpression, PathSegment, SchemaPath};
pub use types::{Bit, BuiltinType, EnumPair, TypeDefinition, TypeKind};

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::qname::{QName, QNameError, QNameModule};

/// Errors raised while assembling schema modules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A name could not be constructed
    #[error(transparent)]
    InvalidName(#[from] QNameError),
    /// A typedef reference did not resolve
    #[error("module '{module}' references unknown typedef '{name}'")]
    UnknownTypedef { module: String, name: String },
    /// A prefix is neither the module's own nor an import
    #[error("module '{module}' uses unknown prefix '{prefix}'")]
    UnknownPrefix { module: String, prefix: String },
    /// A path expression could not be parsed or resolved
    #[error("module '{module}' has invalid path '{path}'")]
    InvalidPath { module: String, path: String },
    /// A list key names a leaf the list does not have
    #[error("list {list} declares key '{key}' which is not a child leaf")]
    InvalidKey { list: String, key: String },
    /// Two modules share a name
    #[error("module '{0}' is defined more than once")]
    DuplicateModule(String),
    /// An import names a module missing from the context
    #[error("module '{module}' imports missing module '{import}'")]
    MissingImport { module: String, import: String },
}

/// Result type alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// One schema module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub qname_module: QNameModule,
    pub prefix: String,
    /// Names of imported modules
    pub imports: Vec<String>,
    /// Prefixes usable inside this module, its own included
    pub prefixes: BTreeMap<String, QNameModule>,
    pub typedefs: Vec<TypeDefinition>,
    pub data: Vec<DataSchemaNode>,
    pub identities: Vec<IdentitySchema>,
    pub rpcs: Vec<RpcSchema>,
    pub augmentations: Vec<AugmentationSchema>,
}

impl Module {
    /// Module a prefix stands for. No prefix means this module.
    pub fn resolve_prefix(&self, prefix: Option<&str>) -> Option<&QNameModule> {
        match prefix {
            None => Some(&self.qname_module),
            Some(p) => self.prefixes.get(p),
        }
    }

    /// Typedef by local name.
    pub fn find_typedef(&self, local_name: &str) -> Option<&TypeDefinition> {
        self.typedefs
            .iter()
            .find(|t| t.qname.local_name() == local_name)
    }

    /// Top-level data node by node type.
    pub fn find_data_child(&self, qname: &QName) -> Option<&DataSchemaNode> {
        self.data.iter().find(|n| n.qname() == qname)
    }
}

/// The resolved set of modules.
#[derive(Debug, Clone, Default)]
pub struct SchemaContext {
    modules: Vec<Arc<Module>>,
}

impl SchemaContext {
    /// Assemble a context, checking module names are unique and imports
    /// are present.
    pub fn new(modules: impl IntoIterator<Item = Module>) -> SchemaResult<Self> {
        let modules: Vec<Arc<Module>> = modules.into_iter().map(Arc::new).collect();

        let mut names = HashSet::new();
        for module in &modules {
            if !names.insert(module.name.as_str()) {
                return Err(SchemaError::DuplicateModule(module.name.clone()));
            }
        }
        for module in &modules {
            for import in &module.imports {
                if !names.contains(import.as_str()) {
                    return Err(SchemaError::MissingImport {
                        module: module.name.clone(),
                        import: import.clone(),
                    });
                }
            }
        }

        debug!(modules = modules.len(), "Assembled schema context");
        Ok(Self { modules })
    }

    /// All modules in insertion order.
    pub fn modules(&self) -> &[Arc<Module>] {
        &self.modules
    }

    /// Module by name.
    pub fn find_module(&self, name: &str) -> Option<&Arc<Module>> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Module by namespace and revision.
    pub fn find_module_by_namespace(&self, module: &QNameModule) -> Option<&Arc<Module>> {
        self.modules.iter().find(|m| &m.qname_module == module)
    }

    /// Identity by name.
    pub fn find_identity(&self, qname: &QName) -> Option<&IdentitySchema> {
        self.find_module_by_namespace(qname.module())?
            .identities
            .iter()
            .find(|i| &i.qname == qname)
    }

    /// RPC by name.
    pub fn find_rpc(&self, qname: &QName) -> Option<&RpcSchema> {
        self.find_module_by_namespace(qname.module())?
            .rpcs
            .iter()
            .find(|r| &r.qname == qname)
    }

    /// Augmentations, from any module, that target the given node.
    pub fn augmentations_of(&self, target: &SchemaPath) -> Vec<(&Arc<Module>, &AugmentationSchema)> {
        self.modules
            .iter()
            .flat_map(|module| {
                module
                    .augmentations
                    .iter()
                    .filter(|a| &a.target == target)
                    .map(move |a| (module, a))
            })
            .collect()
    }

    /// Child of the node at `parent` (or a top-level node when `parent` is
    /// the root), including children added by augmentations.
    pub fn find_child(&self, parent: &SchemaPath, qname: &QName) -> Option<&DataSchemaNode> {
        if parent.is_empty() {
            return self
                .find_module_by_namespace(qname.module())?
                .find_data_child(qname);
        }
        let node = self.find_data_node(parent)?;
        node.find_child(qname).or_else(|| {
            self.augmentations_of(parent)
                .into_iter()
                .flat_map(|(_, aug)| aug.children.iter())
                .find(|c| c.qname() == qname)
        })
    }

    /// Data node at a schema path.
    pub fn find_data_node(&self, path: &SchemaPath) -> Option<&DataSchemaNode> {
        let (first, rest) = path.steps().split_first()?;
        let mut current = self
            .find_module_by_namespace(first.module())?
            .find_data_child(first)?;
        let mut walked = SchemaPath::create([first.clone()]);

        for step in rest {
            let next = match current.find_child(step) {
                Some(child) => child,
                None => self
                    .augmentations_of(&walked)
                    .into_iter()
                    .flat_map(|(_, aug)| aug.children.iter())
                    .find(|c| c.qname() == step)?,
            };
            walked = walked.child(step.clone());
            current = next;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top_module() -> Module {
        ModuleBuilder::new("top", "urn:test:top", Some("2015-11-12"))
            .unwrap()
            .prefix("top")
            .container("container-top", |c| {
                c.leaf("name", TypeSpec::string())
                    .list("top-level-list", ["name"], |l| {
                        l.leaf("name", TypeSpec::string())
                    })
            })
            .build()
            .unwrap()
    }

    #[test]
    fn finds_nested_data_nodes() {
        let ctx = SchemaContext::new([top_module()]).unwrap();
        let module = ctx.find_module("top").unwrap().clone();
        let top = module.qname_module.qname("container-top").unwrap();
        let list = module.qname_module.qname("top-level-list").unwrap();

        let path = SchemaPath::create([top.clone(), list.clone()]);
        let node = ctx.find_data_node(&path).unwrap();
        assert!(matches!(node, DataSchemaNode::List(l) if l.key.len() == 1));
        assert_eq!(node.path(), &path);
        assert!(ctx.find_child(&SchemaPath::root(), &top).is_some());
    }

    #[test]
    fn rejects_duplicate_modules() {
        assert_eq!(
            SchemaContext::new([top_module(), top_module()]).unwrap_err(),
            SchemaError::DuplicateModule("top".into())
        );
    }

    #[test]
    fn augmentation_children_are_reachable() {
        let top = top_module();
        let aug = ModuleBuilder::new("aug", "urn:test:aug", None)
            .unwrap()
            .prefix("aug")
            .import(&top)
            .augment("/top:container-top", |a| a.leaf("extra", TypeSpec::int32()))
            .build()
            .unwrap();
        let extra = aug.qname_module.qname("extra").unwrap();
        let container = top.qname_module.qname("container-top").unwrap();
        let ctx = SchemaContext::new([top, aug]).unwrap();

        let found = ctx
            .find_data_node(&SchemaPath::create([container, extra.clone()]))
            .unwrap();
        assert_eq!(found.qname(), &extra);
    }
}
