//! Type-generation engine
//!
//! Produces a descriptor for every named type of a [`SchemaContext`]:
//! typedefs (wrappers, enumerations, unions, bits), records for data nodes,
//! RPC input and output, augmentations and identities.
//!
//! Modules are processed so every module follows the modules it imports,
//! and within a module typedefs are processed by increasing derivation
//! depth, so a type is always generated after the types it refers to.
//!
//! # Example
//! ```rust,ignore
//! let types = BindingGenerator::generate(&schema)?;
//! let top = types.data_type(&top_path).unwrap();
//! assert_eq!(top.name.name(), "ContainerTop");
//! ```

mod data;
pub mod descriptor;
pub mod naming;
mod sort;
mod typedefs;

pub use descriptor::{
    Constant, ConstantValue, EnumValue, EnumerationType, GeneratedType, PATTERN_CONSTANT_NAME,
    Pattern, Property, PropertyType, RecordKind, RecordType, VALUE_PROPERTY,
};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::qname::QName;
use crate::schema::{SchemaContext, SchemaPath};
use crate::type_ref::TypeName;

use typedefs::TypeProvider;

/// Errors raised while generating types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    /// The schema is internally inconsistent
    #[error("malformed schema: {0}")]
    MalformedSchema(String),
    /// An identityref names an identity no module declares
    #[error("identity {0} not found")]
    IdentityNotFound(QName),
    /// Modules import each other in a cycle
    #[error("circular import: {}", .0.join(" -> "))]
    CircularImport(Vec<String>),
    /// A pattern restriction is not a valid regular expression
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    /// A module is referenced but missing from the context
    #[error("unknown module '{0}'")]
    UnknownModule(String),
}

/// Result type alias for generation.
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Every descriptor generated for one schema context.
#[derive(Debug, Clone, Default)]
pub struct GeneratedTypes {
    typedefs: HashMap<String, BTreeMap<String, GeneratedType>>,
    data: HashMap<SchemaPath, Arc<RecordType>>,
    inline: HashMap<SchemaPath, GeneratedType>,
    identities: HashMap<QName, Arc<RecordType>>,
    augmentations: Vec<Arc<RecordType>>,
    by_name: HashMap<TypeName, GeneratedType>,
}

impl GeneratedTypes {
    /// Descriptor of a typedef, by module name and typedef local name.
    pub fn typedef(&self, module: &str, local_name: &str) -> Option<&GeneratedType> {
        self.typedefs.get(module)?.get(local_name)
    }

    /// Typedef descriptors of one module, ordered by typedef name.
    pub fn module_typedefs(&self, module: &str) -> impl Iterator<Item = (&str, &GeneratedType)> {
        self.typedefs
            .get(module)
            .into_iter()
            .flat_map(|table| table.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Record of the container, list, or RPC input or output at `path`.
    pub fn data_type(&self, path: &SchemaPath) -> Option<&Arc<RecordType>> {
        self.data.get(path)
    }

    /// Inline enumeration, union or bits type declared by the leaf at
    /// `leaf_path`.
    pub fn referenced_type(&self, leaf_path: &SchemaPath) -> Option<&GeneratedType> {
        self.inline.get(leaf_path)
    }

    /// Record of an identity.
    pub fn identity(&self, qname: &QName) -> Option<&Arc<RecordType>> {
        self.identities.get(qname)
    }

    /// Augmentation records in generation order.
    pub fn augmentations(&self) -> &[Arc<RecordType>] {
        &self.augmentations
    }

    /// Any generated type, enclosed types included, by name.
    pub fn by_name(&self, name: &TypeName) -> Option<&GeneratedType> {
        self.by_name.get(name)
    }

    /// Data records keyed by schema path.
    pub fn data_types(&self) -> impl Iterator<Item = (&SchemaPath, &Arc<RecordType>)> {
        self.data.iter()
    }

    /// Number of distinct named types.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn index(&mut self, generated: &GeneratedType) {
        if self.by_name.contains_key(generated.name()) {
            return;
        }
        self.by_name
            .insert(generated.name().clone(), generated.clone());
        if let Some(record) = generated.as_record() {
            for enclosed in &record.enclosed {
                self.index(enclosed);
            }
        }
    }
}

/// Entry point of type generation.
pub struct BindingGenerator;

impl BindingGenerator {
    /// Generate descriptors for every module of `schema`.
    #[instrument(skip_all, fields(modules = schema.modules().len()))]
    pub fn generate(schema: &SchemaContext) -> GeneratorResult<GeneratedTypes> {
        let order = sort::sort_modules(schema)?;
        let mut provider = TypeProvider::new(schema);

        for module in order {
            provider.generate_typedefs(module)?;
            provider.generate_module_data(module)?;
        }

        let mut types = GeneratedTypes {
            typedefs: provider.typedefs,
            data: provider.data_types,
            inline: provider.inline_types,
            identities: provider.identities,
            augmentations: provider.augmentations,
            by_name: HashMap::new(),
        };

        let mut all: Vec<GeneratedType> = Vec::new();
        all.extend(types.typedefs.values().flat_map(|t| t.values().cloned()));
        all.extend(types.data.values().cloned().map(GeneratedType::Record));
        all.extend(types.augmentations.iter().cloned().map(GeneratedType::Record));
        all.extend(types.identities.values().cloned().map(GeneratedType::Record));
        all.extend(types.inline.values().cloned());
        for generated in &all {
            types.index(generated);
        }

        debug!(types = types.len(), "Generated binding types");
        Ok(types)
    }
}
