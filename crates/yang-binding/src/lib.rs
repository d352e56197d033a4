//! # YANG Binding
//!
//! Typed facade objects over schema-generic data trees.
//!
//! ## Overview
//!
//! - **Identifiers**: [`InstanceIdentifier`] addresses facade subtrees with
//!   shared, immutable argument chains
//! - **Schema model**: [`SchemaContext`] and its builders describe modules,
//!   types, data nodes, identities, RPCs and augmentations
//! - **Type generation**: [`BindingGenerator`] produces a descriptor for
//!   every named schema type with stable names
//! - **Codecs**: [`BindingCodecRegistry`] converts facade objects and
//!   identifiers to and from [`NormalizedNode`] trees and
//!   [`YangInstanceIdentifier`] paths
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use yang_binding::prelude::*;
//!
//! let schema = Arc::new(SchemaContext::new([top_module])?);
//! let registry = BindingCodecRegistry::new(CodecConfig::default())?;
//! registry.update_schema(schema)?;
//!
//! let id = InstanceIdentifier::builder_for(Top::binding_type())
//!     .child_keyed(TopLevelList::binding_type(), Key::single("name", "foo"))
//!     .build()?;
//! let path = registry.to_generic_path(&id)?;
//! assert_eq!(registry.from_generic_path(&path)?, id);
//! ```

pub mod codec;
mod config;
pub mod generator;
pub mod identifier;
pub mod node;
mod object;
pub mod qname;
pub mod schema;
mod type_ref;

#[cfg(test)]
mod tests;

pub use codec::{
    BindingCodecRegistry, BindingRuntimeContext, CodecContext, CodecError, CodecResult,
    CodecStats, DataObjectCodec,
};
pub use config::{CodecConfig, ConfigValidationError};
pub use generator::{BindingGenerator, GeneratedType, GeneratedTypes, GeneratorError, RecordType};
pub use identifier::{
    IdentifierError, IdentifierResult, InstanceIdentifier, InstanceIdentifierBuilder, Key,
    KeyedInstanceIdentifier, PathArgument,
};
pub use node::{LeafValue, NormalizedNode, PathStep, YangInstanceIdentifier};
pub use object::{DataObject, DynDataObject, downcast_ref};
pub use qname::{QName, QNameError, QNameModule};
pub use schema::{ModuleBuilder, SchemaContext, SchemaError, SchemaPath, TypeSpec};
pub use type_ref::{TypeName, TypeRef};

/// Prelude for convenient imports
///
/// ```rust,ignore
/// use yang_binding::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BindingCodecRegistry, BindingRuntimeContext, CodecConfig, CodecError, DataObject,
        InstanceIdentifier, Key, LeafValue, ModuleBuilder, NormalizedNode, QName, QNameModule,
        SchemaContext, TypeRef, TypeSpec, YangInstanceIdentifier,
    };
}
