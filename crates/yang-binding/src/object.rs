//! Facade objects
//!
//! A facade object is a plain Rust struct mirroring one generated record.
//! Its `serde` representation carries the record's property names, so the
//! codec can move between the facade and the generic tree through
//! [`serde_json::Value`] without per-type code.
//!
//! ```rust,ignore
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct ContainerTop {
//!     name: Option<String>,
//!     top_level_list: Option<Vec<TopLevelList>>,
//! }
//!
//! impl DataObject for ContainerTop {
//!     fn binding_type() -> TypeRef {
//!         TypeRef::of("gen.v1.urn.test.top.rev20151112", "ContainerTop")
//!     }
//! }
//! ```

use std::any::Any;
use std::fmt::Debug;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::type_ref::TypeRef;

/// A statically typed facade object.
pub trait DataObject: Serialize + DeserializeOwned + Debug + Send + Sync + 'static {
    /// The generated type this struct mirrors.
    fn binding_type() -> TypeRef;
}

/// Type-erased [`DataObject`].
pub trait DynDataObject: Debug + Send + Sync {
    /// The generated type of the object.
    fn type_ref(&self) -> TypeRef;

    /// Property tree of the object.
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;

    /// Access to the concrete type, for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T: DataObject> DynDataObject for T {
    fn type_ref(&self) -> TypeRef {
        T::binding_type()
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Downcast an erased object to a concrete facade type.
pub fn downcast_ref<T: DataObject>(object: &dyn DynDataObject) -> Option<&T> {
    object.as_any().downcast_ref::<T>()
}
