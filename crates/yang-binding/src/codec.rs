//! Codecs between facade objects and the generic tree
//!
//! [`BindingRuntimeContext`] binds generated records to schema nodes.
//! [`BindingCodecRegistry`] holds the active [`CodecContext`], synthesizes a
//! [`DataObjectCodec`] per record type on first use and answers path and
//! object translation queries.
//!
//! Facade objects are converted through their serde property tree:
//! properties use the generated property names, unset properties are absent
//! or null, and augmentation data sits under `"augmentations"` keyed by the
//! augmentation type name.

mod context;
mod error;
mod metrics;
mod registry;
mod unit;
mod value;

pub use context::{BindingRuntimeContext, BoundChild, BoundNode, ChildShape, RpcBinding};
pub use error::{CodecError, CodecResult};
pub use metrics::{CodecMetrics, CodecStats};
pub use registry::{BindingCodecRegistry, CodecContext};
pub use unit::{AUGMENTATIONS_PROPERTY, DataObjectCodec};
pub use value::{ValueCodec, ValueScope};
