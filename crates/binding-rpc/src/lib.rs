//! # Binding RPC
//!
//! Exposes typed binding services as schema-generic RPC implementations.
//!
//! ## Overview
//!
//! - **Services**: an [`RpcService`] registers one async method per
//!   operation, named after the operation in lower camelCase
//! - **Adapter**: [`BindingRpcAdapter`] decodes generic input with the codec
//!   registry, runs the method off the caller and encodes the output lazily
//! - **Providers**: [`RpcRouter`] routes invocations to registered
//!   implementations, [`BindingRpcProvider`] registers typed services
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use binding_rpc::prelude::*;
//!
//! let router = Arc::new(RpcRouter::new());
//! let provider = BindingRpcProvider::new(registry.clone(), router.clone(), AdapterConfig::default())?;
//! let _registration = provider.register_service(Arc::new(ResetService::new()))?;
//!
//! let result = router
//!     .invoke_rpc(&DomRpcIdentifier::new(reset_qname), input_node.into())
//!     .await?;
//! let output = result.result()?;
//! ```

mod adapter;
mod config;
mod error;
mod input;
mod outcome;
mod provider;
mod result;
mod service;

#[cfg(test)]
mod tests;

pub use adapter::BindingRpcAdapter;
pub use config::{AdapterConfig, ConfigValidationError, SpawnPolicy};
pub use error::{ErrorConfig, RpcError, RpcErrorCode, RpcResult};
pub use input::{DomRpcIdentifier, DomRpcInput, LazySerializedContainerNode};
pub use outcome::{ErrorSeverity, ErrorType, OperationError, RpcOutcome};
pub use provider::{
    BindingRpcProvider, DomRpcImplementation, DomRpcProviderService,
    ForwardingRpcProviderService, RpcRegistration, RpcRouter,
};
pub use result::{DomRpcResult, LazySerializedRpcResult};
pub use service::{MethodFuture, RpcService, RpcServiceInvoker};

/// Prelude for convenient imports
///
/// ```rust,ignore
/// use binding_rpc::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AdapterConfig, BindingRpcProvider, DomRpcIdentifier, DomRpcImplementation, DomRpcInput,
        DomRpcProviderService, DomRpcResult, OperationError, RpcError, RpcErrorCode, RpcOutcome,
        RpcResult, RpcRouter, RpcService, RpcServiceInvoker,
    };
    pub use std::sync::Arc;
}
