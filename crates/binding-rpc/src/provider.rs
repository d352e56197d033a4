//! RPC implementations and their registration
//!
//! [`DomRpcImplementation`] is the generic side of an operation.
//! [`DomRpcProviderService`] accepts implementations for a set of
//! [`DomRpcIdentifier`]s and hands back an [`RpcRegistration`] that removes
//! them again. [`RpcRouter`] is the in-memory provider, and
//! [`BindingRpcProvider`] registers typed services through adapters.

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;
use yang_binding::BindingCodecRegistry;

use crate::adapter::BindingRpcAdapter;
use crate::config::{AdapterConfig, ConfigValidationError};
use crate::error::{RpcError, RpcResult};
use crate::input::{DomRpcIdentifier, DomRpcInput};
use crate::result::DomRpcResult;
use crate::service::RpcService;

/// Generic implementation of one or more operations.
///
/// The returned future completes independently of the calling thread.
/// Dropping it only detaches the caller; work already started may continue.
pub trait DomRpcImplementation: Send + Sync {
    fn invoke_rpc(
        &self,
        rpc: &DomRpcIdentifier,
        input: DomRpcInput,
    ) -> BoxFuture<'static, RpcResult<DomRpcResult>>;
}

/// Accepts RPC implementations.
pub trait DomRpcProviderService: Send + Sync {
    /// Register `implementation` for `types`.
    fn register_rpc_implementation(
        &self,
        implementation: Arc<dyn DomRpcImplementation>,
        types: Vec<DomRpcIdentifier>,
    ) -> RpcRegistration;
}

impl<P: DomRpcProviderService + ?Sized> DomRpcProviderService for Arc<P> {
    fn register_rpc_implementation(
        &self,
        implementation: Arc<dyn DomRpcImplementation>,
        types: Vec<DomRpcIdentifier>,
    ) -> RpcRegistration {
        (**self).register_rpc_implementation(implementation, types)
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Handle of a registered implementation.
///
/// The implementation is unregistered by [`close`](Self::close) or when the
/// handle is dropped.
pub struct RpcRegistration {
    id: Uuid,
    types: Vec<DomRpcIdentifier>,
    on_close: Option<Box<dyn FnOnce() + Send>>,
}

impl RpcRegistration {
    pub fn new(
        id: Uuid,
        types: Vec<DomRpcIdentifier>,
        on_close: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            id,
            types,
            on_close: Some(Box::new(on_close)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Identifiers covered by this registration.
    pub fn types(&self) -> &[DomRpcIdentifier] {
        &self.types
    }

    pub fn is_closed(&self) -> bool {
        self.on_close.is_none()
    }

    /// Unregister the implementation.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(on_close) = self.on_close.take() {
            trace!(registration = %self.id, "Closing RPC registration");
            on_close();
        }
    }
}

impl Drop for RpcRegistration {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for RpcRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcRegistration")
            .field("id", &self.id)
            .field("types", &self.types)
            .field("closed", &self.is_closed())
            .finish()
    }
}

// =============================================================================
// Router
// =============================================================================

struct RegisteredImplementation {
    registration: Uuid,
    implementation: Arc<dyn DomRpcImplementation>,
}

type ImplementationTable = DashMap<DomRpcIdentifier, RegisteredImplementation>;

/// In-memory provider routing invocations to registered implementations.
///
/// An invocation with a context path falls back to the implementation
/// registered without one.
#[derive(Clone, Default)]
pub struct RpcRouter {
    implementations: Arc<ImplementationTable>,
}

impl RpcRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an invocation of `rpc` would find an implementation.
    pub fn is_available(&self, rpc: &DomRpcIdentifier) -> bool {
        self.lookup(rpc).is_some()
    }

    /// Registered identifiers.
    pub fn operations(&self) -> Vec<DomRpcIdentifier> {
        self.implementations
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    fn lookup(&self, rpc: &DomRpcIdentifier) -> Option<Arc<dyn DomRpcImplementation>> {
        let found = self.implementations.get(rpc).or_else(|| {
            rpc.context()
                .and_then(|_| self.implementations.get(&rpc.global()))
        })?;
        Some(Arc::clone(&found.implementation))
    }
}

fn unregister(table: &Weak<ImplementationTable>, registration: Uuid, types: &[DomRpcIdentifier]) {
    let Some(table) = table.upgrade() else {
        return;
    };
    for rpc in types {
        if table
            .remove_if(rpc, |_, registered| registered.registration == registration)
            .is_some()
        {
            debug!(operation = %rpc, "Unregistered RPC implementation");
        }
    }
}

impl DomRpcProviderService for RpcRouter {
    fn register_rpc_implementation(
        &self,
        implementation: Arc<dyn DomRpcImplementation>,
        types: Vec<DomRpcIdentifier>,
    ) -> RpcRegistration {
        let id = Uuid::now_v7();
        for rpc in &types {
            let previous = self.implementations.insert(
                rpc.clone(),
                RegisteredImplementation {
                    registration: id,
                    implementation: Arc::clone(&implementation),
                },
            );
            if previous.is_some() {
                warn!(operation = %rpc, "Replacing registered RPC implementation");
            }
        }
        debug!(registration = %id, operations = types.len(), "Registered RPC implementation");

        let table = Arc::downgrade(&self.implementations);
        let registered = types.clone();
        RpcRegistration::new(id, types, move || unregister(&table, id, &registered))
    }
}

impl DomRpcImplementation for RpcRouter {
    fn invoke_rpc(
        &self,
        rpc: &DomRpcIdentifier,
        input: DomRpcInput,
    ) -> BoxFuture<'static, RpcResult<DomRpcResult>> {
        match self.lookup(rpc) {
            Some(implementation) => implementation.invoke_rpc(rpc, input),
            None => {
                debug!(operation = %rpc, "No RPC implementation registered");
                future::ready(Err(RpcError::operation_not_found(rpc.operation()))).boxed()
            }
        }
    }
}

impl fmt::Debug for RpcRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcRouter")
            .field("operations", &self.implementations.len())
            .finish()
    }
}

// =============================================================================
// Forwarding
// =============================================================================

/// Provider that hands every registration to a delegate.
///
/// Wrap a provider in this to observe or extend registrations without
/// changing where they end up.
#[derive(Debug, Clone)]
pub struct ForwardingRpcProviderService<P> {
    delegate: P,
}

impl<P: DomRpcProviderService> ForwardingRpcProviderService<P> {
    pub fn new(delegate: P) -> Self {
        Self { delegate }
    }

    pub fn delegate(&self) -> &P {
        &self.delegate
    }
}

impl<P: DomRpcProviderService> DomRpcProviderService for ForwardingRpcProviderService<P> {
    fn register_rpc_implementation(
        &self,
        implementation: Arc<dyn DomRpcImplementation>,
        types: Vec<DomRpcIdentifier>,
    ) -> RpcRegistration {
        trace!(operations = types.len(), "Forwarding RPC registration");
        self.delegate.register_rpc_implementation(implementation, types)
    }
}

// =============================================================================
// Binding Provider
// =============================================================================

/// Registers typed services with a generic provider.
pub struct BindingRpcProvider<P> {
    registry: Arc<BindingCodecRegistry>,
    provider: P,
    config: AdapterConfig,
}

impl<P: DomRpcProviderService> BindingRpcProvider<P> {
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(
        registry: Arc<BindingCodecRegistry>,
        provider: P,
        config: AdapterConfig,
    ) -> Result<Self, ConfigValidationError> {
        config.validate()?;
        Ok(Self {
            registry,
            provider,
            config,
        })
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Register every operation of the service's module that the service
    /// has a method for.
    ///
    /// # Errors
    ///
    /// Returns `UNAVAILABLE` when no codec context is installed or the
    /// service's module is not part of it.
    #[instrument(skip_all, fields(module = %service.qname_module()))]
    pub fn register_service<S: RpcService>(&self, service: Arc<S>) -> RpcResult<RpcRegistration> {
        let adapter = BindingRpcAdapter::new(Arc::clone(&self.registry), service, self.config.clone())
            .map_err(|e| RpcError::internal(e.to_string()))?;
        let context = self.registry.snapshot()?;
        let types = adapter.operations(&context)?;
        if types.is_empty() {
            warn!("Service implements no operation of its module");
        }
        info!(operations = types.len(), "Registering binding RPC service");
        Ok(self
            .provider
            .register_rpc_implementation(Arc::new(adapter), types))
    }
}
