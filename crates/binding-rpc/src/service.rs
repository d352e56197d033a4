//! Typed RPC services and their method tables
//!
//! A service type registers one async method per operation it implements.
//! Methods are looked up by the lower camelCase form of the operation's
//! local name, so operation `reset-all` is served by method `resetAll`.
//!
//! ```rust,ignore
//! impl RpcService for ResetService {
//!     fn qname_module(&self) -> QNameModule {
//!         self.module.clone()
//!     }
//!
//!     fn register_methods(invoker: &mut RpcServiceInvoker<Self>) {
//!         invoker.method("reset", |service: Arc<Self>, input: ResetInput| async move {
//!             service.reset(input).await
//!         });
//!     }
//! }
//! ```

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{trace, warn};
use yang_binding::QName;
use yang_binding::QNameModule;
use yang_binding::generator::naming::method_name;

use crate::error::{RpcError, RpcErrorCode, RpcResult};
use crate::outcome::RpcOutcome;

/// A typed service implementing operations of one schema module.
pub trait RpcService: Send + Sync + Sized + 'static {
    /// Module whose operations this service implements.
    fn qname_module(&self) -> QNameModule;

    /// Register the methods of this service type.
    fn register_methods(invoker: &mut RpcServiceInvoker<Self>);
}

/// Future returned by an erased service method.
pub type MethodFuture = BoxFuture<'static, RpcResult<RpcOutcome<serde_json::Value>>>;

/// Erased service method over property trees.
type BoxedMethod<S> = Arc<dyn Fn(Arc<S>, serde_json::Value) -> MethodFuture + Send + Sync>;

/// Method table of a service type.
pub struct RpcServiceInvoker<S> {
    methods: HashMap<String, BoxedMethod<S>>,
}

impl<S: RpcService> RpcServiceInvoker<S> {
    /// Build the method table declared by `S`.
    pub fn from_service() -> Self {
        let mut invoker = Self {
            methods: HashMap::new(),
        };
        S::register_methods(&mut invoker);
        trace!(methods = invoker.methods.len(), "Built service method table");
        invoker
    }

    /// Register a method.
    ///
    /// The input is deserialized from the facade property tree of the
    /// operation input (`null` when the operation has none, which `()`
    /// accepts). The result is serialized back into a property tree.
    pub fn method<I, O, F, Fut>(&mut self, name: impl Into<String>, method: F) -> &mut Self
    where
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(Arc<S>, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcResult<RpcOutcome<O>>> + Send + 'static,
    {
        let name = name.into();
        let method = Arc::new(method);
        let boxed: BoxedMethod<S> = Arc::new(move |service: Arc<S>, input: serde_json::Value| {
            let method = method.clone();
            async move {
                let input: I = serde_json::from_value(input).map_err(|e| {
                    warn!(error = %e, "Service input does not match the method signature");
                    RpcError::new(RpcErrorCode::DecodeFailed, "input does not match method")
                        .with_cause(e.to_string())
                })?;
                let outcome = method(service, input).await?;
                outcome.try_map(serde_json::to_value).map_err(|e| {
                    RpcError::new(RpcErrorCode::EncodeFailed, "cannot serialize method result")
                        .with_cause(e.to_string())
                })
            }
            .boxed()
        });
        if self.methods.insert(name.clone(), boxed).is_some() {
            warn!(method = %name, "Replacing previously registered method");
        }
        self
    }

    /// Whether a method serves `operation`.
    pub fn serves(&self, operation: &QName) -> bool {
        self.methods.contains_key(&method_name(operation.local_name()))
    }

    /// Registered method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Start the method serving `operation`.
    ///
    /// # Errors
    ///
    /// Returns `OPERATION_NOT_FOUND` when no method matches.
    pub fn invoke(
        &self,
        service: Arc<S>,
        operation: &QName,
        input: serde_json::Value,
    ) -> RpcResult<MethodFuture> {
        let name = method_name(operation.local_name());
        let method = self
            .methods
            .get(&name)
            .ok_or_else(|| RpcError::operation_not_found(operation))?;
        trace!(method = %name, "Invoking service method");
        Ok(method(service, input))
    }
}
