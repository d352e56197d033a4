//! Binding RPC adapter
//!
//! [`BindingRpcAdapter`] exposes a typed [`RpcService`] as a
//! [`DomRpcImplementation`]. An invocation goes through these steps:
//!
//! 1. Pin the active codec context and look up the operation's input and
//!    output types.
//! 2. Take the facade input attached to a lazy input node, or decode the
//!    generic input node.
//! 3. Run the service method, on its own task by default.
//! 4. Wrap the outcome in a [`LazySerializedRpcResult`], so the output is
//!    encoded only when the result node is read.
//!
//! Failures raised by the service are reported as `INVOCATION_FAILED`.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{Instrument, debug, instrument, trace, warn};
use yang_binding::{BindingCodecRegistry, CodecContext, QName, QNameModule, TypeRef};
use yang_binding::codec::RpcBinding;

use crate::config::{AdapterConfig, ConfigValidationError, SpawnPolicy};
use crate::error::{RpcError, RpcErrorCode, RpcResult};
use crate::input::{DomRpcIdentifier, DomRpcInput};
use crate::outcome::RpcOutcome;
use crate::provider::DomRpcImplementation;
use crate::result::{DomRpcResult, LazySerializedRpcResult};
use crate::service::{MethodFuture, RpcService, RpcServiceInvoker};

/// A service call that is ready to run.
struct PreparedCall {
    context: Arc<CodecContext>,
    output: Option<TypeRef>,
    call: MethodFuture,
    permit: OwnedSemaphorePermit,
}

/// Adapter from a typed service to generic RPC invocations.
pub struct BindingRpcAdapter<S: RpcService> {
    registry: Arc<BindingCodecRegistry>,
    invoker: RpcServiceInvoker<S>,
    service: Arc<S>,
    module: QNameModule,
    config: AdapterConfig,
    permits: Arc<Semaphore>,
}

impl<S: RpcService> BindingRpcAdapter<S> {
    /// Create an adapter for `service`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(
        registry: Arc<BindingCodecRegistry>,
        service: Arc<S>,
        config: AdapterConfig,
    ) -> Result<Self, ConfigValidationError> {
        config.validate()?;
        let module = service.qname_module();
        let invoker = RpcServiceInvoker::from_service();
        debug!(
            module = %module,
            methods = ?invoker.method_names(),
            "Created binding RPC adapter"
        );
        Ok(Self {
            registry,
            invoker,
            service,
            permits: Arc::new(Semaphore::new(config.max_in_flight)),
            module,
            config,
        })
    }

    /// Module whose operations the service implements.
    pub fn qname_module(&self) -> &QNameModule {
        &self.module
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Operations of the service module that have a matching method.
    ///
    /// # Errors
    ///
    /// Returns `UNAVAILABLE` if the module is not part of `context`.
    pub fn operations(&self, context: &CodecContext) -> RpcResult<Vec<DomRpcIdentifier>> {
        let module = context
            .runtime()
            .schema()
            .find_module_by_namespace(&self.module)
            .ok_or_else(|| {
                RpcError::unavailable(format!("module {} is not in the schema context", self.module))
            })?;
        Ok(module
            .rpcs
            .iter()
            .filter(|rpc| self.invoker.serves(&rpc.qname))
            .map(|rpc| DomRpcIdentifier::new(rpc.qname.clone()))
            .collect())
    }

    #[instrument(skip(self, input), fields(operation = %rpc.operation()))]
    fn prepare(&self, rpc: &DomRpcIdentifier, input: DomRpcInput) -> RpcResult<PreparedCall> {
        let operation = rpc.operation();
        if operation.module() != &self.module {
            return Err(RpcError::operation_not_found(operation));
        }

        let context = self.registry.snapshot()?;
        let binding = context
            .runtime()
            .rpc(operation)
            .cloned()
            .ok_or_else(|| RpcError::operation_not_found(operation))?;
        let input = binding_input(&context, &binding, operation, input)?;

        let permit = Arc::clone(&self.permits).try_acquire_owned().map_err(|_| {
            warn!(limit = self.config.max_in_flight, "Invocation limit reached");
            RpcError::unavailable("too many invocations in flight")
        })?;
        let call = self
            .invoker
            .invoke(Arc::clone(&self.service), operation, input)?;

        Ok(PreparedCall {
            context,
            output: binding.output,
            call,
            permit,
        })
    }
}

/// Facade input of an invocation.
fn binding_input(
    context: &CodecContext,
    binding: &RpcBinding,
    operation: &QName,
    input: DomRpcInput,
) -> RpcResult<serde_json::Value> {
    match input {
        DomRpcInput::Empty => Ok(serde_json::Value::Null),
        DomRpcInput::Lazy(lazy) => {
            let data = lazy.binding_data();
            if binding.input.as_ref() != Some(&data.type_ref()) {
                return Err(RpcError::new(
                    RpcErrorCode::DecodeFailed,
                    format!("{} is not the input of {operation}", data.type_ref()),
                ));
            }
            trace!("Using facade shortcut of lazy input");
            data.to_json().map_err(|e| {
                RpcError::new(RpcErrorCode::DecodeFailed, "cannot read facade input")
                    .with_cause(e.to_string())
            })
        }
        DomRpcInput::Node(node) => {
            let Some(input_type) = &binding.input else {
                return Err(RpcError::new(
                    RpcErrorCode::DecodeFailed,
                    format!("operation {operation} takes no input"),
                ));
            };
            context
                .decode_as(&node, input_type)
                .map_err(|e| RpcError::decode_failed(&e))
        }
    }
}

/// Run a service call according to `policy`.
///
/// The permit is released when the call finishes, even if the caller has
/// stopped waiting for it.
async fn run(
    policy: SpawnPolicy,
    operation: &QName,
    call: MethodFuture,
    permit: OwnedSemaphorePermit,
) -> RpcResult<RpcOutcome<serde_json::Value>> {
    let call = async move {
        let _permit = permit;
        call.await
    };
    let handle = match policy {
        SpawnPolicy::Spawn => Handle::try_current().ok(),
        SpawnPolicy::Inline => None,
    };
    match handle {
        Some(handle) => handle
            .spawn(call)
            .await
            .unwrap_or_else(|e| Err(RpcError::invocation_failed(operation, e))),
        None => AssertUnwindSafe(call)
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(RpcError::invocation_failed(operation, "service method panicked"))),
    }
}

impl<S: RpcService> DomRpcImplementation for BindingRpcAdapter<S> {
    fn invoke_rpc(
        &self,
        rpc: &DomRpcIdentifier,
        input: DomRpcInput,
    ) -> BoxFuture<'static, RpcResult<DomRpcResult>> {
        let operation = rpc.operation().clone();
        let errors = self.config.error_config();
        let policy = self.config.spawn_policy;
        let prepared = self.prepare(rpc, input);

        async move {
            let PreparedCall {
                context,
                output,
                call,
                permit,
            } = prepared?;

            let outcome = run(policy, &operation, call, permit)
                .await
                .map_err(|e| match e.code {
                    RpcErrorCode::DecodeFailed
                    | RpcErrorCode::EncodeFailed
                    | RpcErrorCode::InvocationFailed => e,
                    _ => RpcError::invocation_failed(&operation, &e),
                })?;
            trace!(successful = outcome.is_successful(), "Service method completed");

            Ok(LazySerializedRpcResult::new(outcome, output, context).into())
        }
        .map(move |result: RpcResult<DomRpcResult>| {
            result.map_err(|e| {
                warn!(error_code = %e.code, error_message = %e.message, "RPC invocation failed");
                e.apply_config(&errors)
            })
        })
        .in_current_span()
        .boxed()
    }
}
