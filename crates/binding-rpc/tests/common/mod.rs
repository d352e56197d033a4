//! Schema, facade types and a device service shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use binding_rpc::{
    AdapterConfig, BindingRpcProvider, OperationError, RpcError, RpcOutcome, RpcRouter,
    RpcService, RpcServiceInvoker,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use yang_binding::node::ContainerNode;
use yang_binding::{
    BindingCodecRegistry, CodecConfig, DataObject, ModuleBuilder, NormalizedNode, QName,
    QNameModule, SchemaContext, TypeRef, TypeSpec,
};

pub const SVC_NS: &str = "urn:test:svc";
pub const SVC_REVISION: &str = "2020-01-01";
pub const SVC_PACKAGE: &str = "gen.v1.urn.test.svc.rev20200101";

pub fn svc_module() -> QNameModule {
    QNameModule::new(SVC_NS, Some(SVC_REVISION)).unwrap()
}

pub fn svc_qname(local: &str) -> QName {
    svc_module().qname(local).unwrap()
}

/// Module `svc` with one operation per service behavior, plus `unserved`
/// which the service has no method for.
pub fn schema() -> Arc<SchemaContext> {
    let svc = ModuleBuilder::new("svc", SVC_NS, Some(SVC_REVISION))
        .unwrap()
        .typedef("target-name", TypeSpec::string().pattern("[a-z]+"))
        .rpc("reset", |r| {
            r.input(|i| i.leaf("target", TypeSpec::typedef("target-name")))
                .output(|o| o.leaf("done", TypeSpec::boolean()))
        })
        .rpc("ping", |r| r)
        .rpc("explode", |r| r)
        .rpc("crash", |r| r)
        .rpc("refuse", |r| r.output(|o| o.leaf("done", TypeSpec::boolean())))
        .rpc("slow", |r| r)
        .rpc("unserved", |r| r)
        .build()
        .unwrap();
    Arc::new(SchemaContext::new([svc]).unwrap())
}

pub fn registry() -> Arc<BindingCodecRegistry> {
    let registry = BindingCodecRegistry::new(CodecConfig::default()).unwrap();
    registry.update_schema(schema()).unwrap();
    Arc::new(registry)
}

/// Router with the device service registered in development mode.
pub struct Harness {
    pub registry: Arc<BindingCodecRegistry>,
    pub router: Arc<RpcRouter>,
    pub service: Arc<DeviceService>,
    pub registration: binding_rpc::RpcRegistration,
}

pub fn harness(config: AdapterConfig) -> Harness {
    let registry = registry();
    let router = Arc::new(RpcRouter::new());
    let provider = BindingRpcProvider::new(Arc::clone(&registry), Arc::clone(&router), config).unwrap();
    let service = Arc::new(DeviceService::new());
    let registration = provider.register_service(Arc::clone(&service)).unwrap();
    Harness {
        registry,
        router,
        service,
        registration,
    }
}

/// Generic input of `reset`.
pub fn reset_input(target: &str) -> NormalizedNode {
    NormalizedNode::Container(
        ContainerNode::new(svc_qname("input"))
            .with_child(NormalizedNode::leaf(svc_qname("target"), target)),
    )
}

// =============================================================================
// Facade types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetName {
    pub value: String,
}

impl TargetName {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetInput {
    pub target: Option<TargetName>,
}

impl DataObject for ResetInput {
    fn binding_type() -> TypeRef {
        TypeRef::of(SVC_PACKAGE, "ResetInput")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetOutput {
    pub done: Option<bool>,
}

impl DataObject for ResetOutput {
    fn binding_type() -> TypeRef {
        TypeRef::of(SVC_PACKAGE, "ResetOutput")
    }
}

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Default)]
pub struct DeviceService {
    pub resets: AtomicUsize,
    pub last_target: Mutex<Option<String>>,
    pub gate: Notify,
    pub slow_done: AtomicUsize,
}

impl DeviceService {
    pub fn new() -> Self {
        Self::default()
    }

    async fn reset(&self, input: ResetInput) -> Result<RpcOutcome<ResetOutput>, RpcError> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        let target = input.target.map(|t| t.value);
        let done = target.as_deref() == Some("all");
        *self.last_target.lock().unwrap() = target;
        Ok(RpcOutcome::success(ResetOutput { done: Some(done) }))
    }

    async fn slow(&self) -> Result<RpcOutcome<()>, RpcError> {
        self.gate.notified().await;
        self.slow_done.fetch_add(1, Ordering::SeqCst);
        Ok(RpcOutcome::success_empty())
    }
}

impl RpcService for DeviceService {
    fn qname_module(&self) -> QNameModule {
        svc_module()
    }

    fn register_methods(invoker: &mut RpcServiceInvoker<Self>) {
        invoker
            .method("reset", |service: Arc<Self>, input: ResetInput| async move {
                service.reset(input).await
            })
            .method("ping", |_: Arc<Self>, _: ()| async move {
                Ok(RpcOutcome::<()>::success_empty())
            })
            .method("explode", |_: Arc<Self>, _: ()| async move {
                Err::<RpcOutcome<()>, _>(RpcError::internal("disk on fire"))
            })
            .method("crash", |_: Arc<Self>, _: ()| async move {
                if true {
                    panic!("service crashed");
                }
                Ok(RpcOutcome::<()>::success_empty())
            })
            .method("refuse", |_: Arc<Self>, _: ()| async move {
                Ok(RpcOutcome::<ResetOutput>::failed([OperationError::application(
                    "access-denied",
                    "reset refused",
                )]))
            })
            .method("slow", |service: Arc<Self>, _: ()| async move { service.slow().await });
    }
}
