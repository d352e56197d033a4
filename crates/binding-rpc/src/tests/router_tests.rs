//! Router tests
//!
//! Registration lifecycle and routing of the in-memory provider.

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use yang_binding::{NormalizedNode, QName, YangInstanceIdentifier};

use crate::error::{RpcErrorCode, RpcResult};
use crate::input::{DomRpcIdentifier, DomRpcInput};
use crate::provider::{
    DomRpcImplementation, DomRpcProviderService, ForwardingRpcProviderService, RpcRouter,
};
use crate::result::DomRpcResult;

/// Answers every call with a leaf carrying its label.
struct Fixed {
    label: &'static str,
    calls: AtomicUsize,
}

impl Fixed {
    fn new(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            label,
            calls: AtomicUsize::new(0),
        })
    }
}

impl DomRpcImplementation for Fixed {
    fn invoke_rpc(
        &self,
        rpc: &DomRpcIdentifier,
        _input: DomRpcInput,
    ) -> BoxFuture<'static, RpcResult<DomRpcResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let leaf = NormalizedNode::leaf(rpc.operation().clone(), self.label);
        future::ready(Ok(DomRpcResult::success(Some(leaf)))).boxed()
    }
}

fn qname(local: &str) -> QName {
    QName::new("urn:test:router", None, local).unwrap()
}

async fn label_of(router: &RpcRouter, rpc: &DomRpcIdentifier) -> RpcResult<String> {
    let result = router.invoke_rpc(rpc, DomRpcInput::Empty).await?;
    let node = result.result()?.cloned();
    match node {
        Some(NormalizedNode::Leaf(leaf)) => Ok(leaf.value.to_string()),
        other => panic!("unexpected result {other:?}"),
    }
}

#[tokio::test]
async fn routes_to_registered_implementation() {
    let router = RpcRouter::new();
    let reset = DomRpcIdentifier::new(qname("reset"));
    let implementation = Fixed::new("first");
    let _registration = router.register_rpc_implementation(implementation.clone(), vec![reset.clone()]);

    assert_eq!(label_of(&router, &reset).await.unwrap(), "first");
    assert_eq!(implementation.calls.load(Ordering::SeqCst), 1);
    assert!(router.is_available(&reset));
}

#[tokio::test]
async fn dropping_registration_unregisters() {
    let router = RpcRouter::new();
    let reset = DomRpcIdentifier::new(qname("reset"));
    let registration = router.register_rpc_implementation(Fixed::new("first"), vec![reset.clone()]);
    drop(registration);

    let err = label_of(&router, &reset).await.unwrap_err();
    assert_eq!(err.code, RpcErrorCode::OperationNotFound);
    assert!(router.operations().is_empty());
}

#[test]
fn close_unregisters_every_type() {
    let router = RpcRouter::new();
    let types = vec![
        DomRpcIdentifier::new(qname("reset")),
        DomRpcIdentifier::new(qname("reboot")),
    ];
    let registration = router.register_rpc_implementation(Fixed::new("x"), types.clone());
    assert_eq!(registration.types(), types.as_slice());
    assert_eq!(router.operations().len(), 2);

    registration.close();
    assert!(router.operations().is_empty());
}

#[tokio::test]
async fn stale_registration_does_not_remove_replacement() {
    let router = RpcRouter::new();
    let reset = DomRpcIdentifier::new(qname("reset"));
    let old = router.register_rpc_implementation(Fixed::new("old"), vec![reset.clone()]);
    let _new = router.register_rpc_implementation(Fixed::new("new"), vec![reset.clone()]);
    assert_ne!(old.id(), _new.id());

    drop(old);
    assert_eq!(label_of(&router, &reset).await.unwrap(), "new");
}

#[tokio::test]
async fn context_invocation_falls_back_to_global_implementation() {
    let router = RpcRouter::new();
    let global = DomRpcIdentifier::new(qname("reset"));
    let _global = router.register_rpc_implementation(Fixed::new("global"), vec![global]);

    let scoped = DomRpcIdentifier::with_context(
        qname("reset"),
        YangInstanceIdentifier::of(qname("device")),
    );
    assert_eq!(label_of(&router, &scoped).await.unwrap(), "global");

    let _scoped = router.register_rpc_implementation(Fixed::new("scoped"), vec![scoped.clone()]);
    assert_eq!(label_of(&router, &scoped).await.unwrap(), "scoped");
}

#[tokio::test]
async fn forwarding_provider_registers_with_delegate() {
    let router = Arc::new(RpcRouter::new());
    let forwarding = ForwardingRpcProviderService::new(Arc::clone(&router));
    let reset = DomRpcIdentifier::new(qname("reset"));

    let registration = forwarding.register_rpc_implementation(Fixed::new("fwd"), vec![reset.clone()]);
    assert_eq!(label_of(&router, &reset).await.unwrap(), "fwd");
    assert!(Arc::ptr_eq(forwarding.delegate(), &router));

    drop(registration);
    assert!(!router.is_available(&reset));
}
