//! Integration tests for typed services behind the generic RPC router
//!
//! A device service is registered through the binding provider and invoked
//! with generic nodes, lazy facade inputs and failing methods.

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use binding_rpc::{
    AdapterConfig, BindingRpcAdapter, BindingRpcProvider, ConfigValidationError, DomRpcIdentifier,
    DomRpcImplementation, DomRpcInput, DomRpcResult, LazySerializedContainerNode, RpcErrorCode,
    RpcRouter, SpawnPolicy,
};
use common::*;
use yang_binding::{BindingCodecRegistry, CodecConfig, CodecError, LeafValue, NormalizedNode, QName};

fn dev() -> AdapterConfig {
    AdapterConfig::new().with_development_mode(true)
}

fn op(local: &str) -> DomRpcIdentifier {
    DomRpcIdentifier::new(svc_qname(local))
}

// =============================================================================
// Registration
// =============================================================================

#[test]
fn registers_only_operations_with_methods() {
    let harness = harness(dev());
    let registered: HashSet<&str> = harness
        .registration
        .types()
        .iter()
        .map(|rpc| rpc.operation().local_name())
        .collect();

    assert_eq!(
        registered,
        HashSet::from(["reset", "ping", "explode", "crash", "refuse", "slow"])
    );
    assert!(!harness.router.is_available(&op("unserved")));
}

#[test]
fn registration_without_context_is_unavailable() {
    let registry = Arc::new(BindingCodecRegistry::new(CodecConfig::default()).unwrap());
    let provider =
        BindingRpcProvider::new(registry, Arc::new(RpcRouter::new()), dev()).unwrap();
    let err = provider
        .register_service(Arc::new(DeviceService::new()))
        .unwrap_err();
    assert_eq!(err.code, RpcErrorCode::Unavailable);
}

#[test]
fn oversized_in_flight_limit_is_rejected_by_constructor() {
    let result = BindingRpcAdapter::new(
        registry(),
        Arc::new(DeviceService::new()),
        dev().with_max_in_flight(usize::MAX),
    );
    assert!(matches!(
        result,
        Err(ConfigValidationError::MaxInFlightTooLarge { .. })
    ));
}

#[tokio::test]
async fn closing_registration_removes_operations() {
    let harness = harness(dev());
    let router = Arc::clone(&harness.router);
    harness.registration.close();

    let err = router
        .invoke_rpc(&op("ping"), DomRpcInput::Empty)
        .await
        .unwrap_err();
    assert_eq!(err.code, RpcErrorCode::OperationNotFound);
}

// =============================================================================
// Invocation
// =============================================================================

#[tokio::test]
async fn generic_input_is_decoded_and_output_encoded_on_read() {
    let harness = harness(dev());
    let result = harness
        .router
        .invoke_rpc(&op("reset"), reset_input("all").into())
        .await
        .unwrap();

    let DomRpcResult::Lazy(lazy) = &result else {
        panic!("expected a lazy result, found {result:?}");
    };
    assert!(lazy.is_successful());
    assert!(!lazy.is_encoded());
    assert_eq!(lazy.binding_result(), Some(&serde_json::json!({ "done": true })));

    let node = result.result().unwrap().unwrap();
    assert_eq!(node.node_type(), &svc_qname("output"));
    let done = node.children().unwrap().get(&svc_qname("done")).unwrap();
    assert_eq!(done, &NormalizedNode::leaf(svc_qname("done"), LeafValue::Boolean(true)));
    assert!(lazy.is_encoded());
    assert_eq!(harness.service.resets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn facade_shortcut_skips_the_codec() {
    let harness = harness(dev());
    // Violates the target pattern: only reachable without decoding.
    let input = LazySerializedContainerNode::create(
        svc_qname("reset"),
        Arc::new(ResetInput {
            target: Some(TargetName::new("ALL!")),
        }),
        Arc::clone(&harness.registry),
    );

    let result = harness
        .router
        .invoke_rpc(&op("reset"), input.into())
        .await
        .unwrap();

    assert_eq!(
        harness.service.last_target.lock().unwrap().as_deref(),
        Some("ALL!")
    );
    assert_eq!(result.binding_result(), Some(&serde_json::json!({ "done": false })));
}

#[test]
fn lazy_input_encodes_on_demand() {
    let registry = registry();
    let valid = LazySerializedContainerNode::create(
        svc_qname("reset"),
        Arc::new(ResetInput {
            target: Some(TargetName::new("all")),
        }),
        Arc::clone(&registry),
    );
    assert!(!valid.is_serialized());
    assert_eq!(valid.node().unwrap(), &reset_input("all"));
    assert!(valid.is_serialized());

    let invalid = LazySerializedContainerNode::create(
        svc_qname("reset"),
        Arc::new(ResetInput {
            target: Some(TargetName::new("ALL!")),
        }),
        registry,
    );
    assert!(matches!(
        invalid.node(),
        Err(CodecError::PatternMismatch { .. })
    ));
}

#[tokio::test]
async fn lazy_input_of_wrong_type_is_rejected() {
    let harness = harness(dev());
    let input = LazySerializedContainerNode::create(
        svc_qname("reset"),
        Arc::new(ResetOutput { done: Some(true) }),
        Arc::clone(&harness.registry),
    );
    let err = harness
        .router
        .invoke_rpc(&op("reset"), input.into())
        .await
        .unwrap_err();
    assert_eq!(err.code, RpcErrorCode::DecodeFailed);
}

#[tokio::test]
async fn undecodable_input_is_a_decode_failure() {
    let harness = harness(dev());
    let err = harness
        .router
        .invoke_rpc(&op("reset"), reset_input("ALL!").into())
        .await
        .unwrap_err();

    assert_eq!(err.code, RpcErrorCode::DecodeFailed);
    assert!(err.cause.unwrap().contains("[a-z]+"));
    assert_eq!(harness.service.resets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn operation_without_input_or_output() {
    let harness = harness(dev());
    let result = harness
        .router
        .invoke_rpc(&op("ping"), DomRpcInput::Empty)
        .await
        .unwrap();

    assert!(result.is_successful());
    assert_eq!(result.result().unwrap(), None);
}

#[tokio::test]
async fn failed_outcome_is_never_encoded() {
    let harness = harness(dev());
    let result = harness
        .router
        .invoke_rpc(&op("refuse"), DomRpcInput::Empty)
        .await
        .unwrap();

    assert!(!result.is_successful());
    assert_eq!(result.errors()[0].tag, "access-denied");
    assert_eq!(result.result().unwrap(), None);
}

#[tokio::test]
async fn foreign_operation_is_not_found_by_adapter() {
    let adapter =
        BindingRpcAdapter::new(registry(), Arc::new(DeviceService::new()), dev()).unwrap();
    let foreign = DomRpcIdentifier::new(QName::new("urn:other", None, "reset").unwrap());

    let err = adapter
        .invoke_rpc(&foreign, DomRpcInput::Empty)
        .await
        .unwrap_err();
    assert_eq!(err.code, RpcErrorCode::OperationNotFound);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn service_error_becomes_invocation_failure() {
    let harness = harness(dev());
    let err = harness
        .router
        .invoke_rpc(&op("explode"), DomRpcInput::Empty)
        .await
        .unwrap_err();

    assert_eq!(err.code, RpcErrorCode::InvocationFailed);
    assert!(err.cause.unwrap().contains("disk on fire"));
}

#[tokio::test]
async fn production_mode_hides_the_cause() {
    let harness = harness(AdapterConfig::new().with_development_mode(false));
    let err = harness
        .router
        .invoke_rpc(&op("explode"), DomRpcInput::Empty)
        .await
        .unwrap_err();

    assert_eq!(err.code, RpcErrorCode::InvocationFailed);
    assert_eq!(err.message, "An internal error occurred");
    assert!(err.cause.is_none());
}

#[tokio::test]
async fn panicking_service_is_an_invocation_failure() {
    for policy in [SpawnPolicy::Spawn, SpawnPolicy::Inline] {
        let harness = harness(dev().with_spawn_policy(policy));
        let err = harness
            .router
            .invoke_rpc(&op("crash"), DomRpcInput::Empty)
            .await
            .unwrap_err();
        assert_eq!(err.code, RpcErrorCode::InvocationFailed, "policy {policy:?}");
    }
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn dropping_the_caller_detaches_from_the_call() {
    let harness = harness(dev());
    let call = harness.router.invoke_rpc(&op("slow"), DomRpcInput::Empty);
    assert!(tokio::time::timeout(Duration::from_millis(20), call).await.is_err());

    harness.service.gate.notify_one();
    tokio::time::timeout(Duration::from_secs(5), async {
        while harness.service.slow_done.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("detached call did not finish");
}

#[tokio::test]
async fn in_flight_limit_rejects_extra_calls() {
    let harness = harness(dev().with_max_in_flight(1));
    let first = harness.router.invoke_rpc(&op("slow"), DomRpcInput::Empty);

    let err = harness
        .router
        .invoke_rpc(&op("ping"), DomRpcInput::Empty)
        .await
        .unwrap_err();
    assert_eq!(err.code, RpcErrorCode::Unavailable);

    harness.service.gate.notify_one();
    assert!(first.await.unwrap().is_successful());
    harness
        .router
        .invoke_rpc(&op("ping"), DomRpcInput::Empty)
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_invocations_each_get_their_result() {
    let harness = harness(dev());
    let calls = (0..16).map(|i| {
        let target = if i % 2 == 0 { "all" } else { "one" };
        harness.router.invoke_rpc(&op("reset"), reset_input(target).into())
    });
    let results = futures::future::join_all(calls).await;

    for (i, result) in results.into_iter().enumerate() {
        let result = result.unwrap();
        assert_eq!(
            result.binding_result(),
            Some(&serde_json::json!({ "done": i % 2 == 0 }))
        );
    }
    assert_eq!(harness.service.resets.load(Ordering::SeqCst), 16);
}
