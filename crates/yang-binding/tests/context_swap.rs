//! Integration tests for context replacement
//!
//! An operation pinned to a snapshot completes against that snapshot even
//! when the registry moves on to a different schema.

mod common;

use std::sync::Arc;

use common::{ContainerTop, State, registry, schema, top_qname};
use yang_binding::{BindingRuntimeContext, CodecError, DataObject};

fn object() -> ContainerTop {
    ContainerTop {
        name: Some("pinned".into()),
        state: Some(State::Up),
        ..ContainerTop::default()
    }
}

#[test]
fn pinned_snapshot_survives_update() {
    let registry = registry();
    let pinned = registry.snapshot().unwrap();
    let codec = pinned.codec(&ContainerTop::binding_type()).unwrap();

    // A new revision changes every generated package name.
    let runtime = BindingRuntimeContext::create(schema("2020-01-01")).unwrap();
    registry.on_context_updated(Arc::new(runtime));

    let node = pinned.encode(&object()).unwrap();
    assert_eq!(node.node_type(), &top_qname("container-top"));
    let decoded: ContainerTop = pinned.decode(&node).unwrap();
    assert_eq!(decoded, object());
    assert!(Arc::ptr_eq(
        &codec,
        &pinned.codec(&ContainerTop::binding_type()).unwrap()
    ));

    assert!(matches!(
        registry.encode(&object()),
        Err(CodecError::UnknownType(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_encodes_see_whole_contexts() {
    let registry = Arc::new(registry());
    let old = registry.snapshot().unwrap();

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            let snapshot = registry.snapshot().unwrap();
            let result = snapshot.encode(&object());
            (snapshot.version(), result)
        }));
    }

    let runtime = BindingRuntimeContext::create(schema("2020-01-01")).unwrap();
    let new = registry.on_context_updated(Arc::new(runtime));

    for task in tasks {
        let (version, result) = task.await.unwrap();
        if version == old.version() {
            assert_eq!(result.unwrap().node_type(), &top_qname("container-top"));
        } else {
            assert_eq!(version, new.version());
            assert!(matches!(result, Err(CodecError::UnknownType(_))));
        }
    }
}
