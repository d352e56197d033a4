//! Integration tests for the codec registry
//!
//! These tests drive typed facade objects through a registry built from an
//! in-memory schema and check paths and objects survive the round trip.

mod common;

use std::collections::BTreeMap;

use common::{
    ContainerTop, ContainerTop1, Flags, Mode, ModeEnumeration, State, TopLevelList, registry,
    top_qname,
};
use serde_json::json;
use yang_binding::{
    DataObject, DynDataObject, InstanceIdentifier, Key, LeafValue, NormalizedNode, PathArgument,
    PathStep, downcast_ref,
};

// =============================================================================
// Paths
// =============================================================================

#[test]
fn container_top_path_round_trip() {
    let registry = registry();
    let id = InstanceIdentifier::create([PathArgument::Item(ContainerTop::binding_type())]).unwrap();

    let path = registry.to_generic_path(&id).unwrap();
    let last = path.last_step().unwrap().node_type().unwrap();
    assert_eq!(last, &top_qname("container-top"));
    assert_eq!(last.local_name(), "container-top");

    let back = registry.from_generic_path(&path).unwrap();
    assert_eq!(back, id);
    assert_eq!(back.hash_code(), id.hash_code());
}

#[test]
fn keyed_list_path_round_trip() {
    let registry = registry();
    let id = InstanceIdentifier::builder_for(ContainerTop::binding_type())
        .child_keyed(TopLevelList::binding_type(), Key::single("name", "foo"))
        .build_keyed()
        .unwrap();

    let path = registry.to_generic_path(&id).unwrap();
    match path.last_step() {
        Some(PathStep::NodeWithKey(qname, predicates)) => {
            assert_eq!(qname, &top_qname("top-level-list"));
            assert_eq!(predicates.get(&top_qname("name")), Some(&LeafValue::from("foo")));
        }
        other => panic!("unexpected last step {other:?}"),
    }

    let back = registry.from_generic_path(&path).unwrap();
    assert_eq!(InstanceIdentifier::key_of(&back).unwrap(), id.key());
    assert_eq!(back, *id);
}

#[test]
fn augmented_child_path_inserts_augmentation() {
    let registry = registry();
    let id = InstanceIdentifier::builder_for(ContainerTop::binding_type())
        .augmentation(ContainerTop1::binding_type())
        .build()
        .unwrap();

    let path = registry.to_generic_path(&id).unwrap();
    assert!(matches!(path.last_step(), Some(PathStep::Augmentation(_))));
    assert_eq!(registry.from_generic_path(&path).unwrap(), id);
}

// =============================================================================
// Objects
// =============================================================================

fn sample() -> ContainerTop {
    ContainerTop {
        name: Some("top".into()),
        mode: Some(Mode {
            string: None,
            enumeration: Some(ModeEnumeration::On),
        }),
        state: Some(State::Down),
        flags: Some(Flags {
            read: true,
            write: false,
        }),
        top_level_list: Some(vec![
            TopLevelList {
                name: Some("foo".into()),
                value: Some(1),
            },
            TopLevelList {
                name: Some("bar".into()),
                value: None,
            },
        ]),
        augmentations: None,
    }
}

#[test]
fn facade_round_trip() {
    let registry = registry();
    let original = sample();

    let node = registry.encode(&original).unwrap();
    let decoded: ContainerTop = registry.decode(&node).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn keyed_list_becomes_map_entries() {
    let registry = registry();
    let node = registry.encode(&sample()).unwrap();

    let list = node
        .children()
        .and_then(|c| c.get(&top_qname("top-level-list")))
        .unwrap();
    let NormalizedNode::Map(map) = list else {
        panic!("expected map node, found {}", list.kind());
    };
    assert_eq!(map.entries.len(), 2);
    let predicates = [(top_qname("name"), LeafValue::from("bar"))].into_iter().collect();
    assert!(map.entry(&predicates).is_some());
}

#[test]
fn union_enumeration_alternative_round_trip() {
    let registry = registry();
    let top = ContainerTop {
        mode: Some(Mode {
            string: None,
            enumeration: Some(ModeEnumeration::On),
        }),
        ..ContainerTop::default()
    };

    let node = registry.encode(&top).unwrap();
    let leaf = node.children().unwrap().get(&top_qname("mode")).unwrap();
    assert_eq!(leaf, &NormalizedNode::leaf(top_qname("mode"), "ON"));

    let decoded: ContainerTop = registry.decode(&node).unwrap();
    let mode = decoded.mode.unwrap();
    assert_eq!(mode.enumeration, Some(ModeEnumeration::On));
    assert_ne!(mode.enumeration, Some(ModeEnumeration::Off));
    assert_eq!(mode.string, None);
}

#[test]
fn union_string_alternative_round_trip() {
    let registry = registry();
    let top = ContainerTop {
        mode: Some(Mode {
            string: Some("aaaa".into()),
            enumeration: None,
        }),
        ..ContainerTop::default()
    };

    let decoded: ContainerTop = registry.decode(&registry.encode(&top).unwrap()).unwrap();
    assert_eq!(decoded, top);
}

#[test]
fn augmentation_data_round_trip() {
    let registry = registry();
    let augmentation = serde_json::to_value(ContainerTop1 {
        aug_name: Some("extra".into()),
    })
    .unwrap();
    let top = ContainerTop {
        name: Some("top".into()),
        augmentations: Some(BTreeMap::from([(
            ContainerTop1::binding_type().to_string(),
            augmentation,
        )])),
        ..ContainerTop::default()
    };

    let node = registry.encode(&top).unwrap();
    let aug_child = yang_binding::QName::new("urn:test:aug", None, "aug-name").unwrap();
    assert!(node.children().unwrap().contains_key(&aug_child));

    let decoded: ContainerTop = registry.decode(&node).unwrap();
    assert_eq!(decoded, top);
}

#[test]
fn type_erased_encode_matches_typed() {
    let registry = registry();
    let original = sample();
    let erased: &dyn DynDataObject = &original;

    assert_eq!(
        registry.encode_dyn(erased).unwrap(),
        registry.encode(&original).unwrap()
    );
    assert_eq!(downcast_ref::<ContainerTop>(erased), Some(&original));
}

#[test]
fn decode_as_gives_property_tree() {
    let registry = registry();
    let node = registry
        .encode(&ContainerTop {
            state: Some(State::Up),
            ..ContainerTop::default()
        })
        .unwrap();

    let value = registry
        .decode_as(&node, &ContainerTop::binding_type())
        .unwrap();
    assert_eq!(value, json!({"state": "Up"}));
}
