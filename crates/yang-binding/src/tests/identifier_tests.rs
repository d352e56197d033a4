//! Identifier tests - Property-based tests for InstanceIdentifier
//!
//! Tests hashing, equality, wildcard detection and prefix containment over
//! generated argument chains.

use proptest::prelude::*;

use crate::identifier::{HASH_SEED, InstanceIdentifier, Key, PathArgument, next_hash};
use crate::type_ref::TypeRef;

// =============================================================================
// Strategies
// =============================================================================

fn type_ref_strategy() -> impl Strategy<Value = TypeRef> {
    ("[A-Z][a-z]{1,6}", any::<bool>())
        .prop_map(|(name, keyed)| {
            if keyed {
                TypeRef::keyed("gen.v1.urn.test", name)
            } else {
                TypeRef::of("gen.v1.urn.test", name)
            }
        })
}

fn key_strategy() -> impl Strategy<Value = Key> {
    ("[a-z]{1,4}", "[a-z0-9]{0,6}").prop_map(|(leaf, value)| Key::single(leaf, value))
}

/// A path argument that never wildcards: keyed types always carry a key.
fn exact_argument_strategy() -> impl Strategy<Value = PathArgument> {
    (type_ref_strategy(), key_strategy()).prop_map(|(type_ref, key)| {
        if type_ref.is_identifiable() {
            PathArgument::IdentifiableItem(type_ref, key)
        } else {
            PathArgument::Item(type_ref)
        }
    })
}

fn exact_arguments_strategy() -> impl Strategy<Value = Vec<PathArgument>> {
    prop::collection::vec(exact_argument_strategy(), 1..8)
}

// =============================================================================
// Property-Based Tests
// =============================================================================

proptest! {
    /// Creating an identifier reproduces its arguments, and creating it twice
    /// yields equal identifiers with equal hashes.
    #[test]
    fn prop_create_preserves_arguments(arguments in exact_arguments_strategy()) {
        let first = InstanceIdentifier::create(arguments.clone()).unwrap();
        let second = InstanceIdentifier::create(arguments.clone()).unwrap();

        let extracted: Vec<PathArgument> = first.path_arguments().cloned().collect();
        prop_assert_eq!(&extracted, &arguments);
        prop_assert_eq!(first.len(), arguments.len());
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.hash_code(), second.hash_code());
        prop_assert!(!first.is_wildcarded());
    }

    /// Appending a step combines the parent hash with the new argument.
    #[test]
    fn prop_incremental_hash_consistency(
        arguments in exact_arguments_strategy(),
        next in type_ref_strategy(),
    ) {
        let parent = InstanceIdentifier::create(arguments.clone()).unwrap();
        let child = parent.child(next.clone());

        prop_assert_eq!(
            child.hash_code(),
            next_hash(parent.hash_code(), &PathArgument::Item(next))
        );

        let folded = arguments.iter().fold(HASH_SEED, |hash, arg| next_hash(hash, arg));
        prop_assert_eq!(parent.hash_code(), folded);
    }

    /// Dropping a key makes an identifier wildcarded: it still contains the
    /// exact identifier when keys are ignored, but not when compared exactly.
    #[test]
    fn prop_wildcard_monotonicity(
        arguments in exact_arguments_strategy(),
        position in any::<prop::sample::Index>(),
    ) {
        let exact = InstanceIdentifier::create(arguments.clone()).unwrap();
        let index = position.index(arguments.len());

        let mut wildcarded_args = arguments.clone();
        let has_key = matches!(wildcarded_args[index], PathArgument::IdentifiableItem(..));
        if let PathArgument::IdentifiableItem(type_ref, _) = &wildcarded_args[index] {
            wildcarded_args[index] = PathArgument::Item(type_ref.clone());
        }
        let wildcarded = InstanceIdentifier::create(wildcarded_args).unwrap();

        prop_assert!(wildcarded.contains_wildcarded(&exact));
        prop_assert_eq!(wildcarded.is_wildcarded(), has_key);
        prop_assert_eq!(wildcarded.contains(&exact), !has_key);
    }

    /// Containment is prefix based.
    #[test]
    fn prop_containment_is_prefix_based(
        arguments in exact_arguments_strategy(),
        a in type_ref_strategy(),
        b in type_ref_strategy(),
    ) {
        let root = InstanceIdentifier::create(arguments).unwrap();
        let with_a = root.child(a);
        let with_ab = with_a.child(b);

        prop_assert!(with_ab.contains(&with_a));
        prop_assert!(with_ab.contains(&root));
        prop_assert!(with_a.contains(&with_a));
        prop_assert!(!with_a.contains(&with_ab));
    }

    /// A builder seeded from an identifier builds the same identifier as
    /// appending directly.
    #[test]
    fn prop_builder_matches_child(
        arguments in exact_arguments_strategy(),
        next in type_ref_strategy(),
    ) {
        let parent = InstanceIdentifier::create(arguments).unwrap();
        let built = parent.builder().child(next.clone()).build().unwrap();
        prop_assert_eq!(built, parent.child(next));
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn empty_argument_sequence_is_rejected() {
    assert!(InstanceIdentifier::create(Vec::new()).is_err());
    assert!(crate::identifier::InstanceIdentifierBuilder::new().build().is_err());
}

#[test]
fn first_identifier_and_key_of_a_type() {
    let top = TypeRef::of("gen.v1.t", "Top");
    let list = TypeRef::keyed("gen.v1.t", "Entry");
    let leaf = TypeRef::of("gen.v1.t", "Leafy");

    let id = InstanceIdentifier::builder_for(top.clone())
        .child_keyed(list.clone(), Key::single("name", "foo"))
        .child(leaf)
        .build()
        .unwrap();

    let prefix = id.first_identifier_of(&list).unwrap();
    assert_eq!(prefix.len(), 2);
    assert_eq!(prefix.target_type(), &list);
    assert!(id.contains(&prefix));
    assert_eq!(id.first_key_of(&list), Some(&Key::single("name", "foo")));
    assert_eq!(id.first_key_of(&top), None);
}
