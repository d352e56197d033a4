//! Identifier builder

use std::sync::Arc;

use super::{
    IdentifierError, IdentifierResult, InstanceIdentifier, Key, KeyedInstanceIdentifier,
    PathArgument, Segment,
};
use crate::type_ref::TypeRef;

/// Mutable accumulator of path arguments.
///
/// A builder seeded from an existing identifier keeps sharing that
/// identifier's chain; only the appended steps are allocated on `build`.
#[derive(Debug, Clone, Default)]
pub struct InstanceIdentifierBuilder {
    base: Option<Arc<Segment>>,
    appended: Vec<PathArgument>,
}

impl InstanceIdentifierBuilder {
    /// An empty builder. Building it without appending fails.
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn from_identifier(id: &InstanceIdentifier) -> Self {
        Self {
            base: Some(id.segment().clone()),
            appended: Vec::new(),
        }
    }

    /// Append a plain item.
    #[must_use = "This method returns a new builder and does not modify self"]
    pub fn child(mut self, type_ref: TypeRef) -> Self {
        self.appended.push(PathArgument::Item(type_ref));
        self
    }

    /// Append a keyed item.
    #[must_use = "This method returns a new builder and does not modify self"]
    pub fn child_keyed(mut self, type_ref: TypeRef, key: Key) -> Self {
        self.appended
            .push(PathArgument::IdentifiableItem(type_ref, key));
        self
    }

    /// Append an augmentation step.
    #[must_use = "This method returns a new builder and does not modify self"]
    pub fn augmentation(self, type_ref: TypeRef) -> Self {
        self.child(type_ref)
    }

    /// Build the identifier, validating it like [`InstanceIdentifier::create`].
    pub fn build(self) -> IdentifierResult<InstanceIdentifier> {
        InstanceIdentifier::from_tail(self.base, self.appended)
    }

    /// Build an identifier that must end in a keyed item.
    pub fn build_keyed(self) -> IdentifierResult<KeyedInstanceIdentifier> {
        let id = self.build()?;
        id.as_keyed().ok_or_else(|| IdentifierError::NotKeyed {
            target: id.target_type().name().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_fails_like_create() {
        assert_eq!(
            InstanceIdentifierBuilder::new().build().unwrap_err(),
            IdentifierError::Empty
        );
    }

    #[test]
    fn seeded_builder_extends_identifier() {
        let top = TypeRef::of("p", "Top");
        let list = TypeRef::keyed("p", "Entry");
        let root = InstanceIdentifier::builder_for(top.clone()).build().unwrap();

        let built = root
            .builder()
            .child_keyed(list.clone(), Key::single("id", 7i64))
            .build_keyed()
            .unwrap();

        assert_eq!(*built, root.child_keyed(list, Key::single("id", 7i64)).into_identifier());
        assert!(built.contains(&root));
    }

    #[test]
    fn build_keyed_rejects_plain_tail() {
        let result = InstanceIdentifier::builder_for(TypeRef::of("p", "Top")).build_keyed();
        assert!(matches!(result, Err(IdentifierError::NotKeyed { .. })));
    }
}
