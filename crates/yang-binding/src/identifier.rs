//! Binding instance identifiers
//!
//! An [`InstanceIdentifier`] addresses a subtree of facade objects as an
//! ordered chain of [`PathArgument`]s. Identifiers are immutable. Appending a
//! step shares the parent's chain, so `child` is O(1) and never copies or
//! mutates the parent.
//!
//! Each identifier carries a precomputed hash, built incrementally with
//! [`next_hash`], and a wildcard flag that is set when some step names a
//! keyed type without giving its key.
//!
//! # Example
//! ```rust,ignore
//! use yang_binding::{InstanceIdentifier, Key, TypeRef};
//!
//! let top = TypeRef::of("gen.v1.urn.test.top", "Top");
//! let list = TypeRef::keyed("gen.v1.urn.test.top", "TopLevelList");
//!
//! let entry = InstanceIdentifier::create([PathArgument::Item(top)])?
//!     .child_keyed(list.clone(), Key::single("name", "foo"));
//! assert_eq!(entry.key().get("name"), Some(&"foo".into()));
//! ```

mod builder;
mod key;

pub use builder::InstanceIdentifierBuilder;
pub use key::Key;

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use thiserror::Error;

use crate::type_ref::{TypeName, TypeRef};

/// Seed of the incremental identifier hash.
pub const HASH_SEED: u64 = 1;

/// Errors raised while constructing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// No path arguments were supplied
    #[error("identifier must contain at least one path argument")]
    Empty,
    /// The identifier does not end in a keyed list entry
    #[error("identifier targeting {target} does not end in a keyed item")]
    NotKeyed {
        /// Target type of the offending identifier
        target: TypeName,
    },
}

/// Result type alias for identifier operations.
pub type IdentifierResult<T> = Result<T, IdentifierError>;

/// One step of an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathArgument {
    /// A step naming only a type
    Item(TypeRef),
    /// A step naming a list entry type and the key of the entry
    IdentifiableItem(TypeRef, Key),
}

impl PathArgument {
    /// Type the step refers to.
    pub fn type_ref(&self) -> &TypeRef {
        match self {
            Self::Item(t) | Self::IdentifiableItem(t, _) => t,
        }
    }

    /// Key of the step, for identifiable items.
    pub fn key(&self) -> Option<&Key> {
        match self {
            Self::Item(_) => None,
            Self::IdentifiableItem(_, key) => Some(key),
        }
    }

    /// A plain item for a type that requires a key.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Item(t) if t.is_identifiable())
    }

    /// Equality that lets a missing key on either side match any key.
    fn matches_wildcarded(&self, other: &PathArgument) -> bool {
        if self.type_ref() != other.type_ref() {
            return false;
        }
        match (self, other) {
            (Self::IdentifiableItem(_, a), Self::IdentifiableItem(_, b)) => a == b,
            _ => true,
        }
    }
}

impl fmt::Display for PathArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item(t) => write!(f, "{}", t.name().name()),
            Self::IdentifiableItem(t, key) => write!(f, "{}{}", t.name().name(), key),
        }
    }
}

/// Combine a parent identifier hash with one more path argument.
pub fn next_hash(parent: u64, argument: &PathArgument) -> u64 {
    let mut hasher = DefaultHasher::new();
    argument.hash(&mut hasher);
    parent.wrapping_mul(31).wrapping_add(hasher.finish())
}

/// Shared link of the argument chain.
#[derive(Debug)]
pub(crate) struct Segment {
    parent: Option<Arc<Segment>>,
    argument: PathArgument,
    hash: u64,
    wildcarded: bool,
    depth: usize,
}

impl Segment {
    fn append(parent: Option<Arc<Segment>>, argument: PathArgument) -> Arc<Self> {
        let (hash, wildcarded, depth) = match &parent {
            Some(p) => (p.hash, p.wildcarded, p.depth),
            None => (HASH_SEED, false, 0),
        };
        Arc::new(Self {
            hash: next_hash(hash, &argument),
            wildcarded: wildcarded || argument.is_wildcard(),
            depth: depth + 1,
            argument,
            parent,
        })
    }

    /// Segments from the root to this one.
    fn lineage(self: &Arc<Self>) -> Vec<&Arc<Segment>> {
        let mut chain = Vec::with_capacity(self.depth);
        let mut current = Some(self);
        while let Some(segment) = current {
            chain.push(segment);
            current = segment.parent.as_ref();
        }
        chain.reverse();
        chain
    }
}

/// Immutable, hash-cached path to a subtree of facade objects.
#[derive(Clone)]
pub struct InstanceIdentifier {
    tail: Arc<Segment>,
}

impl InstanceIdentifier {
    /// Create an identifier from a non-empty sequence of path arguments.
    pub fn create(arguments: impl IntoIterator<Item = PathArgument>) -> IdentifierResult<Self> {
        let mut tail: Option<Arc<Segment>> = None;
        for argument in arguments {
            tail = Some(Segment::append(tail, argument));
        }
        tail.map(|tail| Self { tail }).ok_or(IdentifierError::Empty)
    }

    /// Start a builder whose first step is a plain item.
    pub fn builder_for(type_ref: TypeRef) -> InstanceIdentifierBuilder {
        InstanceIdentifierBuilder::new().child(type_ref)
    }

    /// Start a builder whose first step is a keyed item.
    pub fn builder_for_keyed(type_ref: TypeRef, key: Key) -> InstanceIdentifierBuilder {
        InstanceIdentifierBuilder::new().child_keyed(type_ref, key)
    }

    /// Key of the last step of `id`, which must be a keyed item.
    pub fn key_of(id: &InstanceIdentifier) -> IdentifierResult<&Key> {
        id.tail.argument.key().ok_or_else(|| IdentifierError::NotKeyed {
            target: id.target_type().name().clone(),
        })
    }

    /// Identifier with a plain item appended.
    pub fn child(&self, type_ref: TypeRef) -> InstanceIdentifier {
        Self {
            tail: Segment::append(Some(self.tail.clone()), PathArgument::Item(type_ref)),
        }
    }

    /// Identifier with a keyed item appended.
    pub fn child_keyed(&self, type_ref: TypeRef, key: Key) -> KeyedInstanceIdentifier {
        let tail = Segment::append(
            Some(self.tail.clone()),
            PathArgument::IdentifiableItem(type_ref, key.clone()),
        );
        KeyedInstanceIdentifier {
            inner: Self { tail },
            key,
        }
    }

    /// Identifier with an augmentation step appended.
    pub fn augment(&self, augmentation: TypeRef) -> InstanceIdentifier {
        self.child(augmentation)
    }

    /// Builder seeded with this identifier's arguments.
    pub fn builder(&self) -> InstanceIdentifierBuilder {
        InstanceIdentifierBuilder::from_identifier(self)
    }

    /// Path arguments from the root to the target.
    pub fn path_arguments(&self) -> impl DoubleEndedIterator<Item = &PathArgument> + '_ {
        self.tail
            .lineage()
            .into_iter()
            .map(|segment| &segment.argument)
    }

    /// The last path argument.
    pub fn last_argument(&self) -> &PathArgument {
        &self.tail.argument
    }

    /// Type addressed by this identifier.
    pub fn target_type(&self) -> &TypeRef {
        self.tail.argument.type_ref()
    }

    /// Number of path arguments.
    pub fn len(&self) -> usize {
        self.tail.depth
    }

    /// Identifiers are never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether some step omits the key of a keyed type.
    pub fn is_wildcarded(&self) -> bool {
        self.tail.wildcarded
    }

    /// The precomputed hash of the argument chain.
    pub fn hash_code(&self) -> u64 {
        self.tail.hash
    }

    /// Whether `other` is a prefix of this identifier, comparing keys exactly.
    pub fn contains(&self, other: &InstanceIdentifier) -> bool {
        self.prefix_matches(other, |a, b| a == b)
    }

    /// Whether `other` is a prefix of this identifier, where a step without a
    /// key matches any key.
    pub fn contains_wildcarded(&self, other: &InstanceIdentifier) -> bool {
        self.prefix_matches(other, PathArgument::matches_wildcarded)
    }

    fn prefix_matches(
        &self,
        other: &InstanceIdentifier,
        eq: impl Fn(&PathArgument, &PathArgument) -> bool,
    ) -> bool {
        if other.len() > self.len() {
            return false;
        }
        self.path_arguments()
            .zip(other.path_arguments())
            .all(|(mine, theirs)| eq(mine, theirs))
    }

    /// Prefix of this identifier ending at the first step of the given type.
    pub fn first_identifier_of(&self, type_ref: &TypeRef) -> Option<InstanceIdentifier> {
        self.tail
            .lineage()
            .into_iter()
            .find(|segment| segment.argument.type_ref() == type_ref)
            .map(|segment| Self {
                tail: segment.clone(),
            })
    }

    /// Key of the first keyed step of the given type.
    pub fn first_key_of(&self, type_ref: &TypeRef) -> Option<&Key> {
        self.path_arguments()
            .filter(|arg| arg.type_ref() == type_ref)
            .find_map(PathArgument::key)
    }

    /// This identifier as a keyed identifier, if it ends in a keyed item.
    pub fn as_keyed(&self) -> Option<KeyedInstanceIdentifier> {
        let key = self.tail.argument.key()?.clone();
        Some(KeyedInstanceIdentifier {
            inner: self.clone(),
            key,
        })
    }

    pub(crate) fn from_tail(tail: Option<Arc<Segment>>, appended: Vec<PathArgument>) -> IdentifierResult<Self> {
        let mut tail = tail;
        for argument in appended {
            tail = Some(Segment::append(tail, argument));
        }
        tail.map(|tail| Self { tail }).ok_or(IdentifierError::Empty)
    }

    pub(crate) fn segment(&self) -> &Arc<Segment> {
        &self.tail
    }
}

impl PartialEq for InstanceIdentifier {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.tail, &other.tail) {
            return true;
        }
        let (a, b) = (&*self.tail, &*other.tail);
        if a.hash != b.hash
            || a.wildcarded != b.wildcarded
            || a.depth != b.depth
            || a.argument.type_ref() != b.argument.type_ref()
        {
            return false;
        }

        let (mut left, mut right) = (Some(a), Some(b));
        while let (Some(l), Some(r)) = (left, right) {
            if std::ptr::eq(l, r) {
                return true;
            }
            if l.argument != r.argument {
                return false;
            }
            left = l.parent.as_deref();
            right = r.parent.as_deref();
        }
        left.is_none() && right.is_none()
    }
}

impl Eq for InstanceIdentifier {}

impl Hash for InstanceIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.tail.hash);
    }
}

impl fmt::Debug for InstanceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceIdentifier")
            .field("target", self.target_type())
            .field("path", &self.path_arguments().collect::<Vec<_>>())
            .field("wildcarded", &self.is_wildcarded())
            .finish()
    }
}

impl fmt::Display for InstanceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for argument in self.path_arguments() {
            write!(f, "/{argument}")?;
        }
        Ok(())
    }
}

/// Identifier whose last step is a keyed list entry.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct KeyedInstanceIdentifier {
    inner: InstanceIdentifier,
    key: Key,
}

impl KeyedInstanceIdentifier {
    /// Key of the addressed list entry.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// The plain identifier.
    pub fn into_identifier(self) -> InstanceIdentifier {
        self.inner
    }
}

impl Deref for KeyedInstanceIdentifier {
    type Target = InstanceIdentifier;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<KeyedInstanceIdentifier> for InstanceIdentifier {
    fn from(id: KeyedInstanceIdentifier) -> Self {
        id.inner
    }
}

impl fmt::Debug for KeyedInstanceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl fmt::Display for KeyedInstanceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}
