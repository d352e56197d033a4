//! List entry keys

use std::collections::BTreeMap;
use std::fmt;

use crate::node::LeafValue;

/// Key of a list entry: key leaf local names mapped to their values.
///
/// Keys are ordered by leaf name so equal keys hash identically regardless
/// of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    values: BTreeMap<String, LeafValue>,
}

impl Key {
    /// An empty key. List steps with an empty key never match a real entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Key with a single leaf.
    pub fn single(leaf: impl Into<String>, value: impl Into<LeafValue>) -> Self {
        Self::new().with(leaf, value)
    }

    /// Add a key leaf value.
    #[must_use = "This method returns a new Key and does not modify self"]
    pub fn with(mut self, leaf: impl Into<String>, value: impl Into<LeafValue>) -> Self {
        self.values.insert(leaf.into(), value.into());
        self
    }

    /// Value of one key leaf.
    pub fn get(&self, leaf: &str) -> Option<&LeafValue> {
        self.values.get(leaf)
    }

    /// Key leaves in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LeafValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of key leaves.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the key has no leaves.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<LeafValue>> FromIterator<(K, V)> for Key {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("]")
    }
}
