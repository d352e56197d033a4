//! Generated type names and type references
//!
//! A [`TypeName`] is the package-qualified name of a generated type. A
//! [`TypeRef`] is the cheap handle identifiers and codecs pass around: the
//! name plus whether instances of the type are addressed by key.

use std::fmt;
use std::sync::Arc;

/// Package-qualified name of a generated type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName {
    package: Arc<str>,
    name: Arc<str>,
}

impl TypeName {
    /// Create a type name from a package and a simple name.
    pub fn new(package: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self {
            package: Arc::from(package.as_ref()),
            name: Arc::from(name.as_ref()),
        }
    }

    /// The package (dot separated).
    pub fn package(&self) -> &str {
        &self.package
    }

    /// The simple name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of a type nested inside this one.
    pub fn nested(&self, name: impl AsRef<str>) -> Self {
        Self::new(format!("{}.{}", self.package, self.name), name)
    }

    /// Parse a fully qualified `package.Name` string.
    pub fn parse(qualified: &str) -> Option<Self> {
        let (package, name) = qualified.rsplit_once('.')?;
        if package.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(package, name))
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.name)
    }
}

/// Reference to a generated type as seen by identifiers and codecs.
///
/// Two references are equal when they name the same type and agree on
/// whether the type requires a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef {
    name: TypeName,
    identifiable: bool,
}

impl TypeRef {
    /// Reference to a type whose instances are not keyed (containers,
    /// augmentations, RPC input and output).
    pub fn new(name: TypeName) -> Self {
        Self {
            name,
            identifiable: false,
        }
    }

    /// Reference to a keyed list entry type.
    pub fn identifiable(name: TypeName) -> Self {
        Self {
            name,
            identifiable: true,
        }
    }

    /// Shorthand for `TypeRef::new(TypeName::new(package, name))`.
    pub fn of(package: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self::new(TypeName::new(package, name))
    }

    /// Shorthand for `TypeRef::identifiable(TypeName::new(package, name))`.
    pub fn keyed(package: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self::identifiable(TypeName::new(package, name))
    }

    /// The referenced type name.
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Whether instances of this type are addressed by key.
    pub fn is_identifiable(&self) -> bool {
        self.identifiable
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_last_dot() {
        let name = TypeName::parse("gen.v1.urn.test.ContainerTop").unwrap();
        assert_eq!(name.package(), "gen.v1.urn.test");
        assert_eq!(name.name(), "ContainerTop");
        assert!(TypeName::parse("NoPackage").is_none());
    }

    #[test]
    fn keyed_flag_participates_in_equality() {
        assert_ne!(TypeRef::of("p", "List"), TypeRef::keyed("p", "List"));
    }
}
