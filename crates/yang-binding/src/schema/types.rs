//! Type definitions

use crate::qname::QName;

use super::SchemaPath;

/// Built-in types of the schema language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    String,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Decimal64,
    Empty,
    Binary,
}

impl BuiltinType {
    /// Schema keyword for this type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Decimal64 => "decimal64",
            Self::Empty => "empty",
            Self::Binary => "binary",
        }
    }

    /// Inclusive value range for the integer types.
    pub fn int_range(&self) -> Option<(i128, i128)> {
        let range = match self {
            Self::Int8 => (i8::MIN as i128, i8::MAX as i128),
            Self::Int16 => (i16::MIN as i128, i16::MAX as i128),
            Self::Int32 => (i32::MIN as i128, i32::MAX as i128),
            Self::Int64 => (i64::MIN as i128, i64::MAX as i128),
            Self::Uint8 => (0, u8::MAX as i128),
            Self::Uint16 => (0, u16::MAX as i128),
            Self::Uint32 => (0, u32::MAX as i128),
            Self::Uint64 => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(range)
    }

    /// Whether this is an unsigned integer type.
    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Self::Uint8 | Self::Uint16 | Self::Uint32 | Self::Uint64
        )
    }
}

/// One value of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumPair {
    /// Label as written in the schema
    pub name: String,
    /// Assigned value
    pub value: i32,
}

/// One bit of a bits type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bit {
    /// Bit name as written in the schema
    pub name: String,
    /// Bit position
    pub position: u32,
}

/// Structural kind of a type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// A built-in type without restrictions
    Builtin(BuiltinType),
    /// Enumeration with its values in declaration order
    Enumeration(Vec<EnumPair>),
    /// Bits with their declarations in order
    Bits(Vec<Bit>),
    /// Union of member types in declaration order
    Union(Vec<TypeDefinition>),
    /// Reference to another leaf, by path expression
    Leafref(String),
    /// Reference to an identity derived from the given base
    Identityref(QName),
    /// A typedef or an inline restriction of another type
    Derived {
        /// The refined type
        base: Box<TypeDefinition>,
        /// Pattern restrictions added by this refinement
        patterns: Vec<String>,
    },
}

/// A type definition: a typedef, a built-in type use, or an inline
/// restriction.
///
/// For typedefs `qname` is the typedef name. For inline types it is the
/// keyword of the base type (`string`, `enumeration`, `union` and so on) in
/// the namespace of the module that uses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    /// Name of the type
    pub qname: QName,
    /// Schema location of the definition
    pub path: SchemaPath,
    /// Structure of the type
    pub kind: TypeKind,
}

impl TypeDefinition {
    /// The built-in type at the bottom of the derivation chain, if any.
    pub fn base_builtin(&self) -> Option<BuiltinType> {
        match &self.kind {
            TypeKind::Builtin(b) => Some(*b),
            TypeKind::Derived { base, .. } => base.base_builtin(),
            _ => None,
        }
    }

    /// The first non-derived definition of the chain.
    pub fn root_kind(&self) -> &TypeKind {
        match &self.kind {
            TypeKind::Derived { base, .. } => base.root_kind(),
            kind => kind,
        }
    }

    /// Number of refinement hops to reach a type that is not derived.
    ///
    /// A union counts as one hop more than its deepest member, so unions
    /// sort after the member typedefs they use.
    pub fn derivation_depth(&self) -> usize {
        match &self.kind {
            TypeKind::Derived { base, .. } => 1 + base.derivation_depth(),
            TypeKind::Union(members) => {
                1 + members
                    .iter()
                    .map(TypeDefinition::derivation_depth)
                    .max()
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(local: &str) -> QName {
        QName::new("urn:test", None, local).unwrap()
    }

    fn builtin(b: BuiltinType) -> TypeDefinition {
        TypeDefinition {
            qname: q(b.name()),
            path: SchemaPath::root(),
            kind: TypeKind::Builtin(b),
        }
    }

    fn derived(name: &str, base: TypeDefinition) -> TypeDefinition {
        TypeDefinition {
            qname: q(name),
            path: SchemaPath::create([q(name)]),
            kind: TypeKind::Derived {
                base: Box::new(base),
                patterns: Vec::new(),
            },
        }
    }

    #[test]
    fn depth_counts_refinement_hops() {
        let a = derived("a", builtin(BuiltinType::String));
        let b = derived("b", a.clone());
        assert_eq!(builtin(BuiltinType::String).derivation_depth(), 0);
        assert_eq!(a.derivation_depth(), 1);
        assert_eq!(b.derivation_depth(), 2);
        assert_eq!(b.base_builtin(), Some(BuiltinType::String));
    }

    #[test]
    fn union_depth_takes_deepest_member() {
        let a = derived("a", builtin(BuiltinType::String));
        let b = derived("b", a.clone());
        let union = TypeDefinition {
            qname: q("union"),
            path: SchemaPath::root(),
            kind: TypeKind::Union(vec![builtin(BuiltinType::Int32), b]),
        };
        assert_eq!(union.derivation_depth(), 3);
        assert!(derived("u", union).derivation_depth() > a.derivation_depth());
    }
}
