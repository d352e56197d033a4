//! Generated type descriptors
//!
//! Descriptors are immutable once built and shared through `Arc`. Identity
//! of the `Arc` is meaningful: a leafref to an enumeration leaf resolves to
//! the very same [`EnumerationType`] instance as the leaf itself.

use std::sync::Arc;

use regex::Regex;

use crate::qname::QName;
use crate::schema::{BuiltinType, SchemaPath};
use crate::type_ref::{TypeName, TypeRef};

/// Name of the constant holding the pattern restrictions of a type.
pub const PATTERN_CONSTANT_NAME: &str = "PATTERN_CONSTANTS";

/// Name of the single property of a wrapper record.
pub const VALUE_PROPERTY: &str = "value";

/// A generated type.
#[derive(Debug, Clone)]
pub enum GeneratedType {
    /// A record with properties
    Record(Arc<RecordType>),
    /// An enumeration
    Enumeration(Arc<EnumerationType>),
    /// A record whose properties are alternative representations
    Union(Arc<RecordType>),
}

impl GeneratedType {
    /// Name of the type.
    pub fn name(&self) -> &TypeName {
        match self {
            Self::Record(r) | Self::Union(r) => &r.name,
            Self::Enumeration(e) => &e.name,
        }
    }

    /// The record behind a record or union.
    pub fn as_record(&self) -> Option<&Arc<RecordType>> {
        match self {
            Self::Record(r) | Self::Union(r) => Some(r),
            Self::Enumeration(_) => None,
        }
    }

    /// The enumeration, if this is one.
    pub fn as_enumeration(&self) -> Option<&Arc<EnumerationType>> {
        match self {
            Self::Enumeration(e) => Some(e),
            _ => None,
        }
    }

    /// Whether both handles point at the same descriptor instance.
    pub fn ptr_eq(&self, other: &GeneratedType) -> bool {
        match (self, other) {
            (Self::Record(a), Self::Record(b)) | (Self::Union(a), Self::Union(b)) => {
                Arc::ptr_eq(a, b)
            }
            (Self::Enumeration(a), Self::Enumeration(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// One constant of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Constant name on the facade side
    pub name: String,
    /// Label in the schema
    pub mapped_name: String,
    /// Assigned value
    pub value: i32,
}

/// Generated enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationType {
    pub name: TypeName,
    pub values: Vec<EnumValue>,
}

impl EnumerationType {
    /// Constant by facade name.
    pub fn by_name(&self, name: &str) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.name == name)
    }

    /// Constant by schema label.
    pub fn by_label(&self, label: &str) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.mapped_name == label)
    }
}

/// A compiled pattern restriction.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// The pattern as written in the schema
    pub source: String,
    /// Anchored compiled form
    pub regex: Regex,
}

impl Pattern {
    /// Whether the whole value matches.
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// Value of a generated constant.
#[derive(Debug, Clone)]
pub enum ConstantValue {
    /// Pattern restrictions a textual value must all match
    Patterns(Vec<Pattern>),
}

/// A named constant attached to a record.
#[derive(Debug, Clone)]
pub struct Constant {
    pub name: String,
    pub value: ConstantValue,
}

/// Type of a property.
#[derive(Debug, Clone)]
pub enum PropertyType {
    /// A built-in scalar
    Primitive(BuiltinType),
    /// A generated record, union or enumeration
    Generated(GeneratedType),
    /// A type tag of an identity derived from the named base identity
    Identity(TypeName),
    /// Ordered collection of the inner type
    List(Box<PropertyType>),
}

impl PropertyType {
    /// The generated type, if this property refers to one directly.
    pub fn generated(&self) -> Option<&GeneratedType> {
        match self {
            Self::Generated(g) => Some(g),
            _ => None,
        }
    }
}

/// A property of a record.
#[derive(Debug, Clone)]
pub struct Property {
    /// Property name on the facade side
    pub name: String,
    /// Name of the schema element the property maps to
    pub yang_name: String,
    /// Position in declaration order
    pub ordinal: usize,
    pub ty: PropertyType,
    pub read_only: bool,
}

/// What a record was generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    /// A typedef refining a primitive or another typedef
    Wrapper,
    /// A union type
    Union,
    /// A bits type
    Bits,
    /// A container, or the input or output of an RPC
    Container(QName),
    /// A list; `key` is empty for unkeyed lists
    List { qname: QName, key: Vec<QName> },
    /// Children added to `target` by another module
    Augmentation { target: SchemaPath, children: Vec<QName> },
    /// An identity
    Identity(QName),
}

/// A generated record type.
#[derive(Debug, Clone)]
pub struct RecordType {
    pub name: TypeName,
    pub kind: RecordKind,
    pub properties: Vec<Property>,
    pub extends: Option<Arc<RecordType>>,
    pub enclosed: Vec<GeneratedType>,
    pub constants: Vec<Constant>,
}

impl RecordType {
    /// Properties of the whole `extends` chain, base first.
    pub fn all_properties(&self) -> Vec<&Property> {
        let mut properties = match &self.extends {
            Some(base) => base.all_properties(),
            None => Vec::new(),
        };
        properties.extend(self.properties.iter());
        properties
    }

    /// Property by facade name, searching the `extends` chain.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .or_else(|| self.extends.as_ref()?.property(name))
    }

    /// Pattern restrictions of this record and its bases.
    pub fn patterns(&self) -> Vec<&Pattern> {
        let mut patterns = match &self.extends {
            Some(base) => base.patterns(),
            None => Vec::new(),
        };
        for constant in &self.constants {
            let ConstantValue::Patterns(own) = &constant.value;
            patterns.extend(own.iter());
        }
        patterns
    }

    /// Constant by name.
    pub fn constant(&self, name: &str) -> Option<&Constant> {
        self.constants.iter().find(|c| c.name == name)
    }

    /// Enclosed type by simple name.
    pub fn find_enclosed(&self, name: &str) -> Option<&GeneratedType> {
        self.enclosed.iter().find(|t| t.name().name() == name)
    }

    /// Schema node type of a data record.
    pub fn node_type(&self) -> Option<&QName> {
        match &self.kind {
            RecordKind::Container(q) | RecordKind::List { qname: q, .. } => Some(q),
            _ => None,
        }
    }

    /// Reference handed to identifiers and codecs.
    pub fn type_ref(&self) -> TypeRef {
        match &self.kind {
            RecordKind::List { key, .. } if !key.is_empty() => {
                TypeRef::identifiable(self.name.clone())
            }
            _ => TypeRef::new(self.name.clone()),
        }
    }
}
