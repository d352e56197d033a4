//! Leaf value codecs
//!
//! Converts between a facade property value, as it appears in the facade's
//! `serde_json` tree, and a [`LeafValue`] of the generic tree.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{Map, Number, Value};

use crate::generator::{
    EnumerationType, GeneratedType, Pattern, PropertyType, RecordKind, RecordType,
    VALUE_PROPERTY,
};
use crate::node::LeafValue;
use crate::qname::QName;
use crate::schema::BuiltinType;
use crate::type_ref::TypeName;

use super::context::BindingRuntimeContext;
use super::error::{CodecError, CodecResult};

/// Per-property conversion plan.
#[derive(Debug, Clone)]
pub enum ValueCodec {
    /// Built-in scalar
    Primitive(BuiltinType),
    /// Textual scalar with pattern restrictions
    Restricted {
        base: BuiltinType,
        patterns: Vec<Pattern>,
    },
    /// Constant name on the facade, schema label in the tree
    Enumeration(Arc<EnumerationType>),
    /// `{"value": ...}` on the facade
    Wrapper(Box<ValueCodec>),
    /// Object of flags on the facade, set of bit names in the tree
    Bits(Arc<RecordType>),
    /// Object with one populated alternative on the facade
    Union(Vec<(String, ValueCodec)>),
    /// Identity type name on the facade, identity name in the tree
    Identity(TypeName),
}

/// What a value conversion needs from its surroundings.
pub struct ValueScope<'a> {
    pub runtime: &'a BindingRuntimeContext,
    pub enforce_patterns: bool,
    /// Facade property being converted, for error messages
    pub property: &'a str,
}

impl ValueScope<'_> {
    fn invalid(&self, reason: impl Into<String>) -> CodecError {
        CodecError::InvalidValue {
            property: self.property.to_string(),
            reason: reason.into(),
        }
    }
}

impl ValueCodec {
    /// Plan for a leaf or leaf-list property. Leaf-list properties are
    /// planned for their element type.
    pub fn for_property(ty: &PropertyType) -> Result<Self, String> {
        match ty {
            PropertyType::Primitive(builtin) => Ok(Self::Primitive(*builtin)),
            PropertyType::Identity(base) => Ok(Self::Identity(base.clone())),
            PropertyType::List(inner) => Self::for_property(inner),
            PropertyType::Generated(GeneratedType::Enumeration(e)) => {
                Ok(Self::Enumeration(e.clone()))
            }
            PropertyType::Generated(GeneratedType::Record(r) | GeneratedType::Union(r)) => {
                Self::for_record(r)
            }
        }
    }

    fn for_record(record: &Arc<RecordType>) -> Result<Self, String> {
        let mut root = record;
        while let Some(base) = &root.extends {
            root = base;
        }

        match &root.kind {
            RecordKind::Bits => Ok(Self::Bits(record.clone())),
            RecordKind::Wrapper => {
                let property = record
                    .property(VALUE_PROPERTY)
                    .ok_or_else(|| format!("{} has no value property", record.name))?;
                let PropertyType::Primitive(base) = &property.ty else {
                    return Err(format!("{} wraps a non-primitive value", record.name));
                };
                Ok(Self::Wrapper(Box::new(restricted(*base, record.patterns()))))
            }
            RecordKind::Union => {
                let patterns = record.patterns();
                let mut alternatives = Vec::new();
                for property in record.all_properties() {
                    let codec = match &property.ty {
                        PropertyType::Primitive(BuiltinType::String) => {
                            restricted(BuiltinType::String, patterns.clone())
                        }
                        other => Self::for_property(other)?,
                    };
                    alternatives.push((property.name.clone(), codec));
                }
                Ok(Self::Union(alternatives))
            }
            other => Err(format!("{} is a {other:?} record, not a value", record.name)),
        }
    }

    /// Facade value to leaf value.
    pub fn encode(&self, scope: &ValueScope<'_>, value: &Value) -> CodecResult<LeafValue> {
        match self {
            Self::Primitive(builtin) => encode_primitive(scope, *builtin, value),
            Self::Restricted { base, patterns } => {
                let leaf = encode_primitive(scope, *base, value)?;
                if scope.enforce_patterns {
                    check_patterns(&leaf, patterns)?;
                }
                Ok(leaf)
            }
            Self::Enumeration(enumeration) => {
                let name = value
                    .as_str()
                    .ok_or_else(|| scope.invalid(format!("expected constant name, found {value}")))?;
                let constant = enumeration.by_name(name).ok_or_else(|| {
                    scope.invalid(format!("{} has no constant {name}", enumeration.name))
                })?;
                Ok(LeafValue::String(constant.mapped_name.clone()))
            }
            Self::Wrapper(inner) => {
                let wrapped = value
                    .get(VALUE_PROPERTY)
                    .ok_or_else(|| scope.invalid("wrapper object without value"))?;
                inner.encode(scope, wrapped)
            }
            Self::Bits(record) => {
                let flags = value
                    .as_object()
                    .ok_or_else(|| scope.invalid(format!("expected bit flags, found {value}")))?;
                let properties = record.all_properties();
                let mut set = BTreeSet::new();
                for (name, flag) in flags {
                    let enabled = match flag {
                        Value::Bool(b) => *b,
                        Value::Null => false,
                        other => return Err(scope.invalid(format!("bit {name} is {other}"))),
                    };
                    let property = properties.iter().find(|p| &p.name == name);
                    match (property, enabled) {
                        (Some(p), true) => {
                            set.insert(p.yang_name.clone());
                        }
                        (None, true) => {
                            return Err(scope.invalid(format!("{} has no bit {name}", record.name)));
                        }
                        _ => {}
                    }
                }
                Ok(LeafValue::Bits(set))
            }
            Self::Union(alternatives) => {
                let object = value
                    .as_object()
                    .ok_or_else(|| scope.invalid(format!("expected union object, found {value}")))?;
                let mut populated = object.iter().filter(|(_, v)| !v.is_null());
                let (Some((name, inner)), None) = (populated.next(), populated.next()) else {
                    return Err(scope.invalid("union must have exactly one populated alternative"));
                };
                let (_, codec) = alternatives
                    .iter()
                    .find(|(alt, _)| alt == name)
                    .ok_or_else(|| scope.invalid(format!("unknown union alternative {name}")))?;
                codec.encode(scope, inner)
            }
            Self::Identity(base) => {
                let name = value
                    .as_str()
                    .and_then(TypeName::parse)
                    .ok_or_else(|| scope.invalid(format!("expected identity type, found {value}")))?;
                let qname = scope
                    .runtime
                    .identity_qname(&name)
                    .ok_or_else(|| scope.invalid(format!("{name} is not an identity")))?;
                check_identity_base(scope, qname, base)?;
                Ok(LeafValue::Identity(qname.clone()))
            }
        }
    }

    /// Leaf value to facade value. Fails when the value does not fit, which
    /// is how union decoding picks its alternative.
    pub fn decode(&self, scope: &ValueScope<'_>, leaf: &LeafValue) -> CodecResult<Value> {
        match self {
            Self::Primitive(builtin) => decode_primitive(scope, *builtin, leaf),
            Self::Restricted { base, patterns } => {
                check_patterns(leaf, patterns)?;
                decode_primitive(scope, *base, leaf)
            }
            Self::Enumeration(enumeration) => {
                let label = leaf
                    .as_str()
                    .ok_or_else(|| scope.invalid(format!("expected label, found {}", leaf.kind())))?;
                let constant = enumeration.by_label(label).ok_or_else(|| {
                    scope.invalid(format!("{} has no label {label}", enumeration.name))
                })?;
                Ok(Value::String(constant.name.clone()))
            }
            Self::Wrapper(inner) => {
                let value = inner.decode(scope, leaf)?;
                let mut object = Map::new();
                object.insert(VALUE_PROPERTY.to_string(), value);
                Ok(Value::Object(object))
            }
            Self::Bits(record) => {
                let LeafValue::Bits(set) = leaf else {
                    return Err(scope.invalid(format!("expected bits, found {}", leaf.kind())));
                };
                let properties = record.all_properties();
                if let Some(unknown) = set
                    .iter()
                    .find(|bit| !properties.iter().any(|p| &p.yang_name == *bit))
                {
                    return Err(scope.invalid(format!("{} has no bit {unknown}", record.name)));
                }
                let flags = properties
                    .iter()
                    .map(|p| (p.name.clone(), Value::Bool(set.contains(&p.yang_name))))
                    .collect();
                Ok(Value::Object(flags))
            }
            Self::Union(alternatives) => {
                for (name, codec) in alternatives {
                    if let Ok(value) = codec.decode(scope, leaf) {
                        let mut object = Map::new();
                        object.insert(name.clone(), value);
                        return Ok(Value::Object(object));
                    }
                }
                Err(scope.invalid(format!("no union alternative accepts {leaf}")))
            }
            Self::Identity(base) => {
                let LeafValue::Identity(qname) = leaf else {
                    return Err(scope.invalid(format!("expected identity, found {}", leaf.kind())));
                };
                check_identity_base(scope, qname, base)?;
                let name = scope
                    .runtime
                    .identity_type(qname)
                    .ok_or_else(|| scope.invalid(format!("identity {qname} has no type")))?;
                Ok(Value::String(name.to_string()))
            }
        }
    }
}

fn restricted(base: BuiltinType, patterns: Vec<&Pattern>) -> ValueCodec {
    if patterns.is_empty() || base != BuiltinType::String {
        ValueCodec::Primitive(base)
    } else {
        ValueCodec::Restricted {
            base,
            patterns: patterns.into_iter().cloned().collect(),
        }
    }
}

fn check_identity_base(scope: &ValueScope<'_>, qname: &QName, base: &TypeName) -> CodecResult<()> {
    if scope.runtime.identity_derives_from(qname, base) {
        Ok(())
    } else {
        Err(scope.invalid(format!("identity {qname} is not derived from {base}")))
    }
}

fn check_patterns(leaf: &LeafValue, patterns: &[Pattern]) -> CodecResult<()> {
    let Some(text) = leaf.as_str() else {
        return Ok(());
    };
    match patterns.iter().find(|p| !p.matches(text)) {
        Some(pattern) => Err(CodecError::PatternMismatch {
            value: text.to_string(),
            pattern: pattern.source.clone(),
        }),
        None => Ok(()),
    }
}

fn encode_primitive(
    scope: &ValueScope<'_>,
    builtin: BuiltinType,
    value: &Value,
) -> CodecResult<LeafValue> {
    let mismatch = || scope.invalid(format!("expected {}, found {value}", builtin.name()));
    match builtin {
        BuiltinType::String => value
            .as_str()
            .map(|s| LeafValue::String(s.to_string()))
            .ok_or_else(mismatch),
        BuiltinType::Boolean => value.as_bool().map(LeafValue::Boolean).ok_or_else(mismatch),
        BuiltinType::Decimal64 => match value {
            Value::Number(n) => Ok(LeafValue::Decimal(n.to_string())),
            _ => Err(mismatch()),
        },
        BuiltinType::Empty => match value {
            Value::Bool(true) => Ok(LeafValue::Empty),
            _ => Err(mismatch()),
        },
        BuiltinType::Binary => {
            let items = value.as_array().ok_or_else(mismatch)?;
            items
                .iter()
                .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()).ok_or_else(mismatch))
                .collect::<CodecResult<Vec<u8>>>()
                .map(LeafValue::Binary)
        }
        integer => {
            let (min, max) = integer.int_range().ok_or_else(mismatch)?;
            let number = value
                .as_i64()
                .map(i128::from)
                .or_else(|| value.as_u64().map(i128::from))
                .ok_or_else(mismatch)?;
            if number < min || number > max {
                return Err(scope.invalid(format!(
                    "{number} is out of range for {}",
                    integer.name()
                )));
            }
            if integer.is_unsigned() {
                Ok(LeafValue::Uint(number as u64))
            } else {
                Ok(LeafValue::Int(number as i64))
            }
        }
    }
}

fn decode_primitive(
    scope: &ValueScope<'_>,
    builtin: BuiltinType,
    leaf: &LeafValue,
) -> CodecResult<Value> {
    let mismatch = || scope.invalid(format!("expected {}, found {}", builtin.name(), leaf.kind()));
    match (builtin, leaf) {
        (BuiltinType::String, LeafValue::String(s)) => Ok(Value::String(s.clone())),
        (BuiltinType::Boolean, LeafValue::Boolean(b)) => Ok(Value::Bool(*b)),
        (BuiltinType::Decimal64, LeafValue::Decimal(text)) => {
            decimal_number(text).map(Value::Number).ok_or_else(mismatch)
        }
        (BuiltinType::Empty, LeafValue::Empty) => Ok(Value::Bool(true)),
        (BuiltinType::Binary, LeafValue::Binary(bytes)) => {
            Ok(Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()))
        }
        (integer, LeafValue::Int(_) | LeafValue::Uint(_)) => {
            let (min, max) = integer.int_range().ok_or_else(mismatch)?;
            let number = match leaf {
                LeafValue::Int(v) => i128::from(*v),
                LeafValue::Uint(v) => i128::from(*v),
                _ => return Err(mismatch()),
            };
            if number < min || number > max {
                return Err(mismatch());
            }
            if integer.is_unsigned() {
                Ok(Value::from(number as u64))
            } else {
                Ok(Value::from(number as i64))
            }
        }
        _ => Err(mismatch()),
    }
}

/// Facade number for a decimal64 text. Integral values are exact; values
/// with a fraction go through `f64` and keep about 15 significant digits.
fn decimal_number(text: &str) -> Option<Number> {
    if let Ok(int) = text.parse::<i64>() {
        return Some(Number::from(int));
    }
    if let Ok(uint) = text.parse::<u64>() {
        return Some(Number::from(uint));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}
