//! Resolution of typedefs and leaf types to generated descriptors

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use regex::Regex;
use tracing::{trace, warn};

use crate::qname::{QName, QNameModule};
use crate::schema::{
    Bit, BuiltinType, DataSchemaNode, EnumPair, Module, PathExpression, PathSegment,
    SchemaContext, SchemaPath, TypeDefinition, TypeKind,
};
use crate::type_ref::TypeName;

use super::descriptor::{
    Constant, ConstantValue, EnumValue, EnumerationType, GeneratedType, PATTERN_CONSTANT_NAME,
    Pattern, Property, PropertyType, RecordKind, RecordType, VALUE_PROPERTY,
};
use super::naming::{
    class_name, next_available_name, package_for_path, package_name, property_name,
};
use super::sort::sort_typedefs;
use super::{GeneratorError, GeneratorResult};

/// Accumulates every descriptor produced for a schema context.
pub(crate) struct TypeProvider<'s> {
    pub(super) schema: &'s SchemaContext,
    /// Typedef descriptors per module name, then typedef local name
    pub(super) typedefs: HashMap<String, BTreeMap<String, GeneratedType>>,
    /// Inline enumeration, union and bits types keyed by the leaf declaring them
    pub(super) inline_types: HashMap<SchemaPath, GeneratedType>,
    pub(super) data_types: HashMap<SchemaPath, Arc<RecordType>>,
    pub(super) identities: HashMap<QName, Arc<RecordType>>,
    pub(super) augmentations: Vec<Arc<RecordType>>,
    pub(super) pending_identities: HashSet<QName>,
    leafref_stack: Vec<SchemaPath>,
}

impl<'s> TypeProvider<'s> {
    pub(super) fn new(schema: &'s SchemaContext) -> Self {
        Self {
            schema,
            typedefs: HashMap::new(),
            inline_types: HashMap::new(),
            data_types: HashMap::new(),
            identities: HashMap::new(),
            augmentations: Vec::new(),
            pending_identities: HashSet::new(),
            leafref_stack: Vec::new(),
        }
    }

    pub(super) fn module_of(&self, module: &QNameModule) -> GeneratorResult<&'s Arc<Module>> {
        self.schema
            .find_module_by_namespace(module)
            .ok_or_else(|| GeneratorError::UnknownModule(module.to_string()))
    }

    /// Generate every typedef of `module`, shallowest derivation first.
    pub(super) fn generate_typedefs(&mut self, module: &Module) -> GeneratorResult<()> {
        for typedef in sort_typedefs(module) {
            let Some(generated) = self.typedef_type(module, typedef)? else {
                trace!(typedef = %typedef.qname, "Typedef resolves at its use sites");
                continue;
            };
            trace!(typedef = %typedef.qname, generated = %generated.name(), "Generated typedef");
            self.typedefs
                .entry(module.name.clone())
                .or_default()
                .insert(typedef.qname.local_name().to_string(), generated);
        }
        Ok(())
    }

    pub(super) fn lookup_typedef(&self, qname: &QName) -> Option<GeneratedType> {
        let module = self.schema.find_module_by_namespace(qname.module())?;
        self.typedefs
            .get(&module.name)?
            .get(qname.local_name())
            .cloned()
    }

    fn typedef_type(
        &mut self,
        module: &Module,
        typedef: &TypeDefinition,
    ) -> GeneratorResult<Option<GeneratedType>> {
        let TypeKind::Derived { base, patterns } = &typedef.kind else {
            return Err(GeneratorError::MalformedSchema(format!(
                "typedef {} does not refine a base type",
                typedef.qname
            )));
        };
        let name = TypeName::new(
            package_name(&module.qname_module),
            class_name(typedef.qname.local_name()),
        );

        let generated = match &base.kind {
            TypeKind::Builtin(builtin) => {
                GeneratedType::Record(Arc::new(wrapper_record(name, *builtin, patterns)?))
            }
            TypeKind::Enumeration(values) => {
                GeneratedType::Enumeration(enumeration_type(name, values))
            }
            TypeKind::Bits(bits) => GeneratedType::Record(bits_record(name, bits)),
            TypeKind::Union(members) => {
                GeneratedType::Union(self.union_record(name, members, &typedef.path)?)
            }
            TypeKind::Leafref(_) | TypeKind::Identityref(_) => return Ok(None),
            TypeKind::Derived { .. } => {
                let parent = is_typedef(base)
                    .then(|| self.lookup_typedef(&base.qname))
                    .flatten();
                let textual = typedef.base_builtin() == Some(BuiltinType::String);
                let constants = if textual {
                    pattern_constants(patterns)?
                } else {
                    Vec::new()
                };
                match parent {
                    Some(GeneratedType::Enumeration(parent)) => {
                        GeneratedType::Enumeration(Arc::new(EnumerationType {
                            name,
                            values: parent.values.clone(),
                        }))
                    }
                    Some(GeneratedType::Record(parent)) => {
                        GeneratedType::Record(Arc::new(extending_record(
                            name,
                            RecordKind::Wrapper,
                            parent,
                            constants,
                        )))
                    }
                    Some(GeneratedType::Union(parent)) => {
                        GeneratedType::Union(Arc::new(extending_record(
                            name,
                            RecordKind::Union,
                            parent,
                            constants,
                        )))
                    }
                    None => match typedef.base_builtin() {
                        Some(builtin) => GeneratedType::Record(Arc::new(wrapper_record(
                            name,
                            builtin,
                            &collect_patterns(typedef),
                        )?)),
                        None => return Ok(None),
                    },
                }
            }
        };
        Ok(Some(generated))
    }

    /// Union record for `members`. Nested unions become enclosed records
    /// linked through a single property.
    pub(super) fn union_record(
        &mut self,
        name: TypeName,
        members: &[TypeDefinition],
        context: &SchemaPath,
    ) -> GeneratorResult<Arc<RecordType>> {
        let mut properties = Vec::new();
        let mut enclosed: Vec<GeneratedType> = Vec::new();
        let mut patterns = Vec::new();

        for member in members {
            let local = member.qname.local_name();
            match &member.kind {
                TypeKind::Union(nested) => {
                    let nested_name = next_available_name(name.name(), |candidate| {
                        candidate == name.name()
                            || enclosed.iter().any(|t| t.name().name() == candidate)
                    });
                    let record = self.union_record(name.nested(&nested_name), nested, context)?;
                    let nested_type = GeneratedType::Union(record);
                    push_property(
                        &mut properties,
                        property_name(&nested_name),
                        local,
                        PropertyType::Generated(nested_type.clone()),
                        true,
                    );
                    enclosed.push(nested_type);
                }
                TypeKind::Enumeration(values) => {
                    let enumeration = GeneratedType::Enumeration(enumeration_type(
                        name.nested(class_name(local)),
                        values,
                    ));
                    push_property(
                        &mut properties,
                        property_name(local),
                        local,
                        PropertyType::Generated(enumeration.clone()),
                        true,
                    );
                    enclosed.push(enumeration);
                }
                TypeKind::Bits(bits) => {
                    let record =
                        GeneratedType::Record(bits_record(name.nested(class_name(local)), bits));
                    push_property(
                        &mut properties,
                        property_name(local),
                        local,
                        PropertyType::Generated(record.clone()),
                        true,
                    );
                    enclosed.push(record);
                }
                TypeKind::Derived { .. } if is_typedef(member) => {
                    match self.lookup_typedef(&member.qname) {
                        Some(generated) => {
                            let property = property_name(generated.name().name());
                            push_property(
                                &mut properties,
                                property,
                                local,
                                PropertyType::Generated(generated),
                                true,
                            );
                        }
                        None => {
                            if let Some(ty) = self.scalar_type(member, context)? {
                                push_property(&mut properties, property_name(local), local, ty, true);
                            }
                        }
                    }
                }
                _ => {
                    if member.base_builtin() == Some(BuiltinType::String) {
                        patterns.extend(collect_patterns(member));
                    }
                    if let Some(ty) = self.scalar_type(member, context)? {
                        push_property(&mut properties, property_name(local), local, ty, true);
                    }
                }
            }
        }

        Ok(Arc::new(RecordType {
            name,
            kind: RecordKind::Union,
            properties,
            extends: None,
            enclosed,
            constants: pattern_constants(&patterns)?,
        }))
    }

    /// Property type of the leaf at `leaf_path`. Inline enumerations,
    /// unions and bits are generated once per leaf and reused afterwards.
    pub(super) fn leaf_type(
        &mut self,
        leaf_path: &SchemaPath,
        type_def: &TypeDefinition,
    ) -> GeneratorResult<Option<PropertyType>> {
        if let Some(existing) = self.inline_types.get(leaf_path) {
            return Ok(Some(PropertyType::Generated(existing.clone())));
        }

        let generated = match &type_def.kind {
            TypeKind::Enumeration(values) => {
                let name = self.inline_type_name(leaf_path)?;
                GeneratedType::Enumeration(enumeration_type(name, values))
            }
            TypeKind::Union(members) => {
                let name = self.inline_type_name(leaf_path)?;
                GeneratedType::Union(self.union_record(name, members, leaf_path)?)
            }
            TypeKind::Bits(bits) => {
                let name = self.inline_type_name(leaf_path)?;
                GeneratedType::Record(bits_record(name, bits))
            }
            _ => return self.scalar_type(type_def, leaf_path),
        };

        trace!(leaf = %leaf_path, generated = %generated.name(), "Generated inline type");
        self.inline_types
            .insert(leaf_path.clone(), generated.clone());
        Ok(Some(PropertyType::Generated(generated)))
    }

    fn scalar_type(
        &mut self,
        type_def: &TypeDefinition,
        leaf_path: &SchemaPath,
    ) -> GeneratorResult<Option<PropertyType>> {
        match &type_def.kind {
            TypeKind::Builtin(builtin) => Ok(Some(PropertyType::Primitive(*builtin))),
            TypeKind::Leafref(expression) => {
                self.leafref_type(expression, &type_def.qname, leaf_path)
            }
            TypeKind::Identityref(base) => self.identity_type(base).map(Some),
            TypeKind::Derived { base, .. } => {
                if is_typedef(type_def) {
                    if let Some(generated) = self.lookup_typedef(&type_def.qname) {
                        return Ok(Some(PropertyType::Generated(generated)));
                    }
                }
                self.scalar_type(base, leaf_path)
            }
            TypeKind::Enumeration(_) | TypeKind::Union(_) | TypeKind::Bits(_) => Ok(None),
        }
    }

    fn leafref_type(
        &mut self,
        expression: &str,
        origin: &QName,
        leaf_path: &SchemaPath,
    ) -> GeneratorResult<Option<PropertyType>> {
        if self.leafref_stack.contains(leaf_path) {
            warn!(leaf = %leaf_path, path = expression, "Leafref cycle, type left unresolved");
            return Ok(None);
        }
        let Some(target_path) = self.leafref_target(expression, origin, leaf_path) else {
            warn!(leaf = %leaf_path, path = expression, "Leafref path does not resolve");
            return Ok(None);
        };
        let schema = self.schema;
        let Some(target) = schema.find_data_node(&target_path) else {
            warn!(leaf = %leaf_path, target = %target_path, "Leafref target not found");
            return Ok(None);
        };

        self.leafref_stack.push(leaf_path.clone());
        let resolved = match target {
            DataSchemaNode::Leaf(leaf) => self.leaf_type(&leaf.path, &leaf.type_def),
            DataSchemaNode::LeafList(list) => self.leaf_type(&list.path, &list.type_def),
            _ => {
                warn!(leaf = %leaf_path, target = %target_path, "Leafref target is not a leaf");
                Ok(None)
            }
        };
        self.leafref_stack.pop();
        resolved
    }

    /// Schema path a leafref expression points at. Predicates are ignored;
    /// relative paths start at the referencing leaf.
    fn leafref_target(
        &self,
        expression: &str,
        origin: &QName,
        leaf_path: &SchemaPath,
    ) -> Option<SchemaPath> {
        let module = self.schema.find_module_by_namespace(origin.module())?;
        let parsed = PathExpression::parse(expression)?;
        let mut steps: Vec<QName> = if parsed.absolute {
            Vec::new()
        } else {
            leaf_path.steps().to_vec()
        };
        for segment in parsed.segments {
            match segment {
                PathSegment::Parent => {
                    steps.pop()?;
                }
                PathSegment::Node { prefix, name } => {
                    steps.push(module.resolve_prefix(prefix)?.qname(name).ok()?);
                }
            }
        }
        Some(SchemaPath::create(steps))
    }

    fn identity_type(&self, base: &QName) -> GeneratorResult<PropertyType> {
        if self.schema.find_identity(base).is_none() {
            return Err(GeneratorError::IdentityNotFound(base.clone()));
        }
        Ok(PropertyType::Identity(identity_type_name(base)))
    }

    /// Name of the record generated for the data node at `path`.
    pub(super) fn record_name(&self, path: &SchemaPath) -> GeneratorResult<TypeName> {
        match path.steps() {
            [] => Err(GeneratorError::MalformedSchema(
                "data node without a schema path".into(),
            )),
            [rpc, io]
                if matches!(io.local_name(), "input" | "output")
                    && self.schema.find_rpc(rpc).is_some() =>
            {
                Ok(TypeName::new(
                    package_name(rpc.module()),
                    format!(
                        "{}{}",
                        class_name(rpc.local_name()),
                        class_name(io.local_name())
                    ),
                ))
            }
            [.., last] => Ok(TypeName::new(
                package_for_path(last.module(), path),
                class_name(last.local_name()),
            )),
        }
    }

    /// Inline types nest inside the record of the leaf's parent; leaves at
    /// the top of a module nest inside `<Module>Data`.
    fn inline_type_name(&self, leaf_path: &SchemaPath) -> GeneratorResult<TypeName> {
        let leaf = leaf_path.last().ok_or_else(|| {
            GeneratorError::MalformedSchema("leaf without a schema path".into())
        })?;
        let parent = match leaf_path.parent() {
            Some(parent) if !parent.is_empty() => self.record_name(&parent)?,
            _ => {
                let module = self.module_of(leaf.module())?;
                TypeName::new(
                    package_name(leaf.module()),
                    format!("{}Data", class_name(&module.name)),
                )
            }
        };
        Ok(parent.nested(class_name(leaf.local_name())))
    }
}

/// Name of the record generated for an identity.
pub(crate) fn identity_type_name(identity: &QName) -> TypeName {
    TypeName::new(
        package_name(identity.module()),
        class_name(identity.local_name()),
    )
}

/// A typedef (as opposed to an inline type) sits directly under the module.
fn is_typedef(type_def: &TypeDefinition) -> bool {
    matches!(type_def.kind, TypeKind::Derived { .. })
        && type_def.path.len() == 1
        && type_def.path.last() == Some(&type_def.qname)
}

/// Patterns of every refinement in the chain, outermost first.
fn collect_patterns(type_def: &TypeDefinition) -> Vec<String> {
    let mut collected = Vec::new();
    let mut current = type_def;
    while let TypeKind::Derived { base, patterns } = &current.kind {
        collected.extend(patterns.iter().cloned());
        current = base;
    }
    collected
}

fn push_property(
    properties: &mut Vec<Property>,
    name: String,
    yang_name: &str,
    ty: PropertyType,
    read_only: bool,
) {
    if properties.iter().any(|p| p.name == name) {
        trace!(property = %name, "Skipping duplicate property");
        return;
    }
    properties.push(Property {
        ordinal: properties.len(),
        name,
        yang_name: yang_name.to_string(),
        ty,
        read_only,
    });
}

pub(super) fn push_data_property(
    properties: &mut Vec<Property>,
    yang_name: &str,
    ty: PropertyType,
) -> bool {
    let before = properties.len();
    push_property(properties, property_name(yang_name), yang_name, ty, false);
    properties.len() > before
}

/// Compile a schema pattern anchored at both ends.
pub(crate) fn compile_pattern(source: &str) -> GeneratorResult<Pattern> {
    Regex::new(&format!("^(?:{source})$"))
        .map(|regex| Pattern {
            source: source.to_string(),
            regex,
        })
        .map_err(|e| GeneratorError::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })
}

fn pattern_constants(patterns: &[String]) -> GeneratorResult<Vec<Constant>> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }
    let compiled = patterns
        .iter()
        .map(|p| compile_pattern(p))
        .collect::<GeneratorResult<Vec<_>>>()?;
    Ok(vec![Constant {
        name: PATTERN_CONSTANT_NAME.to_string(),
        value: ConstantValue::Patterns(compiled),
    }])
}

fn wrapper_record(
    name: TypeName,
    builtin: BuiltinType,
    patterns: &[String],
) -> GeneratorResult<RecordType> {
    let constants = if builtin == BuiltinType::String {
        pattern_constants(patterns)?
    } else {
        Vec::new()
    };
    Ok(RecordType {
        name,
        kind: RecordKind::Wrapper,
        properties: vec![Property {
            name: VALUE_PROPERTY.to_string(),
            yang_name: VALUE_PROPERTY.to_string(),
            ordinal: 0,
            ty: PropertyType::Primitive(builtin),
            read_only: true,
        }],
        extends: None,
        enclosed: Vec::new(),
        constants,
    })
}

fn extending_record(
    name: TypeName,
    kind: RecordKind,
    parent: Arc<RecordType>,
    constants: Vec<Constant>,
) -> RecordType {
    RecordType {
        name,
        kind,
        properties: Vec::new(),
        extends: Some(parent),
        enclosed: Vec::new(),
        constants,
    }
}

fn enumeration_type(name: TypeName, values: &[EnumPair]) -> Arc<EnumerationType> {
    Arc::new(EnumerationType {
        name,
        values: values
            .iter()
            .map(|pair| EnumValue {
                name: class_name(&pair.name),
                mapped_name: pair.name.clone(),
                value: pair.value,
            })
            .collect(),
    })
}

fn bits_record(name: TypeName, bits: &[Bit]) -> Arc<RecordType> {
    let mut properties = Vec::with_capacity(bits.len());
    for bit in bits {
        push_property(
            &mut properties,
            property_name(&bit.name),
            &bit.name,
            PropertyType::Primitive(BuiltinType::Boolean),
            true,
        );
    }
    Arc::new(RecordType {
        name,
        kind: RecordKind::Bits,
        properties,
        extends: None,
        enclosed: Vec::new(),
        constants: Vec::new(),
    })
}
