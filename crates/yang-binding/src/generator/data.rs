//! Records for data nodes, RPC input and output, augmentations and
//! identities

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::qname::QName;
use crate::schema::{
    AugmentationSchema, ContainerSchema, DataSchemaNode, ListSchema, Module, SchemaPath,
};
use crate::type_ref::TypeName;

use super::descriptor::{GeneratedType, Property, PropertyType, RecordKind, RecordType};
use super::naming::{next_available_name, package_name};
use super::typedefs::{TypeProvider, identity_type_name, push_data_property};
use super::{GeneratorError, GeneratorResult};

impl TypeProvider<'_> {
    /// Generate identities, data nodes, RPCs and augmentations of `module`.
    /// Typedefs of the module must already be generated.
    pub(super) fn generate_module_data(&mut self, module: &Module) -> GeneratorResult<()> {
        for identity in &module.identities {
            self.identity_record(&identity.qname)?;
        }

        for node in &module.data {
            match node {
                DataSchemaNode::Container(container) => {
                    self.container_record(container)?;
                }
                DataSchemaNode::List(list) => {
                    self.list_record(list)?;
                }
                DataSchemaNode::Leaf(leaf) => {
                    self.leaf_type(&leaf.path, &leaf.type_def)?;
                }
                DataSchemaNode::LeafList(list) => {
                    self.leaf_type(&list.path, &list.type_def)?;
                }
            }
        }

        for rpc in &module.rpcs {
            for container in [&rpc.input, &rpc.output].into_iter().flatten() {
                self.container_record(container)?;
            }
        }

        for augmentation in &module.augmentations {
            self.augmentation_record(module, augmentation)?;
        }

        debug!(
            module = %module.name,
            records = self.data_types.len(),
            augmentations = self.augmentations.len(),
            "Generated module data types"
        );
        Ok(())
    }

    fn container_record(&mut self, container: &ContainerSchema) -> GeneratorResult<Arc<RecordType>> {
        let name = self.record_name(&container.path)?;
        self.data_record(
            &container.path,
            name,
            RecordKind::Container(container.qname.clone()),
            &container.children,
        )
    }

    fn list_record(&mut self, list: &ListSchema) -> GeneratorResult<Arc<RecordType>> {
        let name = self.record_name(&list.path)?;
        self.data_record(
            &list.path,
            name,
            RecordKind::List {
                qname: list.qname.clone(),
                key: list.key.clone(),
            },
            &list.children,
        )
    }

    fn data_record(
        &mut self,
        path: &SchemaPath,
        name: TypeName,
        kind: RecordKind,
        children: &[DataSchemaNode],
    ) -> GeneratorResult<Arc<RecordType>> {
        if let Some(existing) = self.data_types.get(path) {
            return Ok(existing.clone());
        }

        let (properties, enclosed) = self.child_properties(children)?;
        let record = Arc::new(RecordType {
            name,
            kind,
            properties,
            extends: None,
            enclosed,
            constants: Vec::new(),
        });
        trace!(record = %record.name, path = %path, "Generated data record");
        self.data_types.insert(path.clone(), record.clone());
        Ok(record)
    }

    fn child_properties(
        &mut self,
        children: &[DataSchemaNode],
    ) -> GeneratorResult<(Vec<Property>, Vec<GeneratedType>)> {
        let mut properties = Vec::with_capacity(children.len());
        let mut enclosed = Vec::new();

        for child in children {
            let ty = match child {
                DataSchemaNode::Container(container) => Some(PropertyType::Generated(
                    GeneratedType::Record(self.container_record(container)?),
                )),
                DataSchemaNode::List(list) => Some(PropertyType::List(Box::new(
                    PropertyType::Generated(GeneratedType::Record(self.list_record(list)?)),
                ))),
                DataSchemaNode::Leaf(leaf) => self.leaf_type(&leaf.path, &leaf.type_def)?,
                DataSchemaNode::LeafList(list) => self
                    .leaf_type(&list.path, &list.type_def)?
                    .map(|ty| PropertyType::List(Box::new(ty))),
            };

            if let Some(inline) = self.inline_types.get(child.path()) {
                enclosed.push(inline.clone());
            }

            match ty {
                Some(ty) => {
                    if !push_data_property(&mut properties, child.qname().local_name(), ty) {
                        warn!(node = %child.path(), "Property name already taken, child skipped");
                    }
                }
                None => warn!(node = %child.path(), "Child type unresolved, property skipped"),
            }
        }
        Ok((properties, enclosed))
    }

    fn augmentation_record(
        &mut self,
        module: &Module,
        augmentation: &AugmentationSchema,
    ) -> GeneratorResult<Arc<RecordType>> {
        let target = self
            .data_types
            .get(&augmentation.target)
            .cloned()
            .ok_or_else(|| {
                GeneratorError::MalformedSchema(format!(
                    "module '{}' augments {} which has no generated type",
                    module.name, augmentation.target
                ))
            })?;

        let package = package_name(&module.qname_module);
        let simple_name = next_available_name(target.name.name(), |candidate| {
            self.augmentations
                .iter()
                .any(|a| a.name.package() == package && a.name.name() == candidate)
        });

        let (properties, enclosed) = self.child_properties(&augmentation.children)?;
        let record = Arc::new(RecordType {
            name: TypeName::new(&package, simple_name),
            kind: RecordKind::Augmentation {
                target: augmentation.target.clone(),
                children: augmentation.child_names().cloned().collect(),
            },
            properties,
            extends: None,
            enclosed,
            constants: Vec::new(),
        });
        trace!(record = %record.name, target = %augmentation.target, "Generated augmentation");
        self.augmentations.push(record.clone());
        Ok(record)
    }

    /// Identity record extending the record of its base identity.
    pub(super) fn identity_record(&mut self, qname: &QName) -> GeneratorResult<Arc<RecordType>> {
        if let Some(existing) = self.identities.get(qname) {
            return Ok(existing.clone());
        }
        let schema = self.schema;
        let identity = schema
            .find_identity(qname)
            .ok_or_else(|| GeneratorError::IdentityNotFound(qname.clone()))?;
        if !self.pending_identities.insert(qname.clone()) {
            return Err(GeneratorError::MalformedSchema(format!(
                "identity {qname} derives from itself"
            )));
        }

        let extends = match &identity.base {
            Some(base) => Some(self.identity_record(base)?),
            None => None,
        };
        self.pending_identities.remove(qname);

        let record = Arc::new(RecordType {
            name: identity_type_name(qname),
            kind: RecordKind::Identity(qname.clone()),
            properties: Vec::new(),
            extends,
            enclosed: Vec::new(),
            constants: Vec::new(),
        });
        self.identities.insert(qname.clone(), record.clone());
        Ok(record)
    }
}
