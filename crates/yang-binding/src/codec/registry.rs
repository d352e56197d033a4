//! Codec registry
//!
//! [`BindingCodecRegistry`] owns the active [`CodecContext`]. A context is an
//! immutable snapshot: the runtime context, the codec units synthesized for
//! it and a version number. Replacing the context swaps the whole snapshot,
//! so no unit built for one schema is ever used with another.
//!
//! Every registry operation loads the snapshot once at its start and works
//! only against it. An operation that is running while the context is
//! replaced completes against the context it started with.
//!
//! # Example
//! ```rust,ignore
//! let registry = BindingCodecRegistry::new(CodecConfig::default())?;
//! registry.on_context_updated(Arc::new(BindingRuntimeContext::create(schema)?));
//!
//! let node = registry.encode(&top)?;
//! let back: Top = registry.decode(&node)?;
//! ```

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use tracing::{debug, info, instrument, trace};

use crate::config::{CodecConfig, ConfigValidationError};
use crate::identifier::{InstanceIdentifier, Key, PathArgument};
use crate::node::{NormalizedNode, PathStep, Predicates, YangInstanceIdentifier};
use crate::object::{DataObject, DynDataObject};
use crate::qname::QName;
use crate::schema::SchemaContext;
use crate::type_ref::{TypeName, TypeRef};

use super::context::{BindingRuntimeContext, BoundNode};
use super::error::{CodecError, CodecResult};
use super::metrics::{CodecMetrics, CodecStats};
use super::unit::DataObjectCodec;

/// One immutable codec snapshot.
#[derive(Debug)]
pub struct CodecContext {
    runtime: Arc<BindingRuntimeContext>,
    config: CodecConfig,
    codecs: DashMap<TypeName, Arc<DataObjectCodec>>,
    metrics: Arc<CodecMetrics>,
    version: u64,
}

impl CodecContext {
    fn new(
        runtime: Arc<BindingRuntimeContext>,
        config: CodecConfig,
        metrics: Arc<CodecMetrics>,
        version: u64,
    ) -> Self {
        Self {
            runtime,
            config,
            codecs: DashMap::new(),
            metrics,
            version,
        }
    }

    pub fn runtime(&self) -> &BindingRuntimeContext {
        &self.runtime
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Version of the snapshot; increases with every context update.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of codec units synthesized so far in this snapshot.
    pub fn cached_codecs(&self) -> usize {
        self.codecs.len()
    }

    /// Codec unit for `type_ref`, synthesized on first use.
    ///
    /// Concurrent misses for one type build the unit once; the others wait
    /// on the cache entry. Failed syntheses are not cached.
    pub fn codec(&self, type_ref: &TypeRef) -> CodecResult<Arc<DataObjectCodec>> {
        if let Some(codec) = self.codecs.get(type_ref.name()) {
            self.metrics.record_hit();
            return Ok(codec.clone());
        }

        self.metrics.record_miss();
        let entry = self
            .codecs
            .entry(type_ref.name().clone())
            .or_try_insert_with(|| {
                let codec = DataObjectCodec::synthesize(&self.runtime, type_ref)?;
                self.metrics.record_synthesis();
                Ok(Arc::new(codec))
            });
        match entry {
            Ok(codec) => Ok(codec.clone()),
            Err(err) => {
                self.metrics.record_failure();
                debug!(type_name = %type_ref.name(), error = %err, "Codec synthesis failed");
                Err(err)
            }
        }
    }

    /// Translate a binding identifier into a generic path.
    pub fn to_generic_path(&self, id: &InstanceIdentifier) -> CodecResult<YangInstanceIdentifier> {
        let mut steps = Vec::with_capacity(id.len() + 1);
        let mut current: Option<&Arc<BoundNode>> = None;

        for argument in id.path_arguments() {
            let bound = self.runtime.bound_ref(argument.type_ref())?;
            check_placement(current, bound)?;
            if argument.key().is_some() && bound.key.is_empty() {
                return Err(CodecError::InvalidPath(format!(
                    "{} is not identifiable and cannot carry a key",
                    bound.name()
                )));
            }

            if bound.is_augmentation() {
                steps.push(PathStep::Augmentation(bound.child_names()));
            } else {
                let qname = bound.qname.clone();
                match argument {
                    PathArgument::IdentifiableItem(_, key) => {
                        let predicates = key_predicates(bound, key)?;
                        steps.push(PathStep::Node(qname.clone()));
                        steps.push(PathStep::NodeWithKey(qname, predicates));
                    }
                    PathArgument::Item(_) => steps.push(PathStep::Node(qname)),
                }
            }
            current = Some(bound);
        }
        Ok(YangInstanceIdentifier::create(steps))
    }

    /// Translate a generic path into a binding identifier.
    pub fn from_generic_path(&self, path: &YangInstanceIdentifier) -> CodecResult<InstanceIdentifier> {
        let steps = path.steps();
        let mut arguments = Vec::with_capacity(steps.len());
        let mut current: Option<&Arc<BoundNode>> = None;

        let mut index = 0;
        while index < steps.len() {
            let step = &steps[index];
            index += 1;

            let (qname, predicates) = match step {
                PathStep::Augmentation(children) => {
                    let parent = current.ok_or_else(|| {
                        CodecError::InvalidPath("path cannot start with an augmentation".into())
                    })?;
                    let augmentation = self.find_augmentation(parent, children)?;
                    arguments.push(PathArgument::Item(augmentation.type_ref()));
                    current = Some(augmentation);
                    continue;
                }
                PathStep::Node(qname) => match steps.get(index) {
                    Some(PathStep::NodeWithKey(next, predicates)) if next == qname => {
                        index += 1;
                        (qname, Some(predicates))
                    }
                    _ => (qname, None),
                },
                PathStep::NodeWithKey(qname, predicates) => (qname, Some(predicates)),
            };

            let bound = match current {
                None => self.runtime.root(qname).ok_or_else(|| {
                    CodecError::InvalidPath(format!("{qname} is not a top-level node"))
                })?,
                Some(parent) => {
                    let (owner, target) = self.resolve_child(parent, qname)?;
                    if let Some(augmentation) = owner {
                        arguments.push(PathArgument::Item(augmentation.type_ref()));
                    }
                    self.runtime.bound_ref(&target)?
                }
            };

            let argument = match predicates {
                Some(predicates) => {
                    if !bound.is_list() || bound.key.is_empty() {
                        return Err(CodecError::InvalidPath(format!(
                            "{qname} is not a keyed list"
                        )));
                    }
                    PathArgument::IdentifiableItem(bound.type_ref(), predicate_key(bound, predicates)?)
                }
                None => PathArgument::Item(bound.type_ref()),
            };
            arguments.push(argument);
            current = Some(bound);
        }

        Ok(InstanceIdentifier::create(arguments)?)
    }

    /// Encode a facade object of a statically known type.
    pub fn encode<T: DataObject>(&self, object: &T) -> CodecResult<NormalizedNode> {
        let value = serde_json::to_value(object)?;
        self.encode_value(&T::binding_type(), &value)
    }

    /// Encode a type-erased facade object.
    pub fn encode_dyn(&self, object: &dyn DynDataObject) -> CodecResult<NormalizedNode> {
        let value = object.to_json()?;
        self.encode_value(&object.type_ref(), &value)
    }

    /// Encode a facade property tree of type `type_ref`.
    pub fn encode_value(
        &self,
        type_ref: &TypeRef,
        value: &serde_json::Value,
    ) -> CodecResult<NormalizedNode> {
        let node = self.codec(type_ref)?.encode_node(self, value, 0)?;
        if self.config.debug_logging {
            debug!(type_name = %type_ref.name(), node = node.kind(), "Encoded facade object");
        }
        Ok(node)
    }

    /// Decode a generic node into a facade object.
    pub fn decode<T: DataObject>(&self, node: &NormalizedNode) -> CodecResult<T> {
        let value = self.decode_as(node, &T::binding_type())?;
        Ok(serde_json::from_value(value)?)
    }

    /// Decode a generic node into the property tree of `type_ref`.
    pub fn decode_as(
        &self,
        node: &NormalizedNode,
        type_ref: &TypeRef,
    ) -> CodecResult<serde_json::Value> {
        let value = self.codec(type_ref)?.decode_node(self, node, 0)?;
        if self.config.debug_logging {
            debug!(type_name = %type_ref.name(), "Decoded generic node");
        }
        Ok(value)
    }

    fn find_augmentation(
        &self,
        parent: &BoundNode,
        children: &BTreeSet<QName>,
    ) -> CodecResult<&Arc<BoundNode>> {
        parent
            .augmentations
            .iter()
            .filter_map(|name| self.runtime.bound(name))
            .find(|augmentation| &augmentation.child_names() == children)
            .ok_or_else(|| {
                CodecError::InvalidPath(format!("no augmentation of {} matches", parent.name()))
            })
    }

    /// Record type of a child, with the augmentation it comes from when the
    /// parent does not declare it directly.
    fn resolve_child(
        &self,
        parent: &Arc<BoundNode>,
        qname: &QName,
    ) -> CodecResult<(Option<&Arc<BoundNode>>, TypeRef)> {
        let addressable = |node: &BoundNode| {
            node.child(qname).map(|child| {
                child.target.clone().ok_or_else(|| {
                    CodecError::InvalidPath(format!("{qname} is not a container or list"))
                })
            })
        };

        if let Some(target) = addressable(parent) {
            return Ok((None, target?));
        }
        for name in &parent.augmentations {
            let Some(augmentation) = self.runtime.bound(name) else {
                continue;
            };
            if let Some(target) = addressable(augmentation) {
                return Ok((Some(augmentation), target?));
            }
        }
        Err(CodecError::InvalidPath(format!(
            "{qname} is not a child of {}",
            parent.name()
        )))
    }
}

/// A step must be a top-level node, or sit directly below the previous one.
fn check_placement(parent: Option<&Arc<BoundNode>>, bound: &BoundNode) -> CodecResult<()> {
    let placed = match parent {
        None => !bound.is_augmentation() && bound.path.len() == 1,
        Some(parent) if bound.is_augmentation() => {
            parent.augmentations.contains(bound.name())
        }
        Some(parent) => bound.path.parent().as_ref() == Some(&parent.path),
    };
    if placed {
        Ok(())
    } else {
        Err(CodecError::InvalidPath(format!(
            "{} cannot appear at this position",
            bound.name()
        )))
    }
}

/// Key leaves of `bound` must be given exactly.
fn key_predicates(bound: &BoundNode, key: &Key) -> CodecResult<Predicates> {
    if key.len() != bound.key.len() {
        return Err(invalid_key(bound, format!(
            "expected {} key leaves, found {}",
            bound.key.len(),
            key.len()
        )));
    }
    bound
        .key
        .iter()
        .map(|leaf| {
            key.get(leaf.local_name())
                .map(|value| (leaf.clone(), value.clone()))
                .ok_or_else(|| invalid_key(bound, format!("missing key leaf {}", leaf.local_name())))
        })
        .collect()
}

fn predicate_key(bound: &BoundNode, predicates: &Predicates) -> CodecResult<Key> {
    if predicates.len() != bound.key.len() {
        return Err(invalid_key(bound, format!(
            "expected {} key predicates, found {}",
            bound.key.len(),
            predicates.len()
        )));
    }
    bound
        .key
        .iter()
        .map(|leaf| {
            predicates
                .get(leaf)
                .map(|value| (leaf.local_name().to_string(), value.clone()))
                .ok_or_else(|| invalid_key(bound, format!("missing predicate {}", leaf.local_name())))
        })
        .collect()
}

fn invalid_key(bound: &BoundNode, reason: String) -> CodecError {
    CodecError::InvalidKey {
        list: bound.name().clone(),
        reason,
    }
}

/// Process-wide codec registry with a replaceable context.
#[derive(Debug)]
pub struct BindingCodecRegistry {
    current: ArcSwapOption<CodecContext>,
    update_lock: Mutex<()>,
    config: CodecConfig,
    metrics: Arc<CodecMetrics>,
}

impl Default for BindingCodecRegistry {
    fn default() -> Self {
        Self {
            current: ArcSwapOption::empty(),
            update_lock: Mutex::new(()),
            config: CodecConfig::default(),
            metrics: Arc::new(CodecMetrics::new()),
        }
    }
}

impl BindingCodecRegistry {
    /// Create an empty registry. A context must be installed before use.
    pub fn new(config: CodecConfig) -> Result<Self, ConfigValidationError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// The active snapshot. Holding it pins every later call to this context.
    pub fn snapshot(&self) -> CodecResult<Arc<CodecContext>> {
        self.current.load_full().ok_or(CodecError::MissingContext)
    }

    /// Install a new runtime context, dropping all codec units of the old one.
    ///
    /// Updates are serialized. Operations already holding the previous
    /// snapshot keep using it.
    #[instrument(skip_all)]
    pub fn on_context_updated(&self, runtime: Arc<BindingRuntimeContext>) -> Arc<CodecContext> {
        let _guard = self
            .update_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let version = self
            .current
            .load_full()
            .map_or(1, |previous| previous.version + 1);
        let context = Arc::new(CodecContext::new(
            runtime,
            self.config.clone(),
            self.metrics.clone(),
            version,
        ));
        self.current.store(Some(context.clone()));
        info!(version, "Codec context updated");
        context
    }

    /// Build a runtime context for `schema` and install it.
    pub fn update_schema(&self, schema: Arc<SchemaContext>) -> CodecResult<Arc<CodecContext>> {
        let runtime = BindingRuntimeContext::create(schema)?;
        Ok(self.on_context_updated(Arc::new(runtime)))
    }

    /// Translate a binding identifier into a generic path.
    #[instrument(skip(self), fields(id = %id))]
    pub fn to_generic_path(&self, id: &InstanceIdentifier) -> CodecResult<YangInstanceIdentifier> {
        self.snapshot()?.to_generic_path(id)
    }

    /// Translate a generic path into a binding identifier.
    #[instrument(skip(self), fields(path = %path))]
    pub fn from_generic_path(&self, path: &YangInstanceIdentifier) -> CodecResult<InstanceIdentifier> {
        self.snapshot()?.from_generic_path(path)
    }

    pub fn encode<T: DataObject>(&self, object: &T) -> CodecResult<NormalizedNode> {
        self.snapshot()?.encode(object)
    }

    pub fn encode_dyn(&self, object: &dyn DynDataObject) -> CodecResult<NormalizedNode> {
        self.snapshot()?.encode_dyn(object)
    }

    pub fn decode<T: DataObject>(&self, node: &NormalizedNode) -> CodecResult<T> {
        self.snapshot()?.decode(node)
    }

    pub fn decode_as(
        &self,
        node: &NormalizedNode,
        type_ref: &TypeRef,
    ) -> CodecResult<serde_json::Value> {
        trace!(type_name = %type_ref.name(), "Decoding without facade type");
        self.snapshot()?.decode_as(node, type_ref)
    }

    /// Cache counters, accumulated across contexts.
    pub fn stats(&self) -> CodecStats {
        self.metrics.snapshot()
    }
}
