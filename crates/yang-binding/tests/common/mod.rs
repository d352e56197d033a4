//! Schema and facade types shared by the integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use yang_binding::{
    BindingCodecRegistry, CodecConfig, DataObject, ModuleBuilder, QName, SchemaContext, TypeRef,
    TypeSpec,
};

pub const TOP_NS: &str = "urn:opendaylight:params:xml:ns:yang:test:top";
pub const TOP_PACKAGE: &str = "gen.v1.urn.opendaylight.params.xml.ns.yang.test.top.rev20151112";
pub const LIST_PACKAGE: &str =
    "gen.v1.urn.opendaylight.params.xml.ns.yang.test.top.rev20151112.container.top";
pub const AUG_PACKAGE: &str = "gen.v1.urn.test.aug";

/// The `top` module at the given revision, plus a module augmenting it.
pub fn schema(revision: &str) -> Arc<SchemaContext> {
    let top = ModuleBuilder::new("top", TOP_NS, Some(revision))
        .unwrap()
        .container("container-top", |c| {
            c.leaf("name", TypeSpec::string())
                .leaf(
                    "mode",
                    TypeSpec::union([
                        TypeSpec::string().pattern("a+"),
                        TypeSpec::enumeration([("ON", 0), ("OFF", 1)]),
                    ]),
                )
                .leaf("state", TypeSpec::enumeration([("up", 0), ("down", 1)]))
                .leaf("flags", TypeSpec::bits([("read", 0), ("write", 1)]))
                .list("top-level-list", ["name"], |l| {
                    l.leaf("name", TypeSpec::string())
                        .leaf("value", TypeSpec::int32())
                })
        })
        .build()
        .unwrap();
    let aug = ModuleBuilder::new("aug", "urn:test:aug", None)
        .unwrap()
        .import(&top)
        .augment("/top:container-top", |a| a.leaf("aug-name", TypeSpec::string()))
        .build()
        .unwrap();
    Arc::new(SchemaContext::new([top, aug]).unwrap())
}

pub fn registry() -> BindingCodecRegistry {
    let registry = BindingCodecRegistry::new(CodecConfig::default()).unwrap();
    registry.update_schema(schema("2015-11-12")).unwrap();
    registry
}

pub fn top_qname(local: &str) -> QName {
    QName::new(TOP_NS, Some("2015-11-12"), local).unwrap()
}

// =============================================================================
// Facade types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeEnumeration {
    On,
    Off,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<ModeEnumeration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    Up,
    Down,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub read: bool,
    pub write: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLevelList {
    pub name: Option<String>,
    pub value: Option<i32>,
}

impl DataObject for TopLevelList {
    fn binding_type() -> TypeRef {
        TypeRef::keyed(LIST_PACKAGE, "TopLevelList")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerTop1 {
    pub aug_name: Option<String>,
}

impl DataObject for ContainerTop1 {
    fn binding_type() -> TypeRef {
        TypeRef::of(AUG_PACKAGE, "ContainerTop1")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerTop {
    pub name: Option<String>,
    pub mode: Option<Mode>,
    pub state: Option<State>,
    pub flags: Option<Flags>,
    pub top_level_list: Option<Vec<TopLevelList>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub augmentations: Option<BTreeMap<String, serde_json::Value>>,
}

impl DataObject for ContainerTop {
    fn binding_type() -> TypeRef {
        TypeRef::of(TOP_PACKAGE, "ContainerTop")
    }
}
