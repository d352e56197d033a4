//! Stable naming of generated types and properties

use convert_case::{Case, Casing};

use crate::qname::QNameModule;
use crate::schema::SchemaPath;

/// Base package of a module: `gen.v1.<namespace>[.rev<YYYYMMDD>]`.
pub fn package_name(module: &QNameModule) -> String {
    let mut package = format!("gen.v1.{}", normalize_package(module.namespace()));
    if let Some(revision) = module.revision() {
        package.push_str(".rev");
        package.extend(revision.chars().filter(char::is_ascii_digit));
    }
    package
}

/// Package of a node at `path`: the base package plus one segment per
/// ancestor node.
pub fn package_for_path(module: &QNameModule, path: &SchemaPath) -> String {
    let mut package = package_name(module);
    let ancestors = path.len().saturating_sub(1);
    for step in &path.steps()[..ancestors] {
        package.push('.');
        package.push_str(&normalize_package(step.local_name()));
    }
    package
}

/// Lower-cased, dot separated form of an arbitrary identifier.
fn normalize_package(raw: &str) -> String {
    raw.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| {
            let lower = s.to_ascii_lowercase();
            if lower.starts_with(|c: char| c.is_ascii_digit()) {
                format!("_{lower}")
            } else {
                lower
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Class name of a schema element: `top-level-list` becomes `TopLevelList`.
pub fn class_name(local_name: &str) -> String {
    escape_leading_digit(local_name.to_case(Case::Pascal))
}

/// Property name of a schema element: `top-level-list` becomes
/// `topLevelList`.
pub fn property_name(local_name: &str) -> String {
    escape_leading_digit(local_name.to_case(Case::Camel))
}

/// Method name a service uses for an RPC.
pub fn method_name(rpc_local_name: &str) -> String {
    property_name(rpc_local_name)
}

fn escape_leading_digit(name: String) -> String {
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name
    }
}

/// First name derived from `base` that is not taken: a trailing number is
/// incremented, otherwise `1` is appended. A trailing number too large to
/// increment is treated as part of the stem.
pub fn next_available_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    let digits = base.len() - base.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let (stem, number) = base.split_at(base.len() - digits);
    let (stem, mut counter) = match number.parse::<u64>().ok().and_then(|n| n.checked_add(1)) {
        Some(next) => (stem, next),
        None => (base, 1),
    };

    loop {
        let candidate = format!("{stem}{counter}");
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
