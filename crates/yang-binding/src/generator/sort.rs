//! Processing order of modules and typedefs

use std::collections::HashSet;
use std::sync::Arc;

use crate::schema::{Module, SchemaContext, TypeDefinition};

use super::{GeneratorError, GeneratorResult};

/// Modules ordered so every module follows the modules it imports.
pub(crate) fn sort_modules(schema: &SchemaContext) -> GeneratorResult<Vec<&Arc<Module>>> {
    let mut result = Vec::with_capacity(schema.modules().len());
    let mut visited = HashSet::new();
    let mut path = Vec::new();

    for module in schema.modules() {
        visit(schema, module, &mut visited, &mut path, &mut result)?;
    }
    Ok(result)
}

fn visit<'a>(
    schema: &'a SchemaContext,
    module: &'a Arc<Module>,
    visited: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
    result: &mut Vec<&'a Arc<Module>>,
) -> GeneratorResult<()> {
    if visited.contains(module.name.as_str()) {
        return Ok(());
    }
    if let Some(start) = path.iter().position(|n| *n == module.name) {
        let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
        cycle.push(module.name.clone());
        return Err(GeneratorError::CircularImport(cycle));
    }

    path.push(&module.name);
    for import in &module.imports {
        let dependency = schema
            .find_module(import)
            .ok_or_else(|| GeneratorError::UnknownModule(import.clone()))?;
        visit(schema, dependency, visited, path, result)?;
    }
    path.pop();

    visited.insert(&module.name);
    result.push(module);
    Ok(())
}

/// Typedefs of a module ordered by derivation depth, shallowest first.
/// The sort is stable, so typedefs of equal depth keep declaration order.
pub(crate) fn sort_typedefs(module: &Module) -> Vec<&TypeDefinition> {
    let mut typedefs: Vec<&TypeDefinition> = module.typedefs.iter().collect();
    typedefs.sort_by_key(|t| t.derivation_depth());
    typedefs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ModuleBuilder, TypeSpec};

    #[test]
    fn imports_come_first() {
        let base = ModuleBuilder::new("base", "urn:base", None)
            .unwrap()
            .build()
            .unwrap();
        let user = ModuleBuilder::new("user", "urn:user", None)
            .unwrap()
            .import(&base)
            .build()
            .unwrap();
        let ctx = SchemaContext::new([user, base]).unwrap();

        let order: Vec<&str> = sort_modules(&ctx)
            .unwrap()
            .into_iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(order, vec!["base", "user"]);
    }

    #[test]
    fn import_cycle_is_reported_with_its_path() {
        let mut a = ModuleBuilder::new("a", "urn:a", None).unwrap().build().unwrap();
        let mut b = ModuleBuilder::new("b", "urn:b", None).unwrap().build().unwrap();
        a.imports.push("b".into());
        b.imports.push("a".into());
        let ctx = SchemaContext::new([a, b]).unwrap();

        match sort_modules(&ctx) {
            Err(GeneratorError::CircularImport(cycle)) => {
                assert_eq!(cycle, vec!["a", "b", "a"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn typedefs_sort_by_depth() {
        let module = ModuleBuilder::new("t", "urn:t", None)
            .unwrap()
            .typedef("word", TypeSpec::string())
            .typedef("choice", TypeSpec::union([TypeSpec::typedef("word"), TypeSpec::int32()]))
            .typedef("short-word", TypeSpec::typedef("word").pattern("a"))
            .build()
            .unwrap();
        let order: Vec<&str> = sort_typedefs(&module)
            .into_iter()
            .map(|t| t.qname.local_name())
            .collect();
        assert_eq!(order, vec!["word", "short-word", "choice"]);
    }
}
