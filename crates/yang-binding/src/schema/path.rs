//! Schema paths and path expressions

use std::fmt;

use crate::qname::QName;

/// Location of a schema node: the node types from the root down to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaPath(Vec<QName>);

impl SchemaPath {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Path built from node types in order.
    pub fn create(steps: impl IntoIterator<Item = QName>) -> Self {
        Self(steps.into_iter().collect())
    }

    /// Path of a child node.
    pub fn child(&self, qname: QName) -> Self {
        let mut steps = self.0.clone();
        steps.push(qname);
        Self(steps)
    }

    /// Path of the parent node, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.0.split_last()?;
        Some(Self(parent.to_vec()))
    }

    /// Node type of the addressed node.
    pub fn last(&self) -> Option<&QName> {
        self.0.last()
    }

    /// Node types from the root down.
    pub fn steps(&self) -> &[QName] {
        &self.0
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for step in &self.0 {
            write!(f, "/{}", step.local_name())?;
        }
        Ok(())
    }
}

/// One step of a parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment<'a> {
    /// `..`
    Parent,
    /// `prefix:name` or `name`
    Node {
        /// Prefix, if written
        prefix: Option<&'a str>,
        /// Local name
        name: &'a str,
    },
}

/// Parsed leafref-style path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpression<'a> {
    /// Whether the expression starts at the schema root
    pub absolute: bool,
    /// Steps in order
    pub segments: Vec<PathSegment<'a>>,
}

impl<'a> PathExpression<'a> {
    /// Parse an expression such as `/top:cont/top:leaf` or `../name`.
    ///
    /// Predicates (`[...]`) are dropped, `current()` based keys are not
    /// evaluated. Returns `None` for an empty or malformed expression.
    pub fn parse(expression: &'a str) -> Option<Self> {
        let trimmed = expression.trim();
        let absolute = trimmed.starts_with('/');
        let mut segments = Vec::new();

        for raw in split_outside_brackets(trimmed) {
            let step = match raw.find('[') {
                Some(idx) => raw[..idx].trim(),
                None => raw.trim(),
            };
            if step.is_empty() || step == "." {
                continue;
            }
            if step == ".." {
                segments.push(PathSegment::Parent);
                continue;
            }
            let segment = match step.split_once(':') {
                Some((prefix, name)) if !prefix.is_empty() && !name.is_empty() => {
                    PathSegment::Node {
                        prefix: Some(prefix),
                        name,
                    }
                }
                Some(_) => return None,
                None => PathSegment::Node {
                    prefix: None,
                    name: step,
                },
            };
            segments.push(segment);
        }

        if segments.is_empty() {
            return None;
        }
        Some(Self { absolute, segments })
    }
}

/// Split on `/` except inside predicates.
fn split_outside_brackets(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in input.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                parts.push(&input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}
