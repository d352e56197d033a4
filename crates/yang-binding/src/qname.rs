//! Qualified names
//!
//! Every schema element is addressed by a [`QName`]: a namespace, an optional
//! revision and a local name. [`QNameModule`] is the namespace/revision pair
//! shared by all elements of one module.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error raised when a qualified name cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QNameError {
    /// The local name was empty
    #[error("local name must not be empty (namespace {namespace})")]
    EmptyLocalName {
        /// Namespace the name was requested in
        namespace: String,
    },
    /// The namespace was empty
    #[error("namespace must not be empty")]
    EmptyNamespace,
    /// The revision was not in `YYYY-MM-DD` form
    #[error("invalid revision '{0}', expected YYYY-MM-DD")]
    InvalidRevision(String),
}

/// Namespace and optional revision of a schema module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QNameModule {
    namespace: Arc<str>,
    revision: Option<Arc<str>>,
}

impl QNameModule {
    /// Create a module reference, validating the namespace and revision format.
    pub fn new(namespace: impl AsRef<str>, revision: Option<&str>) -> Result<Self, QNameError> {
        let namespace = namespace.as_ref();
        if namespace.is_empty() {
            return Err(QNameError::EmptyNamespace);
        }
        if let Some(rev) = revision {
            if !is_valid_revision(rev) {
                return Err(QNameError::InvalidRevision(rev.to_string()));
            }
        }
        Ok(Self {
            namespace: Arc::from(namespace),
            revision: revision.map(Arc::from),
        })
    }

    /// The module namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The module revision, if any.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// Create a [`QName`] with the given local name in this module.
    pub fn qname(&self, local_name: impl AsRef<str>) -> Result<QName, QNameError> {
        QName::create(self.clone(), local_name)
    }
}

impl fmt::Display for QNameModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.revision {
            Some(rev) => write!(f, "({}?revision={})", self.namespace, rev),
            None => write!(f, "({})", self.namespace),
        }
    }
}

fn is_valid_revision(rev: &str) -> bool {
    let bytes = rev.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
}

/// A qualified name: module namespace, optional revision and local name.
///
/// Ordering is by module first, then local name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    module: QNameModule,
    local_name: Arc<str>,
}

impl QName {
    /// Create a qualified name inside an existing module.
    pub fn create(module: QNameModule, local_name: impl AsRef<str>) -> Result<Self, QNameError> {
        let local_name = local_name.as_ref();
        if local_name.is_empty() {
            return Err(QNameError::EmptyLocalName {
                namespace: module.namespace().to_string(),
            });
        }
        Ok(Self {
            module,
            local_name: Arc::from(local_name),
        })
    }

    /// Create a qualified name from its raw parts.
    pub fn new(
        namespace: impl AsRef<str>,
        revision: Option<&str>,
        local_name: impl AsRef<str>,
    ) -> Result<Self, QNameError> {
        Self::create(QNameModule::new(namespace, revision)?, local_name)
    }

    /// The owning module.
    pub fn module(&self) -> &QNameModule {
        &self.module
    }

    /// The namespace of the owning module.
    pub fn namespace(&self) -> &str {
        self.module.namespace()
    }

    /// The revision of the owning module.
    pub fn revision(&self) -> Option<&str> {
        self.module.revision()
    }

    /// The local name.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// A sibling name in the same module.
    pub fn sibling(&self, local_name: impl AsRef<str>) -> Result<Self, QNameError> {
        Self::create(self.module.clone(), local_name)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.module, self.local_name)
    }
}
