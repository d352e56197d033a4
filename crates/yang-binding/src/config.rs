//! Configuration of the codec registry.
//!
//! # Example
//! ```rust,ignore
//! use yang_binding::CodecConfig;
//!
//! let config = CodecConfig::new()
//!     .with_strict_decode(true)
//!     .with_max_depth(32);
//! config.validate()?;
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigValidationError {
    /// max_depth must be greater than 0
    #[error("max_depth must be greater than 0")]
    InvalidMaxDepth,
}

/// Codec behavior.
///
/// # Fields
///
/// * `strict_decode` - Fail decoding when the generic tree holds a child the
///   target type does not know. When off, such children are skipped.
///   Default: false.
///
/// * `enforce_patterns` - Check pattern restrictions when encoding facade
///   values. Decoding always checks them, since union decoding relies on it.
///   Default: true.
///
/// * `max_depth` - Maximum nesting of containers and lists walked in one
///   operation. Default: 64.
///
/// * `debug_logging` - Log every encode and decode. Default: false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Reject unknown children on decode (default: false)
    pub strict_decode: bool,
    /// Check patterns on encode (default: true)
    pub enforce_patterns: bool,
    /// Nesting limit (default: 64)
    pub max_depth: usize,
    /// Enable debug logging (default: false)
    pub debug_logging: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            strict_decode: false,
            enforce_patterns: true,
            max_depth: 64,
            debug_logging: false,
        }
    }
}

impl CodecConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and return an error if invalid.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_depth` is 0.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_depth == 0 {
            return Err(ConfigValidationError::InvalidMaxDepth);
        }
        Ok(())
    }

    pub fn with_strict_decode(mut self, strict: bool) -> Self {
        self.strict_decode = strict;
        self
    }

    pub fn with_enforce_patterns(mut self, enforce: bool) -> Self {
        self.enforce_patterns = enforce;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Enable or disable debug logging.
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }
}
