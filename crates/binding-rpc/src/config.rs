//! Configuration of the RPC adapter.
//!
//! # Example
//! ```rust,ignore
//! use binding_rpc::{AdapterConfig, SpawnPolicy};
//!
//! let config = AdapterConfig::new()
//!     .with_development_mode(false)
//!     .with_spawn_policy(SpawnPolicy::Inline)
//!     .with_max_in_flight(128);
//! config.validate()?;
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::error::ErrorConfig;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigValidationError {
    /// max_in_flight must be greater than 0
    #[error("max_in_flight must be greater than 0")]
    InvalidMaxInFlight,

    /// max_in_flight must not exceed the semaphore permit limit
    #[error("max_in_flight must be at most {max}, got {actual}")]
    MaxInFlightTooLarge { max: usize, actual: usize },
}

/// Where a service method runs.
///
/// # Variants
///
/// * `Spawn` - Run the method on a separate tokio task. The caller's future
///   only awaits the task, so dropping it detaches the caller while the
///   method keeps running. Requires a tokio runtime.
///
/// * `Inline` - Poll the method inside the caller's future. Panics are still
///   caught and reported as invocation failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPolicy {
    #[default]
    Spawn,
    Inline,
}

/// Adapter behavior.
///
/// # Fields
///
/// * `development_mode` - Keep failure causes and server error messages in
///   errors returned to callers. Default: on in debug builds.
///
/// * `spawn_policy` - Where service methods run. Default: `Spawn`.
///
/// * `max_in_flight` - Invocations one adapter runs at once. Further calls
///   fail with `UNAVAILABLE` until one completes. Default: 1024.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub development_mode: bool,
    pub spawn_policy: SpawnPolicy,
    pub max_in_flight: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            development_mode: cfg!(debug_assertions),
            spawn_policy: SpawnPolicy::default(),
            max_in_flight: 1024,
        }
    }
}

impl AdapterConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and return an error if invalid.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_in_flight` is 0 or larger than
    /// [`Semaphore::MAX_PERMITS`].
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_in_flight == 0 {
            return Err(ConfigValidationError::InvalidMaxInFlight);
        }
        if self.max_in_flight > Semaphore::MAX_PERMITS {
            return Err(ConfigValidationError::MaxInFlightTooLarge {
                max: Semaphore::MAX_PERMITS,
                actual: self.max_in_flight,
            });
        }
        Ok(())
    }

    /// Error handling derived from this configuration.
    pub fn error_config(&self) -> ErrorConfig {
        ErrorConfig::new().with_development_mode(self.development_mode)
    }

    pub fn with_development_mode(mut self, enabled: bool) -> Self {
        self.development_mode = enabled;
        self
    }

    pub fn with_spawn_policy(mut self, policy: SpawnPolicy) -> Self {
        self.spawn_policy = policy;
        self
    }

    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AdapterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.spawn_policy, SpawnPolicy::Spawn);
    }

    #[test]
    fn zero_in_flight_is_rejected() {
        let config = AdapterConfig::new().with_max_in_flight(0);
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidMaxInFlight)
        );
    }

    #[test]
    fn in_flight_above_permit_limit_is_rejected() {
        let config = AdapterConfig::new().with_max_in_flight(usize::MAX);
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::MaxInFlightTooLarge {
                max: Semaphore::MAX_PERMITS,
                actual: usize::MAX,
            })
        );

        let at_limit = AdapterConfig::new().with_max_in_flight(Semaphore::MAX_PERMITS);
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn error_config_follows_development_mode() {
        let config = AdapterConfig::new().with_development_mode(false);
        assert_eq!(config.error_config(), ErrorConfig::production());
    }

    #[test]
    fn policy_deserializes_from_snake_case() {
        let config: AdapterConfig =
            serde_json::from_str(r#"{"spawn_policy": "inline"}"#).unwrap();
        assert_eq!(config.spawn_policy, SpawnPolicy::Inline);
        assert_eq!(config.max_in_flight, 1024);
    }
}
