//! Error tests - Property-based tests for RpcError preparation
//!
//! Tests that production mode never leaks causes or server error messages,
//! that development mode leaves errors untouched, and that adapter
//! configuration validates its limits.

use proptest::prelude::*;

use crate::config::{AdapterConfig, ConfigValidationError, SpawnPolicy};
use crate::error::{ErrorConfig, RpcError, RpcErrorCode};

// =============================================================================
// Strategies
// =============================================================================

fn code_strategy() -> impl Strategy<Value = RpcErrorCode> {
    prop_oneof![
        Just(RpcErrorCode::InvocationFailed),
        Just(RpcErrorCode::DecodeFailed),
        Just(RpcErrorCode::EncodeFailed),
        Just(RpcErrorCode::OperationNotFound),
        Just(RpcErrorCode::Unavailable),
        Just(RpcErrorCode::Internal),
    ]
}

fn error_strategy() -> impl Strategy<Value = RpcError> {
    (
        code_strategy(),
        "[a-zA-Z ]{1,24}",
        proptest::option::of("[a-z/]{1,16}"),
        proptest::option::of(any::<u16>()),
    )
        .prop_map(|(code, message, cause, detail)| {
            let mut err = RpcError::new(code, message);
            if let Some(cause) = cause {
                err = err.with_cause(cause);
            }
            if let Some(detail) = detail {
                err = err.with_details(serde_json::json!({ "detail": detail }));
            }
            err
        })
}

// =============================================================================
// Property-Based Tests
// =============================================================================

proptest! {
    /// Production mode drops every cause and hides server error messages.
    #[test]
    fn prop_production_never_leaks_causes(err in error_strategy()) {
        let original = err.clone();
        let prepared = err.apply_config(&ErrorConfig::production());

        prop_assert!(prepared.cause.is_none());
        prop_assert_eq!(prepared.code, original.code);
        if original.code.is_server_error() {
            prop_assert_eq!(prepared.message.as_str(), "An internal error occurred");
            prop_assert!(prepared.details.is_none());
        } else {
            prop_assert_eq!(prepared.message, original.message);
            prop_assert_eq!(prepared.details, original.details);
        }
    }

    /// Development mode leaves errors unchanged.
    #[test]
    fn prop_development_is_identity(err in error_strategy()) {
        let prepared = err.clone().apply_config(&ErrorConfig::development());
        prop_assert_eq!(prepared, err);
    }

    /// Client and server errors partition the codes.
    #[test]
    fn prop_codes_are_client_xor_server(code in code_strategy()) {
        prop_assert_ne!(code.is_client_error(), code.is_server_error());
    }

    /// Errors survive a JSON round trip.
    #[test]
    fn prop_errors_round_trip_through_json(err in error_strategy()) {
        let json = serde_json::to_string(&err).unwrap();
        let parsed: RpcError = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(parsed, err);
    }

    /// Only a zero in-flight limit is rejected.
    #[test]
    fn prop_in_flight_limit_validation(limit in 0usize..4, inline in any::<bool>()) {
        let policy = if inline { SpawnPolicy::Inline } else { SpawnPolicy::Spawn };
        let config = AdapterConfig::new()
            .with_max_in_flight(limit)
            .with_spawn_policy(policy);

        if limit == 0 {
            prop_assert_eq!(config.validate(), Err(ConfigValidationError::InvalidMaxInFlight));
        } else {
            prop_assert!(config.validate().is_ok());
        }
    }
}
