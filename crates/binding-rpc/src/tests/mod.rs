//! Test module for binding-rpc
//!
//! Property-based tests for error preparation and adapter configuration,
//! plus router registration tests.

#[cfg(test)]
pub mod error_tests;

#[cfg(test)]
pub mod router_tests;
