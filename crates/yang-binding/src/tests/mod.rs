//! Test module for yang-binding
//!
//! Property-based tests for identifiers plus generator and codec suites
//! built on a shared schema fixture.


#[cfg(test)]
pub mod identifier_tests;
