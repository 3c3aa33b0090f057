//! Test module for orchestration and invariant tests.
//!
//! - **Integration tests**: full passes over real stores and health pools
//! - **Property tests**: monotonicity, idempotence and the session cap
//! - **Helpers**: quest fixtures, a wired-up harness and failure-injecting
//!   test doubles
//!
//! # Test Structure
//!
//! - `integration.rs`: end-to-end passes, handlers and session state
//! - `properties.rs`: proptest invariants over random quest sets
//! - `helpers.rs`: setup utilities and doubles

mod helpers;

// Re-export for convenience
pub use helpers::*;
