// crates/ret-logic/tests/support.rs
// ============================================================================
// Shared test helpers for ret-logic's integration tests.
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only helper module."
)]

/// Result type used throughout the integration test suites.
pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Returns `Err(msg)` when `cond` is false, `Ok(())` otherwise.
///
/// Lets a test function return early with a descriptive message via `?`
/// instead of panicking on `assert!`.
pub fn ensure(cond: bool, msg: impl Into<String>) -> TestResult {
    if cond { Ok(()) } else { Err(msg.into().into()) }
}
