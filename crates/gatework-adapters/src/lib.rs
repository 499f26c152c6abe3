// crates/gatework-adapters/src/lib.rs
// ============================================================================
// Module: Gatework Adapters
// Description: Built-in, deterministic adapters for demos and system tests.
// Purpose: Give callers a zero-config way to exercise the Router and
//          Executor without wiring up a real external tool.
// Dependencies: gatework-core, serde_json
// ============================================================================

//! ## Overview
//! This crate ships two deterministic adapters driven entirely by a step's
//! `with` payload: [`FixtureAdapter`], which writes inline fixture content,
//! and [`FlakyAdapter`], which fails transiently a configured number of
//! times before delegating to the same fixture behavior. Neither adapter
//! has side effects beyond the run's artifact store, and both are safe to
//! register unconditionally in a demo binary or test harness.
//! Invariants:
//! - Adapter implementations never mutate the run context directly; all
//!   observable effects go through the artifact store.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod fixture;
pub mod flaky;
pub mod registry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use fixture::FixtureAdapter;
pub use fixture::FixtureDirective;
pub use flaky::FlakyAdapter;
pub use registry::register_builtin_adapters;
pub use registry::BuiltinAdapterConfigs;
pub use registry::FixtureAdapterConfig;
pub use registry::FlakyAdapterConfig;
