// crates/gatework-adapters/src/registry.rs
// ============================================================================
// Module: Built-in Adapter Registration
// Description: Configuration bundle and helper for registering the adapters
//              this crate ships into a gatework_core::registry::AdapterRegistry.
// Purpose: Give demos and system tests a one-call way to populate a registry
//          with deterministic fixture and flaky adapters.
// Dependencies: gatework-core
// ============================================================================

//! ## Overview
//! [`BuiltinAdapterConfigs`] describes the adapters this crate can register;
//! [`register_builtin_adapters`] builds each one from its descriptor and adds
//! it to the given registry. Neither adapter is registered unless named in
//! the configs, so a caller that only wants the fixture adapter can omit the
//! flaky one entirely.

use std::collections::BTreeSet;

use gatework_core::error::RegistryError;
use gatework_core::identifiers::AdapterName;
use gatework_core::model::AdapterDescriptor;
use gatework_core::model::AdapterKind;
use gatework_core::registry::AdapterRegistry;

use crate::fixture::FixtureAdapter;
use crate::flaky::FlakyAdapter;

/// Configuration for the built-in fixture adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureAdapterConfig {
    /// Actor kinds this adapter declares support for.
    pub actor_kinds_supported: Vec<String>,
    /// Capability tags this adapter advertises.
    pub capabilities: Vec<String>,
}

impl Default for FixtureAdapterConfig {
    fn default() -> Self {
        Self { actor_kinds_supported: vec!["fixture".to_owned()], capabilities: Vec::new() }
    }
}

/// Configuration for the built-in flaky adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlakyAdapterConfig {
    /// Actor kinds this adapter declares support for.
    pub actor_kinds_supported: Vec<String>,
    /// Capability tags this adapter advertises.
    pub capabilities: Vec<String>,
    /// Number of invocations that fail transiently before succeeding.
    pub fail_first_n: u32,
    /// Message reported on each transient failure.
    pub failure_message: String,
}

impl Default for FlakyAdapterConfig {
    fn default() -> Self {
        Self {
            actor_kinds_supported: vec!["flaky".to_owned()],
            capabilities: Vec::new(),
            fail_first_n: 1,
            failure_message: "transient failure".to_owned(),
        }
    }
}

/// Which built-in adapters to register, and with what configuration.
///
/// # Invariants
/// - A `None` field means that adapter is not registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltinAdapterConfigs {
    /// Configuration for the fixture adapter, or `None` to skip it.
    pub fixture: Option<FixtureAdapterConfig>,
    /// Configuration for the flaky adapter, or `None` to skip it.
    pub flaky: Option<FlakyAdapterConfig>,
}

impl BuiltinAdapterConfigs {
    /// Registers both built-in adapters with their default configuration.
    #[must_use]
    pub fn all_defaults() -> Self {
        Self { fixture: Some(FixtureAdapterConfig::default()), flaky: Some(FlakyAdapterConfig::default()) }
    }
}

/// Registers every adapter named in `configs` into `registry`.
///
/// # Errors
/// Returns [`RegistryError::DuplicateAdapter`] if an adapter with the same
/// name is already registered.
pub fn register_builtin_adapters(
    registry: &mut AdapterRegistry,
    configs: BuiltinAdapterConfigs,
) -> Result<(), RegistryError> {
    if let Some(config) = configs.fixture {
        let descriptor = AdapterDescriptor {
            name: AdapterName::new("fixture"),
            kind: AdapterKind::Deterministic,
            actor_kinds_supported: config.actor_kinds_supported,
            capabilities: config.capabilities,
            estimated_cost_per_invocation: 0,
            available: true,
            side_effects: BTreeSet::new(),
        };
        registry.register(FixtureAdapter::new(descriptor))?;
    }
    if let Some(config) = configs.flaky {
        let descriptor = AdapterDescriptor {
            name: AdapterName::new("flaky"),
            kind: AdapterKind::Deterministic,
            actor_kinds_supported: config.actor_kinds_supported,
            capabilities: config.capabilities,
            estimated_cost_per_invocation: 0,
            available: true,
            side_effects: BTreeSet::new(),
        };
        registry.register(FlakyAdapter::new(descriptor, config.fail_first_n, config.failure_message))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::register_builtin_adapters;
    use super::BuiltinAdapterConfigs;
    use gatework_core::identifiers::AdapterName;
    use gatework_core::registry::AdapterAccessPolicy;
    use gatework_core::registry::AdapterRegistry;

    #[test]
    fn registers_both_adapters_by_default() {
        let mut registry = AdapterRegistry::new(AdapterAccessPolicy::allow_all());
        register_builtin_adapters(&mut registry, BuiltinAdapterConfigs::all_defaults()).expect("registers");
        assert!(registry.lookup(&AdapterName::new("fixture")).is_some());
        assert!(registry.lookup(&AdapterName::new("flaky")).is_some());
    }

    #[test]
    fn skips_adapters_left_unconfigured() {
        let mut registry = AdapterRegistry::new(AdapterAccessPolicy::allow_all());
        let configs = BuiltinAdapterConfigs { fixture: Some(super::FixtureAdapterConfig::default()), flaky: None };
        register_builtin_adapters(&mut registry, configs).expect("registers");
        assert!(registry.lookup(&AdapterName::new("fixture")).is_some());
        assert!(registry.lookup(&AdapterName::new("flaky")).is_none());
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = AdapterRegistry::new(AdapterAccessPolicy::allow_all());
        register_builtin_adapters(&mut registry, BuiltinAdapterConfigs::all_defaults()).expect("registers");
        let result = register_builtin_adapters(&mut registry, BuiltinAdapterConfigs::all_defaults());
        assert!(result.is_err());
    }
}
