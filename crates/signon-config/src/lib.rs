// crates/signon-config/src/lib.rs
// ============================================================================
// Module: Sign-On Config Library
// Description: Configuration model for the sign-on policy action provider.
// Purpose: Load and validate provider settings from TOML.
// Dependencies: serde, toml, signon-client
// ============================================================================

//! ## Overview
//! `signon-config` owns the provider configuration file: API region and
//! timeouts, retry budget, and audit sink selection. Loading is strict and
//! fail-closed; see [`ProviderConfig::load`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ApiConfig;
pub use config::AuditConfig;
pub use config::AuditSinkKind;
pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::ProviderConfig;
pub use config::Region;
pub use config::RetryConfig;
