// crates/signon-provider/src/lib.rs
// ============================================================================
// Module: Sign-On Provider Library
// Description: Reconciliation of declared sign-on policy actions.
// Purpose: Turn host verbs into remote calls, persisted state and diagnostics.
// Dependencies: signon-core, signon-client, signon-config
// ============================================================================

//! ## Overview
//! `signon-provider` is what a declarative host talks to. [`ActionDriver`]
//! runs the create, read, update, delete, import and list verbs, mapping
//! every failure into [`signon_core::Diagnostics`] through [`DriverError`].
//! [`plan_replacement`] tells the host which edits force delete-then-create,
//! and the audit module records what each verb did as JSON lines.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod driver;
pub mod errors;
pub mod resource;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RemoteAuditEvent;
pub use audit::StderrAuditSink;
pub use audit::Verb;
pub use audit::VerbAuditEvent;
pub use audit::VerbOutcome;
pub use audit::sink_from_config;
pub use driver::ActionDriver;
pub use driver::ListOutcome;
pub use driver::ReconcileOutcome;
pub use errors::DriverError;
pub use errors::Operation;
pub use errors::client_error_diagnostic;
pub use errors::format_api_error;
pub use resource::ActionResourceModel;
pub use resource::ReplacementPlan;
pub use resource::ResourceError;
pub use resource::STATE_SCHEMA_VERSION;
pub use resource::plan_replacement;
pub use resource::upgrade_state;

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions and debug output.
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]
}
