// crates/signon-client/src/lib.rs
// ============================================================================
// Module: Sign-On Client Library
// Description: Async client for the remote sign-on policy action API.
// Purpose: Provide authenticated, cancellable single-attempt remote calls.
// Dependencies: reqwest, tokio, async-trait, signon-core
// ============================================================================

//! ## Overview
//! `signon-client` owns every network concern of the provider: the
//! [`SignOnPolicyActionApi`] seam and its reqwest implementation, bearer token
//! sources, the error envelope, and the retry loop with cooperative
//! cancellation. Calls are single attempts; callers decide what to retry.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod api;
pub mod error;
pub mod http;
pub mod retry;
pub mod token;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use api::ActionPage;
pub use api::ActionPages;
pub use api::EnvironmentSummary;
pub use api::ResponseSummary;
pub use api::SignOnPolicyActionApi;
pub use error::ClientError;
pub use error::ErrorDetail;
pub use error::ErrorEnvelope;
pub use http::ClientSettings;
pub use http::HttpSignOnPolicyActionApi;
pub use retry::CancelSignal;
pub use retry::RetryAttempt;
pub use retry::RetryPolicy;
pub use retry::retry;
pub use token::CachedTokenSource;
pub use token::EnvTokenSource;
pub use token::IssuedToken;
pub use token::StaticTokenSource;
pub use token::TokenFetcher;
pub use token::TokenSource;

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
