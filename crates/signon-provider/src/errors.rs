// crates/signon-provider/src/errors.rs
// ============================================================================
// Module: Error Mapping
// Description: Converts driver failures into host diagnostics.
// Purpose: Give users actionable messages for every remote failure mode.
// Dependencies: signon-core, signon-client, thiserror
// ============================================================================

//! ## Overview
//! [`DriverError`] collects every way a verb can fail. At the host boundary
//! each error becomes exactly one [`Diagnostic`]. Remote failures with a
//! decoded envelope are rendered with the operation name, the envelope id,
//! code and message, and every detail entry including constraint data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use serde_json::Value;
use signon_client::ClientError;
use signon_client::ErrorDetail;
use signon_client::ErrorEnvelope;
use signon_core::Diagnostic;
use signon_core::EnvironmentId;
use signon_core::ImportIdError;
use signon_core::InputError;
use signon_core::StructureError;
use thiserror::Error;

use crate::resource::ResourceError;

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Remote operation names used in diagnostics and audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// POST a new action.
    Create,
    /// GET one action.
    Read,
    /// PUT an action.
    Update,
    /// DELETE an action.
    Delete,
    /// GET a page of actions.
    List,
    /// GET the environment.
    ReadEnvironment,
}

impl Operation {
    /// Returns the operation name shown to users.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Create => "CreateSignOnPolicyAction",
            Self::Read => "ReadOneSignOnPolicyAction",
            Self::Update => "UpdateSignOnPolicyAction",
            Self::Delete => "DeleteSignOnPolicyAction",
            Self::List => "ReadAllSignOnPolicyActions",
            Self::ReadEnvironment => "ReadOneEnvironment",
        }
    }
}

// ============================================================================
// SECTION: Driver Errors
// ============================================================================

/// Failures surfaced by reconciliation verbs.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The declarative configuration was rejected before any remote call.
    #[error(transparent)]
    Input(#[from] InputError),
    /// The remote returned a shape the declarative form cannot represent.
    #[error(transparent)]
    Structure(#[from] StructureError),
    /// The import identifier was malformed.
    #[error(transparent)]
    ImportId(#[from] ImportIdError),
    /// A remote call failed.
    #[error("{} failed: {source}", operation.name())]
    Remote {
        /// Operation that failed.
        operation: Operation,
        /// Underlying client failure.
        source: ClientError,
    },
    /// The permission probe showed the environment is unreachable.
    #[error("environment {environment_id} not found or not accessible")]
    EnvironmentInaccessible {
        /// Environment that was probed.
        environment_id: EnvironmentId,
        /// Failure that triggered the probe.
        source: ClientError,
    },
    /// A resource required by the verb does not exist.
    #[error("{0}")]
    Missing(String),
    /// The proposed change cannot be applied in place.
    #[error("changing {} requires replacing the action", .0.join(", "))]
    RequiresReplacement(Vec<&'static str>),
    /// The driver could not be built from configuration.
    #[error("provider setup failed: {0}")]
    Setup(String),
    /// Persisted state could not be handled.
    #[error(transparent)]
    State(#[from] ResourceError),
}

impl DriverError {
    /// Returns the client failure behind a remote error.
    #[must_use]
    pub const fn client_error(&self) -> Option<&ClientError> {
        match self {
            Self::Remote {
                source, ..
            }
            | Self::EnvironmentInaccessible {
                source, ..
            } => Some(source),
            _ => None,
        }
    }

    /// Wraps a client failure for `operation`.
    #[must_use]
    pub const fn remote(operation: Operation, source: ClientError) -> Self {
        Self::Remote {
            operation,
            source,
        }
    }

    /// Converts the error into a host diagnostic.
    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Input(err) => err.to_diagnostic(),
            Self::Structure(err) => err.to_diagnostic(),
            Self::ImportId(err) => {
                Diagnostic::error("Unexpected import identifier").with_detail(err.to_string())
            }
            Self::Remote {
                operation,
                source,
            } => client_error_diagnostic(*operation, source),
            Self::EnvironmentInaccessible {
                environment_id,
                source,
            } => Diagnostic::error("Environment not found or not accessible").with_detail(format!(
                "The environment {environment_id} does not exist or the configured credentials \
                 cannot access it. Check the environment ID and that the worker application has \
                 a role assigned over this environment.\n\nOriginal error: {source}"
            )),
            Self::Missing(message) => Diagnostic::error(message.clone()),
            Self::RequiresReplacement(attributes) => {
                Diagnostic::error("Sign-on policy action cannot be updated in place").with_detail(
                    format!(
                        "Changing {} requires deleting and recreating the action.",
                        attributes.join(", ")
                    ),
                )
            }
            Self::Setup(message) => {
                Diagnostic::error("Provider configuration error").with_detail(message.clone())
            }
            Self::State(err) => Diagnostic::error("Unexpected sign-on policy action state")
                .with_detail(err.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Client Error Mapping
// ============================================================================

/// Maps a client failure for `operation` into a diagnostic.
#[must_use]
pub fn client_error_diagnostic(operation: Operation, error: &ClientError) -> Diagnostic {
    let name = operation.name();
    match error {
        ClientError::RetryBudgetExhausted {
            attempts,
            last,
        } => Diagnostic::error(format!("Error when calling `{name}`: retries exhausted"))
            .with_detail(format!(
                "The request failed {attempts} times within the retry budget.\n{}",
                last_failure_detail(last)
            )),
        ClientError::Api {
            envelope, ..
        } if error.is_gateway_type_rejection() => {
            let guidance = "Only LDAP gateways are supported for new user provisioning.";
            Diagnostic::error("Invalid new user provisioning gateway type").with_detail(
                match envelope {
                    Some(envelope) => format!("{guidance}\n\n{}", format_envelope(envelope)),
                    None => guidance.to_string(),
                },
            )
        }
        ClientError::Api {
            status: 404, ..
        } if matches!(operation, Operation::Create | Operation::Update) => Diagnostic::error(
            format!("Error when calling `{name}`: sign-on policy or action not found"),
        )
        .with_detail(
            "The environment, sign-on policy or action no longer exists. It may have been \
             removed outside of this provider.",
        ),
        ClientError::Api {
            envelope: Some(envelope),
            ..
        } => {
            let (summary, detail) = format_api_error(name, envelope);
            Diagnostic::error(summary).with_detail(detail)
        }
        ClientError::Api {
            status,
            envelope: None,
            body_excerpt,
            ..
        } => Diagnostic::error(format!("Error when calling `{name}`: status {status}"))
            .with_detail(format!("Response body: {body_excerpt}")),
        ClientError::Decode(message) => Diagnostic::error("Unexpected sign-on policy action structure")
            .with_detail(format!(
                "The response to `{name}` could not be decoded: {message}. Please report this issue \
                 to the provider maintainers."
            )),
        ClientError::Cancelled => Diagnostic::error(format!("`{name}` was cancelled")),
        ClientError::PagingLoop(href) => {
            Diagnostic::error(format!("Error when calling `{name}`: paging did not terminate"))
                .with_detail(format!(
                    "The next-page link {href} was returned after it had already been fetched."
                ))
        }
        ClientError::Transport(message)
        | ClientError::Token(message)
        | ClientError::InvalidRequest(message) => {
            Diagnostic::error(format!("Error when calling `{name}`: {message}"))
        }
    }
}

/// Describes the failure observed on the last retry attempt.
fn last_failure_detail(last: &ClientError) -> String {
    match last {
        ClientError::Api {
            status,
            body_excerpt,
            ..
        } => format!("Last status: {status}\nLast response body: {body_excerpt}"),
        other => format!("Last error: {other}"),
    }
}

/// Formats an error envelope as `(summary, detail)` for `operation`.
#[must_use]
pub fn format_api_error(operation: &str, envelope: &ErrorEnvelope) -> (String, String) {
    let summary = format!("Error when calling `{operation}`: {}", envelope.message);
    (summary, format_envelope(envelope))
}

/// Renders the envelope detail block.
fn format_envelope(envelope: &ErrorEnvelope) -> String {
    let mut detail = format!(
        "Error Details:\nID:\t\t{}\nCode:\t\t{}\nMessage:\t{}",
        envelope.id, envelope.code, envelope.message
    );
    if !envelope.details.is_empty() {
        let entries: Vec<String> = envelope.details.iter().map(format_detail).collect();
        let _ = write!(detail, "\nDetails:\n{}", entries.join("\n"));
    }
    detail
}

/// Renders one envelope detail entry.
fn format_detail(detail: &ErrorDetail) -> String {
    let mut out = String::new();
    let mut marker = "-";
    for (label, value) in
        [("Code", &detail.code), ("Message", &detail.message), ("Target", &detail.target)]
    {
        if let Some(value) = value {
            let _ = writeln!(out, "  {marker} {label}:\t{value}");
            marker = " ";
        }
    }
    if let Some(Value::Object(inner)) = &detail.inner_error {
        let _ = writeln!(out, "  {marker} Data:");
        for (key, value) in inner {
            let rendered = match value {
                Value::Array(items) => format!(
                    "[{}]",
                    items.iter().map(render_scalar).collect::<Vec<_>>().join(", ")
                ),
                other => render_scalar(other),
            };
            let _ = writeln!(out, "      {}:\t{rendered}", constraint_label(key));
        }
    }
    out
}

/// Renders a JSON scalar without string quotes.
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Returns a readable label for an inner-error constraint key.
fn constraint_label(key: &str) -> String {
    match key {
        "rangeMinimumValue" => "Range Min Value".to_string(),
        "rangeMaximumValue" => "Range Max Value".to_string(),
        "allowedPattern" => "Allowed Pattern".to_string(),
        "allowedValues" => "Allowed Values".to_string(),
        "maximumValue" => "Max Value".to_string(),
        "referencedValues" => "Referenced Values".to_string(),
        other => other.to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
