// crates/signon-client/src/error.rs
// ============================================================================
// Module: Client Errors
// Description: Error envelope and failure classification for remote calls.
// Purpose: Give the driver a typed view of every way a remote call can fail.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The remote API answers failed requests with a JSON envelope carrying an
//! error id, a code, a message and optional per-field details. [`ClientError`]
//! keeps the HTTP status, the decoded envelope when one was present, and a
//! bounded excerpt of the raw body so diagnostics can quote it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::api::ResponseSummary;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message prefix emitted while a freshly granted role is still propagating.
pub const PERMISSION_PROPAGATION_PREFIX: &str =
    "The actor attempting to perform the request is not authorized.";

/// Envelope code for constraint violations.
pub const CONSTRAINT_VIOLATION: &str = "CONSTRAINT_VIOLATION";

/// Envelope code for rejected field values.
pub const INVALID_VALUE: &str = "INVALID_VALUE";

/// Message returned when deleting the only action left on a policy.
pub const LAST_ACTION_MESSAGE: &str = "Cannot delete last action from the policy";

/// Maximum body excerpt retained on API errors (in characters).
pub const MAX_BODY_EXCERPT_CHARS: usize = 512;

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// Error body returned by the remote API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Remote correlation id for the failure.
    #[serde(default)]
    pub id: String,
    /// Top-level error code (e.g. `INVALID_DATA`).
    #[serde(default)]
    pub code: String,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Per-field details, in the order returned.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ErrorDetail>,
}

/// One entry of [`ErrorEnvelope::details`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    /// Detail code (e.g. `INVALID_VALUE`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Field path the detail refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Detail message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Constraint data such as allowed values or ranges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_error: Option<Value>,
}

impl ErrorEnvelope {
    /// Returns the first detail, if any.
    #[must_use]
    pub fn first_detail(&self) -> Option<&ErrorDetail> {
        self.details.first()
    }

    /// Decodes an envelope from a response body.
    ///
    /// Returns `None` when the body is not an envelope or carries no id.
    #[must_use]
    pub fn from_body(body: &[u8]) -> Option<Self> {
        serde_json::from_slice::<Self>(body).ok().filter(|envelope| !envelope.id.is_empty())
    }
}

// ============================================================================
// SECTION: Client Error
// ============================================================================

/// Failures returned by the sign-on policy action client.
///
/// # Invariants
/// - Variants are stable for error classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The API answered with a non-success status.
    #[error("remote API returned status {status}: {}", api_message(envelope.as_ref(), body_excerpt))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Decoded error envelope, when the body carried one.
        envelope: Option<ErrorEnvelope>,
        /// Bounded excerpt of the response body.
        body_excerpt: String,
        /// Request URL that produced the response, when known.
        url: Option<String>,
    },
    /// The request never produced a response.
    #[error("remote API unreachable: {0}")]
    Transport(String),
    /// A success response body could not be decoded.
    #[error("remote API response could not be decoded: {0}")]
    Decode(String),
    /// The operation was cancelled by the host.
    #[error("operation cancelled")]
    Cancelled,
    /// Retries ran out before the call succeeded.
    #[error("retry budget exhausted after {attempts} attempts: {last}")]
    RetryBudgetExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Failure observed on the last attempt.
        last: Box<ClientError>,
    },
    /// The bearer token could not be obtained.
    #[error("access token unavailable: {0}")]
    Token(String),
    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// A paging link pointed back at a page already fetched.
    #[error("paging link repeats an already fetched page: {0}")]
    PagingLoop(String),
}

impl ClientError {
    /// Builds an API error from a status and raw body.
    #[must_use]
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        Self::Api {
            status,
            envelope: ErrorEnvelope::from_body(body),
            body_excerpt: body_excerpt(body),
            url: None,
        }
    }

    /// Attaches the request URL to an API error.
    #[must_use]
    pub fn at_url(self, request_url: impl Into<String>) -> Self {
        match self {
            Self::Api {
                status,
                envelope,
                body_excerpt,
                ..
            } => Self::Api {
                status,
                envelope,
                body_excerpt,
                url: Some(request_url.into()),
            },
            other => other,
        }
    }

    /// Returns the response behind the innermost API failure, when its URL is known.
    #[must_use]
    pub fn response(&self) -> Option<ResponseSummary> {
        match self.root() {
            Self::Api {
                status,
                url: Some(url),
                ..
            } => Some(ResponseSummary {
                status: *status,
                url: url.clone(),
            }),
            _ => None,
        }
    }

    /// Returns the innermost failure, unwrapping exhausted retries.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::RetryBudgetExhausted {
                last, ..
            } => last.root(),
            other => other,
        }
    }

    /// Returns the HTTP status of the innermost API failure.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            Self::Api {
                status, ..
            } => Some(*status),
            _ => None,
        }
    }

    /// Returns the decoded envelope of the innermost API failure.
    #[must_use]
    pub fn envelope(&self) -> Option<&ErrorEnvelope> {
        match self.root() {
            Self::Api {
                envelope, ..
            } => envelope.as_ref(),
            _ => None,
        }
    }

    /// Returns true when the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns true for authentication or authorization refusals.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Returns true for failures worth retrying regardless of verb.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api {
                status, ..
            } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true when a new role grant has not yet propagated.
    #[must_use]
    pub fn is_permission_propagation(&self) -> bool {
        self.envelope()
            .is_some_and(|envelope| envelope.message.starts_with(PERMISSION_PROPAGATION_PREFIX))
    }

    /// Returns true when the API refused to delete the last action.
    #[must_use]
    pub fn is_last_action_violation(&self) -> bool {
        if self.status() != Some(400) {
            return false;
        }
        let Some(envelope) = self.envelope() else {
            return false;
        };
        match envelope.first_detail() {
            Some(detail) => {
                detail.code.as_deref() == Some(CONSTRAINT_VIOLATION)
                    && detail
                        .message
                        .as_deref()
                        .is_some_and(|message| message.contains(LAST_ACTION_MESSAGE))
            }
            None => {
                envelope.code == CONSTRAINT_VIOLATION
                    && envelope.message.contains(LAST_ACTION_MESSAGE)
            }
        }
    }

    /// Returns true when the API rejected a non-LDAP provisioning gateway.
    #[must_use]
    pub fn is_gateway_type_rejection(&self) -> bool {
        self.envelope().and_then(ErrorEnvelope::first_detail).is_some_and(|detail| {
            detail.code.as_deref() == Some(INVALID_VALUE)
                && detail.target.as_deref() == Some("newUserProvisioning.gateways")
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Truncates a response body to [`MAX_BODY_EXCERPT_CHARS`] characters.
#[must_use]
pub fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let mut excerpt: String = text.chars().take(MAX_BODY_EXCERPT_CHARS).collect();
    if text.chars().count() > MAX_BODY_EXCERPT_CHARS {
        excerpt.push_str("...");
    }
    excerpt
}

/// Picks the most useful message for an API error display.
fn api_message(envelope: Option<&ErrorEnvelope>, body_excerpt: &str) -> String {
    match envelope {
        Some(envelope) => format!("{} ({})", envelope.message, envelope.code),
        None if body_excerpt.is_empty() => "empty body".to_string(),
        None => body_excerpt.to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    fn api(status: u16, body: &str) -> ClientError {
        ClientError::from_response(status, body.as_bytes())
    }

    #[test]
    fn decodes_envelope_with_details() {
        let err = api(
            400,
            r#"{"id":"e1","code":"INVALID_DATA","message":"bad","details":[{"code":"INVALID_VALUE","target":"newUserProvisioning.gateways","message":"only LDAP","innerError":{"allowedValues":["LDAP"]}}]}"#,
        );
        let envelope = err.envelope().unwrap();
        assert_eq!(envelope.code, "INVALID_DATA");
        assert_eq!(envelope.details.len(), 1);
        assert!(envelope.details[0].inner_error.is_some());
        assert!(err.is_gateway_type_rejection());
    }

    #[test]
    fn non_envelope_body_is_kept_as_excerpt() {
        let err = api(502, "<html>bad gateway</html>");
        assert!(err.envelope().is_none());
        assert!(err.is_transient());
        assert!(err.to_string().contains("bad gateway"));
    }

    #[test]
    fn excerpt_is_bounded() {
        let body = "x".repeat(MAX_BODY_EXCERPT_CHARS + 10);
        let excerpt = body_excerpt(body.as_bytes());
        assert_eq!(excerpt.len(), MAX_BODY_EXCERPT_CHARS + 3);
    }

    #[test]
    fn classifies_last_action_violation() {
        let err = api(
            400,
            r#"{"id":"e2","code":"INVALID_DATA","message":"The request could not be completed.","details":[{"code":"CONSTRAINT_VIOLATION","target":"id","message":"Cannot delete last action from the policy"}]}"#,
        );
        assert!(err.is_last_action_violation());
        assert!(!err.is_transient());
        let other = api(
            400,
            r#"{"id":"e3","code":"INVALID_DATA","message":"x","details":[{"code":"CONSTRAINT_VIOLATION","target":"id","message":"other"}]}"#,
        );
        assert!(!other.is_last_action_violation());
        let forbidden = api(
            403,
            r#"{"id":"e5","code":"INVALID_DATA","message":"x","details":[{"code":"CONSTRAINT_VIOLATION","message":"Cannot delete last action from the policy"}]}"#,
        );
        assert!(!forbidden.is_last_action_violation());
    }

    #[test]
    fn last_action_violation_falls_back_to_top_level_code() {
        let err = api(
            400,
            r#"{"id":"e6","code":"CONSTRAINT_VIOLATION","message":"Cannot delete last action from the policy"}"#,
        );
        assert!(err.is_last_action_violation());
    }

    #[test]
    fn response_is_known_once_url_is_attached() {
        let err = api(400, r#"{"id":"e7","code":"INVALID_DATA","message":"bad"}"#);
        assert!(err.response().is_none());
        let located = err.at_url("https://api.test/v1/environments/env1");
        assert_eq!(
            located.response(),
            Some(ResponseSummary {
                status: 400,
                url: "https://api.test/v1/environments/env1".to_string(),
            })
        );
        let exhausted = ClientError::RetryBudgetExhausted {
            attempts: 2,
            last: Box::new(located),
        };
        assert_eq!(exhausted.response().map(|response| response.status), Some(400));
        assert!(ClientError::Cancelled.at_url("https://api.test").response().is_none());
    }

    #[test]
    fn classifies_permission_propagation() {
        let err = api(
            403,
            r#"{"id":"e4","code":"ACCESS_FAILED","message":"The actor attempting to perform the request is not authorized. Role pending."}"#,
        );
        assert!(err.is_permission_propagation());
        assert!(err.is_permission_denied());
    }

    #[test]
    fn exhausted_retries_expose_root_status() {
        let err = ClientError::RetryBudgetExhausted {
            attempts: 3,
            last: Box::new(api(404, "")),
        };
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_transient());
    }
}
