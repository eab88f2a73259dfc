// crates/signon-core/src/identifiers.rs
// ============================================================================
// Module: Sign-On Identifiers
// Description: Opaque remote identifiers for environments, policies, actions.
// Purpose: Provide strongly typed, serializable IDs and the import id parser.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Identifiers are opaque strings assigned by the remote platform. They
//! serialize transparently and are only validated for emptiness here; the
//! remote remains the authority on their format.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Environment (tenant) identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentId(String);

impl EnvironmentId {
    /// Creates a new environment identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for EnvironmentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Sign-on policy (parent) identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignOnPolicyId(String);

impl SignOnPolicyId {
    /// Creates a new sign-on policy identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignOnPolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SignOnPolicyId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Sign-on policy action identifier, assigned by the remote on create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    /// Creates a new action identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ActionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Import Identifier
// ============================================================================

/// Fully qualified action address parsed from an import id.
///
/// # Invariants
/// - All three components are non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionAddress {
    /// Environment holding the policy.
    pub environment_id: EnvironmentId,
    /// Parent sign-on policy.
    pub sign_on_policy_id: SignOnPolicyId,
    /// Action identifier.
    pub action_id: ActionId,
}

impl ActionAddress {
    /// Parses an `environmentID/signOnPolicyID/actionID` import id.
    ///
    /// # Errors
    ///
    /// Returns [`ImportIdError`] when the id does not have exactly three
    /// non-empty slash-separated components.
    pub fn parse_import_id(raw: &str) -> Result<Self, ImportIdError> {
        let parts: Vec<&str> = raw.split('/').collect();
        match parts.as_slice() {
            [environment, policy, action]
                if !environment.is_empty() && !policy.is_empty() && !action.is_empty() =>
            {
                Ok(Self {
                    environment_id: EnvironmentId::new(*environment),
                    sign_on_policy_id: SignOnPolicyId::new(*policy),
                    action_id: ActionId::new(*action),
                })
            }
            _ => Err(ImportIdError {
                raw: raw.to_string(),
            }),
        }
    }
}

impl fmt::Display for ActionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.environment_id, self.sign_on_policy_id, self.action_id)
    }
}

/// Import id parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "invalid id (\"{raw}\") specified, should be in format \
     \"environmentID/signOnPolicyID/signOnPolicyActionID\""
)]
pub struct ImportIdError {
    /// The rejected raw id.
    pub raw: String,
}
