// crates/signon-provider/src/resource.rs
// ============================================================================
// Module: Action Resource Model
// Description: Persisted state of one managed sign-on policy action.
// Purpose: Pair remote identifiers with the flat action and plan replacement.
// Dependencies: serde, serde_json, signon-core
// ============================================================================

//! ## Overview
//! [`ActionResourceModel`] is what the host persists between runs: the
//! remote identifiers plus the flat [`ActionConfig`]. Its JSON form matches
//! the attribute names of the resource schema, which lets [`plan_replacement`]
//! compare prior and proposed state attribute by attribute for every
//! attribute the schema marks as forcing replacement.
//!
//! Persisted state is versioned. [`upgrade_state`] brings state written by
//! older releases up to [`STATE_SCHEMA_VERSION`] before a verb sees it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use signon_core::ActionAddress;
use signon_core::ActionConfig;
use signon_core::ActionId;
use signon_core::EnvironmentId;
use signon_core::SignOnPolicyId;
use signon_core::action_resource_schema;
use signon_core::schema::ValueKind;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Layout version written into persisted state.
pub const STATE_SCHEMA_VERSION: u32 = 1;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures handling persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// State could not be encoded as JSON.
    #[error("state could not be encoded: {0}")]
    Encode(String),
    /// State was written by a newer release.
    #[error("state schema version {found} is newer than supported version {STATE_SCHEMA_VERSION}")]
    UnsupportedVersion {
        /// Version found in the stored state.
        found: u32,
    },
    /// Stored state does not decode into the current layout.
    #[error("stored state is malformed: {0}")]
    Malformed(String),
}

// ============================================================================
// SECTION: Resource Model
// ============================================================================

/// Persisted state of a managed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResourceModel {
    /// Layout version of this state; 0 when written before versioning.
    #[serde(default)]
    pub schema_version: u32,
    /// Remote-assigned identifier; absent until created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ActionId>,
    /// Environment holding the policy.
    pub environment_id: EnvironmentId,
    /// Parent sign-on policy.
    pub sign_on_policy_id: SignOnPolicyId,
    /// Flat declarative action.
    #[serde(flatten)]
    pub action: ActionConfig,
}

impl ActionResourceModel {
    /// Creates an unsaved model for `action`.
    #[must_use]
    pub const fn new(
        environment_id: EnvironmentId,
        sign_on_policy_id: SignOnPolicyId,
        action: ActionConfig,
    ) -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION,
            id: None,
            environment_id,
            sign_on_policy_id,
            action,
        }
    }

    /// Returns the full address when the model has been created.
    #[must_use]
    pub fn address(&self) -> Option<ActionAddress> {
        self.id.as_ref().map(|action_id| ActionAddress {
            environment_id: self.environment_id.clone(),
            sign_on_policy_id: self.sign_on_policy_id.clone(),
            action_id: action_id.clone(),
        })
    }

    /// Returns a copy carrying `id` and `action`.
    #[must_use]
    pub fn with_remote(&self, id: ActionId, action: ActionConfig) -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION,
            id: Some(id),
            environment_id: self.environment_id.clone(),
            sign_on_policy_id: self.sign_on_policy_id.clone(),
            action,
        }
    }
}

impl From<ActionAddress> for ActionResourceModel {
    fn from(address: ActionAddress) -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION,
            id: Some(address.action_id),
            environment_id: address.environment_id,
            sign_on_policy_id: address.sign_on_policy_id,
            action: ActionConfig::default(),
        }
    }
}

// ============================================================================
// SECTION: State Upgrade
// ============================================================================

/// Decodes persisted state, migrating older layouts to the current one.
///
/// # Errors
///
/// Returns [`ResourceError::UnsupportedVersion`] for state written by a newer
/// release and [`ResourceError::Malformed`] when the state does not decode.
pub fn upgrade_state(mut raw: Value) -> Result<ActionResourceModel, ResourceError> {
    let version = match raw.get("schema_version") {
        None | Some(Value::Null) => 0,
        Some(value) => value
            .as_u64()
            .and_then(|version| u32::try_from(version).ok())
            .ok_or_else(|| ResourceError::Malformed(format!("invalid schema_version {value}")))?,
    };
    if version > STATE_SCHEMA_VERSION {
        return Err(ResourceError::UnsupportedVersion {
            found: version,
        });
    }
    if version == 0 {
        upgrade_from_v0(&mut raw);
    }
    let Some(object) = raw.as_object_mut() else {
        return Err(ResourceError::Malformed("state is not a JSON object".to_string()));
    };
    object.insert("schema_version".to_string(), Value::from(STATE_SCHEMA_VERSION));
    serde_json::from_value(raw).map_err(|err| ResourceError::Malformed(err.to_string()))
}

/// Unwraps the `conditions` block list and renames `value_string`.
fn upgrade_from_v0(raw: &mut Value) {
    if let Some(conditions) = raw.get_mut("conditions").filter(|conditions| conditions.is_array()) {
        let blocks = conditions.take();
        *conditions =
            blocks.as_array().and_then(|blocks| blocks.first()).cloned().unwrap_or(Value::Null);
    }
    let Some(entries) =
        raw.pointer_mut("/conditions/user_attribute_equals").and_then(Value::as_array_mut)
    else {
        return;
    };
    for entry in entries.iter_mut().filter_map(Value::as_object_mut) {
        if let Some(value) = entry.remove("value_string") {
            entry.entry("value").or_insert(value);
        }
    }
}

// ============================================================================
// SECTION: Replacement Planning
// ============================================================================

/// Outcome of comparing prior and proposed state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementPlan {
    /// Attributes whose change forces delete-then-create, in schema order.
    pub requires_replace: Vec<&'static str>,
}

impl ReplacementPlan {
    /// Returns true when the change cannot be applied in place.
    #[must_use]
    pub fn requires_replacement(&self) -> bool {
        !self.requires_replace.is_empty()
    }
}

/// Determines which changes force the action to be replaced.
///
/// Scalar attributes force replacement when their value changes. Variant
/// blocks force replacement when the block is added or removed; edits inside
/// a block that stays selected are applied in place.
///
/// # Errors
///
/// Returns [`ResourceError::Encode`] when either state cannot be encoded.
pub fn plan_replacement(
    prior: &ActionResourceModel,
    proposed: &ActionResourceModel,
) -> Result<ReplacementPlan, ResourceError> {
    let encode = |model: &ActionResourceModel| {
        serde_json::to_value(model).map_err(|err| ResourceError::Encode(err.to_string()))
    };
    let prior = encode(prior)?;
    let proposed = encode(proposed)?;
    let schema = action_resource_schema();
    let requires_replace = schema
        .force_new_attributes()
        .filter(|attribute| {
            let before = prior.get(attribute.name).filter(|value| !value.is_null());
            let after = proposed.get(attribute.name).filter(|value| !value.is_null());
            match attribute.kind {
                ValueKind::Block | ValueKind::BlockList | ValueKind::BlockSet => {
                    before.is_some() != after.is_some()
                }
                _ => before != after,
            }
        })
        .map(|attribute| attribute.name)
        .collect();
    Ok(ReplacementPlan {
        requires_replace,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
