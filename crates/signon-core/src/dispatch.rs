// crates/signon-core/src/dispatch.rs
// ============================================================================
// Module: Action Dispatcher
// Description: Entry points between the flat action record and the wire.
// Purpose: Enforce priority and single-variant rules, then delegate.
// Dependencies: crate::{model, variant, wire, error}
// ============================================================================

//! ## Overview
//! The dispatcher knows neither the wire shape nor the condition tree. It
//! validates the flat record, projects it into a [`TypedAction`] and hands
//! it to the variant codec; on the way back it turns the typed form into the
//! flat record again.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::error::InputError;
use crate::error::StructureError;
use crate::model::ActionConfig;
use crate::model::ActionVariant;
use crate::model::CrossVariantAttributes;
use crate::model::LoginConfig;
use crate::model::TypedAction;
use crate::variant;
use crate::variant::ExpandedAction;
use crate::wire::ActionKind;
use crate::wire::LoginAction;
use crate::wire::SignOnPolicyAction;
use crate::wire::SocialSignOn;
use crate::wire::Toggle;

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Projects the flat record into its typed form.
///
/// # Errors
///
/// Returns [`InputError`] when the priority is below one or when not
/// exactly one variant block is set.
pub fn typed_action(config: &ActionConfig) -> Result<TypedAction, InputError> {
    if config.priority < 1 {
        return Err(InputError::InvalidPriority(config.priority));
    }
    let variant = match config.selected_variants().as_slice() {
        [] => return Err(InputError::NoVariant),
        [_] => select_variant(config)?,
        many => {
            return Err(InputError::MultipleVariants(
                many.iter().map(|kind| kind.block_name()).collect(),
            ));
        }
    };
    Ok(TypedAction {
        priority: config.priority,
        variant,
        cross: CrossVariantAttributes {
            registration_external_href: config.registration_external_href.clone(),
            registration_local_population_id: config.registration_local_population_id.clone(),
            registration_confirm_user_attributes: config.registration_confirm_user_attributes,
            social_provider_ids: config.social_provider_ids.clone(),
            enforce_lockout_for_identity_providers: config.enforce_lockout_for_identity_providers,
            confirm_identity_provider_attributes: config.confirm_identity_provider_attributes,
        },
        conditions: config.conditions.clone(),
    })
}

/// Clones the single set variant block.
fn select_variant(config: &ActionConfig) -> Result<ActionVariant, InputError> {
    let variant = if let Some(block) = &config.agreement {
        ActionVariant::Agreement(block.clone())
    } else if let Some(block) = &config.identifier_first {
        ActionVariant::IdentifierFirst(block.clone())
    } else if let Some(block) = &config.identity_provider {
        ActionVariant::IdentityProvider(block.clone())
    } else if let Some(block) = &config.login {
        ActionVariant::Login(block.clone())
    } else if let Some(block) = &config.mfa {
        ActionVariant::Mfa(block.clone())
    } else if let Some(block) = &config.progressive_profiling {
        ActionVariant::ProgressiveProfiling(block.clone())
    } else if let Some(block) = &config.pingid {
        ActionVariant::PingId(block.clone())
    } else if let Some(block) = &config.pingid_windows_login_passwordless {
        ActionVariant::PingIdWindowsLoginPasswordless(block.clone())
    } else {
        return Err(InputError::NoVariant);
    };
    Ok(variant)
}

/// Expands a flat action record into the remote representation.
///
/// # Errors
///
/// Returns [`InputError`] for any configuration the remote would reject or
/// that cannot be represented.
pub fn expand_action(config: &ActionConfig) -> Result<ExpandedAction, InputError> {
    variant::expand(&typed_action(config)?)
}

/// Flattens a remote action into the flat record.
///
/// # Errors
///
/// Returns [`StructureError`] when the remote action cannot be represented.
pub fn flatten_action(action: &SignOnPolicyAction) -> Result<ActionConfig, StructureError> {
    Ok(variant::flatten(action)?.into_config())
}

/// Builds the unconditioned login action used to keep a policy non-empty.
#[must_use]
pub fn minimal_login_action(priority: u32) -> SignOnPolicyAction {
    SignOnPolicyAction {
        id: None,
        priority,
        condition: None,
        kind: ActionKind::Login(LoginAction {
            recovery: Some(Toggle {
                enabled: LoginConfig::default().recovery_enabled,
            }),
            new_user_provisioning: None,
            sign_on: SocialSignOn::default(),
        }),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
