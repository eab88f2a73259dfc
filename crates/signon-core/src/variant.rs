// crates/signon-core/src/variant.rs
// ============================================================================
// Module: Variant Codec
// Description: Typed action variants <-> remote variant arms.
// Purpose: Encode per-variant and cross-variant attributes in both directions.
// Dependencies: crate::{condition, model, wire, error, diagnostics}
// ============================================================================

//! ## Overview
//! [`expand`] turns a [`TypedAction`] into a [`SignOnPolicyAction`], checking
//! required attributes and where the registration and social sign-on
//! attributes may appear. [`flatten`] reverses it for any remote arm and
//! reconstructs the flat condition surface.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::condition::ConditionContext;
use crate::condition::expand_conditions;
use crate::condition::flatten_condition;
use crate::diagnostics::Diagnostics;
use crate::error::InputError;
use crate::error::StructureError;
use crate::model::ActionVariant;
use crate::model::AgreementConfig;
use crate::model::CrossVariantAttributes;
use crate::model::DiscoveryRuleConfig;
use crate::model::GatewayConfig;
use crate::model::IdentifierFirstConfig;
use crate::model::IdentityProviderConfig;
use crate::model::LoginConfig;
use crate::model::MfaConfig;
use crate::model::NewUserProvisioningConfig;
use crate::model::PingIdConfig;
use crate::model::PingIdWindowsLoginPasswordlessConfig;
use crate::model::ProfileAttributeConfig;
use crate::model::ProgressiveProfilingConfig;
use crate::model::TypedAction;
use crate::model::VariantKind;
use crate::wire::ActionKind;
use crate::wire::AgreementAction;
use crate::wire::DiscoveryCondition;
use crate::wire::DiscoveryRule;
use crate::wire::ExternalLink;
use crate::wire::IDENTIFIER_REF;
use crate::wire::IdentifierFirstAction;
use crate::wire::IdentityProviderAction;
use crate::wire::LoginAction;
use crate::wire::MfaAction;
use crate::wire::NamedAttribute;
use crate::wire::NewUserProvisioning;
use crate::wire::PingIdAction;
use crate::wire::PingIdWinLoginPasswordlessAction;
use crate::wire::ProfileAttribute;
use crate::wire::ProgressiveProfilingAction;
use crate::wire::ProvisioningGateway;
use crate::wire::Registration;
use crate::wire::ResourceRef;
use crate::wire::SignOnPolicyAction;
use crate::wire::SocialSignOn;
use crate::wire::Toggle;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Remote action produced by expansion, with its warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedAction {
    /// Action to send.
    pub action: SignOnPolicyAction,
    /// Non-fatal findings.
    pub diagnostics: Diagnostics,
}

// ============================================================================
// SECTION: Expansion
// ============================================================================

/// Expands a typed action into its remote representation.
///
/// # Errors
///
/// Returns [`InputError`] for missing required attributes, misplaced
/// cross-variant attributes and invalid conditions.
pub fn expand(typed: &TypedAction) -> Result<ExpandedAction, InputError> {
    let kind = typed.variant.kind();
    check_cross_variant(kind, &typed.cross)?;

    let mut diagnostics = Diagnostics::new();
    let condition = expand_conditions(
        typed.conditions.as_ref(),
        ConditionContext {
            kind,
            priority: typed.priority,
        },
    )?;
    diagnostics.extend(condition.warnings);

    let action_kind = match &typed.variant {
        ActionVariant::Agreement(block) => {
            require(&block.agreement_id, "agreement_id", kind)?;
            ActionKind::Agreement(AgreementAction {
                agreement: ResourceRef::new(block.agreement_id.clone()),
                disable_decline_option: Some(!block.show_decline_option),
            })
        }
        ActionVariant::IdentifierFirst(block) => {
            let discovery_rules = block
                .discovery_rule
                .iter()
                .map(|rule| {
                    require(&rule.identity_provider_id, "discovery_rule.identity_provider_id", kind)?;
                    require(&rule.attribute_contains_text, "discovery_rule.attribute_contains_text", kind)?;
                    Ok(DiscoveryRule {
                        condition: DiscoveryCondition {
                            contains: rule.attribute_contains_text.clone(),
                            value: IDENTIFIER_REF.to_string(),
                        },
                        identity_provider: ResourceRef::new(rule.identity_provider_id.clone()),
                    })
                })
                .collect::<Result<Vec<_>, InputError>>()?;
            ActionKind::IdentifierFirst(IdentifierFirstAction {
                discovery_rules: (!discovery_rules.is_empty()).then_some(discovery_rules),
                recovery: block.recovery_enabled.map(|enabled| Toggle {
                    enabled,
                }),
                sign_on: expand_social_sign_on(&typed.cross, &mut diagnostics),
            })
        }
        ActionVariant::IdentityProvider(block) => {
            require(&block.identity_provider_id, "identity_provider_id", kind)?;
            ActionKind::IdentityProvider(IdentityProviderAction {
                identity_provider: ResourceRef::new(block.identity_provider_id.clone()),
                acr_values: block.acr_values.clone(),
                pass_user_context: block.pass_user_context,
                registration: expand_registration(&typed.cross, &mut diagnostics),
            })
        }
        ActionVariant::Login(block) => {
            let gateways = block
                .new_user_provisioning
                .as_ref()
                .map(|provisioning| provisioning.gateway.as_slice())
                .unwrap_or_default();
            let gateways = gateways
                .iter()
                .map(|gateway| ProvisioningGateway {
                    id: gateway.id.clone(),
                    gateway_type: gateway.gateway_type.clone(),
                    user_type: ResourceRef::new(gateway.user_type_id.clone()),
                })
                .collect::<Vec<_>>();
            ActionKind::Login(LoginAction {
                recovery: Some(Toggle {
                    enabled: block.recovery_enabled,
                }),
                new_user_provisioning: (!gateways.is_empty()).then_some(NewUserProvisioning {
                    gateways,
                }),
                sign_on: expand_social_sign_on(&typed.cross, &mut diagnostics),
            })
        }
        ActionVariant::Mfa(block) => ActionKind::Mfa(MfaAction {
            device_authentication_policy: block.device_sign_on_policy_id.clone().map(ResourceRef::new),
            no_device_mode: Some(block.no_device_mode),
        }),
        ActionVariant::ProgressiveProfiling(block) => {
            require(&block.prompt_text, "prompt_text", kind)?;
            if block.attribute.is_empty() {
                return Err(InputError::MissingAttribute {
                    attribute: "attribute",
                    variant: kind,
                });
            }
            ActionKind::ProgressiveProfiling(ProgressiveProfilingAction {
                attributes: block
                    .attribute
                    .iter()
                    .map(|attribute| ProfileAttribute {
                        name: attribute.name.clone(),
                        required: attribute.required,
                    })
                    .collect(),
                prevent_multiple_prompts_per_flow: block.prevent_multiple_prompts_per_flow,
                prompt_interval_seconds: block.prompt_interval_seconds,
                prompt_text: block.prompt_text.clone(),
            })
        }
        ActionVariant::PingId(PingIdConfig {}) => ActionKind::PingId(PingIdAction {}),
        ActionVariant::PingIdWindowsLoginPasswordless(block) => {
            require(&block.unique_user_attribute_name, "unique_user_attribute_name", kind)?;
            ActionKind::PingIdWinLoginPasswordless(PingIdWinLoginPasswordlessAction {
                unique_user_attribute: NamedAttribute {
                    name: block.unique_user_attribute_name.clone(),
                },
                offline_mode: Toggle {
                    enabled: block.offline_mode_enabled,
                },
            })
        }
    };

    Ok(ExpandedAction {
        action: SignOnPolicyAction {
            id: None,
            priority: typed.priority,
            condition: condition.node,
            kind: action_kind,
        },
        diagnostics,
    })
}

/// Fails with `MissingAttribute` when `value` is empty.
fn require(value: &str, attribute: &'static str, variant: VariantKind) -> Result<(), InputError> {
    if value.trim().is_empty() {
        return Err(InputError::MissingAttribute {
            attribute,
            variant,
        });
    }
    Ok(())
}

/// Checks registration exclusivity and where cross-variant attributes apply.
fn check_cross_variant(kind: VariantKind, cross: &CrossVariantAttributes) -> Result<(), InputError> {
    if cross.registration_external_href.is_some() && cross.registration_local_population_id.is_some() {
        return Err(InputError::ConflictingRegistration);
    }
    let social_form = matches!(kind, VariantKind::IdentifierFirst | VariantKind::Login);
    let registration_form = social_form || kind == VariantKind::IdentityProvider;
    let misplaced = [
        ("registration_external_href", cross.registration_external_href.is_some(), social_form),
        (
            "registration_local_population_id",
            cross.registration_local_population_id.is_some(),
            registration_form,
        ),
        (
            "registration_confirm_user_attributes",
            cross.registration_confirm_user_attributes,
            registration_form,
        ),
        ("social_provider_ids", !cross.social_provider_ids.is_empty(), social_form),
        (
            "enforce_lockout_for_identity_providers",
            cross.enforce_lockout_for_identity_providers,
            social_form,
        ),
        (
            "confirm_identity_provider_attributes",
            cross.confirm_identity_provider_attributes,
            social_form,
        ),
    ]
    .into_iter()
    .find(|(_, present, allowed)| *present && !*allowed);
    if let Some((attribute, ..)) = misplaced {
        return Err(InputError::AttributeNotApplicable {
            attribute,
            variant: kind,
        });
    }
    for (attribute, value) in [
        ("registration_external_href", cross.registration_external_href.as_deref()),
        ("registration_local_population_id", cross.registration_local_population_id.as_deref()),
    ] {
        if let Some(value) = value {
            require(value, attribute, kind)?;
        }
    }
    Ok(())
}

/// Builds the registration object; confirmation only rides on a population.
fn expand_registration(
    cross: &CrossVariantAttributes,
    diagnostics: &mut Diagnostics,
) -> Option<Registration> {
    if cross.registration_confirm_user_attributes && cross.registration_local_population_id.is_none() {
        diagnostics.warn(
            "`registration_confirm_user_attributes` has no effect unless \
             `registration_local_population_id` is set and was not applied",
        );
    }
    if let Some(href) = &cross.registration_external_href {
        return Some(Registration {
            enabled: false,
            external: Some(ExternalLink {
                href: href.clone(),
            }),
            population: None,
            confirm_identity_provider_attributes: None,
        });
    }
    cross.registration_local_population_id.as_ref().map(|population| Registration {
        enabled: true,
        external: None,
        population: Some(ResourceRef::new(population.clone())),
        confirm_identity_provider_attributes: Some(cross.registration_confirm_user_attributes),
    })
}

/// Builds the registration and social sign-on fragment.
fn expand_social_sign_on(cross: &CrossVariantAttributes, diagnostics: &mut Diagnostics) -> SocialSignOn {
    let registration = expand_registration(cross, diagnostics);
    if cross.social_provider_ids.is_empty() {
        if cross.enforce_lockout_for_identity_providers {
            diagnostics.warn(
                "`enforce_lockout_for_identity_providers` has no effect without \
                 `social_provider_ids` and was not applied",
            );
        }
        if cross.confirm_identity_provider_attributes {
            diagnostics.warn(
                "`confirm_identity_provider_attributes` has no effect without \
                 `social_provider_ids` and was not applied",
            );
        }
        return SocialSignOn {
            registration,
            ..SocialSignOn::default()
        };
    }
    SocialSignOn {
        registration,
        social_providers: Some(cross.social_provider_ids.iter().cloned().map(ResourceRef::new).collect()),
        enforce_lockout_for_identity_providers: Some(cross.enforce_lockout_for_identity_providers),
        confirm_identity_provider_attributes: Some(cross.confirm_identity_provider_attributes),
    }
}

// ============================================================================
// SECTION: Flattening
// ============================================================================

/// Flattens a remote action into its typed form.
///
/// # Errors
///
/// Returns [`StructureError`] when the condition tree or a discovery rule
/// cannot be represented declaratively.
pub fn flatten(action: &SignOnPolicyAction) -> Result<TypedAction, StructureError> {
    let mut cross = CrossVariantAttributes::default();
    let variant = match &action.kind {
        ActionKind::Agreement(arm) => ActionVariant::Agreement(AgreementConfig {
            agreement_id: arm.agreement.id.clone(),
            show_decline_option: !arm.disable_decline_option.unwrap_or(false),
        }),
        ActionKind::IdentifierFirst(arm) => {
            flatten_social_sign_on(&arm.sign_on, &mut cross);
            let discovery_rule = arm
                .discovery_rules
                .iter()
                .flatten()
                .enumerate()
                .map(|(index, rule)| {
                    if rule.condition.value != IDENTIFIER_REF {
                        return Err(StructureError::new(
                            format!("discoveryRules[{index}].condition.value"),
                            format!("expected reference `{IDENTIFIER_REF}`"),
                        ));
                    }
                    Ok(DiscoveryRuleConfig {
                        attribute_contains_text: rule.condition.contains.clone(),
                        identity_provider_id: rule.identity_provider.id.clone(),
                    })
                })
                .collect::<Result<Vec<_>, StructureError>>()?;
            ActionVariant::IdentifierFirst(IdentifierFirstConfig {
                discovery_rule,
                recovery_enabled: arm.recovery.map(|recovery| recovery.enabled),
            })
        }
        ActionKind::IdentityProvider(arm) => {
            flatten_registration(arm.registration.as_ref(), &mut cross);
            ActionVariant::IdentityProvider(IdentityProviderConfig {
                identity_provider_id: arm.identity_provider.id.clone(),
                acr_values: arm.acr_values.clone(),
                pass_user_context: arm.pass_user_context,
            })
        }
        ActionKind::Login(arm) => {
            flatten_social_sign_on(&arm.sign_on, &mut cross);
            let new_user_provisioning = arm
                .new_user_provisioning
                .as_ref()
                .filter(|provisioning| !provisioning.gateways.is_empty())
                .map(|provisioning| NewUserProvisioningConfig {
                    gateway: provisioning
                        .gateways
                        .iter()
                        .map(|gateway| GatewayConfig {
                            id: gateway.id.clone(),
                            gateway_type: gateway.gateway_type.clone(),
                            user_type_id: gateway.user_type.id.clone(),
                        })
                        .collect(),
                });
            ActionVariant::Login(LoginConfig {
                recovery_enabled: arm.recovery.is_none_or(|recovery| recovery.enabled),
                new_user_provisioning,
            })
        }
        ActionKind::Mfa(arm) => ActionVariant::Mfa(MfaConfig {
            device_sign_on_policy_id: arm
                .device_authentication_policy
                .as_ref()
                .map(|policy| policy.id.clone()),
            no_device_mode: arm.no_device_mode.unwrap_or_default(),
        }),
        ActionKind::ProgressiveProfiling(arm) => {
            ActionVariant::ProgressiveProfiling(ProgressiveProfilingConfig {
                attribute: arm
                    .attributes
                    .iter()
                    .map(|attribute| ProfileAttributeConfig {
                        name: attribute.name.clone(),
                        required: attribute.required,
                    })
                    .collect::<BTreeSet<_>>(),
                prevent_multiple_prompts_per_flow: arm.prevent_multiple_prompts_per_flow,
                prompt_interval_seconds: arm.prompt_interval_seconds,
                prompt_text: arm.prompt_text.clone(),
            })
        }
        ActionKind::PingId(PingIdAction {}) => ActionVariant::PingId(PingIdConfig {}),
        ActionKind::PingIdWinLoginPasswordless(arm) => {
            ActionVariant::PingIdWindowsLoginPasswordless(PingIdWindowsLoginPasswordlessConfig {
                unique_user_attribute_name: arm.unique_user_attribute.name.clone(),
                offline_mode_enabled: arm.offline_mode.enabled,
            })
        }
    };

    let conditions = action
        .condition
        .as_ref()
        .map(flatten_condition)
        .transpose()?
        .filter(|conditions| !conditions.is_empty());

    Ok(TypedAction {
        priority: action.priority,
        variant,
        cross,
        conditions,
    })
}

/// Copies registration settings into the cross-variant attributes.
fn flatten_registration(registration: Option<&Registration>, cross: &mut CrossVariantAttributes) {
    let Some(registration) = registration else {
        return;
    };
    if let Some(external) = &registration.external {
        cross.registration_external_href = Some(external.href.clone());
    } else if let Some(population) = &registration.population {
        cross.registration_local_population_id = Some(population.id.clone());
        cross.registration_confirm_user_attributes =
            registration.confirm_identity_provider_attributes.unwrap_or(false);
    }
}

/// Copies the registration and social sign-on fragment.
fn flatten_social_sign_on(sign_on: &SocialSignOn, cross: &mut CrossVariantAttributes) {
    flatten_registration(sign_on.registration.as_ref(), cross);
    cross.social_provider_ids =
        sign_on.social_providers.iter().flatten().map(|provider| provider.id.clone()).collect();
    cross.enforce_lockout_for_identity_providers =
        sign_on.enforce_lockout_for_identity_providers.unwrap_or(false);
    cross.confirm_identity_provider_attributes =
        sign_on.confirm_identity_provider_attributes.unwrap_or(false);
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

    fn typed(variant: ActionVariant) -> TypedAction {
        TypedAction {
            priority: 2,
            variant,
            cross: CrossVariantAttributes::default(),
            conditions: None,
        }
    }

    #[test]
    fn agreement_decline_flag_is_inverted() {
        let expanded = expand(&typed(ActionVariant::Agreement(AgreementConfig {
            agreement_id: "agr1".to_string(),
            show_decline_option: true,
        })))
        .unwrap();
        let ActionKind::Agreement(arm) = &expanded.action.kind else {
            panic!("expected agreement arm");
        };
        assert_eq!(arm.disable_decline_option, Some(false));
        let ActionVariant::Agreement(block) = flatten(&expanded.action).unwrap().variant else {
            panic!("expected agreement block");
        };
        assert!(block.show_decline_option);
    }

    #[test]
    fn registration_modes_are_exclusive() {
        let mut action = typed(ActionVariant::Login(LoginConfig::default()));
        action.cross.registration_external_href = Some("https://example.com/register".to_string());
        action.cross.registration_local_population_id = Some("pop1".to_string());
        assert_eq!(expand(&action).unwrap_err(), InputError::ConflictingRegistration);
    }

    #[test]
    fn social_providers_rejected_on_identity_provider() {
        let mut action = typed(ActionVariant::IdentityProvider(IdentityProviderConfig {
            identity_provider_id: "idp1".to_string(),
            acr_values: None,
            pass_user_context: None,
        }));
        action.cross.social_provider_ids.insert("idpA".to_string());
        assert_eq!(
            expand(&action).unwrap_err(),
            InputError::AttributeNotApplicable {
                attribute: "social_provider_ids",
                variant: VariantKind::IdentityProvider,
            }
        );
    }

    #[test]
    fn identity_provider_keeps_local_registration() {
        let mut action = typed(ActionVariant::IdentityProvider(IdentityProviderConfig {
            identity_provider_id: "idp1".to_string(),
            acr_values: Some("urn:acr:mfa".to_string()),
            pass_user_context: Some(true),
        }));
        action.cross.registration_local_population_id = Some("pop1".to_string());
        action.cross.registration_confirm_user_attributes = true;
        let expanded = expand(&action).unwrap();
        assert!(expanded.diagnostics.is_empty());
        assert_eq!(flatten(&expanded.action).unwrap(), action);
    }

    #[test]
    fn confirmation_without_social_providers_warns() {
        let mut action = typed(ActionVariant::IdentifierFirst(IdentifierFirstConfig::default()));
        action.cross.confirm_identity_provider_attributes = true;
        let expanded = expand(&action).unwrap();
        assert_eq!(expanded.diagnostics.warnings().count(), 1);
        let ActionKind::IdentifierFirst(arm) = &expanded.action.kind else {
            panic!("expected identifier-first arm");
        };
        assert_eq!(arm.sign_on.confirm_identity_provider_attributes, None);
    }

    #[test]
    fn discovery_rules_reference_identifier() {
        let action = typed(ActionVariant::IdentifierFirst(IdentifierFirstConfig {
            discovery_rule: vec![DiscoveryRuleConfig {
                attribute_contains_text: "@example.com".to_string(),
                identity_provider_id: "idp1".to_string(),
            }],
            recovery_enabled: Some(false),
        }));
        let expanded = expand(&action).unwrap();
        let ActionKind::IdentifierFirst(arm) = &expanded.action.kind else {
            panic!("expected identifier-first arm");
        };
        let rules = arm.discovery_rules.as_ref().unwrap();
        assert_eq!(rules[0].condition.value, IDENTIFIER_REF);
        assert_eq!(flatten(&expanded.action).unwrap(), action);
    }

    #[test]
    fn empty_prompt_text_is_missing() {
        let action = typed(ActionVariant::ProgressiveProfiling(ProgressiveProfilingConfig {
            attribute: BTreeSet::from([ProfileAttributeConfig {
                name: "email".to_string(),
                required: true,
            }]),
            prevent_multiple_prompts_per_flow: true,
            prompt_interval_seconds: 60,
            prompt_text: "  ".to_string(),
        }));
        assert!(matches!(
            expand(&action).unwrap_err(),
            InputError::MissingAttribute {
                attribute: "prompt_text",
                ..
            }
        ));
    }
}
