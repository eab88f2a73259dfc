//! Action codec property-based tests.
//!
//! ## Purpose
//! These tests generate valid declarative actions across all eight variants
//! and check that expansion followed by a JSON wire round trip and flattening
//! reproduces the normalized input.
//!
//! ## What is covered
//! - Round-trip identity on managed fields.
//! - Priority pass-through.
//! - Emitted condition trees stay within the flat-expressible shapes.
//! - Population and attribute sets survive without loss.
// crates/signon-core/tests/proptest_round_trip.rs
// ============================================================================
// Module: Action Codec Property-Based Tests
// Description: Randomized round trips through expand, JSON and flatten.
// Purpose: Ensure no managed field is lost or altered by the codecs.
// ============================================================================

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
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeSet;

use proptest::prelude::*;
use signon_core::ActionConfig;
use signon_core::ConditionLeaf;
use signon_core::ConditionNode;
use signon_core::ConditionsConfig;
use signon_core::SignOnPolicyAction;
use signon_core::expand_action;
use signon_core::flatten_action;
use signon_core::model::AgreementConfig;
use signon_core::model::DiscoveryRuleConfig;
use signon_core::model::GatewayConfig;
use signon_core::model::IdentifierFirstConfig;
use signon_core::model::IdentityProviderConfig;
use signon_core::model::LoginConfig;
use signon_core::model::MfaConfig;
use signon_core::model::NewUserProvisioningConfig;
use signon_core::model::NoDeviceMode;
use signon_core::model::PingIdConfig;
use signon_core::model::PingIdWindowsLoginPasswordlessConfig;
use signon_core::model::ProfileAttributeConfig;
use signon_core::model::ProgressiveProfilingConfig;
use signon_core::model::UserAttributeEquals;

// ============================================================================
// SECTION: Strategies
// ============================================================================

fn resource_id() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

fn id_set() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(resource_id(), 0 .. 4)
}

fn cidrs() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec((0u8 ..= 255).prop_map(|octet| format!("{octet}.0.0.0/8")), 0 .. 3)
}

fn attribute_entries() -> impl Strategy<Value = BTreeSet<UserAttributeEquals>> {
    let value = prop_oneof![
        "[A-Za-z]{0,6}".prop_map(|text| (Some(text), None)),
        any::<bool>().prop_map(|flag| (None, Some(flag))),
    ];
    prop::collection::btree_set(
        ("[a-z]{1,6}", value).prop_map(|(path, (value, value_boolean))| UserAttributeEquals {
            attribute_reference: format!("${{user.{path}}}"),
            value,
            value_boolean,
        }),
        0 .. 4,
    )
}

fn password_threshold() -> impl Strategy<Value = Option<u64>> {
    prop::option::of(1u64 .. 1_000_000)
}

fn last_sign_on_pair() -> impl Strategy<Value = (Option<u64>, Option<u64>)> {
    prop_oneof![
        Just((None, None)),
        (1u64 .. 1_000_000).prop_map(|seconds| (Some(seconds), None)),
        (1u64 .. 1_000_000).prop_map(|seconds| (None, Some(seconds))),
    ]
}

fn mfa_conditions() -> impl Strategy<Value = ConditionsConfig> {
    (
        last_sign_on_pair(),
        id_set(),
        attribute_entries(),
        cidrs(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        cidrs(),
    )
        .prop_map(|((password, mfa), populations, attributes, out_of_range, risk, geo, anonymous, allowed)| {
            ConditionsConfig {
                last_sign_on_older_than_seconds: password,
                last_sign_on_older_than_seconds_mfa: mfa,
                user_is_member_of_any_population_id: populations,
                user_attribute_equals: attributes,
                ip_out_of_range_cidr: out_of_range,
                ip_reputation_high_risk: risk,
                geovelocity_anomaly_detected: geo,
                anonymous_network_detected: anonymous,
                anonymous_network_detected_allowed_cidr: allowed,
            }
        })
}

fn form_conditions() -> impl Strategy<Value = ConditionsConfig> {
    (password_threshold(), id_set(), attribute_entries()).prop_map(|(password, populations, attributes)| {
        ConditionsConfig {
            last_sign_on_older_than_seconds: password,
            user_is_member_of_any_population_id: populations,
            user_attribute_equals: attributes,
            ..ConditionsConfig::default()
        }
    })
}

fn password_only_conditions() -> impl Strategy<Value = ConditionsConfig> {
    password_threshold().prop_map(|password| ConditionsConfig {
        last_sign_on_older_than_seconds: password,
        ..ConditionsConfig::default()
    })
}

/// Registration choice: none, external link, or local population.
#[derive(Debug, Clone)]
enum RegistrationChoice {
    /// No registration.
    None,
    /// External registration link.
    External(String),
    /// Local registration population.
    Local(String),
}

fn registration_choice() -> impl Strategy<Value = RegistrationChoice> {
    prop_oneof![
        Just(RegistrationChoice::None),
        "[a-z]{1,8}".prop_map(|host| RegistrationChoice::External(format!("https://{host}.example.com"))),
        resource_id().prop_map(RegistrationChoice::Local),
    ]
}

fn apply_registration(config: &mut ActionConfig, choice: RegistrationChoice, confirm: bool) {
    match choice {
        RegistrationChoice::None => {}
        RegistrationChoice::External(href) => config.registration_external_href = Some(href),
        RegistrationChoice::Local(population) => {
            config.registration_local_population_id = Some(population);
        }
    }
    config.registration_confirm_user_attributes = confirm;
}

fn social_form(config: &mut ActionConfig, social: (RegistrationChoice, bool, BTreeSet<String>, bool, bool)) {
    let (registration, confirm, providers, lockout, confirm_idp) = social;
    apply_registration(config, registration, confirm);
    config.social_provider_ids = providers;
    config.enforce_lockout_for_identity_providers = lockout;
    config.confirm_identity_provider_attributes = confirm_idp;
}

fn social_attributes() -> impl Strategy<Value = (RegistrationChoice, bool, BTreeSet<String>, bool, bool)> {
    (registration_choice(), any::<bool>(), id_set(), any::<bool>(), any::<bool>())
}

fn action_config() -> impl Strategy<Value = ActionConfig> {
    let priority = 2u32 .. 100;
    prop_oneof![
        (priority.clone(), resource_id(), any::<bool>(), password_only_conditions()).prop_map(
            |(priority, agreement_id, show_decline_option, conditions)| ActionConfig {
                priority,
                conditions: Some(conditions),
                agreement: Some(AgreementConfig {
                    agreement_id,
                    show_decline_option,
                }),
                ..ActionConfig::default()
            }
        ),
        (
            priority.clone(),
            prop::collection::vec(("[a-z@.]{1,10}", resource_id()), 0 .. 3),
            prop::option::of(any::<bool>()),
            form_conditions(),
            social_attributes(),
        )
            .prop_map(|(priority, rules, recovery_enabled, conditions, social)| {
                let mut config = ActionConfig {
                    priority,
                    conditions: Some(conditions),
                    identifier_first: Some(IdentifierFirstConfig {
                        discovery_rule: rules
                            .into_iter()
                            .map(|(text, idp)| DiscoveryRuleConfig {
                                attribute_contains_text: text,
                                identity_provider_id: idp,
                            })
                            .collect(),
                        recovery_enabled,
                    }),
                    ..ActionConfig::default()
                };
                social_form(&mut config, social);
                config
            }),
        (
            priority.clone(),
            resource_id(),
            prop::option::of("[a-z:]{1,10}"),
            prop::option::of(any::<bool>()),
            password_only_conditions(),
            prop::option::of(resource_id()),
            any::<bool>(),
        )
            .prop_map(|(priority, idp, acr_values, pass_user_context, conditions, population, confirm)| {
                ActionConfig {
                    priority,
                    conditions: Some(conditions),
                    registration_local_population_id: population,
                    registration_confirm_user_attributes: confirm,
                    identity_provider: Some(IdentityProviderConfig {
                        identity_provider_id: idp,
                        acr_values,
                        pass_user_context,
                    }),
                    ..ActionConfig::default()
                }
            }),
        (
            priority.clone(),
            any::<bool>(),
            prop::option::of(prop::collection::vec((resource_id(), resource_id()), 0 .. 3)),
            form_conditions(),
            social_attributes(),
        )
            .prop_map(|(priority, recovery_enabled, gateways, conditions, social)| {
                let mut config = ActionConfig {
                    priority,
                    conditions: Some(conditions),
                    login: Some(LoginConfig {
                        recovery_enabled,
                        new_user_provisioning: gateways.map(|gateways| NewUserProvisioningConfig {
                            gateway: gateways
                                .into_iter()
                                .map(|(id, user_type_id)| GatewayConfig {
                                    id,
                                    gateway_type: "LDAP".to_string(),
                                    user_type_id,
                                })
                                .collect(),
                        }),
                    }),
                    ..ActionConfig::default()
                };
                social_form(&mut config, social);
                config
            }),
        (
            priority.clone(),
            prop::option::of(resource_id()),
            prop_oneof![Just(NoDeviceMode::Block), Just(NoDeviceMode::Bypass)],
            mfa_conditions(),
        )
            .prop_map(|(priority, device_sign_on_policy_id, no_device_mode, conditions)| ActionConfig {
                priority,
                conditions: Some(conditions),
                mfa: Some(MfaConfig {
                    device_sign_on_policy_id,
                    no_device_mode,
                }),
                ..ActionConfig::default()
            }),
        (
            priority.clone(),
            prop::collection::btree_set(("[a-z]{1,8}", any::<bool>()), 1 .. 4),
            any::<bool>(),
            0u32 .. 10_000_000,
            "[A-Za-z][A-Za-z ]{0,10}",
        )
            .prop_map(|(priority, attributes, prevent, interval, prompt_text)| ActionConfig {
                priority,
                progressive_profiling: Some(ProgressiveProfilingConfig {
                    attribute: attributes
                        .into_iter()
                        .map(|(name, required)| ProfileAttributeConfig {
                            name,
                            required,
                        })
                        .collect(),
                    prevent_multiple_prompts_per_flow: prevent,
                    prompt_interval_seconds: interval,
                    prompt_text,
                }),
                ..ActionConfig::default()
            }),
        priority.clone().prop_map(|priority| ActionConfig {
            priority,
            pingid: Some(PingIdConfig {}),
            ..ActionConfig::default()
        }),
        (priority, "[a-z]{1,8}", any::<bool>()).prop_map(|(priority, name, offline)| ActionConfig {
            priority,
            pingid_windows_login_passwordless: Some(PingIdWindowsLoginPasswordlessConfig {
                unique_user_attribute_name: name,
                offline_mode_enabled: offline,
            }),
            ..ActionConfig::default()
        }),
    ]
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn is_member_shape(node: &ConditionNode) -> bool {
    match node {
        ConditionNode::Aggregate(_) => true,
        ConditionNode::Not(inner) => {
            matches!(inner.as_ref(), ConditionNode::Aggregate(ConditionLeaf::IpRange { .. }))
        }
        ConditionNode::Or(_) | ConditionNode::And(_) => false,
    }
}

fn is_flat_shape(node: &ConditionNode) -> bool {
    match node {
        ConditionNode::Or(members) => members.len() > 1 && members.iter().all(is_member_shape),
        other => is_member_shape(other),
    }
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn expand_then_flatten_is_identity(config in action_config()) {
        let expanded = expand_action(&config).unwrap();
        prop_assert_eq!(expanded.action.priority, config.priority);
        if let Some(node) = &expanded.action.condition {
            prop_assert!(is_flat_shape(node));
        }

        let json = serde_json::to_value(&expanded.action).unwrap();
        let decoded: SignOnPolicyAction = serde_json::from_value(json).unwrap();
        prop_assert_eq!(&decoded, &expanded.action);

        let flattened = flatten_action(&decoded).unwrap();
        prop_assert_eq!(flattened, config.normalized());
    }

    #[test]
    fn set_valued_conditions_survive_without_loss(
        populations in id_set(),
        attributes in attribute_entries(),
    ) {
        let config = ActionConfig {
            priority: 5,
            conditions: Some(ConditionsConfig {
                user_is_member_of_any_population_id: populations.clone(),
                user_attribute_equals: attributes.clone(),
                ..ConditionsConfig::default()
            }),
            mfa: Some(MfaConfig::default()),
            ..ActionConfig::default()
        };
        let expanded = expand_action(&config).unwrap();
        let flattened = flatten_action(&expanded.action).unwrap();
        let conditions = flattened.conditions.unwrap_or_default();
        prop_assert_eq!(conditions.user_is_member_of_any_population_id, populations);
        prop_assert_eq!(conditions.user_attribute_equals, attributes);
    }
}
