// crates/signon-core/src/model.rs
// ============================================================================
// Module: Declarative Action Model
// Description: Flat, user-authored form of a sign-on policy action.
// Purpose: Define the host-facing action record and its typed projection.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`ActionConfig`] is the flat record users author: a priority, exactly one
//! variant block, the cross-variant registration and social sign-on
//! attributes, and an optional [`ConditionsConfig`]. The dispatcher projects
//! it into a [`TypedAction`] whose [`ActionVariant`] makes the one-variant
//! rule structural before the codecs run.
//!
//! Defaults mirror the remote platform: decline shown, login recovery on,
//! `BLOCK` without an MFA device, one profiling prompt per flow every 90 days.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

pub use crate::wire::NoDeviceMode;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default progressive profiling prompt interval (90 days).
pub const DEFAULT_PROMPT_INTERVAL_SECONDS: u32 = 7_776_000;

/// Serde default for flags that are on unless disabled.
const fn default_true() -> bool {
    true
}

/// Serde default for `prompt_interval_seconds`.
const fn default_prompt_interval() -> u32 {
    DEFAULT_PROMPT_INTERVAL_SECONDS
}

// ============================================================================
// SECTION: Variant Kinds
// ============================================================================

/// Discriminator of the eight action variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    /// `agreement` block.
    Agreement,
    /// `identifier_first` block.
    IdentifierFirst,
    /// `identity_provider` block.
    IdentityProvider,
    /// `login` block.
    Login,
    /// `mfa` block.
    Mfa,
    /// `progressive_profiling` block.
    ProgressiveProfiling,
    /// `pingid` block.
    #[serde(rename = "pingid")]
    PingId,
    /// `pingid_windows_login_passwordless` block.
    #[serde(rename = "pingid_windows_login_passwordless")]
    PingIdWindowsLoginPasswordless,
}

impl VariantKind {
    /// All variants in block declaration order.
    pub const ALL: [Self; 8] = [
        Self::Agreement,
        Self::IdentifierFirst,
        Self::IdentityProvider,
        Self::Login,
        Self::Mfa,
        Self::ProgressiveProfiling,
        Self::PingId,
        Self::PingIdWindowsLoginPasswordless,
    ];

    /// Returns the declarative block name.
    #[must_use]
    pub const fn block_name(self) -> &'static str {
        match self {
            Self::Agreement => "agreement",
            Self::IdentifierFirst => "identifier_first",
            Self::IdentityProvider => "identity_provider",
            Self::Login => "login",
            Self::Mfa => "mfa",
            Self::ProgressiveProfiling => "progressive_profiling",
            Self::PingId => "pingid",
            Self::PingIdWindowsLoginPasswordless => "pingid_windows_login_passwordless",
        }
    }

    /// Returns the remote `type` discriminator.
    #[must_use]
    pub const fn wire_type(self) -> &'static str {
        match self {
            Self::Agreement => "AGREEMENT",
            Self::IdentifierFirst => "IDENTIFIER_FIRST",
            Self::IdentityProvider => "IDENTITY_PROVIDER",
            Self::Login => "LOGIN",
            Self::Mfa => "MULTI_FACTOR_AUTHENTICATION",
            Self::ProgressiveProfiling => "PROGRESSIVE_PROFILING",
            Self::PingId => "PINGID_AUTHENTICATION",
            Self::PingIdWindowsLoginPasswordless => "PINGID_WINLOGIN_PASSWORDLESS_AUTHENTICATION",
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.block_name())
    }
}

// ============================================================================
// SECTION: Variant Blocks
// ============================================================================

/// `agreement` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementConfig {
    /// Agreement to present.
    pub agreement_id: String,
    /// Whether users may decline.
    #[serde(default = "default_true")]
    pub show_decline_option: bool,
}

/// Identifier-first discovery rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRuleConfig {
    /// Text the typed identifier must contain.
    pub attribute_contains_text: String,
    /// Identity provider matched users are sent to.
    pub identity_provider_id: String,
}

/// `identifier_first` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierFirstConfig {
    /// Discovery rules in evaluation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discovery_rule: Vec<DiscoveryRuleConfig>,
    /// Account recovery; the remote default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_enabled: Option<bool>,
}

/// `identity_provider` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProviderConfig {
    /// Identity provider to federate with.
    pub identity_provider_id: String,
    /// Requested ACR values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acr_values: Option<String>,
    /// Whether user context is passed to the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_user_context: Option<bool>,
}

/// Login provisioning gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway id.
    pub id: String,
    /// Gateway type; the remote accepts `LDAP` only.
    #[serde(rename = "type")]
    pub gateway_type: String,
    /// Gateway user type id.
    pub user_type_id: String,
}

/// `login.new_user_provisioning` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUserProvisioningConfig {
    /// Gateways consulted in order.
    #[serde(default)]
    pub gateway: Vec<GatewayConfig>,
}

/// `login` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginConfig {
    /// Account recovery.
    #[serde(default = "default_true")]
    pub recovery_enabled: bool,
    /// New user provisioning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_user_provisioning: Option<NewUserProvisioningConfig>,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            recovery_enabled: true,
            new_user_provisioning: None,
        }
    }
}

/// `mfa` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MfaConfig {
    /// Device sign-on policy to apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_sign_on_policy_id: Option<String>,
    /// Behaviour without a usable device.
    #[serde(default)]
    pub no_device_mode: NoDeviceMode,
}

/// Attribute collected by progressive profiling.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileAttributeConfig {
    /// User attribute name.
    pub name: String,
    /// Whether the user must supply it.
    pub required: bool,
}

/// `progressive_profiling` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressiveProfilingConfig {
    /// Attributes to collect.
    pub attribute: BTreeSet<ProfileAttributeConfig>,
    /// Whether the prompt is shown at most once per flow.
    #[serde(default = "default_true")]
    pub prevent_multiple_prompts_per_flow: bool,
    /// Minimum interval between prompts.
    #[serde(default = "default_prompt_interval")]
    pub prompt_interval_seconds: u32,
    /// Prompt text.
    pub prompt_text: String,
}

/// `pingid` block; carries no attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingIdConfig {}

/// `pingid_windows_login_passwordless` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingIdWindowsLoginPasswordlessConfig {
    /// Attribute uniquely identifying the Windows user.
    pub unique_user_attribute_name: String,
    /// Whether offline mode is enabled.
    pub offline_mode_enabled: bool,
}

// ============================================================================
// SECTION: Conditions
// ============================================================================

/// Attribute equality condition entry.
///
/// # Invariants
/// - Exactly one of `value` / `value_boolean` is set (checked on expand).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserAttributeEquals {
    /// Reference of the form `${user.<path>}`.
    pub attribute_reference: String,
    /// String value to compare.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Boolean value to compare.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_boolean: Option<bool>,
}

/// Flat condition surface; any satisfied key triggers the action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionsConfig {
    /// Seconds since the last password sign-on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sign_on_older_than_seconds: Option<u64>,
    /// Seconds since the last MFA sign-on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sign_on_older_than_seconds_mfa: Option<u64>,
    /// Populations whose members trigger the action.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub user_is_member_of_any_population_id: BTreeSet<String>,
    /// Attribute equality entries.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub user_attribute_equals: BTreeSet<UserAttributeEquals>,
    /// CIDRs outside which the action triggers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_out_of_range_cidr: Vec<String>,
    /// Trigger on a high-risk IP reputation.
    #[serde(default)]
    pub ip_reputation_high_risk: bool,
    /// Trigger on a geovelocity anomaly.
    #[serde(default)]
    pub geovelocity_anomaly_detected: bool,
    /// Trigger on an anonymous network.
    #[serde(default)]
    pub anonymous_network_detected: bool,
    /// CIDRs exempt from anonymous network detection.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anonymous_network_detected_allowed_cidr: Vec<String>,
}

impl ConditionsConfig {
    /// Returns true when no key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_sign_on_older_than_seconds.is_none()
            && self.last_sign_on_older_than_seconds_mfa.is_none()
            && self.user_is_member_of_any_population_id.is_empty()
            && self.user_attribute_equals.is_empty()
            && self.ip_out_of_range_cidr.is_empty()
            && !self.ip_reputation_high_risk
            && !self.geovelocity_anomaly_detected
            && !self.anonymous_network_detected
            && self.anonymous_network_detected_allowed_cidr.is_empty()
    }
}

// ============================================================================
// SECTION: Action Record
// ============================================================================

/// Declarative sign-on policy action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Evaluation order within the policy, starting at 1.
    pub priority: u32,
    /// Optional condition surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<ConditionsConfig>,
    /// External registration link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_external_href: Option<String>,
    /// Population receiving locally registered users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_local_population_id: Option<String>,
    /// Whether registering users confirm provider-supplied attributes.
    #[serde(default)]
    pub registration_confirm_user_attributes: bool,
    /// Social identity providers offered on the form.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub social_provider_ids: BTreeSet<String>,
    /// Whether lockout applies to identity provider sign-ons.
    #[serde(default)]
    pub enforce_lockout_for_identity_providers: bool,
    /// Whether users confirm attributes supplied by identity providers.
    #[serde(default)]
    pub confirm_identity_provider_attributes: bool,
    /// `agreement` variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agreement: Option<AgreementConfig>,
    /// `identifier_first` variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier_first: Option<IdentifierFirstConfig>,
    /// `identity_provider` variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_provider: Option<IdentityProviderConfig>,
    /// `login` variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<LoginConfig>,
    /// `mfa` variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfa: Option<MfaConfig>,
    /// `progressive_profiling` variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progressive_profiling: Option<ProgressiveProfilingConfig>,
    /// `pingid` variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pingid: Option<PingIdConfig>,
    /// `pingid_windows_login_passwordless` variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pingid_windows_login_passwordless: Option<PingIdWindowsLoginPasswordlessConfig>,
}

impl ActionConfig {
    /// Returns the kinds of every variant block that is set.
    #[must_use]
    pub fn selected_variants(&self) -> Vec<VariantKind> {
        [
            (VariantKind::Agreement, self.agreement.is_some()),
            (VariantKind::IdentifierFirst, self.identifier_first.is_some()),
            (VariantKind::IdentityProvider, self.identity_provider.is_some()),
            (VariantKind::Login, self.login.is_some()),
            (VariantKind::Mfa, self.mfa.is_some()),
            (VariantKind::ProgressiveProfiling, self.progressive_profiling.is_some()),
            (VariantKind::PingId, self.pingid.is_some()),
            (VariantKind::PingIdWindowsLoginPasswordless, self.pingid_windows_login_passwordless.is_some()),
        ]
        .into_iter()
        .filter_map(|(kind, present)| present.then_some(kind))
        .collect()
    }

    /// Returns the record with every value expansion drops or defaults
    /// removed, i.e. the record a read-back is expected to reproduce.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut normalized = self.clone();
        let conditions_ignored = matches!(
            self.selected_variants().as_slice(),
            [VariantKind::Agreement | VariantKind::ProgressiveProfiling]
        );
        normalized.conditions = normalized.conditions.take().and_then(|mut conditions| {
            if !conditions.anonymous_network_detected {
                conditions.anonymous_network_detected_allowed_cidr.clear();
            }
            (!conditions_ignored && !conditions.is_empty()).then_some(conditions)
        });
        if normalized.registration_local_population_id.is_none() {
            normalized.registration_confirm_user_attributes = false;
        }
        if normalized.social_provider_ids.is_empty() {
            normalized.enforce_lockout_for_identity_providers = false;
            normalized.confirm_identity_provider_attributes = false;
        }
        if let Some(login) = normalized.login.as_mut()
            && login.new_user_provisioning.as_ref().is_some_and(|nup| nup.gateway.is_empty())
        {
            login.new_user_provisioning = None;
        }
        normalized
    }
}

// ============================================================================
// SECTION: Typed Projection
// ============================================================================

/// Exactly one selected variant with its block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionVariant {
    /// Agreement.
    Agreement(AgreementConfig),
    /// Identifier first.
    IdentifierFirst(IdentifierFirstConfig),
    /// Identity provider.
    IdentityProvider(IdentityProviderConfig),
    /// Login.
    Login(LoginConfig),
    /// Multi-factor authentication.
    Mfa(MfaConfig),
    /// Progressive profiling.
    ProgressiveProfiling(ProgressiveProfilingConfig),
    /// `PingID`.
    PingId(PingIdConfig),
    /// `PingID` Windows login passwordless.
    PingIdWindowsLoginPasswordless(PingIdWindowsLoginPasswordlessConfig),
}

impl ActionVariant {
    /// Returns the variant discriminator.
    #[must_use]
    pub const fn kind(&self) -> VariantKind {
        match self {
            Self::Agreement(_) => VariantKind::Agreement,
            Self::IdentifierFirst(_) => VariantKind::IdentifierFirst,
            Self::IdentityProvider(_) => VariantKind::IdentityProvider,
            Self::Login(_) => VariantKind::Login,
            Self::Mfa(_) => VariantKind::Mfa,
            Self::ProgressiveProfiling(_) => VariantKind::ProgressiveProfiling,
            Self::PingId(_) => VariantKind::PingId,
            Self::PingIdWindowsLoginPasswordless(_) => VariantKind::PingIdWindowsLoginPasswordless,
        }
    }
}

/// Registration and social sign-on attributes shared across variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossVariantAttributes {
    /// External registration link.
    pub registration_external_href: Option<String>,
    /// Population receiving locally registered users.
    pub registration_local_population_id: Option<String>,
    /// Whether registering users confirm provider-supplied attributes.
    pub registration_confirm_user_attributes: bool,
    /// Social identity providers.
    pub social_provider_ids: BTreeSet<String>,
    /// Whether lockout applies to identity provider sign-ons.
    pub enforce_lockout_for_identity_providers: bool,
    /// Whether users confirm identity provider attributes.
    pub confirm_identity_provider_attributes: bool,
}

/// Typed form of an [`ActionConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedAction {
    /// Evaluation order.
    pub priority: u32,
    /// Selected variant.
    pub variant: ActionVariant,
    /// Cross-variant attributes.
    pub cross: CrossVariantAttributes,
    /// Condition surface.
    pub conditions: Option<ConditionsConfig>,
}

impl TypedAction {
    /// Converts back into the flat record.
    #[must_use]
    pub fn into_config(self) -> ActionConfig {
        let mut config = ActionConfig {
            priority: self.priority,
            conditions: self.conditions,
            registration_external_href: self.cross.registration_external_href,
            registration_local_population_id: self.cross.registration_local_population_id,
            registration_confirm_user_attributes: self.cross.registration_confirm_user_attributes,
            social_provider_ids: self.cross.social_provider_ids,
            enforce_lockout_for_identity_providers: self.cross.enforce_lockout_for_identity_providers,
            confirm_identity_provider_attributes: self.cross.confirm_identity_provider_attributes,
            ..ActionConfig::default()
        };
        match self.variant {
            ActionVariant::Agreement(block) => config.agreement = Some(block),
            ActionVariant::IdentifierFirst(block) => config.identifier_first = Some(block),
            ActionVariant::IdentityProvider(block) => config.identity_provider = Some(block),
            ActionVariant::Login(block) => config.login = Some(block),
            ActionVariant::Mfa(block) => config.mfa = Some(block),
            ActionVariant::ProgressiveProfiling(block) => {
                config.progressive_profiling = Some(block);
            }
            ActionVariant::PingId(block) => config.pingid = Some(block),
            ActionVariant::PingIdWindowsLoginPasswordless(block) => {
                config.pingid_windows_login_passwordless = Some(block);
            }
        }
        config
    }
}
