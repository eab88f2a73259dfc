// crates/signon-core/src/wire.rs
// ============================================================================
// Module: Sign-On Policy Action Wire Model
// Description: Serde types for the remote action representation.
// Purpose: Mirror the management API JSON exactly, including conditions.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`SignOnPolicyAction`] is a JSON object discriminated by its `type`
//! field. Its optional `condition` is a recursive union of `and`, `or`, `not`
//! and typed leaves; the union has no tag, so [`ConditionNode`] is decoded
//! through a permissive intermediate record and rejected unless exactly one
//! known shape matches.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::identifiers::ActionId;

// ============================================================================
// SECTION: Reference Vocabulary
// ============================================================================

/// Time of the last password sign-on in the current session.
pub const PASSWORD_SIGN_ON_AT_REF: &str = "${session.lastSignOn.withAuthenticator.pwd.at}";
/// Time of the last MFA sign-on in the current session.
pub const MFA_SIGN_ON_AT_REF: &str = "${session.lastSignOn.withAuthenticator.mfa.at}";
/// Remote IP of the current request.
pub const REMOTE_IP_REF: &str = "${flow.request.http.remoteIp}";
/// Remote IP of the user's previous sign-on.
pub const LAST_SIGN_ON_IP_REF: &str = "${user.lastSignOn.remoteIp}";
/// Time of the user's previous sign-on.
pub const LAST_SIGN_ON_AT_REF: &str = "${user.lastSignOn.at}";
/// Population of the user.
pub const POPULATION_REF: &str = "${user.population.id}";
/// Identifier typed on the identifier-first form.
pub const IDENTIFIER_REF: &str = "${identifier}";
/// Lower bound of the high-risk IP reputation band.
pub const IP_RISK_HIGH_MIN: u32 = 80;
/// Upper bound of the high-risk IP reputation band.
pub const IP_RISK_HIGH_MAX: u32 = 100;

// ============================================================================
// SECTION: Action
// ============================================================================

/// Remote sign-on policy action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOnPolicyAction {
    /// Remote-assigned identifier; absent on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ActionId>,
    /// Evaluation order within the policy, starting at 1.
    pub priority: u32,
    /// Optional gating condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionNode>,
    /// Variant arm, selected by the `type` discriminator.
    #[serde(flatten)]
    pub kind: ActionKind,
}

/// Variant arms of a remote action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActionKind {
    /// Terms-of-use acceptance.
    #[serde(rename = "AGREEMENT")]
    Agreement(AgreementAction),
    /// Identifier-first discovery.
    #[serde(rename = "IDENTIFIER_FIRST")]
    IdentifierFirst(IdentifierFirstAction),
    /// Federated sign-on through an external identity provider.
    #[serde(rename = "IDENTITY_PROVIDER")]
    IdentityProvider(IdentityProviderAction),
    /// Username/password login.
    #[serde(rename = "LOGIN")]
    Login(LoginAction),
    /// Multi-factor authentication.
    #[serde(rename = "MULTI_FACTOR_AUTHENTICATION")]
    Mfa(MfaAction),
    /// Progressive profile collection.
    #[serde(rename = "PROGRESSIVE_PROFILING")]
    ProgressiveProfiling(ProgressiveProfilingAction),
    /// `PingID` authentication (workforce).
    #[serde(rename = "PINGID_AUTHENTICATION")]
    PingId(PingIdAction),
    /// `PingID` Windows login passwordless authentication (workforce).
    #[serde(rename = "PINGID_WINLOGIN_PASSWORDLESS_AUTHENTICATION")]
    PingIdWinLoginPasswordless(PingIdWinLoginPasswordlessAction),
}

// ============================================================================
// SECTION: Shared Fragments
// ============================================================================

/// Reference to another remote resource by id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Referenced resource id.
    pub id: String,
}

impl ResourceRef {
    /// Creates a reference to `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
        }
    }
}

/// Enabled toggle object (`{"enabled": bool}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggle {
    /// Whether the feature is enabled.
    pub enabled: bool,
}

/// External registration link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    /// Target URL.
    pub href: String,
}

/// Self-registration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// True for local registration into a population, false for external.
    pub enabled: bool,
    /// External registration link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalLink>,
    /// Population receiving locally registered users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<ResourceRef>,
    /// Whether users confirm attributes supplied by an external provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_identity_provider_attributes: Option<bool>,
}

/// Registration and social sign-on settings shared by identifier-first and
/// login actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialSignOn {
    /// Registration settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<Registration>,
    /// Social identity providers offered on the form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_providers: Option<Vec<ResourceRef>>,
    /// Whether lockout applies to identity provider sign-ons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_lockout_for_identity_providers: Option<bool>,
    /// Whether users confirm attributes supplied by identity providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_identity_provider_attributes: Option<bool>,
}

// ============================================================================
// SECTION: Variant Arms
// ============================================================================

/// `AGREEMENT` arm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementAction {
    /// Agreement to present.
    pub agreement: ResourceRef,
    /// Whether the decline button is hidden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_decline_option: Option<bool>,
}

/// Identifier-first discovery rule condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryCondition {
    /// Text the identifier must contain.
    pub contains: String,
    /// Reference the text is matched against.
    pub value: String,
}

/// Identifier-first discovery rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryRule {
    /// Matching condition.
    pub condition: DiscoveryCondition,
    /// Identity provider users are routed to on a match.
    pub identity_provider: ResourceRef,
}

/// `IDENTIFIER_FIRST` arm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierFirstAction {
    /// Discovery rules in evaluation order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_rules: Option<Vec<DiscoveryRule>>,
    /// Account recovery toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery: Option<Toggle>,
    /// Registration and social sign-on settings.
    #[serde(flatten)]
    pub sign_on: SocialSignOn,
}

/// `IDENTITY_PROVIDER` arm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProviderAction {
    /// Identity provider to federate with.
    pub identity_provider: ResourceRef,
    /// Requested authentication context class references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acr_values: Option<String>,
    /// Whether user context is passed to the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_user_context: Option<bool>,
    /// Registration settings for federated users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<Registration>,
}

/// Gateway used to provision new users on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningGateway {
    /// Gateway id.
    pub id: String,
    /// Gateway type, e.g. `LDAP`.
    #[serde(rename = "type")]
    pub gateway_type: String,
    /// Gateway user type.
    pub user_type: ResourceRef,
}

/// New user provisioning settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUserProvisioning {
    /// Gateways consulted in order.
    pub gateways: Vec<ProvisioningGateway>,
}

/// `LOGIN` arm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginAction {
    /// Account recovery toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery: Option<Toggle>,
    /// New user provisioning settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_user_provisioning: Option<NewUserProvisioning>,
    /// Registration and social sign-on settings.
    #[serde(flatten)]
    pub sign_on: SocialSignOn,
}

/// Behaviour when a user has no usable MFA device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoDeviceMode {
    /// Reject the sign-on.
    #[default]
    Block,
    /// Skip the MFA step.
    Bypass,
}

impl NoDeviceMode {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Block => "BLOCK",
            Self::Bypass => "BYPASS",
        }
    }
}

/// `MULTI_FACTOR_AUTHENTICATION` arm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaAction {
    /// Device authentication policy to apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_authentication_policy: Option<ResourceRef>,
    /// Behaviour without a usable device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_device_mode: Option<NoDeviceMode>,
}

/// Attribute collected by progressive profiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAttribute {
    /// User attribute name.
    pub name: String,
    /// Whether the user must supply it.
    pub required: bool,
}

/// `PROGRESSIVE_PROFILING` arm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressiveProfilingAction {
    /// Attributes to collect.
    pub attributes: Vec<ProfileAttribute>,
    /// Whether the prompt is shown at most once per flow.
    pub prevent_multiple_prompts_per_flow: bool,
    /// Minimum interval between prompts.
    pub prompt_interval_seconds: u32,
    /// Prompt text shown to the user.
    pub prompt_text: String,
}

/// `PINGID_AUTHENTICATION` arm; carries no attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingIdAction {}

/// Named user attribute reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedAttribute {
    /// Attribute name.
    pub name: String,
}

/// `PINGID_WINLOGIN_PASSWORDLESS_AUTHENTICATION` arm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingIdWinLoginPasswordlessAction {
    /// Attribute uniquely identifying the Windows user.
    pub unique_user_attribute: NamedAttribute,
    /// Offline mode toggle.
    pub offline_mode: Toggle,
}

// ============================================================================
// SECTION: Condition Tree
// ============================================================================

/// Value compared by an equality leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EqualsValue {
    /// Boolean comparison.
    Bool(bool),
    /// String comparison.
    Text(String),
}

/// Origin of a geovelocity comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeovelocityOrigin {
    /// Reference to the previous remote IP.
    pub ip: String,
    /// Reference to the previous sign-on time.
    pub at: String,
}

/// Risk band of an IP reputation leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRiskBand {
    /// Inclusive lower bound.
    pub min: u32,
    /// Inclusive upper bound.
    pub max: u32,
}

/// Typed condition leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionLeaf {
    /// True when more than `greater` seconds passed since `seconds_since`.
    Greater {
        /// Time reference.
        seconds_since: String,
        /// Threshold in seconds.
        greater: u64,
    },
    /// True when `contains` lies in one of the CIDR ranges.
    IpRange {
        /// IP reference.
        contains: String,
        /// CIDR ranges.
        ip_range: Vec<String>,
    },
    /// True when the reputation of `valid` falls inside `band`.
    IpRisk {
        /// IP reference.
        valid: String,
        /// Reputation band.
        band: IpRiskBand,
    },
    /// True when travel from `valid_from` to `value` is implausible.
    Geovelocity {
        /// Current IP reference.
        value: String,
        /// Previous sign-on origin.
        valid_from: GeovelocityOrigin,
    },
    /// True when `valid` is an anonymous network outside `allowed`.
    AnonymousNetwork {
        /// IP reference.
        valid: String,
        /// Allowed CIDR ranges.
        allowed: Vec<String>,
    },
    /// True when `value` equals `equals`.
    Equals {
        /// Attribute reference.
        value: String,
        /// Expected value.
        equals: EqualsValue,
    },
}

/// Recursive action condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCondition", into = "RawCondition")]
pub enum ConditionNode {
    /// Conjunction.
    And(Vec<ConditionNode>),
    /// Disjunction.
    Or(Vec<ConditionNode>),
    /// Negation.
    Not(Box<ConditionNode>),
    /// Typed leaf.
    Aggregate(ConditionLeaf),
}

/// Condition object that matches no known shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized condition shape: {0}")]
pub struct ConditionShapeError(
    /// What failed to match.
    String,
);

/// Untagged condition record; every known key is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCondition {
    /// Conjunction members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    and: Option<Vec<RawCondition>>,
    /// Disjunction members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    or: Option<Vec<RawCondition>>,
    /// Negated member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    not: Option<Box<RawCondition>>,
    /// Greater leaf time reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seconds_since: Option<String>,
    /// Greater leaf threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    greater: Option<u64>,
    /// IP range leaf ranges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ip_range: Option<Vec<String>>,
    /// IP range leaf reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contains: Option<String>,
    /// IP risk leaf band.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ip_risk: Option<IpRiskBand>,
    /// IP risk and anonymous network reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    valid: Option<String>,
    /// Geovelocity and equality reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    /// Geovelocity origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    valid_from: Option<GeovelocityOrigin>,
    /// Anonymous network allow-list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    anonymous_network: Option<Vec<String>>,
    /// Equality expected value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    equals: Option<EqualsValue>,
}

impl RawCondition {
    /// Names of the discriminating keys present on the record.
    fn markers(&self) -> Vec<&'static str> {
        [
            ("and", self.and.is_some()),
            ("or", self.or.is_some()),
            ("not", self.not.is_some()),
            ("greater", self.greater.is_some()),
            ("ipRange", self.ip_range.is_some()),
            ("ipRisk", self.ip_risk.is_some()),
            ("validFrom", self.valid_from.is_some()),
            ("anonymousNetwork", self.anonymous_network.is_some()),
            ("equals", self.equals.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }

    /// Names of the companion keys present on the record.
    fn companions(&self) -> Vec<&'static str> {
        [
            ("secondsSince", self.seconds_since.is_some()),
            ("contains", self.contains.is_some()),
            ("valid", self.valid.is_some()),
            ("value", self.value.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

/// Takes the companion reference required by `marker`, rejecting strays.
fn companion(
    raw: &RawCondition,
    marker: &str,
    key: &'static str,
    value: Option<String>,
) -> Result<String, ConditionShapeError> {
    let companions = raw.companions();
    if companions.len() > 1 || companions.first().is_some_and(|name| *name != key) {
        return Err(ConditionShapeError(format!(
            "`{marker}` leaf carries unexpected keys {companions:?}"
        )));
    }
    value.ok_or_else(|| ConditionShapeError(format!("`{marker}` leaf is missing `{key}`")))
}

impl TryFrom<RawCondition> for ConditionNode {
    type Error = ConditionShapeError;

    fn try_from(raw: RawCondition) -> Result<Self, Self::Error> {
        let markers = raw.markers();
        let marker = match markers.as_slice() {
            [marker] => *marker,
            [] => return Err(ConditionShapeError("no recognized condition key".to_string())),
            many => {
                return Err(ConditionShapeError(format!("ambiguous condition keys {many:?}")));
            }
        };
        let aggregate = matches!(marker, "and" | "or" | "not");
        if aggregate && !raw.companions().is_empty() {
            return Err(ConditionShapeError(format!(
                "`{marker}` node carries leaf keys {:?}",
                raw.companions()
            )));
        }
        let node = match marker {
            "and" => Self::And(convert_members(raw.and.unwrap_or_default())?),
            "or" => Self::Or(convert_members(raw.or.unwrap_or_default())?),
            "not" => {
                let inner = raw
                    .not
                    .ok_or_else(|| ConditionShapeError("`not` node is empty".to_string()))?;
                Self::Not(Box::new(Self::try_from(*inner)?))
            }
            "greater" => {
                let greater = raw.greater.unwrap_or_default();
                let seconds_since =
                    companion(&raw, marker, "secondsSince", raw.seconds_since.clone())?;
                Self::Aggregate(ConditionLeaf::Greater {
                    seconds_since,
                    greater,
                })
            }
            "ipRange" => {
                let contains = companion(&raw, marker, "contains", raw.contains.clone())?;
                Self::Aggregate(ConditionLeaf::IpRange {
                    contains,
                    ip_range: raw.ip_range.unwrap_or_default(),
                })
            }
            "ipRisk" => {
                let valid = companion(&raw, marker, "valid", raw.valid.clone())?;
                let band = raw.ip_risk.ok_or_else(|| {
                    ConditionShapeError("`ipRisk` leaf is missing its band".to_string())
                })?;
                Self::Aggregate(ConditionLeaf::IpRisk {
                    valid,
                    band,
                })
            }
            "validFrom" => {
                let value = companion(&raw, marker, "value", raw.value.clone())?;
                let valid_from = raw.valid_from.ok_or_else(|| {
                    ConditionShapeError("`validFrom` leaf is missing its origin".to_string())
                })?;
                Self::Aggregate(ConditionLeaf::Geovelocity {
                    value,
                    valid_from,
                })
            }
            "anonymousNetwork" => {
                let valid = companion(&raw, marker, "valid", raw.valid.clone())?;
                Self::Aggregate(ConditionLeaf::AnonymousNetwork {
                    valid,
                    allowed: raw.anonymous_network.unwrap_or_default(),
                })
            }
            _ => {
                let value = companion(&raw, marker, "value", raw.value.clone())?;
                let equals = raw.equals.ok_or_else(|| {
                    ConditionShapeError("`equals` leaf is missing its value".to_string())
                })?;
                Self::Aggregate(ConditionLeaf::Equals {
                    value,
                    equals,
                })
            }
        };
        Ok(node)
    }
}

/// Converts aggregate members, failing on the first bad member.
fn convert_members(members: Vec<RawCondition>) -> Result<Vec<ConditionNode>, ConditionShapeError> {
    members.into_iter().map(ConditionNode::try_from).collect()
}

impl From<ConditionNode> for RawCondition {
    fn from(node: ConditionNode) -> Self {
        match node {
            ConditionNode::And(members) => Self {
                and: Some(members.into_iter().map(Self::from).collect()),
                ..Self::default()
            },
            ConditionNode::Or(members) => Self {
                or: Some(members.into_iter().map(Self::from).collect()),
                ..Self::default()
            },
            ConditionNode::Not(inner) => Self {
                not: Some(Box::new(Self::from(*inner))),
                ..Self::default()
            },
            ConditionNode::Aggregate(leaf) => Self::from(leaf),
        }
    }
}

impl From<ConditionLeaf> for RawCondition {
    fn from(leaf: ConditionLeaf) -> Self {
        match leaf {
            ConditionLeaf::Greater {
                seconds_since,
                greater,
            } => Self {
                seconds_since: Some(seconds_since),
                greater: Some(greater),
                ..Self::default()
            },
            ConditionLeaf::IpRange {
                contains,
                ip_range,
            } => Self {
                ip_range: Some(ip_range),
                contains: Some(contains),
                ..Self::default()
            },
            ConditionLeaf::IpRisk {
                valid,
                band,
            } => Self {
                ip_risk: Some(band),
                valid: Some(valid),
                ..Self::default()
            },
            ConditionLeaf::Geovelocity {
                value,
                valid_from,
            } => Self {
                value: Some(value),
                valid_from: Some(valid_from),
                ..Self::default()
            },
            ConditionLeaf::AnonymousNetwork {
                valid,
                allowed,
            } => Self {
                anonymous_network: Some(allowed),
                valid: Some(valid),
                ..Self::default()
            },
            ConditionLeaf::Equals {
                value,
                equals,
            } => Self {
                value: Some(value),
                equals: Some(equals),
                ..Self::default()
            },
        }
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

    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_login_action_with_flattened_sign_on_fields() {
        let action: SignOnPolicyAction = serde_json::from_value(json!({
            "id": "a1",
            "type": "LOGIN",
            "priority": 2,
            "recovery": { "enabled": true },
            "socialProviders": [{ "id": "idpA" }],
            "enforceLockoutForIdentityProviders": true,
            "environment": { "id": "env1" }
        }))
        .unwrap();
        let ActionKind::Login(login) = action.kind else {
            panic!("expected login arm");
        };
        assert_eq!(action.priority, 2);
        assert_eq!(login.sign_on.social_providers, Some(vec![ResourceRef::new("idpA")]));
        assert_eq!(login.sign_on.enforce_lockout_for_identity_providers, Some(true));
    }

    #[test]
    fn encodes_type_discriminator() {
        let action = SignOnPolicyAction {
            id: None,
            priority: 1,
            condition: None,
            kind: ActionKind::PingId(PingIdAction {}),
        };
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value, json!({ "priority": 1, "type": "PINGID_AUTHENTICATION" }));
    }

    #[test]
    fn decodes_each_leaf_shape() {
        let node: ConditionNode = serde_json::from_value(json!({
            "or": [
                { "secondsSince": PASSWORD_SIGN_ON_AT_REF, "greater": 60 },
                { "not": { "ipRange": ["10.0.0.0/8"], "contains": REMOTE_IP_REF } },
                { "ipRisk": { "min": 80, "max": 100 }, "valid": REMOTE_IP_REF },
                { "value": REMOTE_IP_REF, "validFrom": { "ip": LAST_SIGN_ON_IP_REF, "at": LAST_SIGN_ON_AT_REF } },
                { "anonymousNetwork": [], "valid": REMOTE_IP_REF },
                { "value": "${user.lifecycle.status}", "equals": true }
            ]
        }))
        .unwrap();
        let ConditionNode::Or(members) = &node else {
            panic!("expected OR");
        };
        assert_eq!(members.len(), 6);
        assert!(matches!(
            members[5],
            ConditionNode::Aggregate(ConditionLeaf::Equals {
                equals: EqualsValue::Bool(true),
                ..
            })
        ));
        let encoded = serde_json::to_value(&node).unwrap();
        let decoded: ConditionNode = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn rejects_ambiguous_and_unknown_shapes() {
        let ambiguous = serde_json::from_value::<ConditionNode>(json!({
            "or": [], "and": []
        }));
        assert!(ambiguous.is_err());
        let unknown = serde_json::from_value::<ConditionNode>(json!({ "xor": [] }));
        assert!(unknown.is_err());
        let stray = serde_json::from_value::<ConditionNode>(json!({
            "secondsSince": PASSWORD_SIGN_ON_AT_REF, "greater": 60, "valid": REMOTE_IP_REF
        }));
        assert!(stray.is_err());
    }
}
