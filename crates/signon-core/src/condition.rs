// crates/signon-core/src/condition.rs
// ============================================================================
// Module: Condition Codec
// Description: Flat condition surface <-> nested boolean condition tree.
// Purpose: Expand user conditions into remote trees and rebuild them exactly.
// Dependencies: crate::{model, wire, error, diagnostics}
// ============================================================================

//! ## Overview
//! The flat surface is a disjunction: any present key triggers the action.
//! Expansion emits one node per key in a fixed order and joins them under a
//! single top-level OR. Set-valued keys with several members contribute
//! their equality leaves directly to that OR, so every emitted tree is one
//! of:
//!
//! - a single aggregate leaf,
//! - a NOT over an IP range leaf,
//! - a top-level OR whose members are the two shapes above.
//!
//! Flattening accepts exactly those shapes. Anything else, including AND
//! nodes, nested ORs, unknown references and repeated single-valued leaves,
//! is reported as a [`StructureError`] naming the offending node path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::diagnostics::Diagnostics;
use crate::error::InputError;
use crate::error::StructureError;
use crate::model::ConditionsConfig;
use crate::model::UserAttributeEquals;
use crate::model::VariantKind;
use crate::wire::ConditionLeaf;
use crate::wire::ConditionNode;
use crate::wire::EqualsValue;
use crate::wire::GeovelocityOrigin;
use crate::wire::IP_RISK_HIGH_MAX;
use crate::wire::IP_RISK_HIGH_MIN;
use crate::wire::IpRiskBand;
use crate::wire::LAST_SIGN_ON_AT_REF;
use crate::wire::LAST_SIGN_ON_IP_REF;
use crate::wire::MFA_SIGN_ON_AT_REF;
use crate::wire::PASSWORD_SIGN_ON_AT_REF;
use crate::wire::POPULATION_REF;
use crate::wire::REMOTE_IP_REF;

// ============================================================================
// SECTION: Condition Keys
// ============================================================================

/// Keys of the flat condition surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKey {
    /// `last_sign_on_older_than_seconds`.
    LastSignOnOlderThanSeconds,
    /// `last_sign_on_older_than_seconds_mfa`.
    LastSignOnOlderThanSecondsMfa,
    /// `user_is_member_of_any_population_id`.
    UserIsMemberOfAnyPopulationId,
    /// `user_attribute_equals`.
    UserAttributeEquals,
    /// `ip_out_of_range_cidr`.
    IpOutOfRangeCidr,
    /// `ip_reputation_high_risk`.
    IpReputationHighRisk,
    /// `geovelocity_anomaly_detected`.
    GeovelocityAnomalyDetected,
    /// `anonymous_network_detected`.
    AnonymousNetworkDetected,
    /// `anonymous_network_detected_allowed_cidr`.
    AnonymousNetworkDetectedAllowedCidr,
}

impl ConditionKey {
    /// Returns the declarative key name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::LastSignOnOlderThanSeconds => "last_sign_on_older_than_seconds",
            Self::LastSignOnOlderThanSecondsMfa => "last_sign_on_older_than_seconds_mfa",
            Self::UserIsMemberOfAnyPopulationId => "user_is_member_of_any_population_id",
            Self::UserAttributeEquals => "user_attribute_equals",
            Self::IpOutOfRangeCidr => "ip_out_of_range_cidr",
            Self::IpReputationHighRisk => "ip_reputation_high_risk",
            Self::GeovelocityAnomalyDetected => "geovelocity_anomaly_detected",
            Self::AnonymousNetworkDetected => "anonymous_network_detected",
            Self::AnonymousNetworkDetectedAllowedCidr => "anonymous_network_detected_allowed_cidr",
        }
    }

    /// Returns true when the key may be set on `kind`.
    #[must_use]
    pub const fn applies_to(self, kind: VariantKind) -> bool {
        match self {
            Self::LastSignOnOlderThanSeconds => matches!(
                kind,
                VariantKind::IdentifierFirst
                    | VariantKind::IdentityProvider
                    | VariantKind::Login
                    | VariantKind::Mfa
            ),
            Self::UserIsMemberOfAnyPopulationId | Self::UserAttributeEquals => {
                matches!(kind, VariantKind::IdentifierFirst | VariantKind::Login | VariantKind::Mfa)
            }
            Self::LastSignOnOlderThanSecondsMfa
            | Self::IpOutOfRangeCidr
            | Self::IpReputationHighRisk
            | Self::GeovelocityAnomalyDetected
            | Self::AnonymousNetworkDetected
            | Self::AnonymousNetworkDetectedAllowedCidr => matches!(kind, VariantKind::Mfa),
        }
    }
}

/// Lists the keys set on `conditions`, in emission order.
fn present_keys(conditions: &ConditionsConfig) -> Vec<ConditionKey> {
    [
        (ConditionKey::LastSignOnOlderThanSeconds, conditions.last_sign_on_older_than_seconds.is_some()),
        (
            ConditionKey::LastSignOnOlderThanSecondsMfa,
            conditions.last_sign_on_older_than_seconds_mfa.is_some(),
        ),
        (ConditionKey::IpOutOfRangeCidr, !conditions.ip_out_of_range_cidr.is_empty()),
        (ConditionKey::IpReputationHighRisk, conditions.ip_reputation_high_risk),
        (ConditionKey::GeovelocityAnomalyDetected, conditions.geovelocity_anomaly_detected),
        (ConditionKey::AnonymousNetworkDetected, conditions.anonymous_network_detected),
        (
            ConditionKey::AnonymousNetworkDetectedAllowedCidr,
            !conditions.anonymous_network_detected_allowed_cidr.is_empty(),
        ),
        (
            ConditionKey::UserIsMemberOfAnyPopulationId,
            !conditions.user_is_member_of_any_population_id.is_empty(),
        ),
        (ConditionKey::UserAttributeEquals, !conditions.user_attribute_equals.is_empty()),
    ]
    .into_iter()
    .filter_map(|(key, present)| present.then_some(key))
    .collect()
}

// ============================================================================
// SECTION: Expansion
// ============================================================================

/// Variant and priority the conditions are expanded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionContext {
    /// Variant carrying the conditions.
    pub kind: VariantKind,
    /// Action priority.
    pub priority: u32,
}

/// Result of expanding a condition surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedCondition {
    /// Tree to send, absent when nothing applies.
    pub node: Option<ConditionNode>,
    /// Non-fatal findings.
    pub warnings: Diagnostics,
}

/// Expands the flat condition surface into a remote condition tree.
///
/// # Errors
///
/// Returns [`InputError`] when a key is not valid for the variant or
/// priority, when keys conflict, or when an equality entry is malformed.
pub fn expand_conditions(
    conditions: Option<&ConditionsConfig>,
    context: ConditionContext,
) -> Result<ExpandedCondition, InputError> {
    let mut expanded = ExpandedCondition::default();
    let Some(conditions) = conditions.filter(|conditions| !conditions.is_empty()) else {
        return Ok(expanded);
    };

    match context.kind {
        VariantKind::PingId | VariantKind::PingIdWindowsLoginPasswordless => {
            return Err(InputError::ConditionForbidden {
                variant: context.kind,
            });
        }
        VariantKind::Agreement | VariantKind::ProgressiveProfiling => {
            expanded.warnings.warn(format!(
                "Conditions have no effect on the `{}` action type and were not applied",
                context.kind
            ));
            return Ok(expanded);
        }
        _ => {}
    }

    if context.priority == 1 {
        if !conditions.user_is_member_of_any_population_id.is_empty() {
            return Err(InputError::InvalidAtPriorityOne {
                key: ConditionKey::UserIsMemberOfAnyPopulationId.name(),
            });
        }
        if !conditions.user_attribute_equals.is_empty() {
            return Err(InputError::InvalidAtPriorityOne {
                key: ConditionKey::UserAttributeEquals.name(),
            });
        }
    }

    if let Some(key) = present_keys(conditions).into_iter().find(|key| !key.applies_to(context.kind)) {
        return Err(InputError::ConditionNotApplicable {
            key: key.name(),
            variant: context.kind,
        });
    }
    if conditions.last_sign_on_older_than_seconds.is_some()
        && conditions.last_sign_on_older_than_seconds_mfa.is_some()
    {
        return Err(InputError::ConflictingConditions {
            first: ConditionKey::LastSignOnOlderThanSeconds.name(),
            second: ConditionKey::LastSignOnOlderThanSecondsMfa.name(),
        });
    }
    for entry in &conditions.user_attribute_equals {
        validate_attribute_equals(entry)?;
    }

    let mut nodes = Vec::new();
    if let Some(seconds) = conditions.last_sign_on_older_than_seconds {
        nodes.push(greater_node(PASSWORD_SIGN_ON_AT_REF, seconds));
    }
    if let Some(seconds) = conditions.last_sign_on_older_than_seconds_mfa {
        nodes.push(greater_node(MFA_SIGN_ON_AT_REF, seconds));
    }
    if !conditions.ip_out_of_range_cidr.is_empty() {
        nodes.push(ConditionNode::Not(Box::new(ConditionNode::Aggregate(ConditionLeaf::IpRange {
            contains: REMOTE_IP_REF.to_string(),
            ip_range: conditions.ip_out_of_range_cidr.clone(),
        }))));
    }
    if conditions.ip_reputation_high_risk {
        nodes.push(ConditionNode::Aggregate(ConditionLeaf::IpRisk {
            valid: REMOTE_IP_REF.to_string(),
            band: IpRiskBand {
                min: IP_RISK_HIGH_MIN,
                max: IP_RISK_HIGH_MAX,
            },
        }));
    }
    if conditions.geovelocity_anomaly_detected {
        nodes.push(ConditionNode::Aggregate(ConditionLeaf::Geovelocity {
            value: REMOTE_IP_REF.to_string(),
            valid_from: GeovelocityOrigin {
                ip: LAST_SIGN_ON_IP_REF.to_string(),
                at: LAST_SIGN_ON_AT_REF.to_string(),
            },
        }));
    }
    if conditions.anonymous_network_detected {
        nodes.push(ConditionNode::Aggregate(ConditionLeaf::AnonymousNetwork {
            valid: REMOTE_IP_REF.to_string(),
            allowed: conditions.anonymous_network_detected_allowed_cidr.clone(),
        }));
    } else if !conditions.anonymous_network_detected_allowed_cidr.is_empty() {
        expanded.warnings.warn(
            "`anonymous_network_detected_allowed_cidr` has no effect unless \
             `anonymous_network_detected` is true and was not applied",
        );
    }
    if let Some(node) = any_of(conditions.user_is_member_of_any_population_id.iter().map(|id| {
        equals_node(POPULATION_REF, EqualsValue::Text(id.clone()))
    })) {
        nodes.push(node);
    }
    if let Some(node) = any_of(conditions.user_attribute_equals.iter().map(|entry| {
        let equals = match (&entry.value, entry.value_boolean) {
            (Some(text), _) => EqualsValue::Text(text.clone()),
            (None, flag) => EqualsValue::Bool(flag.unwrap_or_default()),
        };
        equals_node(&entry.attribute_reference, equals)
    })) {
        nodes.push(node);
    }

    expanded.node = combine(nodes);
    Ok(expanded)
}

/// Builds a greater-than-seconds-since aggregate.
fn greater_node(reference: &str, seconds: u64) -> ConditionNode {
    ConditionNode::Aggregate(ConditionLeaf::Greater {
        seconds_since: reference.to_string(),
        greater: seconds,
    })
}

/// Builds an equality aggregate.
fn equals_node(reference: &str, equals: EqualsValue) -> ConditionNode {
    ConditionNode::Aggregate(ConditionLeaf::Equals {
        value: reference.to_string(),
        equals,
    })
}

/// Joins set members: one member stands alone, several form an OR.
fn any_of(members: impl Iterator<Item = ConditionNode>) -> Option<ConditionNode> {
    let mut members: Vec<ConditionNode> = members.collect();
    match members.len() {
        0 => None,
        1 => members.pop(),
        _ => Some(ConditionNode::Or(members)),
    }
}

/// Joins per-key nodes under a single top-level OR, splicing set ORs.
fn combine(nodes: Vec<ConditionNode>) -> Option<ConditionNode> {
    if nodes.len() <= 1 {
        return nodes.into_iter().next();
    }
    let members = nodes
        .into_iter()
        .flat_map(|node| match node {
            ConditionNode::Or(members) => members,
            other => vec![other],
        })
        .collect();
    Some(ConditionNode::Or(members))
}

/// Checks one attribute equality entry.
fn validate_attribute_equals(entry: &UserAttributeEquals) -> Result<(), InputError> {
    if entry.value.is_some() == entry.value_boolean.is_some() {
        return Err(InputError::AmbiguousEqualityValue {
            attribute_reference: entry.attribute_reference.clone(),
        });
    }
    if !is_user_attribute_reference(&entry.attribute_reference) {
        return Err(InputError::InvalidAttributeReference {
            attribute_reference: entry.attribute_reference.clone(),
        });
    }
    Ok(())
}

/// Returns true for references of the form `${user.<path>}`.
///
/// Path segments are non-empty runs of ASCII alphanumerics, `_` or `-`,
/// separated by single dots.
#[must_use]
pub fn is_user_attribute_reference(reference: &str) -> bool {
    let Some(path) = reference.strip_prefix("${user.").and_then(|rest| rest.strip_suffix('}'))
    else {
        return false;
    };
    path.split('.').all(|segment| {
        !segment.is_empty()
            && segment.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    })
}

// ============================================================================
// SECTION: Flattening
// ============================================================================

/// Rebuilds the flat condition surface from a remote tree.
///
/// # Errors
///
/// Returns [`StructureError`] when the tree contains a shape or reference
/// the flat surface cannot express.
pub fn flatten_condition(node: &ConditionNode) -> Result<ConditionsConfig, StructureError> {
    let mut accumulator = FlatAccumulator::default();
    match node {
        ConditionNode::Or(members) => {
            if members.is_empty() {
                return Err(StructureError::new("condition.or", "OR node has no members"));
            }
            for (index, member) in members.iter().enumerate() {
                accumulator.visit_member(member, &format!("condition.or[{index}]"))?;
            }
        }
        other => accumulator.visit_member(other, "condition")?,
    }
    Ok(accumulator.finish())
}

/// Write-once accumulator for the flat surface.
#[derive(Debug, Default)]
struct FlatAccumulator {
    /// Password last-sign-on threshold.
    password_threshold: Option<u64>,
    /// MFA last-sign-on threshold.
    mfa_threshold: Option<u64>,
    /// Out-of-range CIDRs.
    ip_out_of_range: Option<Vec<String>>,
    /// High-risk IP reputation switch.
    ip_risk: Option<bool>,
    /// Geovelocity switch.
    geovelocity: Option<bool>,
    /// Anonymous network allow-list.
    anonymous_network: Option<Vec<String>>,
    /// Population ids.
    populations: BTreeSet<String>,
    /// Attribute equality entries.
    attributes: BTreeSet<UserAttributeEquals>,
}

impl FlatAccumulator {
    /// Records one member of the top-level disjunction.
    fn visit_member(&mut self, node: &ConditionNode, path: &str) -> Result<(), StructureError> {
        match node {
            ConditionNode::Aggregate(leaf) => self.record_leaf(leaf, path),
            ConditionNode::Not(inner) => {
                let not_path = format!("{path}.not");
                match inner.as_ref() {
                    ConditionNode::Aggregate(ConditionLeaf::IpRange {
                        contains,
                        ip_range,
                    }) => {
                        expect_reference(contains, REMOTE_IP_REF, &not_path)?;
                        write_once(&mut self.ip_out_of_range, ip_range.clone(), &not_path, "IP range")
                    }
                    _ => Err(StructureError::new(not_path, "NOT may only wrap an IP range leaf")),
                }
            }
            ConditionNode::Or(_) => Err(StructureError::new(path, "nested OR nodes are not supported")),
            ConditionNode::And(_) => Err(StructureError::new(path, "AND nodes are not supported")),
        }
    }

    /// Records a non-negated leaf.
    fn record_leaf(&mut self, leaf: &ConditionLeaf, path: &str) -> Result<(), StructureError> {
        match leaf {
            ConditionLeaf::Greater {
                seconds_since,
                greater,
            } => match seconds_since.as_str() {
                PASSWORD_SIGN_ON_AT_REF => {
                    write_once(&mut self.password_threshold, *greater, path, "password last sign-on")
                }
                MFA_SIGN_ON_AT_REF => {
                    write_once(&mut self.mfa_threshold, *greater, path, "MFA last sign-on")
                }
                other => Err(StructureError::new(
                    path,
                    format!("unknown seconds-since reference `{other}`"),
                )),
            },
            ConditionLeaf::IpRange {
                ..
            } => Err(StructureError::new(path, "IP range leaf must be negated")),
            ConditionLeaf::IpRisk {
                valid,
                band,
            } => {
                expect_reference(valid, REMOTE_IP_REF, path)?;
                if band.min != IP_RISK_HIGH_MIN || band.max != IP_RISK_HIGH_MAX {
                    return Err(StructureError::new(
                        path,
                        format!("unsupported IP risk band {}..{}", band.min, band.max),
                    ));
                }
                write_once(&mut self.ip_risk, true, path, "IP risk")
            }
            ConditionLeaf::Geovelocity {
                value,
                valid_from,
            } => {
                expect_reference(value, REMOTE_IP_REF, path)?;
                expect_reference(&valid_from.ip, LAST_SIGN_ON_IP_REF, path)?;
                expect_reference(&valid_from.at, LAST_SIGN_ON_AT_REF, path)?;
                write_once(&mut self.geovelocity, true, path, "geovelocity")
            }
            ConditionLeaf::AnonymousNetwork {
                valid,
                allowed,
            } => {
                expect_reference(valid, REMOTE_IP_REF, path)?;
                write_once(&mut self.anonymous_network, allowed.clone(), path, "anonymous network")
            }
            ConditionLeaf::Equals {
                value,
                equals,
            } => self.record_equals(value, equals, path),
        }
    }

    /// Routes an equality leaf to the population or attribute set.
    fn record_equals(
        &mut self,
        reference: &str,
        equals: &EqualsValue,
        path: &str,
    ) -> Result<(), StructureError> {
        if reference == POPULATION_REF {
            let EqualsValue::Text(id) = equals else {
                return Err(StructureError::new(path, "population equality must compare a string"));
            };
            self.populations.insert(id.clone());
            return Ok(());
        }
        if !is_user_attribute_reference(reference) {
            return Err(StructureError::new(path, format!("unknown equality reference `{reference}`")));
        }
        let (value, value_boolean) = match equals {
            EqualsValue::Text(text) => (Some(text.clone()), None),
            EqualsValue::Bool(flag) => (None, Some(*flag)),
        };
        self.attributes.insert(UserAttributeEquals {
            attribute_reference: reference.to_string(),
            value,
            value_boolean,
        });
        Ok(())
    }

    /// Produces the flat surface.
    fn finish(self) -> ConditionsConfig {
        let anonymous_network_detected = self.anonymous_network.is_some();
        ConditionsConfig {
            last_sign_on_older_than_seconds: self.password_threshold,
            last_sign_on_older_than_seconds_mfa: self.mfa_threshold,
            user_is_member_of_any_population_id: self.populations,
            user_attribute_equals: self.attributes,
            ip_out_of_range_cidr: self.ip_out_of_range.unwrap_or_default(),
            ip_reputation_high_risk: self.ip_risk.unwrap_or_default(),
            geovelocity_anomaly_detected: self.geovelocity.unwrap_or_default(),
            anonymous_network_detected,
            anonymous_network_detected_allowed_cidr: self.anonymous_network.unwrap_or_default(),
        }
    }
}

/// Stores `value` in an empty slot; a second write is a structure error.
fn write_once<T>(
    slot: &mut Option<T>,
    value: T,
    path: &str,
    leaf: &str,
) -> Result<(), StructureError> {
    if slot.is_some() {
        return Err(StructureError::new(path, format!("duplicate {leaf} leaf")));
    }
    *slot = Some(value);
    Ok(())
}

/// Requires a leaf reference to be the fixed vocabulary entry.
fn expect_reference(actual: &str, expected: &str, path: &str) -> Result<(), StructureError> {
    if actual == expected {
        Ok(())
    } else {
        Err(StructureError::new(path, format!("expected reference `{expected}`, found `{actual}`")))
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

    fn mfa_context(priority: u32) -> ConditionContext {
        ConditionContext {
            kind: VariantKind::Mfa,
            priority,
        }
    }

    fn population(id: &str) -> ConditionNode {
        equals_node(POPULATION_REF, EqualsValue::Text(id.to_string()))
    }

    #[test]
    fn single_key_emits_bare_aggregate() {
        let conditions = ConditionsConfig {
            last_sign_on_older_than_seconds: Some(3600),
            ..ConditionsConfig::default()
        };
        let expanded = expand_conditions(Some(&conditions), mfa_context(2)).unwrap();
        assert_eq!(expanded.node, Some(greater_node(PASSWORD_SIGN_ON_AT_REF, 3600)));
        assert!(expanded.warnings.is_empty());
    }

    #[test]
    fn population_set_splices_into_top_level_or() {
        let conditions = ConditionsConfig {
            last_sign_on_older_than_seconds_mfa: Some(60),
            user_is_member_of_any_population_id: ["p1", "p2"].into_iter().map(String::from).collect(),
            ..ConditionsConfig::default()
        };
        let expanded = expand_conditions(Some(&conditions), mfa_context(2)).unwrap();
        assert_eq!(
            expanded.node,
            Some(ConditionNode::Or(vec![
                greater_node(MFA_SIGN_ON_AT_REF, 60),
                population("p1"),
                population("p2"),
            ]))
        );
    }

    #[test]
    fn lone_population_set_becomes_top_level_or() {
        let conditions = ConditionsConfig {
            user_is_member_of_any_population_id: ["p1", "p2"].into_iter().map(String::from).collect(),
            ..ConditionsConfig::default()
        };
        let expanded = expand_conditions(Some(&conditions), mfa_context(2)).unwrap();
        assert_eq!(expanded.node, Some(ConditionNode::Or(vec![population("p1"), population("p2")])));
        assert_eq!(flatten_condition(&expanded.node.unwrap()).unwrap(), conditions);
    }

    #[test]
    fn allow_list_without_detector_warns() {
        let conditions = ConditionsConfig {
            ip_reputation_high_risk: true,
            anonymous_network_detected_allowed_cidr: vec!["10.0.0.0/8".to_string()],
            ..ConditionsConfig::default()
        };
        let expanded = expand_conditions(Some(&conditions), mfa_context(2)).unwrap();
        assert_eq!(expanded.warnings.len(), 1);
        let flattened = flatten_condition(&expanded.node.unwrap()).unwrap();
        assert!(flattened.ip_reputation_high_risk);
        assert!(flattened.anonymous_network_detected_allowed_cidr.is_empty());
    }

    #[test]
    fn mfa_only_key_rejected_on_login() {
        let conditions = ConditionsConfig {
            geovelocity_anomaly_detected: true,
            ..ConditionsConfig::default()
        };
        let context = ConditionContext {
            kind: VariantKind::Login,
            priority: 2,
        };
        let err = expand_conditions(Some(&conditions), context).unwrap_err();
        assert_eq!(
            err,
            InputError::ConditionNotApplicable {
                key: "geovelocity_anomaly_detected",
                variant: VariantKind::Login,
            }
        );
    }

    #[test]
    fn both_last_sign_on_keys_conflict() {
        let conditions = ConditionsConfig {
            last_sign_on_older_than_seconds: Some(1),
            last_sign_on_older_than_seconds_mfa: Some(2),
            ..ConditionsConfig::default()
        };
        let err = expand_conditions(Some(&conditions), mfa_context(2)).unwrap_err();
        assert!(matches!(err, InputError::ConflictingConditions { .. }));
    }

    #[test]
    fn attribute_entry_requires_exactly_one_value() {
        let mut conditions = ConditionsConfig::default();
        conditions.user_attribute_equals.insert(UserAttributeEquals {
            attribute_reference: "${user.name.given}".to_string(),
            value: Some("Ada".to_string()),
            value_boolean: Some(true),
        });
        let err = expand_conditions(Some(&conditions), mfa_context(2)).unwrap_err();
        assert!(matches!(err, InputError::AmbiguousEqualityValue { .. }));
    }

    #[test]
    fn attribute_reference_format_checked() {
        assert!(is_user_attribute_reference("${user.name.given}"));
        assert!(is_user_attribute_reference("${user.custom_attr-1}"));
        assert!(!is_user_attribute_reference("${user.}"));
        assert!(!is_user_attribute_reference("${session.id}"));
        assert!(!is_user_attribute_reference("user.name"));
        assert!(!is_user_attribute_reference("${user.name..given}"));
    }

    #[test]
    fn flatten_rejects_and_with_path() {
        let node = ConditionNode::Or(vec![
            population("p1"),
            ConditionNode::And(vec![population("p2")]),
        ]);
        let err = flatten_condition(&node).unwrap_err();
        assert_eq!(err.path, "condition.or[1]");
    }

    #[test]
    fn flatten_rejects_negated_non_range_leaf() {
        let node = ConditionNode::Or(vec![
            population("p1"),
            population("p2"),
            ConditionNode::Not(Box::new(population("p3"))),
        ]);
        let err = flatten_condition(&node).unwrap_err();
        assert_eq!(err.path, "condition.or[2].not");
    }

    #[test]
    fn flatten_rejects_duplicate_single_valued_leaf() {
        let node = ConditionNode::Or(vec![
            greater_node(PASSWORD_SIGN_ON_AT_REF, 1),
            greater_node(PASSWORD_SIGN_ON_AT_REF, 2),
        ]);
        let err = flatten_condition(&node).unwrap_err();
        assert_eq!(err.path, "condition.or[1]");
        assert!(err.reason.contains("duplicate"));
    }

    #[test]
    fn flatten_rejects_nonstandard_risk_band() {
        let node = ConditionNode::Aggregate(ConditionLeaf::IpRisk {
            valid: REMOTE_IP_REF.to_string(),
            band: IpRiskBand {
                min: 50,
                max: 100,
            },
        });
        let err = flatten_condition(&node).unwrap_err();
        assert_eq!(err.path, "condition");
    }

    #[test]
    fn flatten_rejects_nested_or_and_unknown_reference() {
        let nested = ConditionNode::Or(vec![ConditionNode::Or(vec![population("p1")])]);
        assert!(flatten_condition(&nested).is_err());
        let unknown = greater_node("${session.lastSignOn.at}", 5);
        assert!(flatten_condition(&unknown).is_err());
    }

    #[test]
    fn flatten_routes_boolean_attribute_equality() {
        let node = equals_node("${user.enabled}", EqualsValue::Bool(false));
        let flattened = flatten_condition(&node).unwrap();
        let entry = flattened.user_attribute_equals.iter().next().unwrap();
        assert_eq!(entry.value_boolean, Some(false));
        assert_eq!(entry.value, None);
    }
}
