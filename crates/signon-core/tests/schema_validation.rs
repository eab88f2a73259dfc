//! Schema validation tests for signon-core.
// crates/signon-core/tests/schema_validation.rs
// =============================================================================
// Module: Schema Validation Tests
// Description: Checks the declared resource schema and its JSON rendering.
// Purpose: Ensure the JSON Schema enforces the declared attribute rules.
// =============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use jsonschema::Draft;
use jsonschema::Validator;
use serde_json::Value;
use serde_json::json;
use signon_core::action_resource_schema;
use signon_core::schema::Presence;
use signon_core::schema::ValueKind;

type TestResult = Result<(), String>;

const ENV_ID: &str = "abcdef12-3456-7890-abcd-ef1234567890";
const POLICY_ID: &str = "12345678-90ab-cdef-1234-567890abcdef";
const IDP_ID: &str = "00000000-1111-2222-3333-444444444444";

fn compile_schema() -> Result<Validator, String> {
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&action_resource_schema().to_json_schema())
        .map_err(|err| format!("failed to compile schema: {err}"))
}

fn base_document(extra: Value) -> Value {
    let mut document = json!({
        "environment_id": ENV_ID,
        "sign_on_policy_id": POLICY_ID,
        "priority": 2
    });
    if let (Some(target), Value::Object(extra)) = (document.as_object_mut(), extra) {
        target.extend(extra);
    }
    document
}

// ============================================================================
// SECTION: Declaration
// ============================================================================

#[test]
fn replacement_attributes_are_identity_and_variants() {
    let schema = action_resource_schema();
    let names: Vec<&str> = schema.force_new_attributes().map(|attribute| attribute.name).collect();
    assert_eq!(
        names,
        vec![
            "environment_id",
            "sign_on_policy_id",
            "agreement",
            "identifier_first",
            "identity_provider",
            "login",
            "mfa",
            "progressive_profiling",
            "pingid",
            "pingid_windows_login_passwordless",
        ]
    );
}

#[test]
fn nested_attributes_resolve_by_path() -> TestResult {
    let schema = action_resource_schema();
    let reference = schema
        .attribute("conditions.user_attribute_equals.attribute_reference")
        .ok_or("missing attribute_reference")?;
    assert_eq!(reference.presence, Presence::Required);
    let gateway = schema.attribute("login.new_user_provisioning.gateway").ok_or("missing gateway")?;
    assert_eq!(gateway.kind, ValueKind::BlockList);
    assert!(schema.attribute("login.unknown").is_none());
    assert_eq!(schema.attribute("id").map(|id| id.presence), Some(Presence::Computed));
    Ok(())
}

// ============================================================================
// SECTION: JSON Schema
// ============================================================================

#[test]
fn accepts_login_with_conditions() -> TestResult {
    let validator = compile_schema()?;
    let document = base_document(json!({
        "social_provider_ids": [IDP_ID],
        "enforce_lockout_for_identity_providers": true,
        "login": { "recovery_enabled": true },
        "conditions": {
            "last_sign_on_older_than_seconds": 3600,
            "user_attribute_equals": [
                { "attribute_reference": "${user.name.given}", "value": "Ada" }
            ]
        }
    }));
    if !validator.is_valid(&document) {
        return Err(format!("expected valid document: {document}"));
    }
    Ok(())
}

#[test]
fn accepts_workforce_variant_without_conditions() -> TestResult {
    let validator = compile_schema()?;
    let document = base_document(json!({
        "pingid_windows_login_passwordless": {
            "unique_user_attribute_name": "objectGUID",
            "offline_mode_enabled": true
        }
    }));
    if !validator.is_valid(&document) {
        return Err("expected valid workforce document".to_string());
    }
    Ok(())
}

#[test]
fn rejects_invalid_documents() -> TestResult {
    let validator = compile_schema()?;
    let cases = vec![
        ("no variant", base_document(json!({}))),
        ("two variants", base_document(json!({ "pingid": {}, "mfa": {} }))),
        ("zero priority", {
            let mut document = base_document(json!({ "pingid": {} }));
            document["priority"] = json!(0);
            document
        }),
        (
            "social providers on mfa",
            base_document(json!({ "mfa": {}, "social_provider_ids": [IDP_ID] })),
        ),
        (
            "both registration modes",
            base_document(json!({
                "login": {},
                "registration_external_href": "https://example.com/register",
                "registration_local_population_id": IDP_ID
            })),
        ),
        (
            "both last sign-on keys",
            base_document(json!({
                "mfa": {},
                "conditions": {
                    "last_sign_on_older_than_seconds": 1,
                    "last_sign_on_older_than_seconds_mfa": 2
                }
            })),
        ),
        (
            "bad attribute reference",
            base_document(json!({
                "mfa": {},
                "conditions": {
                    "user_attribute_equals": [
                        { "attribute_reference": "${session.id}", "value": "x" }
                    ]
                }
            })),
        ),
        (
            "both equality arms",
            base_document(json!({
                "mfa": {},
                "conditions": {
                    "user_attribute_equals": [
                        {
                            "attribute_reference": "${user.enabled}",
                            "value": "x",
                            "value_boolean": true
                        }
                    ]
                }
            })),
        ),
        (
            "unknown no-device mode",
            base_document(json!({ "mfa": { "no_device_mode": "ALLOW" } })),
        ),
        (
            "non-LDAP gateway",
            base_document(json!({
                "login": {
                    "new_user_provisioning": {
                        "gateway": [{ "id": IDP_ID, "type": "RADIUS", "user_type_id": IDP_ID }]
                    }
                }
            })),
        ),
        ("unknown attribute", base_document(json!({ "pingid": {}, "colour": "blue" }))),
    ];
    for (label, document) in cases {
        if validator.is_valid(&document) {
            return Err(format!("expected {label} to be rejected: {document}"));
        }
    }
    Ok(())
}
