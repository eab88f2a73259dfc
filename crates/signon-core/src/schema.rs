// crates/signon-core/src/schema.rs
// ============================================================================
// Module: Resource Schema
// Description: Declarative attribute schema for the action resource.
// Purpose: Describe attributes for the host harness and render JSON Schema.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`action_resource_schema`] declares every attribute of the action resource
//! once: type, presence, defaults, replacement behaviour, sibling
//! constraints and value validators. The host harness consumes the
//! declaration at plan time; [`ResourceSchema::to_json_schema`] renders the
//! same rules as a JSON Schema (draft 2020-12) for tooling.
//!
//! Constraint lists (`conflicts_with`, `at_least_one_of`, `exactly_one_of`)
//! name sibling attributes within the same block.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::model::DEFAULT_PROMPT_INTERVAL_SECONDS;
use crate::model::VariantKind;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Resource type name registered with the host.
pub const ACTION_RESOURCE_TYPE: &str = "sign_on_policy_action";

/// Pattern accepted for remote resource ids.
pub const RESOURCE_ID_PATTERN: &str =
    "^[a-zA-Z0-9]{8}-[a-zA-Z0-9]{4}-[a-zA-Z0-9]{4}-[a-zA-Z0-9]{4}-[a-zA-Z0-9]{12}$";

/// Pattern accepted for IPv4 or IPv6 CIDR ranges.
pub const CIDR_PATTERN: &str = "^[0-9a-fA-F:.]+/[0-9]{1,3}$";

/// Pattern accepted for user attribute references.
pub const ATTRIBUTE_REFERENCE_PATTERN: &str =
    "^\\$\\{user\\.[A-Za-z0-9_-]+(\\.[A-Za-z0-9_-]+)*\\}$";

/// Pattern accepted for registration links.
pub const URL_PATTERN: &str = "^https?://\\S+$";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// String scalar.
    String,
    /// Integer scalar.
    Integer,
    /// Boolean scalar.
    Bool,
    /// Ordered list of strings.
    StringList,
    /// Unordered set of strings.
    StringSet,
    /// Single nested block.
    Block,
    /// Ordered list of nested blocks.
    BlockList,
    /// Unordered set of nested blocks.
    BlockSet,
}

/// Who supplies an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The user must set it.
    Required,
    /// The user may set it.
    Optional,
    /// The remote assigns it.
    Computed,
    /// The user may set it; otherwise the remote assigns it.
    OptionalComputed,
}

/// Value validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// Non-blank string.
    NonEmpty,
    /// Remote resource id.
    ResourceId,
    /// CIDR range.
    Cidr,
    /// `${user.<path>}` reference.
    AttributeReference,
    /// HTTP(S) URL.
    Url,
    /// Integer lower bound.
    AtLeast(i64),
    /// Enumerated string values.
    OneOf(&'static [&'static str]),
}

/// Default value applied when the user omits an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Integer(i64),
    /// String default.
    Text(&'static str),
}

impl DefaultValue {
    /// Renders the default as JSON.
    fn to_json(self) -> Value {
        match self {
            Self::Bool(value) => json!(value),
            Self::Integer(value) => json!(value),
            Self::Text(value) => json!(value),
        }
    }
}

/// One declared attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSchema {
    /// Attribute name.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Value type.
    pub kind: ValueKind,
    /// Who supplies the value.
    pub presence: Presence,
    /// Whether a change requires delete-then-create.
    pub force_new: bool,
    /// Default when omitted.
    pub default: Option<DefaultValue>,
    /// Siblings that may not be set together with this attribute.
    pub conflicts_with: &'static [&'static str],
    /// Siblings of which at least one must be set.
    pub at_least_one_of: &'static [&'static str],
    /// Siblings of which exactly one must be set.
    pub exactly_one_of: &'static [&'static str],
    /// Value validators; for collections they apply to each element.
    pub validators: Vec<Validator>,
    /// Maximum collection size.
    pub max_items: Option<usize>,
    /// Nested attributes for block kinds.
    pub nested: Vec<AttributeSchema>,
}

impl AttributeSchema {
    /// Declares an attribute with no constraints.
    #[must_use]
    pub const fn new(
        name: &'static str,
        kind: ValueKind,
        presence: Presence,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            description,
            kind,
            presence,
            force_new: false,
            default: None,
            conflicts_with: &[],
            at_least_one_of: &[],
            exactly_one_of: &[],
            validators: Vec::new(),
            max_items: None,
            nested: Vec::new(),
        }
    }

    /// Marks the attribute as requiring replacement on change.
    #[must_use]
    pub const fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub const fn default_value(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets conflicting siblings.
    #[must_use]
    pub const fn conflicts_with(mut self, names: &'static [&'static str]) -> Self {
        self.conflicts_with = names;
        self
    }

    /// Sets the at-least-one-of group.
    #[must_use]
    pub const fn at_least_one_of(mut self, names: &'static [&'static str]) -> Self {
        self.at_least_one_of = names;
        self
    }

    /// Sets the exactly-one-of group.
    #[must_use]
    pub const fn exactly_one_of(mut self, names: &'static [&'static str]) -> Self {
        self.exactly_one_of = names;
        self
    }

    /// Adds a validator.
    #[must_use]
    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Sets the maximum collection size.
    #[must_use]
    pub const fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    /// Sets nested attributes.
    #[must_use]
    pub fn nested(mut self, nested: Vec<Self>) -> Self {
        self.nested = nested;
        self
    }

    /// Renders the attribute value schema.
    fn to_json_schema(&self) -> Value {
        let mut schema = match self.kind {
            ValueKind::String => scalar_schema("string", &self.validators),
            ValueKind::Integer => scalar_schema("integer", &self.validators),
            ValueKind::Bool => scalar_schema("boolean", &self.validators),
            ValueKind::StringList | ValueKind::StringSet => json!({
                "type": "array",
                "items": scalar_schema("string", &self.validators),
                "uniqueItems": self.kind == ValueKind::StringSet,
            }),
            ValueKind::Block => object_schema(&self.nested),
            ValueKind::BlockList | ValueKind::BlockSet => json!({
                "type": "array",
                "items": object_schema(&self.nested),
                "uniqueItems": self.kind == ValueKind::BlockSet,
            }),
        };
        if let Value::Object(map) = &mut schema {
            map.insert("description".to_string(), json!(self.description));
            if let Some(default) = self.default {
                map.insert("default".to_string(), default.to_json());
            }
            if let Some(max) = self.max_items
                && matches!(self.kind, ValueKind::StringList | ValueKind::StringSet | ValueKind::BlockList | ValueKind::BlockSet)
            {
                map.insert("maxItems".to_string(), json!(max));
            }
            if self.presence == Presence::Computed {
                map.insert("readOnly".to_string(), json!(true));
            }
        }
        schema
    }
}

/// Declared resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSchema {
    /// Resource type name.
    pub type_name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Top-level attributes.
    pub attributes: Vec<AttributeSchema>,
}

impl ResourceSchema {
    /// Looks up an attribute by dotted path, e.g. `conditions.ip_out_of_range_cidr`.
    #[must_use]
    pub fn attribute(&self, path: &str) -> Option<&AttributeSchema> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.attributes.iter().find(|attribute| attribute.name == first)?;
        for segment in segments {
            current = current.nested.iter().find(|attribute| attribute.name == segment)?;
        }
        Some(current)
    }

    /// Returns the top-level attributes that require replacement on change.
    pub fn force_new_attributes(&self) -> impl Iterator<Item = &AttributeSchema> {
        self.attributes.iter().filter(|attribute| attribute.force_new)
    }

    /// Renders the resource as a JSON Schema document.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut schema = object_schema(&self.attributes);
        if let Value::Object(map) = &mut schema {
            map.insert(
                "$schema".to_string(),
                json!("https://json-schema.org/draft/2020-12/schema"),
            );
            map.insert("title".to_string(), json!(self.type_name));
            map.insert("description".to_string(), json!(self.description));
        }
        schema
    }
}

// ============================================================================
// SECTION: JSON Schema Rendering
// ============================================================================

/// Renders a scalar type with its validators.
fn scalar_schema(type_name: &str, validators: &[Validator]) -> Value {
    let mut map = Map::new();
    map.insert("type".to_string(), json!(type_name));
    for validator in validators {
        match validator {
            Validator::NonEmpty => {
                map.insert("minLength".to_string(), json!(1));
                map.insert("pattern".to_string(), json!("\\S"));
            }
            Validator::ResourceId => {
                map.insert("pattern".to_string(), json!(RESOURCE_ID_PATTERN));
            }
            Validator::Cidr => {
                map.insert("pattern".to_string(), json!(CIDR_PATTERN));
            }
            Validator::AttributeReference => {
                map.insert("pattern".to_string(), json!(ATTRIBUTE_REFERENCE_PATTERN));
            }
            Validator::Url => {
                map.insert("pattern".to_string(), json!(URL_PATTERN));
            }
            Validator::AtLeast(minimum) => {
                map.insert("minimum".to_string(), json!(minimum));
            }
            Validator::OneOf(values) => {
                map.insert("enum".to_string(), json!(values));
            }
        }
    }
    Value::Object(map)
}

/// Renders an object whose properties are `attributes`.
fn object_schema(attributes: &[AttributeSchema]) -> Value {
    let properties: Map<String, Value> = attributes
        .iter()
        .map(|attribute| (attribute.name.to_string(), attribute.to_json_schema()))
        .collect();
    let required: Vec<&str> = attributes
        .iter()
        .filter(|attribute| attribute.presence == Presence::Required)
        .map(|attribute| attribute.name)
        .collect();

    let mut all_of = Vec::new();
    if let Some(group) = attributes.iter().map(|attribute| attribute.exactly_one_of).find(|group| !group.is_empty()) {
        all_of.push(json!({ "oneOf": required_each(group) }));
    }
    if let Some(group) = attributes.iter().map(|attribute| attribute.at_least_one_of).find(|group| !group.is_empty()) {
        all_of.push(json!({ "anyOf": required_each(group) }));
    }
    for attribute in attributes.iter().filter(|attribute| !attribute.conflicts_with.is_empty()) {
        all_of.push(json!({
            "if": { "required": [attribute.name] },
            "then": { "not": { "anyOf": required_each(attribute.conflicts_with) } }
        }));
    }

    let mut schema = json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    });
    if !all_of.is_empty()
        && let Value::Object(map) = &mut schema
    {
        map.insert("allOf".to_string(), Value::Array(all_of));
    }
    schema
}

/// One `{"required": [name]}` clause per name.
fn required_each(names: &[&str]) -> Vec<Value> {
    names.iter().map(|name| json!({ "required": [name] })).collect()
}

// ============================================================================
// SECTION: Action Resource
// ============================================================================

/// Variant block names, all mutually exclusive.
const VARIANT_BLOCKS: &[&str] = &[
    VariantKind::Agreement.block_name(),
    VariantKind::IdentifierFirst.block_name(),
    VariantKind::IdentityProvider.block_name(),
    VariantKind::Login.block_name(),
    VariantKind::Mfa.block_name(),
    VariantKind::ProgressiveProfiling.block_name(),
    VariantKind::PingId.block_name(),
    VariantKind::PingIdWindowsLoginPasswordless.block_name(),
];

/// Variants without the social sign-on form.
const NON_SOCIAL_VARIANTS: &[&str] = &[
    "agreement",
    "identity_provider",
    "mfa",
    "progressive_profiling",
    "pingid",
    "pingid_windows_login_passwordless",
];

/// Variants without any registration form.
const NON_REGISTRATION_VARIANTS: &[&str] =
    &["agreement", "mfa", "progressive_profiling", "pingid", "pingid_windows_login_passwordless"];

/// Keys of the condition block.
const CONDITION_KEYS: &[&str] = &[
    "last_sign_on_older_than_seconds",
    "last_sign_on_older_than_seconds_mfa",
    "user_is_member_of_any_population_id",
    "user_attribute_equals",
    "ip_out_of_range_cidr",
    "ip_reputation_high_risk",
    "geovelocity_anomaly_detected",
    "anonymous_network_detected",
    "anonymous_network_detected_allowed_cidr",
];

/// Declares a variant block.
fn variant_block(name: &'static str, description: &'static str, nested: Vec<AttributeSchema>) -> AttributeSchema {
    AttributeSchema::new(name, ValueKind::Block, Presence::Optional, description)
        .force_new()
        .max_items(1)
        .exactly_one_of(VARIANT_BLOCKS)
        .nested(nested)
}

/// Returns the declared schema of the sign-on policy action resource.
#[must_use]
pub fn action_resource_schema() -> ResourceSchema {
    use DefaultValue::Bool;
    use Presence::Computed;
    use Presence::Optional;
    use Presence::OptionalComputed;
    use Presence::Required;
    use ValueKind::Block;
    use ValueKind::BlockList;
    use ValueKind::BlockSet;
    use ValueKind::Integer;
    use ValueKind::StringSet;

    ResourceSchema {
        type_name: ACTION_RESOURCE_TYPE,
        description: "An action within a sign-on policy.",
        attributes: vec![
            AttributeSchema::new("id", ValueKind::String, Computed, "Remote identifier of the action."),
            AttributeSchema::new(
                "environment_id",
                ValueKind::String,
                Required,
                "Environment holding the sign-on policy.",
            )
            .force_new()
            .validate(Validator::ResourceId),
            AttributeSchema::new(
                "sign_on_policy_id",
                ValueKind::String,
                Required,
                "Sign-on policy the action belongs to.",
            )
            .force_new()
            .validate(Validator::ResourceId),
            AttributeSchema::new("priority", Integer, Required, "Evaluation order within the policy.")
                .validate(Validator::AtLeast(1)),
            AttributeSchema::new(
                "conditions",
                Block,
                Optional,
                "Conditions of which any triggers the action.",
            )
            .max_items(1)
            .nested(condition_attributes()),
            AttributeSchema::new(
                "registration_external_href",
                ValueKind::String,
                Optional,
                "External link for user registration.",
            )
            .conflicts_with(&[
                "registration_local_population_id",
                "agreement",
                "identity_provider",
                "mfa",
                "progressive_profiling",
                "pingid",
                "pingid_windows_login_passwordless",
            ])
            .validate(Validator::Url),
            AttributeSchema::new(
                "registration_local_population_id",
                ValueKind::String,
                Optional,
                "Population that registering users are created in.",
            )
            .conflicts_with(&[
                "registration_external_href",
                "agreement",
                "mfa",
                "progressive_profiling",
                "pingid",
                "pingid_windows_login_passwordless",
            ])
            .validate(Validator::ResourceId),
            AttributeSchema::new(
                "registration_confirm_user_attributes",
                ValueKind::Bool,
                Optional,
                "Whether registering users confirm attributes supplied by an identity provider.",
            )
            .default_value(Bool(false))
            .conflicts_with(NON_REGISTRATION_VARIANTS),
            AttributeSchema::new(
                "social_provider_ids",
                StringSet,
                Optional,
                "Social identity providers offered on the sign-on form.",
            )
            .conflicts_with(NON_SOCIAL_VARIANTS)
            .validate(Validator::ResourceId),
            AttributeSchema::new(
                "enforce_lockout_for_identity_providers",
                ValueKind::Bool,
                Optional,
                "Whether account lockout applies to identity provider sign-ons.",
            )
            .default_value(Bool(false))
            .conflicts_with(NON_SOCIAL_VARIANTS),
            AttributeSchema::new(
                "confirm_identity_provider_attributes",
                ValueKind::Bool,
                Optional,
                "Whether users confirm attributes supplied by identity providers.",
            )
            .default_value(Bool(false))
            .conflicts_with(NON_SOCIAL_VARIANTS),
            variant_block(
                "agreement",
                "Require acceptance of an agreement.",
                vec![
                    AttributeSchema::new(
                        "agreement_id",
                        ValueKind::String,
                        Required,
                        "Agreement to present.",
                    )
                    .validate(Validator::ResourceId),
                    AttributeSchema::new(
                        "show_decline_option",
                        ValueKind::Bool,
                        Optional,
                        "Whether users may decline the agreement.",
                    )
                    .default_value(Bool(true)),
                ],
            ),
            variant_block(
                "identifier_first",
                "Collect the identifier first and route to an identity provider.",
                vec![
                    AttributeSchema::new(
                        "discovery_rule",
                        BlockList,
                        Optional,
                        "Rules routing identifiers to identity providers.",
                    )
                    .nested(vec![
                        AttributeSchema::new(
                            "attribute_contains_text",
                            ValueKind::String,
                            Required,
                            "Text the identifier must contain.",
                        )
                        .validate(Validator::NonEmpty),
                        AttributeSchema::new(
                            "identity_provider_id",
                            ValueKind::String,
                            Required,
                            "Identity provider matched users are sent to.",
                        )
                        .validate(Validator::ResourceId),
                    ]),
                    AttributeSchema::new(
                        "recovery_enabled",
                        ValueKind::Bool,
                        OptionalComputed,
                        "Whether account recovery is offered.",
                    ),
                ],
            ),
            variant_block(
                "identity_provider",
                "Sign on through an external identity provider.",
                vec![
                    AttributeSchema::new(
                        "identity_provider_id",
                        ValueKind::String,
                        Required,
                        "Identity provider to federate with.",
                    )
                    .validate(Validator::ResourceId),
                    AttributeSchema::new(
                        "acr_values",
                        ValueKind::String,
                        Optional,
                        "Requested authentication context class references.",
                    )
                    .validate(Validator::NonEmpty),
                    AttributeSchema::new(
                        "pass_user_context",
                        ValueKind::Bool,
                        Optional,
                        "Whether user context is passed to the identity provider.",
                    ),
                ],
            ),
            variant_block(
                "login",
                "Sign on with username and password.",
                vec![
                    AttributeSchema::new(
                        "recovery_enabled",
                        ValueKind::Bool,
                        Optional,
                        "Whether account recovery is offered.",
                    )
                    .default_value(Bool(true)),
                    AttributeSchema::new(
                        "new_user_provisioning",
                        Block,
                        Optional,
                        "Provision unknown users from a gateway on first sign-on.",
                    )
                    .max_items(1)
                    .nested(vec![
                        AttributeSchema::new(
                            "gateway",
                            BlockList,
                            Required,
                            "Gateways consulted in order.",
                        )
                        .nested(vec![
                            AttributeSchema::new("id", ValueKind::String, Required, "Gateway id.")
                                .validate(Validator::ResourceId),
                            AttributeSchema::new("type", ValueKind::String, Required, "Gateway type.")
                                .validate(Validator::OneOf(&["LDAP"])),
                            AttributeSchema::new(
                                "user_type_id",
                                ValueKind::String,
                                Required,
                                "Gateway user type.",
                            )
                            .validate(Validator::ResourceId),
                        ]),
                    ]),
                ],
            ),
            variant_block(
                "mfa",
                "Require multi-factor authentication.",
                vec![
                    AttributeSchema::new(
                        "device_sign_on_policy_id",
                        ValueKind::String,
                        Optional,
                        "Device authentication policy to apply.",
                    )
                    .validate(Validator::ResourceId),
                    AttributeSchema::new(
                        "no_device_mode",
                        ValueKind::String,
                        Optional,
                        "Behaviour when the user has no usable device.",
                    )
                    .default_value(DefaultValue::Text("BLOCK"))
                    .validate(Validator::OneOf(&["BLOCK", "BYPASS"])),
                ],
            ),
            variant_block(
                "progressive_profiling",
                "Collect missing profile attributes.",
                vec![
                    AttributeSchema::new("attribute", BlockSet, Required, "Attributes to collect.")
                        .nested(vec![
                            AttributeSchema::new(
                                "name",
                                ValueKind::String,
                                Required,
                                "User attribute name.",
                            )
                            .validate(Validator::NonEmpty),
                            AttributeSchema::new(
                                "required",
                                ValueKind::Bool,
                                Required,
                                "Whether the user must supply the attribute.",
                            ),
                        ]),
                    AttributeSchema::new(
                        "prevent_multiple_prompts_per_flow",
                        ValueKind::Bool,
                        Optional,
                        "Whether the prompt is shown at most once per flow.",
                    )
                    .default_value(Bool(true)),
                    AttributeSchema::new(
                        "prompt_interval_seconds",
                        Integer,
                        Optional,
                        "Minimum interval between prompts.",
                    )
                    .default_value(DefaultValue::Integer(i64::from(DEFAULT_PROMPT_INTERVAL_SECONDS)))
                    .validate(Validator::AtLeast(0)),
                    AttributeSchema::new(
                        "prompt_text",
                        ValueKind::String,
                        Required,
                        "Text shown when prompting.",
                    )
                    .validate(Validator::NonEmpty),
                ],
            ),
            variant_block("pingid", "Require PingID authentication.", Vec::new()),
            variant_block(
                "pingid_windows_login_passwordless",
                "Require PingID Windows login passwordless authentication.",
                vec![
                    AttributeSchema::new(
                        "unique_user_attribute_name",
                        ValueKind::String,
                        Required,
                        "Attribute uniquely identifying the Windows user.",
                    )
                    .validate(Validator::NonEmpty),
                    AttributeSchema::new(
                        "offline_mode_enabled",
                        ValueKind::Bool,
                        Required,
                        "Whether offline mode is enabled.",
                    ),
                ],
            ),
        ],
    }
}

/// Declares the condition block keys.
fn condition_attributes() -> Vec<AttributeSchema> {
    use Presence::Optional;

    vec![
        AttributeSchema::new(
            "last_sign_on_older_than_seconds",
            ValueKind::Integer,
            Optional,
            "Trigger when the last password sign-on is older than this many seconds.",
        )
        .conflicts_with(&["last_sign_on_older_than_seconds_mfa"])
        .at_least_one_of(CONDITION_KEYS)
        .validate(Validator::AtLeast(0)),
        AttributeSchema::new(
            "last_sign_on_older_than_seconds_mfa",
            ValueKind::Integer,
            Optional,
            "Trigger when the last MFA sign-on is older than this many seconds.",
        )
        .conflicts_with(&["last_sign_on_older_than_seconds"])
        .at_least_one_of(CONDITION_KEYS)
        .validate(Validator::AtLeast(0)),
        AttributeSchema::new(
            "user_is_member_of_any_population_id",
            ValueKind::StringSet,
            Optional,
            "Trigger for members of any of these populations.",
        )
        .at_least_one_of(CONDITION_KEYS)
        .validate(Validator::ResourceId),
        AttributeSchema::new(
            "user_attribute_equals",
            ValueKind::BlockSet,
            Optional,
            "Trigger when any user attribute equals the given value.",
        )
        .at_least_one_of(CONDITION_KEYS)
        .nested(vec![
            AttributeSchema::new(
                "attribute_reference",
                ValueKind::String,
                Presence::Required,
                "Attribute reference of the form `${user.<path>}`.",
            )
            .validate(Validator::AttributeReference),
            AttributeSchema::new("value", ValueKind::String, Optional, "String value to compare.")
                .exactly_one_of(&["value", "value_boolean"]),
            AttributeSchema::new(
                "value_boolean",
                ValueKind::Bool,
                Optional,
                "Boolean value to compare.",
            )
            .exactly_one_of(&["value", "value_boolean"]),
        ]),
        AttributeSchema::new(
            "ip_out_of_range_cidr",
            ValueKind::StringList,
            Optional,
            "Trigger when the request IP is outside all of these ranges.",
        )
        .at_least_one_of(CONDITION_KEYS)
        .validate(Validator::Cidr),
        AttributeSchema::new(
            "ip_reputation_high_risk",
            ValueKind::Bool,
            Optional,
            "Trigger when the request IP has a high-risk reputation.",
        )
        .default_value(DefaultValue::Bool(false))
        .at_least_one_of(CONDITION_KEYS),
        AttributeSchema::new(
            "geovelocity_anomaly_detected",
            ValueKind::Bool,
            Optional,
            "Trigger on implausible travel since the last sign-on.",
        )
        .default_value(DefaultValue::Bool(false))
        .at_least_one_of(CONDITION_KEYS),
        AttributeSchema::new(
            "anonymous_network_detected",
            ValueKind::Bool,
            Optional,
            "Trigger when the request comes from an anonymous network.",
        )
        .default_value(DefaultValue::Bool(false))
        .at_least_one_of(CONDITION_KEYS),
        AttributeSchema::new(
            "anonymous_network_detected_allowed_cidr",
            ValueKind::StringList,
            Optional,
            "Ranges exempt from anonymous network detection.",
        )
        .at_least_one_of(CONDITION_KEYS)
        .validate(Validator::Cidr),
    ]
}
