// crates/signon-core/src/lib.rs
// ============================================================================
// Module: Sign-On Core Library
// Description: Pure codecs for sign-on policy actions.
// Purpose: Translate declarative actions to and from the remote wire form.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `signon-core` holds the sign-on policy action engine with no I/O: the wire
//! model, the flat declarative model, the condition and variant codecs, the
//! dispatcher tying them together, and the resource schema. Every function is
//! pure and safe to call concurrently.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod condition;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod identifiers;
pub mod model;
pub mod schema;
pub mod variant;
pub mod wire;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use condition::ConditionContext;
pub use condition::ConditionKey;
pub use condition::ExpandedCondition;
pub use condition::expand_conditions;
pub use condition::flatten_condition;
pub use diagnostics::Diagnostic;
pub use diagnostics::Diagnostics;
pub use diagnostics::Severity;
pub use dispatch::expand_action;
pub use dispatch::flatten_action;
pub use dispatch::minimal_login_action;
pub use dispatch::typed_action;
pub use error::InputError;
pub use error::StructureError;
pub use identifiers::ActionAddress;
pub use identifiers::ActionId;
pub use identifiers::EnvironmentId;
pub use identifiers::ImportIdError;
pub use identifiers::SignOnPolicyId;
pub use model::ActionConfig;
pub use model::ActionVariant;
pub use model::ConditionsConfig;
pub use model::TypedAction;
pub use model::VariantKind;
pub use schema::ResourceSchema;
pub use schema::action_resource_schema;
pub use variant::ExpandedAction;
pub use wire::ActionKind;
pub use wire::ConditionLeaf;
pub use wire::ConditionNode;
pub use wire::SignOnPolicyAction;
