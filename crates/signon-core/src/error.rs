// crates/signon-core/src/error.rs
// ============================================================================
// Module: Codec Errors
// Description: Input and structure errors raised by the action codecs.
// Purpose: Distinguish user-fixable configuration errors from remote drift.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`InputError`] is raised while expanding a declarative action, before any
//! remote call is made; the user can fix it by editing their configuration.
//! [`StructureError`] is raised while flattening a remote action whose shape
//! cannot be represented declaratively; the user cannot fix it and is asked to
//! report it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::diagnostics::Diagnostic;
use crate::model::VariantKind;

// ============================================================================
// SECTION: Input Errors
// ============================================================================

/// Declarative input rejected during expansion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// No variant block is set.
    #[error("no policy action type is configured; exactly one action block must be set")]
    NoVariant,
    /// More than one variant block is set.
    #[error("multiple policy action types are configured ({}); exactly one action block must be set", .0.join(", "))]
    MultipleVariants(Vec<&'static str>),
    /// Priority is below one.
    #[error("priority must be at least 1, got {0}")]
    InvalidPriority(u32),
    /// A condition key that the remote rejects on the first action.
    #[error("`{key}` cannot be set when the action priority is 1")]
    InvalidAtPriorityOne {
        /// Offending condition key.
        key: &'static str,
    },
    /// Conditions are set on a variant that does not accept any.
    #[error("conditions are not supported on the `{variant}` action type")]
    ConditionForbidden {
        /// Variant carrying the condition block.
        variant: VariantKind,
    },
    /// A condition key is set on a variant it does not apply to.
    #[error("condition `{key}` is not applicable to the `{variant}` action type")]
    ConditionNotApplicable {
        /// Offending condition key.
        key: &'static str,
        /// Variant carrying the condition block.
        variant: VariantKind,
    },
    /// Two mutually exclusive condition keys are both set.
    #[error("conditions `{first}` and `{second}` cannot both be set")]
    ConflictingConditions {
        /// First conflicting key.
        first: &'static str,
        /// Second conflicting key.
        second: &'static str,
    },
    /// An attribute equality entry sets neither or both value arms.
    #[error(
        "user attribute condition for `{attribute_reference}` must set exactly one of `value` or `value_boolean`"
    )]
    AmbiguousEqualityValue {
        /// Reference of the offending entry.
        attribute_reference: String,
    },
    /// An attribute equality reference is not of the `${user.<path>}` form.
    #[error(
        "attribute reference `{attribute_reference}` is invalid; expected the form `${{user.<attribute path>}}`"
    )]
    InvalidAttributeReference {
        /// Rejected reference.
        attribute_reference: String,
    },
    /// Both registration modes are set.
    #[error(
        "`registration_external_href` and `registration_local_population_id` cannot both be set"
    )]
    ConflictingRegistration,
    /// A cross-variant attribute is set on a variant it does not apply to.
    #[error("`{attribute}` is not applicable to the `{variant}` action type")]
    AttributeNotApplicable {
        /// Offending attribute name.
        attribute: &'static str,
        /// Selected variant.
        variant: VariantKind,
    },
    /// A required attribute is missing or empty.
    #[error("`{attribute}` must be set and non-empty for the `{variant}` action type")]
    MissingAttribute {
        /// Missing attribute name.
        attribute: &'static str,
        /// Selected variant.
        variant: VariantKind,
    },
}

impl InputError {
    /// Converts the error into a host diagnostic.
    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error("Invalid sign-on policy action configuration").with_detail(self.to_string())
    }
}

// ============================================================================
// SECTION: Structure Errors
// ============================================================================

/// Remote action shape the declarative form cannot represent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "unexpected sign-on policy action structure at `{path}`: {reason}; please report this issue to \
     the provider maintainers"
)]
pub struct StructureError {
    /// Location of the offending node, e.g. `condition.or[2].not`.
    pub path: String,
    /// What was unexpected about the node.
    pub reason: String,
}

impl StructureError {
    /// Creates a structure error at `path`.
    #[must_use]
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Converts the error into a host diagnostic.
    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error("Unexpected sign-on policy action structure").with_detail(self.to_string())
    }
}
