// crates/signon-client/src/api.rs
// ============================================================================
// Module: Sign-On Policy Action API
// Description: Async interface to the remote sign-on policy action endpoints.
// Purpose: Give the reconciliation driver a transport-agnostic seam.
// Dependencies: async-trait, signon-core
// ============================================================================

//! ## Overview
//! [`SignOnPolicyActionApi`] is the single seam between the reconciliation
//! driver and the network. Each method performs exactly one HTTP exchange;
//! retries and compensation belong to the caller. [`ActionPages`] tracks the
//! cursor of the paged collection endpoint, refuses links that loop back to
//! a page already fetched, and remembers the first response so errors can be
//! attributed to it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use async_trait::async_trait;
use signon_core::ActionId;
use signon_core::EnvironmentId;
use signon_core::SignOnPolicyAction;
use signon_core::SignOnPolicyId;

use crate::error::ClientError;
use crate::retry::CancelSignal;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Summary of an HTTP response kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSummary {
    /// HTTP status code.
    pub status: u16,
    /// Request URL that produced the response.
    pub url: String,
}

/// One page of the action collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPage {
    /// Actions on this page, in server order.
    pub actions: Vec<SignOnPolicyAction>,
    /// Link to the next page, when one exists.
    pub next: Option<String>,
    /// Response that carried this page.
    pub response: ResponseSummary,
}

/// Environment returned by the permission probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSummary {
    /// Environment identifier.
    pub id: EnvironmentId,
    /// Display name, when returned.
    pub name: Option<String>,
}

// ============================================================================
// SECTION: API Trait
// ============================================================================

/// Remote operations on sign-on policy actions.
///
/// # Invariants
/// - Each call issues at most one request.
/// - Implementations honour `cancel` while waiting on the network.
#[async_trait]
pub trait SignOnPolicyActionApi: Send + Sync {
    /// Creates an action and returns the stored representation.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    async fn create_action(
        &self,
        environment_id: &EnvironmentId,
        policy_id: &SignOnPolicyId,
        action: &SignOnPolicyAction,
        cancel: &CancelSignal,
    ) -> Result<SignOnPolicyAction, ClientError>;

    /// Reads one action by id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails; 404 is reported as an
    /// API error with that status.
    async fn read_action(
        &self,
        environment_id: &EnvironmentId,
        policy_id: &SignOnPolicyId,
        action_id: &ActionId,
        cancel: &CancelSignal,
    ) -> Result<SignOnPolicyAction, ClientError>;

    /// Replaces an action in full.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    async fn update_action(
        &self,
        environment_id: &EnvironmentId,
        policy_id: &SignOnPolicyId,
        action_id: &ActionId,
        action: &SignOnPolicyAction,
        cancel: &CancelSignal,
    ) -> Result<SignOnPolicyAction, ClientError>;

    /// Deletes an action.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    async fn delete_action(
        &self,
        environment_id: &EnvironmentId,
        policy_id: &SignOnPolicyId,
        action_id: &ActionId,
        cancel: &CancelSignal,
    ) -> Result<(), ClientError>;

    /// Fetches one page of the action collection.
    ///
    /// `next` is the link returned by the previous page, or `None` for the
    /// first page.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    async fn fetch_page(
        &self,
        environment_id: &EnvironmentId,
        policy_id: &SignOnPolicyId,
        next: Option<&str>,
        cancel: &CancelSignal,
    ) -> Result<ActionPage, ClientError>;

    /// Reads the environment; used to probe access after a refusal.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails.
    async fn get_environment(
        &self,
        environment_id: &EnvironmentId,
        cancel: &CancelSignal,
    ) -> Result<EnvironmentSummary, ClientError>;
}

// ============================================================================
// SECTION: Paging
// ============================================================================

/// Cursor over the pages of an action collection.
///
/// The cursor never performs I/O itself, so callers can wrap each
/// [`SignOnPolicyActionApi::fetch_page`] call in their own retry loop.
#[derive(Debug, Clone, Default)]
pub struct ActionPages {
    /// Link to the next page; `None` once exhausted, `Some(None)` before the first page.
    next: Option<Option<String>>,
    /// First response observed, for error attribution.
    first_response: Option<ResponseSummary>,
    /// Page URLs and links already handed out.
    visited: BTreeSet<String>,
}

impl ActionPages {
    /// Starts a cursor at the first page.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: Some(None),
            first_response: None,
            visited: BTreeSet::new(),
        }
    }

    /// Returns the link to request next, or `None` once every page was read.
    ///
    /// The inner value is `None` for the first page.
    #[must_use]
    pub fn next_link(&self) -> Option<Option<&str>> {
        self.next.as_ref().map(Option::as_deref)
    }

    /// Records a fetched page and returns its actions.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::PagingLoop`] when the page links back to a page
    /// already fetched; the cursor is exhausted afterwards.
    pub fn advance(&mut self, page: ActionPage) -> Result<Vec<SignOnPolicyAction>, ClientError> {
        self.visited.insert(page.response.url.clone());
        if self.first_response.is_none() {
            self.first_response = Some(page.response);
        }
        self.next = None;
        if let Some(href) = page.next {
            if !self.visited.insert(href.clone()) {
                return Err(ClientError::PagingLoop(href));
            }
            self.next = Some(Some(href));
        }
        Ok(page.actions)
    }

    /// Records the response behind a failed page request.
    ///
    /// Only the first response is kept, so this is a no-op once a page was read.
    pub fn record_failure(&mut self, error: &ClientError) {
        if self.first_response.is_none() {
            self.first_response = error.response();
        }
    }

    /// Returns the first response observed by this cursor.
    #[must_use]
    pub const fn first_response(&self) -> Option<&ResponseSummary> {
        self.first_response.as_ref()
    }
}
