// crates/signon-provider/src/driver.rs
// ============================================================================
// Module: Reconciliation Driver
// Description: Create, read, update, delete, import and list sign-on policy actions.
// Purpose: Reconcile declared actions against the remote API with retries.
// Dependencies: signon-client, signon-config, signon-core, tokio
// ============================================================================

//! ## Overview
//! [`ActionDriver`] runs one reconciliation verb at a time against a
//! [`SignOnPolicyActionApi`]. Every verb returns a [`ReconcileOutcome`]
//! carrying the new persisted state and the diagnostics for the host; verbs
//! never return `Err`.
//!
//! Security posture: remote responses are untrusted input; every body is
//! decoded through the codecs before it reaches persisted state.
//!
//! ## Retry model
//! All remote calls of one verb share a single budget measured from the
//! verb's first request. Transient failures (transport, 5xx, 429) and
//! permission-propagation refusals are retried; read-back after a write also
//! retries 404 until the remote becomes consistent. A 401/403 that survives
//! retries triggers a probe of the environment so the user learns whether
//! the environment itself is unreachable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use signon_client::ActionPages;
use signon_client::CancelSignal;
use signon_client::ClientError;
use signon_client::EnvTokenSource;
use signon_client::HttpSignOnPolicyActionApi;
use signon_client::ResponseSummary;
use signon_client::RetryAttempt;
use signon_client::RetryPolicy;
use signon_client::SignOnPolicyActionApi;
use signon_client::retry;
use signon_config::ProviderConfig;
use signon_core::ActionAddress;
use signon_core::ActionId;
use signon_core::Diagnostic;
use signon_core::Diagnostics;
use signon_core::EnvironmentId;
use signon_core::SignOnPolicyId;
use signon_core::expand_action;
use signon_core::flatten_action;
use signon_core::minimal_login_action;
use tokio::time::Instant;

use crate::audit::AuditSink;
use crate::audit::RemoteAuditEvent;
use crate::audit::Verb;
use crate::audit::VerbAuditEvent;
use crate::audit::VerbAuditEventParams;
use crate::audit::VerbOutcome;
use crate::audit::sink_from_config;
use crate::errors::DriverError;
use crate::errors::Operation;
use crate::resource::ActionResourceModel;
use crate::resource::plan_replacement;

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of a single-resource verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// State to persist; `None` when the action no longer exists.
    pub state: Option<ActionResourceModel>,
    /// Findings for the host.
    pub diagnostics: Diagnostics,
}

/// Result of listing every action on a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOutcome {
    /// Actions decoded before the first failure, in server order.
    pub actions: Vec<ActionResourceModel>,
    /// Findings for the host.
    pub diagnostics: Diagnostics,
}

/// Failure of a verb together with the state the host should keep.
struct VerbFailure {
    /// State to persist despite the failure.
    state: Option<ActionResourceModel>,
    /// Cause of the failure.
    error: DriverError,
}

impl From<DriverError> for VerbFailure {
    fn from(error: DriverError) -> Self {
        Self {
            state: None,
            error,
        }
    }
}

/// Internal verb result before diagnostics are assembled.
type VerbResult = Result<Option<ActionResourceModel>, VerbFailure>;

// ============================================================================
// SECTION: Retry Classification
// ============================================================================

/// Failures retried by every remote call.
fn retry_remote(error: &ClientError) -> bool {
    error.is_transient() || error.is_permission_propagation()
}

/// Failures retried when reading back a freshly written action.
fn retry_read_back(error: &ClientError) -> bool {
    error.is_not_found() || retry_remote(error)
}

// ============================================================================
// SECTION: Driver
// ============================================================================

/// Reconciles sign-on policy actions against the remote API.
pub struct ActionDriver<A> {
    /// Remote API.
    api: A,
    /// Back-off and budget shared by the calls of one verb.
    retry: RetryPolicy,
    /// Audit sink for verb and remote events.
    audit: Arc<dyn AuditSink>,
}

impl ActionDriver<HttpSignOnPolicyActionApi> {
    /// Builds an HTTP-backed driver from provider configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Setup`] when the HTTP client or audit sink
    /// cannot be created.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, DriverError> {
        let tokens = Arc::new(EnvTokenSource::new(config.api.access_token_env.clone()));
        let api = HttpSignOnPolicyActionApi::new(&config.api.client_settings(), tokens)
            .map_err(|err| DriverError::Setup(err.to_string()))?;
        let audit = sink_from_config(&config.audit)
            .map_err(|err| DriverError::Setup(format!("audit sink: {err}")))?;
        Ok(Self::new(api, config.retry.policy(), audit))
    }
}

impl<A: SignOnPolicyActionApi> ActionDriver<A> {
    /// Creates a driver over `api`.
    #[must_use]
    pub fn new(api: A, retry: RetryPolicy, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            api,
            retry,
            audit,
        }
    }

    /// Returns the remote API.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    // ------------------------------------------------------------------------
    // Verbs
    // ------------------------------------------------------------------------

    /// Creates the planned action and returns its read-back state.
    ///
    /// Configuration errors are reported without contacting the remote. When
    /// the create succeeds but the read-back fails, the state still carries
    /// the new id so the action is not orphaned.
    pub async fn create(
        &self,
        plan: &ActionResourceModel,
        cancel: &CancelSignal,
    ) -> ReconcileOutcome {
        let params = self.begin(Verb::Create, plan);
        let mut diagnostics = Diagnostics::new();
        let result = self.create_action(plan, cancel, &mut diagnostics).await;
        self.finish(params, result, diagnostics)
    }

    /// Refreshes `state` from the remote.
    ///
    /// A missing action clears the state without a diagnostic.
    pub async fn read(&self, state: &ActionResourceModel, cancel: &CancelSignal) -> ReconcileOutcome {
        let params = self.begin(Verb::Read, state);
        let result = self.refresh(state, cancel).await.map_err(|error| VerbFailure {
            state: Some(state.clone()),
            error,
        });
        self.finish(params, result, Diagnostics::new())
    }

    /// Replaces the remote action described by `prior` with `plan`.
    pub async fn update(
        &self,
        prior: &ActionResourceModel,
        plan: &ActionResourceModel,
        cancel: &CancelSignal,
    ) -> ReconcileOutcome {
        let params = self.begin(Verb::Update, prior);
        let mut diagnostics = Diagnostics::new();
        let result = self.update_action(prior, plan, cancel, &mut diagnostics).await;
        self.finish(params, result, diagnostics)
    }

    /// Deletes the action in `state`.
    ///
    /// When the remote refuses to delete the last action of a policy, a
    /// generic login action is created at priority 1 first and a warning
    /// reports that it is left unmanaged.
    pub async fn delete(
        &self,
        state: &ActionResourceModel,
        cancel: &CancelSignal,
    ) -> ReconcileOutcome {
        let params = self.begin(Verb::Delete, state);
        let mut diagnostics = Diagnostics::new();
        let result = self.delete_action(state, cancel, &mut diagnostics).await;
        self.finish(params, result, diagnostics)
    }

    /// Adopts an existing action addressed by `envId/policyId/actionId`.
    pub async fn import(&self, import_id: &str, cancel: &CancelSignal) -> ReconcileOutcome {
        let model = match ActionAddress::parse_import_id(import_id) {
            Ok(address) => ActionResourceModel::from(address),
            Err(err) => {
                let mut diagnostics = Diagnostics::new();
                diagnostics.push(DriverError::from(err).to_diagnostic());
                return ReconcileOutcome {
                    state: None,
                    diagnostics,
                };
            }
        };
        let params = self.begin(Verb::Import, &model);
        let result: VerbResult = match self.refresh(&model, cancel).await {
            Ok(Some(state)) => Ok(Some(state)),
            Ok(None) => Err(DriverError::Missing(format!(
                "Cannot import non-existent sign-on policy action {import_id}"
            ))
            .into()),
            Err(error) => Err(error.into()),
        };
        self.finish(params, result, Diagnostics::new())
    }

    /// Lists every action on a policy.
    ///
    /// Stops at the first failure; a failure is attributed to the first
    /// response of the collection.
    pub async fn list(
        &self,
        environment_id: &EnvironmentId,
        policy_id: &SignOnPolicyId,
        cancel: &CancelSignal,
    ) -> ListOutcome {
        let params = VerbAuditEventParams {
            verb: Verb::List,
            environment_id: environment_id.to_string(),
            sign_on_policy_id: policy_id.to_string(),
            action_id: None,
        };
        self.audit.record_verb(&VerbAuditEvent::started(params.clone()));
        let mut pages = ActionPages::new();
        let mut actions = Vec::new();
        let mut diagnostics = Diagnostics::new();
        if let Err(error) =
            self.collect_actions(environment_id, policy_id, &mut pages, &mut actions, cancel).await
        {
            if let Some(source) = error.client_error() {
                pages.record_failure(source);
            }
            let diagnostic = error.to_diagnostic();
            diagnostics.push(match pages.first_response() {
                Some(response) => attribute_to_response(diagnostic, response),
                None => diagnostic,
            });
        }
        self.record_finish(params, &diagnostics, false);
        ListOutcome {
            actions,
            diagnostics,
        }
    }

    // ------------------------------------------------------------------------
    // Verb bodies
    // ------------------------------------------------------------------------

    /// Expands, posts and reads back a new action.
    async fn create_action(
        &self,
        plan: &ActionResourceModel,
        cancel: &CancelSignal,
        diagnostics: &mut Diagnostics,
    ) -> VerbResult {
        let expanded = expand_action(&plan.action).map_err(DriverError::from)?;
        diagnostics.extend(expanded.diagnostics);
        let started = Instant::now();
        let api = &self.api;
        let environment_id = &plan.environment_id;
        let policy_id = &plan.sign_on_policy_id;
        let action = &expanded.action;
        let created = self
            .call(Operation::Create, environment_id, started, cancel, retry_remote, move || {
                api.create_action(environment_id, policy_id, action, cancel)
            })
            .await?;
        let Some(action_id) = created.id else {
            return Err(DriverError::remote(
                Operation::Create,
                ClientError::Decode("created action has no id".to_string()),
            )
            .into());
        };
        let tracked = plan.with_remote(action_id, plan.action.clone());
        match self.read_back(&tracked, started, cancel).await {
            Ok(state) => Ok(Some(state)),
            Err(error) => Err(VerbFailure {
                state: Some(tracked),
                error,
            }),
        }
    }

    /// Puts the planned action over the prior one and reads it back.
    async fn update_action(
        &self,
        prior: &ActionResourceModel,
        plan: &ActionResourceModel,
        cancel: &CancelSignal,
        diagnostics: &mut Diagnostics,
    ) -> VerbResult {
        let keep = |error: DriverError| VerbFailure {
            state: Some(prior.clone()),
            error,
        };
        let replacement = plan_replacement(prior, plan).map_err(|err| keep(err.into()))?;
        if replacement.requires_replacement() {
            return Err(keep(DriverError::RequiresReplacement(replacement.requires_replace)));
        }
        let Some(action_id) = prior.id.as_ref() else {
            return Err(keep(DriverError::Missing(
                "Cannot update a sign-on policy action that was never created".to_string(),
            )));
        };
        let expanded = expand_action(&plan.action).map_err(|err| keep(err.into()))?;
        diagnostics.extend(expanded.diagnostics);
        let started = Instant::now();
        let api = &self.api;
        let environment_id = &plan.environment_id;
        let policy_id = &plan.sign_on_policy_id;
        let action = &expanded.action;
        self.call(Operation::Update, environment_id, started, cancel, retry_remote, move || {
            api.update_action(environment_id, policy_id, action_id, action, cancel)
        })
        .await
        .map_err(keep)?;
        let tracked = plan.with_remote(action_id.clone(), plan.action.clone());
        self.read_back(&tracked, started, cancel).await.map(Some).map_err(keep)
    }

    /// Deletes an action, compensating when it is the last on its policy.
    async fn delete_action(
        &self,
        state: &ActionResourceModel,
        cancel: &CancelSignal,
        diagnostics: &mut Diagnostics,
    ) -> VerbResult {
        let keep = |error: DriverError| VerbFailure {
            state: Some(state.clone()),
            error,
        };
        let Some(action_id) = state.id.as_ref() else {
            return Ok(None);
        };
        let started = Instant::now();
        match self.delete_remote(state, action_id, started, cancel).await {
            Ok(()) => Ok(None),
            Err(DriverError::Remote {
                source, ..
            }) if source.is_last_action_violation() => self
                .compensate_last_action(state, action_id, started, cancel, diagnostics)
                .await
                .map_err(keep),
            Err(error) => Err(keep(error)),
        }
    }

    /// Adds a generic login action, then deletes the managed one again.
    async fn compensate_last_action(
        &self,
        state: &ActionResourceModel,
        action_id: &ActionId,
        started: Instant,
        cancel: &CancelSignal,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<ActionResourceModel>, DriverError> {
        let placeholder = minimal_login_action(1);
        let api = &self.api;
        let environment_id = &state.environment_id;
        let policy_id = &state.sign_on_policy_id;
        let action = &placeholder;
        let created = self
            .call(Operation::Create, environment_id, started, cancel, retry_remote, move || {
                api.create_action(environment_id, policy_id, action, cancel)
            })
            .await;
        self.audit.record_remote(&RemoteAuditEvent::compensation(
            Operation::Delete.name(),
            environment_id.as_str(),
            created.is_ok(),
        ));
        let generic = created?;
        self.delete_remote(state, action_id, started, cancel).await?;
        let generic_id = generic.id.map_or_else(|| "unknown".to_string(), |id| id.to_string());
        diagnostics.push(
            Diagnostic::warning("Generic sign-on policy action left in place").with_detail(format!(
                "Action {action_id} was the last action on sign-on policy {policy_id}. A sign-on \
                 policy must keep at least one action, so a generic login action ({generic_id}) \
                 was added at priority 1 before deleting it. The generic action is not managed \
                 by this provider."
            )),
        );
        Ok(None)
    }

    // ------------------------------------------------------------------------
    // Remote helpers
    // ------------------------------------------------------------------------

    /// Reads `state` by id; `None` when the remote no longer has it.
    async fn refresh(
        &self,
        state: &ActionResourceModel,
        cancel: &CancelSignal,
    ) -> Result<Option<ActionResourceModel>, DriverError> {
        let Some(action_id) = state.id.as_ref() else {
            return Err(DriverError::Missing(
                "Sign-on policy action state has no id".to_string(),
            ));
        };
        let api = &self.api;
        let environment_id = &state.environment_id;
        let policy_id = &state.sign_on_policy_id;
        let read = self
            .call(Operation::Read, environment_id, Instant::now(), cancel, retry_remote, move || {
                api.read_action(environment_id, policy_id, action_id, cancel)
            })
            .await;
        match read {
            Ok(action) => Ok(Some(state.with_remote(action_id.clone(), flatten_action(&action)?))),
            Err(DriverError::Remote {
                source, ..
            }) if source.is_not_found() => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Reads back a freshly written action, tolerating 404 within the budget.
    async fn read_back(
        &self,
        model: &ActionResourceModel,
        started: Instant,
        cancel: &CancelSignal,
    ) -> Result<ActionResourceModel, DriverError> {
        let Some(action_id) = model.id.as_ref() else {
            return Err(DriverError::Missing(
                "Sign-on policy action state has no id".to_string(),
            ));
        };
        let api = &self.api;
        let environment_id = &model.environment_id;
        let policy_id = &model.sign_on_policy_id;
        let action = self
            .call(Operation::Read, environment_id, started, cancel, retry_read_back, move || {
                api.read_action(environment_id, policy_id, action_id, cancel)
            })
            .await?;
        Ok(model.with_remote(action_id.clone(), flatten_action(&action)?))
    }

    /// Deletes one action; an already-missing action counts as deleted.
    async fn delete_remote(
        &self,
        state: &ActionResourceModel,
        action_id: &ActionId,
        started: Instant,
        cancel: &CancelSignal,
    ) -> Result<(), DriverError> {
        let api = &self.api;
        let environment_id = &state.environment_id;
        let policy_id = &state.sign_on_policy_id;
        let deleted = self
            .call(Operation::Delete, environment_id, started, cancel, retry_remote, move || {
                api.delete_action(environment_id, policy_id, action_id, cancel)
            })
            .await;
        match deleted {
            Err(DriverError::Remote {
                source, ..
            }) if source.is_not_found() => Ok(()),
            other => other,
        }
    }

    /// Pages through the collection, flattening every action into `actions`.
    async fn collect_actions(
        &self,
        environment_id: &EnvironmentId,
        policy_id: &SignOnPolicyId,
        pages: &mut ActionPages,
        actions: &mut Vec<ActionResourceModel>,
        cancel: &CancelSignal,
    ) -> Result<(), DriverError> {
        let api = &self.api;
        let started = Instant::now();
        while let Some(link) = pages.next_link() {
            let page = self
                .call(Operation::List, environment_id, started, cancel, retry_remote, move || {
                    api.fetch_page(environment_id, policy_id, link, cancel)
                })
                .await?;
            let listed =
                pages.advance(page).map_err(|err| DriverError::remote(Operation::List, err))?;
            for action in listed {
                let Some(action_id) = action.id.clone() else {
                    return Err(DriverError::remote(
                        Operation::List,
                        ClientError::Decode("listed action has no id".to_string()),
                    ));
                };
                let mut model = ActionResourceModel::new(
                    environment_id.clone(),
                    policy_id.clone(),
                    flatten_action(&action)?,
                );
                model.id = Some(action_id);
                actions.push(model);
            }
        }
        Ok(())
    }

    /// Runs one remote call under the verb's shared retry budget.
    ///
    /// Failures that survive retries are probed for environment access.
    async fn call<T, Request, Fut>(
        &self,
        operation: Operation,
        environment_id: &EnvironmentId,
        started: Instant,
        cancel: &CancelSignal,
        retryable: fn(&ClientError) -> bool,
        request: Request,
    ) -> Result<T, DriverError>
    where
        Request: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let policy = RetryPolicy {
            budget: self.retry.budget.saturating_sub(started.elapsed()),
            ..self.retry
        };
        let observe = |attempt: &RetryAttempt<'_>| {
            self.audit.record_remote(&RemoteAuditEvent::retry(
                operation.name(),
                environment_id.as_str(),
                attempt.attempt,
                attempt.delay.as_millis(),
                attempt.error.status(),
            ));
        };
        match retry(&policy, cancel, retryable, observe, request).await {
            Ok(value) => Ok(value),
            Err(error) => Err(self.remote_failure(operation, environment_id, error, cancel).await),
        }
    }

    /// Wraps a failed call, probing the environment after a 401/403.
    async fn remote_failure(
        &self,
        operation: Operation,
        environment_id: &EnvironmentId,
        error: ClientError,
        cancel: &CancelSignal,
    ) -> DriverError {
        if !error.is_permission_denied() {
            return DriverError::remote(operation, error);
        }
        let probe = self.api.get_environment(environment_id, cancel).await;
        self.audit.record_remote(&RemoteAuditEvent::probe(
            Operation::ReadEnvironment.name(),
            environment_id.as_str(),
            probe.as_ref().err().and_then(ClientError::status),
            probe.is_ok(),
        ));
        match probe {
            Err(probe_error) if !matches!(probe_error, ClientError::Cancelled) => {
                DriverError::EnvironmentInaccessible {
                    environment_id: environment_id.clone(),
                    source: error,
                }
            }
            _ => DriverError::remote(operation, error),
        }
    }

    // ------------------------------------------------------------------------
    // Audit
    // ------------------------------------------------------------------------

    /// Records the start of `verb` and returns the parameters for its finish.
    fn begin(&self, verb: Verb, model: &ActionResourceModel) -> VerbAuditEventParams {
        let params = VerbAuditEventParams {
            verb,
            environment_id: model.environment_id.to_string(),
            sign_on_policy_id: model.sign_on_policy_id.to_string(),
            action_id: model.id.as_ref().map(ToString::to_string),
        };
        self.audit.record_verb(&VerbAuditEvent::started(params.clone()));
        params
    }

    /// Assembles the outcome of a single-resource verb.
    fn finish(
        &self,
        params: VerbAuditEventParams,
        result: VerbResult,
        mut diagnostics: Diagnostics,
    ) -> ReconcileOutcome {
        let state = match result {
            Ok(state) => state,
            Err(failure) => {
                diagnostics.push(failure.error.to_diagnostic());
                failure.state
            }
        };
        let absent = state.is_none() && params.verb == Verb::Read;
        self.record_finish(params, &diagnostics, absent);
        ReconcileOutcome {
            state,
            diagnostics,
        }
    }

    /// Records the end of a verb with its outcome classification.
    fn record_finish(&self, params: VerbAuditEventParams, diagnostics: &Diagnostics, absent: bool) {
        let errors = diagnostics.errors().count();
        let warnings = diagnostics.warnings().count();
        let outcome = if errors > 0 {
            VerbOutcome::Error
        } else if absent {
            VerbOutcome::Absent
        } else if warnings > 0 {
            VerbOutcome::Warning
        } else {
            VerbOutcome::Ok
        };
        self.audit.record_verb(&VerbAuditEvent::finished(params, outcome, errors, warnings));
    }
}

/// Appends the first collection response to a list diagnostic.
fn attribute_to_response(mut diagnostic: Diagnostic, response: &ResponseSummary) -> Diagnostic {
    let note = format!("First response: HTTP {} from {}", response.status, response.url);
    diagnostic.detail = Some(match diagnostic.detail.take() {
        Some(detail) => format!("{detail}\n\n{note}"),
        None => note,
    });
    diagnostic
}

// ============================================================================
// SECTION: Tests
// ============================================================================
