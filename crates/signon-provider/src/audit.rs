// crates/signon-provider/src/audit.rs
// ============================================================================
// Module: Provider Audit Logging
// Description: Structured audit events for reconciliation verbs.
// Purpose: Emit JSON-line audit records without hard logging dependencies.
// Dependencies: serde, serde_json, signon-config
// ============================================================================

//! ## Overview
//! Audit events describe what the driver did: verb start and finish with the
//! outcome, remote retries, permission probes, and delete compensation. Events
//! carry identifiers, statuses and counts only; tokens and request bodies are
//! never recorded. Sinks write one JSON object per line.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use signon_config::AuditConfig;
use signon_config::AuditSinkKind;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Reconciliation verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    /// Create a new action.
    Create,
    /// Refresh state from the remote.
    Read,
    /// Replace an existing action.
    Update,
    /// Delete an action.
    Delete,
    /// Adopt an existing action by import id.
    Import,
    /// List every action on a policy.
    List,
}

/// Verb outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbOutcome {
    /// Completed without diagnostics.
    Ok,
    /// Completed with warnings only.
    Warning,
    /// Failed with at least one error.
    Error,
    /// Remote resource was gone; state cleared.
    Absent,
}

/// Verb lifecycle audit event.
#[derive(Debug, Clone, Serialize)]
pub struct VerbAuditEvent {
    /// Event identifier (`verb_started` or `verb_finished`).
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Verb being run.
    pub verb: Verb,
    /// Environment identifier.
    pub environment_id: String,
    /// Sign-on policy identifier.
    pub sign_on_policy_id: String,
    /// Action identifier when known.
    pub action_id: Option<String>,
    /// Outcome, set on `verb_finished` only.
    pub outcome: Option<VerbOutcome>,
    /// Number of error diagnostics, set on `verb_finished` only.
    pub errors: usize,
    /// Number of warning diagnostics, set on `verb_finished` only.
    pub warnings: usize,
}

/// Parameters for constructing a [`VerbAuditEvent`].
#[derive(Debug, Clone)]
pub struct VerbAuditEventParams {
    /// Verb being run.
    pub verb: Verb,
    /// Environment identifier.
    pub environment_id: String,
    /// Sign-on policy identifier.
    pub sign_on_policy_id: String,
    /// Action identifier when known.
    pub action_id: Option<String>,
}

impl VerbAuditEvent {
    /// Creates a `verb_started` event.
    #[must_use]
    pub fn started(params: VerbAuditEventParams) -> Self {
        Self {
            event: "verb_started",
            timestamp_ms: now_ms(),
            verb: params.verb,
            environment_id: params.environment_id,
            sign_on_policy_id: params.sign_on_policy_id,
            action_id: params.action_id,
            outcome: None,
            errors: 0,
            warnings: 0,
        }
    }

    /// Creates a `verb_finished` event.
    #[must_use]
    pub fn finished(
        params: VerbAuditEventParams,
        outcome: VerbOutcome,
        errors: usize,
        warnings: usize,
    ) -> Self {
        Self {
            event: "verb_finished",
            timestamp_ms: now_ms(),
            verb: params.verb,
            environment_id: params.environment_id,
            sign_on_policy_id: params.sign_on_policy_id,
            action_id: params.action_id,
            outcome: Some(outcome),
            errors,
            warnings,
        }
    }
}

/// Remote interaction audit event.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteAuditEvent {
    /// Event identifier (`remote_retry`, `permission_probe`, `delete_compensation`).
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Remote operation name.
    pub operation: &'static str,
    /// Environment identifier.
    pub environment_id: String,
    /// Failed attempt number, for retries.
    pub attempt: Option<u32>,
    /// Back-off before the next attempt, for retries.
    pub delay_ms: Option<u128>,
    /// HTTP status observed, when any.
    pub status: Option<u16>,
    /// Whether the probed or compensating call succeeded.
    pub succeeded: Option<bool>,
}

impl RemoteAuditEvent {
    /// Creates a retry event.
    #[must_use]
    pub fn retry(
        operation: &'static str,
        environment_id: &str,
        attempt: u32,
        delay_ms: u128,
        status: Option<u16>,
    ) -> Self {
        Self {
            event: "remote_retry",
            timestamp_ms: now_ms(),
            operation,
            environment_id: environment_id.to_string(),
            attempt: Some(attempt),
            delay_ms: Some(delay_ms),
            status,
            succeeded: None,
        }
    }

    /// Creates a permission probe event.
    #[must_use]
    pub fn probe(
        operation: &'static str,
        environment_id: &str,
        status: Option<u16>,
        succeeded: bool,
    ) -> Self {
        Self {
            event: "permission_probe",
            timestamp_ms: now_ms(),
            operation,
            environment_id: environment_id.to_string(),
            attempt: None,
            delay_ms: None,
            status,
            succeeded: Some(succeeded),
        }
    }

    /// Creates a delete compensation event.
    #[must_use]
    pub fn compensation(operation: &'static str, environment_id: &str, succeeded: bool) -> Self {
        Self {
            event: "delete_compensation",
            timestamp_ms: now_ms(),
            operation,
            environment_id: environment_id.to_string(),
            attempt: None,
            delay_ms: None,
            status: None,
            succeeded: Some(succeeded),
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for provider events.
pub trait AuditSink: Send + Sync {
    /// Record a verb lifecycle event.
    fn record_verb(&self, event: &VerbAuditEvent);

    /// Record a remote interaction event.
    fn record_remote(&self, _event: &RemoteAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record_verb(&self, event: &VerbAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_remote(&self, event: &RemoteAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized event.
    fn append<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record_verb(&self, event: &VerbAuditEvent) {
        self.append(event);
    }

    fn record_remote(&self, event: &RemoteAuditEvent) {
        self.append(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record_verb(&self, _event: &VerbAuditEvent) {}

    fn record_remote(&self, _event: &RemoteAuditEvent) {}
}

/// Builds the sink selected by `config`.
///
/// # Errors
///
/// Returns an error if the file sink cannot open its log file.
pub fn sink_from_config(config: &AuditConfig) -> io::Result<Arc<dyn AuditSink>> {
    match (config.sink, config.path.as_deref()) {
        (AuditSinkKind::Stderr, _) => Ok(Arc::new(StderrAuditSink)),
        (AuditSinkKind::File, Some(path)) => Ok(Arc::new(FileAuditSink::new(Path::new(path))?)),
        (AuditSinkKind::File, None) => {
            Err(io::Error::new(io::ErrorKind::InvalidInput, "file audit sink requires a path"))
        }
        (AuditSinkKind::None, _) => Ok(Arc::new(NoopAuditSink)),
    }
}

/// Returns the current time in milliseconds since the epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
