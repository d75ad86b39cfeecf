//! Core error types for auditd-core
//!
//! Every failure a lifecycle event can hit is one variant of
//! [`OperatorError`]. [`OperatorError::severity`] decides what happens to it:
//! recoverable failures become a `Blocked` status, propagated failures are
//! returned to the event source, and the fatal one stops event processing.

use std::fmt;
use std::path::PathBuf;

use auditd_host::{PackageError, ProbeError, RuleLoadError, ServiceError};
use thiserror::Error;

use crate::state::ReconcileState;

/// How a failure surfaces to the event source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caught by the reconciler and reported as `Blocked`
    Recoverable,
    /// Returned to the caller as a failed event
    Propagated,
    /// The caller must halt processing of the event
    Fatal,
}

/// One rejected configuration option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Option name
    pub field: String,
    /// Human-readable reason
    pub reason: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Configuration rejected by the validator, one entry per violated field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub violations: Vec<FieldViolation>,
}

impl ValidationFailure {
    /// Whether `field` has a violation
    #[must_use]
    pub fn violates(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Template could not be loaded or rendered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("template {template}: {message}")]
pub struct RenderFailure {
    pub template: String,
    /// Full cause chain from the template engine
    pub message: String,
}

/// Rule files could not be synchronized
#[derive(Error, Debug, Clone)]
pub enum SyncFailure {
    /// Source directory could not be listed
    #[error("failed to list rule source {path}: {message}")]
    List { path: PathBuf, message: String },

    /// A rule file could not be copied; no reload was attempted
    #[error("failed to copy rule file {file}: {message}")]
    Copy { file: PathBuf, message: String },

    /// All files were copied but the reload failed; copies are kept
    #[error("rules copied ({copied} files) but reload failed")]
    Reload {
        copied: usize,
        #[source]
        cause: RuleLoadError,
    },
}

/// Errors that can occur while handling a lifecycle event
#[derive(Error, Debug, Clone)]
pub enum OperatorError {
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("failed to render configuration: {0}")]
    Render(#[from] RenderFailure),

    #[error("failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// Restart rejected by the service manager, cause kept for diagnostics
    #[error("failed to restart {service}")]
    Restart {
        service: String,
        #[source]
        cause: ServiceError,
    },

    /// Service still inactive after the restart this pass already made
    #[error("{service} is not active after restart")]
    NotActive { service: String },

    #[error("failed to install {package}")]
    Install {
        package: String,
        #[source]
        cause: PackageError,
    },

    #[error("failed to remove {package}")]
    Remove {
        package: String,
        #[source]
        cause: PackageError,
    },

    #[error("failed to synchronize audit rules: {0}")]
    Sync(#[from] SyncFailure),

    #[error("failed to detect platform")]
    Probe(#[source] ProbeError),

    #[error("auditd cannot be run on this platform (virtualization: {virtualization})")]
    PlatformUnsupported { virtualization: String },

    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: ReconcileState,
        to: ReconcileState,
    },
}

impl OperatorError {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            OperatorError::Validation(_)
            | OperatorError::Render(_)
            | OperatorError::Read { .. }
            | OperatorError::Write { .. }
            | OperatorError::Restart { .. }
            | OperatorError::NotActive { .. }
            | OperatorError::InvalidTransition { .. } => Severity::Recoverable,
            OperatorError::Install { .. }
            | OperatorError::Remove { .. }
            | OperatorError::Sync(_)
            | OperatorError::Probe(_) => Severity::Propagated,
            OperatorError::PlatformUnsupported { .. } => Severity::Fatal,
        }
    }

    /// Check if the event source must stop processing the event
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Error message followed by every underlying cause
    #[must_use]
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str(": ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}
