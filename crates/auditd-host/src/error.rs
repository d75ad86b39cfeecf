//! Error types for auditd-host

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during package operations
#[derive(Error, Debug, Clone)]
pub enum PackageError {
    /// Package not found in repositories
    #[error("package not found: {0}")]
    PackageNotFound(String),

    /// Repository is unavailable
    #[error("repository unavailable: {0}")]
    RepositoryUnavailable(String),

    /// Lock file conflict (another process running)
    #[error("lock file conflict: {0}")]
    LockConflict(String),

    /// Insufficient permissions (need sudo)
    #[error("insufficient permissions: {0}")]
    PermissionDenied(String),

    /// Command execution failed
    #[error("command failed: {status} - {message}")]
    CommandFailed {
        /// Exit status
        status: i32,
        /// Error message
        message: String,
    },

    /// Execution error from the command executor
    #[error("execution error: {0}")]
    ExecutionError(String),
}

impl PackageError {
    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PackageError::LockConflict(_) | PackageError::RepositoryUnavailable(_)
        )
    }

    /// Check if error indicates need for sudo
    #[must_use]
    pub fn needs_sudo(&self) -> bool {
        matches!(self, PackageError::PermissionDenied(_))
    }
}

/// Errors from the service manager
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    /// `systemctl` returned a non-zero status
    #[error("systemctl {action} {service} failed: {status} - {message}")]
    CommandFailed {
        /// Verb that failed (restart, start, ...)
        action: String,
        /// Unit name
        service: String,
        /// Exit status
        status: i32,
        /// Error message
        message: String,
    },

    /// Execution error from the command executor
    #[error("execution error: {0}")]
    ExecutionError(String),
}

/// Errors from reloading audit rules into the kernel
#[derive(Error, Debug, Clone)]
pub enum RuleLoadError {
    /// `augenrules --load` returned a non-zero status
    #[error("rule reload failed: {status} - {message}")]
    CommandFailed {
        /// Exit status
        status: i32,
        /// Error message
        message: String,
    },

    /// Execution error from the command executor
    #[error("execution error: {0}")]
    ExecutionError(String),
}

/// Errors from the virtualization probe
#[derive(Error, Debug, Clone)]
pub enum ProbeError {
    /// Probe ran but printed no classification
    #[error("virtualization probe gave no answer (status {status}): {message}")]
    NoAnswer {
        /// Exit status
        status: i32,
        /// Error message
        message: String,
    },

    /// Execution error from the command executor
    #[error("execution error: {0}")]
    ExecutionError(String),
}

/// Filesystem errors, always tagged with the path involved
#[derive(Error, Debug)]
pub enum FsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown owner `{0}`")]
    UnknownOwner(String),

    #[error("failed to look up owner `{owner}`: {source}")]
    OwnerLookup {
        owner: String,
        #[source]
        source: nix::Error,
    },
}
