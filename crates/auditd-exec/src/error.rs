//! Error types for auditd-exec

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while running a command
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// Process could not be spawned (missing shell, fork failure)
    #[error("failed to spawn process: {0}")]
    SpawnError(String),

    /// I/O error while collecting output
    #[error("I/O error: {0}")]
    IoError(String),

    /// Command timed out and was killed
    #[error("command `{command}` timed out after {timeout:?}")]
    Timeout {
        /// Command that exceeded the deadline
        command: String,
        /// Timeout duration that was exceeded
        timeout: Duration,
    },
}
