//! Command executor trait

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ExecError;
use crate::result::CommandResult;

/// Runs shell commands on the managed machine.
///
/// A non-zero exit status is not an error at this layer: callers inspect
/// [`CommandResult::status`] and translate failures into their own error type.
/// There is no unbounded variant; every command gets a deadline.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command, killing it if it does not finish within `timeout`
    async fn run_with_timeout(
        &self,
        cmd: &str,
        timeout: Duration,
    ) -> Result<CommandResult, ExecError>;
}
