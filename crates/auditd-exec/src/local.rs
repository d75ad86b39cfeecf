//! Local command execution using `tokio::process`

use std::process::{Output, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, instrument};

use crate::error::ExecError;
use crate::result::CommandResult;
use crate::traits::CommandExecutor;

/// Runs commands through `sh -c` on this machine.
///
/// Commands get the C locale so that apt, dpkg and systemctl messages can be
/// matched reliably. Children are killed when their future is dropped, which
/// is how a timed-out command is reaped.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    env: Vec<(String, String)>,
}

impl LocalExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            env: vec![("LC_ALL".to_string(), "C".to_string())],
        }
    }

    fn command(&self, cmd: &str) -> Command {
        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(cmd)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    async fn output(&self, cmd: &str) -> Result<Output, ExecError> {
        let child = self
            .command(cmd)
            .spawn()
            .map_err(|e| ExecError::SpawnError(e.to_string()))?;
        child
            .wait_with_output()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for LocalExecutor {
    #[instrument(skip(self), level = "debug")]
    async fn run_with_timeout(
        &self,
        cmd: &str,
        timeout: Duration,
    ) -> Result<CommandResult, ExecError> {
        let start = Instant::now();

        let Ok(output) = tokio::time::timeout(timeout, self.output(cmd)).await else {
            error!(command = %cmd, timeout = ?timeout, "command timed out");
            return Err(ExecError::Timeout {
                command: cmd.to_string(),
                timeout,
            });
        };

        let result = CommandResult::from_output(&output?, start.elapsed());
        debug!(
            command = %cmd,
            status = result.status,
            duration = ?result.duration,
            "command completed"
        );
        Ok(result)
    }
}
