//! Scripted executor for collaborator tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use auditd_exec::{CommandExecutor, CommandResult, ExecError};

/// Records every command and replays queued results; succeeds with empty
/// output once the queue is drained.
pub struct ScriptedExecutor {
    commands: Mutex<Vec<String>>,
    timeouts: Mutex<Vec<Duration>>,
    replies: Mutex<VecDeque<Result<CommandResult, ExecError>>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            timeouts: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, result: CommandResult) {
        self.replies.lock().unwrap().push_back(Ok(result));
    }

    pub fn push_err(&self, err: ExecError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.timeouts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn run_with_timeout(
        &self,
        cmd: &str,
        timeout: Duration,
    ) -> Result<CommandResult, ExecError> {
        self.commands.lock().unwrap().push(cmd.to_string());
        self.timeouts.lock().unwrap().push(timeout);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(CommandResult::with_status(0, "")))
    }
}
