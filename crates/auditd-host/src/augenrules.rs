//! Audit rule loading through `augenrules`

use std::sync::Arc;

use async_trait::async_trait;
use auditd_exec::CommandExecutor;
use tracing::{info, instrument};

use crate::error::RuleLoadError;
use crate::traits::RuleLoader;
use crate::types::CommandSettings;

/// Merges `/etc/audit/rules.d/*.rules` and loads the result
pub struct AugenrulesLoader {
    executor: Arc<dyn CommandExecutor>,
    settings: CommandSettings,
}

impl AugenrulesLoader {
    pub fn new(executor: Arc<dyn CommandExecutor>, settings: CommandSettings) -> Self {
        Self { executor, settings }
    }
}

#[async_trait]
impl RuleLoader for AugenrulesLoader {
    #[instrument(skip(self))]
    async fn reload(&self) -> Result<(), RuleLoadError> {
        let cmd = self.settings.command("augenrules --load");
        let result = self
            .executor
            .run_with_timeout(&cmd, self.settings.timeout)
            .await
            .map_err(|e| RuleLoadError::ExecutionError(e.to_string()))?;

        if !result.success() {
            return Err(RuleLoadError::CommandFailed {
                status: result.status,
                message: result.diagnostic(),
            });
        }

        info!("audit rules loaded");
        Ok(())
    }
}
