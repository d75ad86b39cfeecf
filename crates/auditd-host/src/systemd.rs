//! systemd service manager

use std::sync::Arc;

use async_trait::async_trait;
use auditd_exec::CommandExecutor;
use tracing::{info, instrument};

use crate::error::ServiceError;
use crate::traits::ServiceManager;
use crate::types::CommandSettings;

/// Service manager backed by `systemctl`
pub struct SystemctlManager {
    executor: Arc<dyn CommandExecutor>,
    settings: CommandSettings,
}

impl SystemctlManager {
    pub fn new(executor: Arc<dyn CommandExecutor>, settings: CommandSettings) -> Self {
        Self { executor, settings }
    }
}

#[async_trait]
impl ServiceManager for SystemctlManager {
    #[instrument(skip(self))]
    async fn restart_service(&self, name: &str) -> Result<(), ServiceError> {
        let cmd = self.settings.command(&format!("systemctl restart {name}"));
        let result = self
            .executor
            .run_with_timeout(&cmd, self.settings.timeout)
            .await
            .map_err(|e| ServiceError::ExecutionError(e.to_string()))?;

        if !result.success() {
            return Err(ServiceError::CommandFailed {
                action: "restart".to_string(),
                service: name.to_string(),
                status: result.status,
                message: result.diagnostic(),
            });
        }

        info!(service = %name, "service restarted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn is_running(&self, name: &str) -> Result<bool, ServiceError> {
        // is-active needs no privileges
        let cmd = format!("systemctl --quiet is-active {name}");
        let result = self
            .executor
            .run_with_timeout(&cmd, self.settings.timeout)
            .await
            .map_err(|e| ServiceError::ExecutionError(e.to_string()))?;

        Ok(result.success())
    }
}
