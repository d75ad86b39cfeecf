//! Platform probe through `systemd-detect-virt`

use std::sync::Arc;

use async_trait::async_trait;
use auditd_exec::CommandExecutor;
use tracing::{debug, error, instrument};

use crate::error::ProbeError;
use crate::traits::PlatformProbe;
use crate::types::{CommandSettings, Virtualization};

/// Reports the virtualization type of the machine
pub struct SystemdDetectVirt {
    executor: Arc<dyn CommandExecutor>,
    settings: CommandSettings,
}

impl SystemdDetectVirt {
    pub fn new(executor: Arc<dyn CommandExecutor>, settings: CommandSettings) -> Self {
        Self { executor, settings }
    }
}

#[async_trait]
impl PlatformProbe for SystemdDetectVirt {
    #[instrument(skip(self))]
    async fn virtualization(&self) -> Result<Virtualization, ProbeError> {
        let result = self
            .executor
            .run_with_timeout("systemd-detect-virt", self.settings.timeout)
            .await
            .map_err(|e| ProbeError::ExecutionError(e.to_string()))?;

        // Bare metal prints "none" and exits 1, so the output decides, not the status
        let kind = result.stdout.trim();
        if kind.is_empty() {
            error!(status = result.status, stderr = %result.stderr, "failed to detect virtualization type");
            return Err(ProbeError::NoAnswer {
                status: result.status,
                message: result.diagnostic(),
            });
        }

        debug!(virtualization = %kind, "detected virtualization type");
        Ok(Virtualization::new(kind))
    }
}
