//! APT package manager (Debian/Ubuntu)

use std::sync::Arc;

use async_trait::async_trait;
use auditd_exec::{CommandExecutor, CommandResult};
use tracing::{debug, info, instrument};

use crate::error::PackageError;
use crate::traits::PackageManager;
use crate::types::CommandSettings;

/// APT package manager implementation
pub struct AptManager {
    /// Executor for running commands
    executor: Arc<dyn CommandExecutor>,
    settings: CommandSettings,
    /// Run `apt-get update` before installing
    update_cache: bool,
}

impl AptManager {
    /// Create a new APT manager
    ///
    /// # Arguments
    /// * `executor` - Executor for running apt commands
    /// * `settings` - sudo and timeout settings
    pub fn new(executor: Arc<dyn CommandExecutor>, settings: CommandSettings) -> Self {
        Self {
            executor,
            settings,
            update_cache: true,
        }
    }

    /// Skip refreshing the package index before installs
    #[must_use]
    pub fn without_cache_update(mut self) -> Self {
        self.update_cache = false;
        self
    }

    /// Build apt-get command with optional sudo and no prompts
    fn apt_cmd(&self, args: &str) -> String {
        self.settings
            .command(&format!("DEBIAN_FRONTEND=noninteractive apt-get {args}"))
    }

    async fn run(&self, cmd: &str) -> Result<CommandResult, PackageError> {
        self.executor
            .run_with_timeout(cmd, self.settings.timeout)
            .await
            .map_err(|e| PackageError::ExecutionError(e.to_string()))
    }

    /// Map a failed apt-get run to the most specific error
    fn classify_failure(name: &str, result: CommandResult) -> PackageError {
        let message = result.diagnostic();
        if message.contains("Could not get lock") {
            return PackageError::LockConflict(message);
        }
        if message.contains("Permission denied") || message.contains("are you root?") {
            return PackageError::PermissionDenied(message);
        }
        if message.contains("Unable to locate package") {
            return PackageError::PackageNotFound(name.to_string());
        }
        PackageError::CommandFailed {
            status: result.status,
            message,
        }
    }

    /// `dpkg-query` prints `install ok installed` for a fully installed package
    fn parse_status(output: &str) -> bool {
        output.trim() == "install ok installed"
    }
}

#[async_trait]
impl PackageManager for AptManager {
    #[instrument(skip(self))]
    async fn add_package(&self, name: &str) -> Result<(), PackageError> {
        if self.update_cache {
            debug!("updating package index");
            let result = self.run(&self.apt_cmd("update -qq")).await?;
            if !result.success() {
                return Err(PackageError::RepositoryUnavailable(result.diagnostic()));
            }
        }

        info!(package = %name, "installing package");
        let result = self.run(&self.apt_cmd(&format!("install -y {name}"))).await?;
        if !result.success() {
            return Err(Self::classify_failure(name, result));
        }

        info!(package = %name, "package installed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_package(&self, name: &str) -> Result<(), PackageError> {
        info!(package = %name, "removing package");
        let result = self.run(&self.apt_cmd(&format!("remove -y {name}"))).await?;
        if !result.success() {
            return Err(Self::classify_failure(name, result));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn is_installed(&self, name: &str) -> Result<bool, PackageError> {
        let cmd = format!("dpkg-query -W -f='${{Status}}' {name}");
        let result = self.run(&cmd).await?;

        // dpkg-query exits 1 for unknown packages
        Ok(result.success() && Self::parse_status(&result.stdout))
    }
}
