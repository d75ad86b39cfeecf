//! `ServiceController`: the auditd package, service and config file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use auditd_host::{FileSpec, FileStore, PackageManager, ServiceManager};
use tracing::{error, info, instrument, warn};

use crate::config::DaemonSpec;
use crate::error::OperatorError;
use crate::rules::RuleSynchronizer;

/// Wraps the package and service collaborators for one daemon and
/// translates their failures into [`OperatorError`].
pub struct ServiceController {
    spec: DaemonSpec,
    packages: Arc<dyn PackageManager>,
    services: Arc<dyn ServiceManager>,
    store: Arc<dyn FileStore>,
    rules: RuleSynchronizer,
    /// Packaged rule files copied on install
    rules_source: PathBuf,
}

impl ServiceController {
    /// Config file: owner and group may read and write
    pub const CONFIG_FILE_MODE: u32 = 0o640;

    pub fn new(
        spec: DaemonSpec,
        packages: Arc<dyn PackageManager>,
        services: Arc<dyn ServiceManager>,
        store: Arc<dyn FileStore>,
        rules: RuleSynchronizer,
        rules_source: impl Into<PathBuf>,
    ) -> Self {
        Self {
            spec,
            packages,
            services,
            store,
            rules,
            rules_source: rules_source.into(),
        }
    }

    #[must_use]
    pub fn spec(&self) -> &DaemonSpec {
        &self.spec
    }

    #[must_use]
    pub fn config_file(&self) -> &Path {
        &self.spec.config_file
    }

    /// Install the package, then synchronize the audit rules
    ///
    /// # Errors
    /// `OperatorError::Install` if the package manager fails,
    /// `OperatorError::Sync` if the rules cannot be copied or reloaded
    #[instrument(skip(self), fields(package = %self.spec.package))]
    pub async fn install(&self) -> Result<(), OperatorError> {
        let upgrade = self.is_installed().await;
        info!(upgrade, "installing package");
        self.packages
            .add_package(&self.spec.package)
            .await
            .map_err(|cause| {
                error!(
                    error = %cause,
                    retryable = cause.is_retryable(),
                    needs_sudo = cause.needs_sudo(),
                    "package install failed"
                );
                OperatorError::Install {
                    package: self.spec.package.clone(),
                    cause,
                }
            })?;

        let copied = self.rules.sync(&self.rules_source).await?;
        info!(rules = copied, "auditd installed");
        Ok(())
    }

    /// # Errors
    /// `OperatorError::Remove` if the package manager fails
    #[instrument(skip(self), fields(package = %self.spec.package))]
    pub async fn remove(&self) -> Result<(), OperatorError> {
        self.packages
            .remove_package(&self.spec.package)
            .await
            .map_err(|cause| OperatorError::Remove {
                package: self.spec.package.clone(),
                cause,
            })
    }

    /// # Errors
    /// `OperatorError::Restart` carrying the service manager's error
    #[instrument(skip(self), fields(service = %self.spec.service))]
    pub async fn restart(&self) -> Result<(), OperatorError> {
        self.services
            .restart_service(&self.spec.service)
            .await
            .map_err(|cause| OperatorError::Restart {
                service: self.spec.service.clone(),
                cause,
            })
    }

    /// Whether the daemon is running; a failed query counts as not running
    pub async fn is_active(&self) -> bool {
        match self.services.is_running(&self.spec.service).await {
            Ok(running) => running,
            Err(e) => {
                warn!(service = %self.spec.service, error = %e, "failed to query service state");
                false
            }
        }
    }

    /// Whether the package is installed; a failed query counts as not installed
    pub async fn is_installed(&self) -> bool {
        match self.packages.is_installed(&self.spec.package).await {
            Ok(installed) => installed,
            Err(e) => {
                warn!(package = %self.spec.package, error = %e, "failed to query package state");
                false
            }
        }
    }

    /// Current config file bytes, `None` before the first write
    ///
    /// The content is not decoded; a file that is not UTF-8 simply differs
    /// from any render.
    ///
    /// # Errors
    /// `OperatorError::Read` if the file exists but cannot be read
    pub fn read_config(&self) -> Result<Option<Vec<u8>>, OperatorError> {
        self.store
            .read_optional(&self.spec.config_file)
            .map_err(|e| OperatorError::Read {
                path: self.spec.config_file.clone(),
                message: e.to_string(),
            })
    }

    /// # Errors
    /// `OperatorError::Write` if the file cannot be written
    pub fn write_config(&self, content: &str) -> Result<(), OperatorError> {
        let spec = FileSpec {
            mode: Self::CONFIG_FILE_MODE,
            owner: self.spec.owner.clone(),
        };
        self.store
            .write(&self.spec.config_file, content.as_bytes(), &spec)
            .map_err(|e| OperatorError::Write {
                path: self.spec.config_file.clone(),
                message: e.to_string(),
            })
    }
}
