//! Host collaborator traits

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{FsError, PackageError, ProbeError, RuleLoadError, ServiceError};
use crate::types::{FileSpec, Virtualization};

/// Installs and removes system packages
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Install a package; installing an already-installed package succeeds
    async fn add_package(&self, name: &str) -> Result<(), PackageError>;

    /// Remove a package
    async fn remove_package(&self, name: &str) -> Result<(), PackageError>;

    /// Whether the package is currently installed
    async fn is_installed(&self, name: &str) -> Result<bool, PackageError>;
}

/// Controls system services
#[async_trait]
pub trait ServiceManager: Send + Sync {
    async fn restart_service(&self, name: &str) -> Result<(), ServiceError>;

    /// Whether the service is running right now
    async fn is_running(&self, name: &str) -> Result<bool, ServiceError>;
}

/// Loads the rule files under the daemon's rule directory into the kernel
#[async_trait]
pub trait RuleLoader: Send + Sync {
    async fn reload(&self) -> Result<(), RuleLoadError>;
}

/// Classifies the execution environment
#[async_trait]
pub trait PlatformProbe: Send + Sync {
    async fn virtualization(&self) -> Result<Virtualization, ProbeError>;
}

/// File access for the config file, rule directory and status file
pub trait FileStore: Send + Sync {
    /// Read a file's bytes; `Ok(None)` when it does not exist
    fn read_optional(&self, path: &Path) -> Result<Option<Vec<u8>>, FsError>;

    /// Read a file's bytes
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, FsError>;

    /// Replace the file's content, then apply mode and owner
    fn write(&self, path: &Path, content: &[u8], spec: &FileSpec) -> Result<(), FsError>;

    /// Regular files directly under `dir`, sorted by name
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError>;
}
