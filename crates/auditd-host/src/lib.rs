//! auditd-host: Host operating system collaborators
//!
//! Traits for the package manager, service manager, audit rule loader,
//! platform probe and filesystem, plus the implementations used on a real
//! Debian/Ubuntu machine (apt, systemctl, augenrules, systemd-detect-virt).

pub mod apt;
pub mod augenrules;
pub mod error;
pub mod fs;
pub mod systemd;
pub mod traits;
pub mod types;
pub mod virt;

#[cfg(test)]
mod test_support;

pub use apt::AptManager;
pub use augenrules::AugenrulesLoader;
pub use error::{FsError, PackageError, ProbeError, RuleLoadError, ServiceError};
pub use fs::HostFs;
pub use systemd::SystemctlManager;
pub use traits::{FileStore, PackageManager, PlatformProbe, RuleLoader, ServiceManager};
pub use types::{CommandSettings, FileSpec, Virtualization};
pub use virt::SystemdDetectVirt;
