//! Type definitions shared by the host collaborators

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How host commands are run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSettings {
    /// Prefix commands with sudo
    pub use_sudo: bool,
    /// Deadline for each command
    pub timeout: Duration,
}

impl CommandSettings {
    /// Create settings with the given timeout and no sudo
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            use_sudo: false,
            timeout,
        }
    }

    /// Prefix commands with sudo
    #[must_use]
    pub fn with_sudo(mut self, use_sudo: bool) -> Self {
        self.use_sudo = use_sudo;
        self
    }

    /// Build a command line with optional sudo
    #[must_use]
    pub fn command(&self, cmd: &str) -> String {
        if self.use_sudo {
            format!("sudo {cmd}")
        } else {
            cmd.to_string()
        }
    }
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

/// Ownership and permissions for a written file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    /// Unix permission bits
    pub mode: u32,
    /// Owning user; the file keeps the writer's identity when `None`
    pub owner: Option<String>,
}

impl FileSpec {
    /// File with the given mode, no ownership change
    #[must_use]
    pub fn with_mode(mode: u32) -> Self {
        Self { mode, owner: None }
    }

    /// Set the owning user (group follows the user's primary group)
    #[must_use]
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

/// Virtualization type reported by the platform probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Virtualization(String);

impl Virtualization {
    /// Linux containers share the host kernel's audit subsystem
    pub const LXC: &'static str = "lxc";

    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into().trim().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether auditd can run here
    #[must_use]
    pub fn supports_auditd(&self) -> bool {
        self.0 != Self::LXC
    }
}

impl std::fmt::Display for Virtualization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
