//! auditd-exec: Command execution abstraction
//!
//! Provides the `CommandExecutor` trait and a local implementation that runs
//! shell commands under a deadline. Every host collaborator in
//! `auditd-host` goes through this seam so tests can substitute a mock.

pub mod error;
pub mod local;
pub mod result;
pub mod traits;

pub use error::ExecError;
pub use local::LocalExecutor;
pub use result::CommandResult;
pub use traits::CommandExecutor;
