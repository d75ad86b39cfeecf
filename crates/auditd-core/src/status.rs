//! Unit status and how it reaches the outside world

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use auditd_host::{FileSpec, FileStore, FsError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::event::LifecycleEvent;

pub const INVALID_CONFIG: &str = "Invalid config. Please check the operator log.";
pub const RENDER_FAILED: &str = "Failed to render auditd config. Please check the operator log.";
pub const CONFIGURE_FAILED: &str = "Failed to configure and restart auditd.";
pub const INSTALLING: &str = "Installing or upgrading auditd package.";
pub const REMOVING: &str = "Removing auditd package.";

/// Externally visible outcome of an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum UnitStatus {
    Active,
    Blocked(String),
    Maintenance(String),
}

impl UnitStatus {
    pub fn blocked(message: impl Into<String>) -> Self {
        UnitStatus::Blocked(message.into())
    }

    pub fn maintenance(message: impl Into<String>) -> Self {
        UnitStatus::Maintenance(message.into())
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, UnitStatus::Active)
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            UnitStatus::Active => None,
            UnitStatus::Blocked(m) | UnitStatus::Maintenance(m) => Some(m),
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Active => f.write_str("active"),
            UnitStatus::Blocked(m) => write!(f, "blocked: {m}"),
            UnitStatus::Maintenance(m) => write!(f, "maintenance: {m}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("failed to encode status: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Receives every status the operator sets
pub trait StatusReporter: Send + Sync {
    /// # Errors
    /// Returns `ReportError` if the status could not be delivered
    fn report(&self, event: LifecycleEvent, status: &UnitStatus) -> Result<(), ReportError>;
}

/// Logs statuses
#[derive(Debug, Default)]
pub struct TracingReporter;

impl StatusReporter for TracingReporter {
    fn report(&self, event: LifecycleEvent, status: &UnitStatus) -> Result<(), ReportError> {
        match status {
            UnitStatus::Blocked(message) => warn!(%event, %message, "unit blocked"),
            _ => info!(%event, %status, "unit status"),
        }
        Ok(())
    }
}

/// Status kind without its message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Active,
    Blocked,
    Maintenance,
}

/// Status file content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: StatusKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub event: LifecycleEvent,
    pub updated_at: DateTime<Utc>,
}

impl StatusRecord {
    pub fn new(event: LifecycleEvent, status: &UnitStatus) -> Self {
        let kind = match status {
            UnitStatus::Active => StatusKind::Active,
            UnitStatus::Blocked(_) => StatusKind::Blocked,
            UnitStatus::Maintenance(_) => StatusKind::Maintenance,
        };
        Self {
            status: kind,
            message: status.message().map(str::to_string),
            event,
            updated_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn unit_status(&self) -> UnitStatus {
        let message = self.message.clone().unwrap_or_default();
        match self.status {
            StatusKind::Active => UnitStatus::Active,
            StatusKind::Blocked => UnitStatus::Blocked(message),
            StatusKind::Maintenance => UnitStatus::Maintenance(message),
        }
    }

    /// Read the last record; `Ok(None)` before the first event
    ///
    /// # Errors
    /// Returns `ReportError` if the file exists but cannot be read or decoded
    pub fn load(store: &dyn FileStore, path: &Path) -> Result<Option<Self>, ReportError> {
        match store.read_optional(path)? {
            Some(content) => Ok(Some(serde_json::from_slice(&content)?)),
            None => Ok(None),
        }
    }
}

/// Writes the latest status as JSON for an external observer
pub struct JsonFileReporter {
    store: Arc<dyn FileStore>,
    path: PathBuf,
}

impl JsonFileReporter {
    pub fn new(store: Arc<dyn FileStore>, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }
}

impl StatusReporter for JsonFileReporter {
    fn report(&self, event: LifecycleEvent, status: &UnitStatus) -> Result<(), ReportError> {
        let record = StatusRecord::new(event, status);
        let mut content = serde_json::to_vec_pretty(&record)?;
        content.push(b'\n');
        self.store
            .write(&self.path, &content, &FileSpec::with_mode(0o644))?;
        Ok(())
    }
}

/// Sends each status to several reporters; all are tried even if one fails
#[derive(Default)]
pub struct FanoutReporter {
    reporters: Vec<Arc<dyn StatusReporter>>,
}

impl FanoutReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, reporter: Arc<dyn StatusReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }
}

impl StatusReporter for FanoutReporter {
    fn report(&self, event: LifecycleEvent, status: &UnitStatus) -> Result<(), ReportError> {
        let mut first_error = None;
        for reporter in &self.reporters {
            if let Err(e) = reporter.report(event, status) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditd_host::HostFs;

    #[test]
    fn test_status_json_shape() {
        let json = serde_json::to_value(UnitStatus::blocked(CONFIGURE_FAILED)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "blocked", "message": CONFIGURE_FAILED })
        );

        let json = serde_json::to_value(UnitStatus::Active).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "active" }));
    }

    #[test]
    fn test_json_file_reporter_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("status.json");
        let store: Arc<dyn FileStore> = Arc::new(HostFs::new());

        assert!(StatusRecord::load(store.as_ref(), &path).unwrap().is_none());

        let reporter = JsonFileReporter::new(store.clone(), &path);
        reporter
            .report(LifecycleEvent::Install, &UnitStatus::maintenance(INSTALLING))
            .unwrap();
        reporter
            .report(LifecycleEvent::ConfigChanged, &UnitStatus::Active)
            .unwrap();

        let record = StatusRecord::load(store.as_ref(), &path).unwrap().unwrap();
        assert_eq!(record.unit_status(), UnitStatus::Active);
        assert!(record.message.is_none());
        assert_eq!(record.event, LifecycleEvent::ConfigChanged);
    }

    #[test]
    fn test_fanout_reaches_every_reporter() {
        struct Failing;
        impl StatusReporter for Failing {
            fn report(&self, _: LifecycleEvent, _: &UnitStatus) -> Result<(), ReportError> {
                Err(ReportError::Fs(FsError::UnknownOwner("nobody".to_string())))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        let store: Arc<dyn FileStore> = Arc::new(HostFs::new());

        let fanout = FanoutReporter::new()
            .with(Arc::new(Failing))
            .with(Arc::new(JsonFileReporter::new(store.clone(), &path)));

        assert!(fanout.report(LifecycleEvent::UpdateStatus, &UnitStatus::Active).is_err());
        assert!(path.exists());
    }
}
