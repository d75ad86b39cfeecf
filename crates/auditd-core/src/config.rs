//! Configuration types: the daemon options and where the daemon lives
//!
//! [`validate`] turns untyped options into an [`AuditdConfig`]. Nothing here
//! is persisted; the options are validated again on every reconciliation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{FieldViolation, ValidationFailure};

/// Lowest accepted `num_logs`
pub const MIN_NUM_LOGS: i64 = 0;
/// Highest accepted `num_logs`
pub const MAX_NUM_LOGS: i64 = 999;

pub const DEFAULT_NUM_LOGS: i64 = 10;
/// Megabytes
pub const DEFAULT_MAX_LOG_FILE: i64 = 512;

/// Untyped options as supplied by the operator
pub type RawOptions = serde_json::Map<String, Value>;

/// Validated auditd options, also the template context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuditdConfig {
    /// Number of rotated log files to keep
    pub num_logs: i64,
    /// Size of one log file in megabytes, deliberately unbounded
    pub max_log_file: i64,
}

impl Default for AuditdConfig {
    fn default() -> Self {
        Self {
            num_logs: DEFAULT_NUM_LOGS,
            max_log_file: DEFAULT_MAX_LOG_FILE,
        }
    }
}

const KNOWN_OPTIONS: [&str; 2] = ["num_logs", "max_log_file"];

/// Validate raw options.
///
/// Missing options take their defaults and unknown options are ignored.
/// Every violated field is reported, and a violation is never clamped into
/// range.
///
/// # Errors
/// Returns `ValidationFailure` if any option is not an integer or `num_logs`
/// is outside `[MIN_NUM_LOGS, MAX_NUM_LOGS]`.
pub fn validate(raw: &RawOptions) -> Result<AuditdConfig, ValidationFailure> {
    for key in raw.keys().filter(|k| !KNOWN_OPTIONS.contains(&k.as_str())) {
        warn!(option = %key, "ignoring unknown option");
    }

    let mut violations = Vec::new();
    let mut config = AuditdConfig::default();

    match integer_option(raw, "num_logs") {
        Ok(Some(value)) => match check_num_logs(value) {
            Ok(()) => config.num_logs = value,
            Err(reason) => violations.push(violation("num_logs", reason)),
        },
        Ok(None) => {}
        Err(reason) => violations.push(violation("num_logs", reason)),
    }

    match integer_option(raw, "max_log_file") {
        Ok(Some(value)) => config.max_log_file = value,
        Ok(None) => {}
        Err(reason) => violations.push(violation("max_log_file", reason)),
    }

    if violations.is_empty() {
        Ok(config)
    } else {
        Err(ValidationFailure { violations })
    }
}

fn violation(field: &str, reason: String) -> FieldViolation {
    FieldViolation {
        field: field.to_string(),
        reason,
    }
}

fn check_num_logs(value: i64) -> Result<(), String> {
    if value < MIN_NUM_LOGS {
        return Err(format!("'num_logs' cannot be less than {MIN_NUM_LOGS}."));
    }
    if value > MAX_NUM_LOGS {
        return Err(format!("'num_logs' cannot be larger than {MAX_NUM_LOGS}."));
    }
    Ok(())
}

/// `Ok(None)` for a missing or null option
fn integer_option(raw: &RawOptions, name: &str) -> Result<Option<i64>, String> {
    match raw.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_i64() {
                Ok(Some(v))
            } else if n.as_u64().is_some() {
                Err(format!("'{name}' is out of range."))
            } else {
                Err(format!("'{name}' must be an integer, got {n}."))
            }
        }
        Some(other) => Err(format!("'{name}' must be an integer, got {other}.")),
    }
}

/// Where the managed daemon lives on the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonSpec {
    /// Package providing the daemon
    #[serde(default = "default_package")]
    pub package: String,
    /// systemd unit name
    #[serde(default = "default_service")]
    pub service: String,
    /// Daemon configuration file
    #[serde(default = "default_config_file")]
    pub config_file: PathBuf,
    /// Directory `augenrules` merges rule files from
    #[serde(default = "default_rules_dir")]
    pub rules_dir: PathBuf,
    /// Owner of written files; `None` keeps the writer's identity
    #[serde(default = "default_owner")]
    pub owner: Option<String>,
}

fn default_package() -> String {
    "auditd".to_string()
}

fn default_service() -> String {
    "auditd".to_string()
}

fn default_config_file() -> PathBuf {
    PathBuf::from("/etc/audit/auditd.conf")
}

fn default_rules_dir() -> PathBuf {
    PathBuf::from("/etc/audit/rules.d")
}

#[allow(clippy::unnecessary_wraps)]
fn default_owner() -> Option<String> {
    Some("root".to_string())
}

impl Default for DaemonSpec {
    fn default() -> Self {
        Self {
            package: default_package(),
            service: default_service(),
            config_file: default_config_file(),
            rules_dir: default_rules_dir(),
            owner: default_owner(),
        }
    }
}
