//! Operator settings and daemon options loading

use std::path::{Path, PathBuf};

use auditd_core::{DaemonSpec, RawOptions};
use eyre::{WrapErr, bail};
use serde::{Deserialize, Serialize};

/// Environment variable naming the settings file
pub const SETTINGS_ENV: &str = "AUDITD_OPERATOR_SETTINGS";

/// Options file read when `--options` is not given
pub const DEFAULT_OPTIONS_FILE: &str = "/etc/auditd-operator/options.toml";

/// Top-level settings for auditd-operator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Where the managed daemon lives
    #[serde(default)]
    pub daemon: DaemonSpec,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Files shipped with the operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory holding `auditd.conf.tera`; the embedded template is used when unset
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
    /// Rule files copied into the daemon's rule directory on install
    #[serde(default = "default_rules_source_dir")]
    pub rules_source_dir: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            template_dir: None,
            rules_source_dir: default_rules_source_dir(),
        }
    }
}

fn default_rules_source_dir() -> PathBuf {
    PathBuf::from("/usr/share/auditd-operator/rules")
}

/// External command settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Seconds before a package, service or rule command is abandoned
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Prefix privileged commands with sudo
    #[serde(default)]
    pub use_sudo: bool,
    /// Refresh the package index before installing
    #[serde(default = "default_update_cache")]
    pub update_cache: bool,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            use_sudo: false,
            update_cache: default_update_cache(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_update_cache() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    /// JSON file holding the last reported status
    #[serde(default = "default_status_file")]
    pub file: PathBuf,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            file: default_status_file(),
        }
    }
}

fn default_status_file() -> PathBuf {
    PathBuf::from("/var/lib/auditd-operator/status.json")
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Settings {
    /// Load settings from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read settings {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .wrap_err_with(|| format!("failed to parse settings {}", path.display()))?;
        Ok(settings)
    }

    /// Settings file to use: `explicit`, then the environment, then the
    /// first default path that exists
    ///
    /// An explicitly named file is returned even if it does not exist.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(SETTINGS_ENV) {
            return Some(PathBuf::from(path));
        }

        let mut paths = vec![
            PathBuf::from("auditd-operator.toml"),
            PathBuf::from("/etc/auditd-operator/auditd-operator.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("auditd-operator/auditd-operator.toml"));
        }

        paths.into_iter().find(|path| path.exists())
    }
}

/// Read the options file and apply `key=value` overrides on top
///
/// A missing options file is only an error when it was named explicitly.
///
/// # Errors
/// Returns error if the file cannot be read or parsed, or an override is malformed
pub fn load_options(explicit: Option<&Path>, overrides: &[String]) -> eyre::Result<RawOptions> {
    let path = explicit.unwrap_or(Path::new(DEFAULT_OPTIONS_FILE));

    let mut options = match std::fs::read_to_string(path) {
        Ok(content) => parse_options(&content)
            .wrap_err_with(|| format!("failed to parse options {}", path.display()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && explicit.is_none() => {
            RawOptions::new()
        }
        Err(e) => {
            return Err(e).wrap_err_with(|| format!("failed to read options {}", path.display()));
        }
    };

    for raw in overrides {
        let (key, value) = parse_override(raw)?;
        options.insert(key, value);
    }
    Ok(options)
}

fn parse_options(content: &str) -> eyre::Result<RawOptions> {
    let table: toml::Table = toml::from_str(content)?;
    match serde_json::to_value(table)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => bail!("options must be a table"),
    }
}

/// `key=value`, the value read as a TOML scalar and kept as a string otherwise
fn parse_override(raw: &str) -> eyre::Result<(String, serde_json::Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("invalid override `{raw}`, expected key=value");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("invalid override `{raw}`, empty key");
    }

    let value = value.trim();
    let parsed = toml::from_str::<toml::Table>(&format!("v = {value}"))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .map_or_else(
            || Ok(serde_json::Value::String(value.to_string())),
            serde_json::to_value,
        )?;

    Ok((key.to_string(), parsed))
}
