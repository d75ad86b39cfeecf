//! Lifecycle events consumed by the operator

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An event the host framework delivers to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleEvent {
    Install,
    Upgrade,
    ConfigChanged,
    UpdateStatus,
    Remove,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 5] = [
        LifecycleEvent::Install,
        LifecycleEvent::Upgrade,
        LifecycleEvent::ConfigChanged,
        LifecycleEvent::UpdateStatus,
        LifecycleEvent::Remove,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleEvent::Install => "install",
            LifecycleEvent::Upgrade => "upgrade",
            LifecycleEvent::ConfigChanged => "config-changed",
            LifecycleEvent::UpdateStatus => "update-status",
            LifecycleEvent::Remove => "remove",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown event name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown lifecycle event `{0}`")]
pub struct UnknownEvent(pub String);

impl FromStr for LifecycleEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept hook names with underscores too (config_changed)
        let normalized = s.trim().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == normalized)
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}
