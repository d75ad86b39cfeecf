//! Message types for actor communication
//!
//! Message handlers are implemented in the actor module.

use chrono::{DateTime, Utc};
use kameo_macros::Reply;
use serde::Serialize;

use crate::config::RawOptions;
use crate::event::LifecycleEvent;
use crate::reconciler::ReconcileReport;
use crate::status::UnitStatus;

/// Handle a lifecycle event with the options in effect for it
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub event: LifecycleEvent,
    pub options: RawOptions,
}

impl Dispatch {
    pub fn new(event: LifecycleEvent, options: RawOptions) -> Self {
        Self { event, options }
    }
}

/// Result of a handled event
#[derive(Debug, Clone, Serialize, Reply)]
pub struct EventOutcome {
    pub event: LifecycleEvent,
    /// Last status reported for the event, `None` if nothing was reported
    pub status: Option<UnitStatus>,
    /// Present for events answered by reconciliation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReconcileReport>,
}

impl EventOutcome {
    pub fn new(
        event: LifecycleEvent,
        status: Option<UnitStatus>,
        report: Option<ReconcileReport>,
    ) -> Self {
        Self {
            event,
            status,
            report,
        }
    }
}

/// Get the status of the last handled event
#[derive(Debug)]
pub struct GetStatus;

/// Snapshot of the operator
#[derive(Debug, Clone, Serialize, Reply)]
pub struct StatusSnapshot {
    pub status: Option<UnitStatus>,
    pub last_event: Option<LifecycleEvent>,
    pub last_handled: Option<DateTime<Utc>>,
    /// Events handled since the actor started, failed ones included
    pub events_handled: u64,
}
