//! auditd-core: lifecycle and reconciliation logic for auditd
//!
//! Validates options, renders the daemon config, synchronizes audit rules
//! and keeps the service running. [`OperatorActor`] feeds lifecycle events
//! to the [`Reconciler`] one at a time.

pub mod actor;
pub mod config;
pub mod error;
pub mod event;
pub mod message;
pub mod reconciler;
pub mod render;
pub mod rules;
pub mod service;
pub mod state;
pub mod status;

pub use actor::{OperatorActor, OperatorActorArgs};
pub use config::{
    AuditdConfig, DEFAULT_MAX_LOG_FILE, DEFAULT_NUM_LOGS, DaemonSpec, MAX_NUM_LOGS, MIN_NUM_LOGS,
    RawOptions, validate,
};
pub use error::{FieldViolation, OperatorError, RenderFailure, Severity, SyncFailure, ValidationFailure};
pub use event::{LifecycleEvent, UnknownEvent};
pub use message::{Dispatch, EventOutcome, GetStatus, StatusSnapshot};
pub use reconciler::{ReconcileReport, Reconciler};
pub use render::{CONFIG_TEMPLATE, TemplateRenderer, TeraRenderer};
pub use rules::RuleSynchronizer;
pub use service::ServiceController;
pub use state::ReconcileState;
pub use status::{
    FanoutReporter, JsonFileReporter, ReportError, StatusKind, StatusRecord, StatusReporter,
    TracingReporter, UnitStatus,
};
