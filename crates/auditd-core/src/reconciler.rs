//! `Reconciler`: lifecycle paths and the reconciliation state machine

use std::sync::{Arc, Mutex};

use auditd_host::PlatformProbe;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{RawOptions, validate};
use crate::error::OperatorError;
use crate::event::LifecycleEvent;
use crate::message::EventOutcome;
use crate::render::TemplateRenderer;
use crate::service::ServiceController;
use crate::state::ReconcileState;
use crate::status::{
    CONFIGURE_FAILED, INSTALLING, INVALID_CONFIG, REMOVING, RENDER_FAILED, StatusReporter,
    UnitStatus,
};

/// What one reconciliation pass did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub status: UnitStatus,
    /// Whether the config file was (re)written
    pub config_written: bool,
    /// Restarts issued, never more than one
    pub restarts: u32,
    /// States visited, starting at `Idle`
    pub trace: Vec<ReconcileState>,
    /// Cause chain of the failure that blocked the pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Bookkeeping for a single pass
struct Pass {
    state: ReconcileState,
    trace: Vec<ReconcileState>,
    config_written: bool,
    restarts: u32,
}

impl Pass {
    fn new() -> Self {
        Self {
            state: ReconcileState::Idle,
            trace: vec![ReconcileState::Idle],
            config_written: false,
            restarts: 0,
        }
    }

    fn transition_to(&mut self, next: ReconcileState) -> Result<(), OperatorError> {
        if !self.state.can_transition_to(next) {
            return Err(OperatorError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.enter(next);
        Ok(())
    }

    /// Failure exit, reachable from every state an error can occur in
    fn block(&mut self) {
        if self.state != ReconcileState::Blocked {
            self.enter(ReconcileState::Blocked);
        }
    }

    fn enter(&mut self, next: ReconcileState) {
        info!(from = %self.state, to = %next, "state transition");
        self.state = next;
        self.trace.push(next);
    }

    fn finish(self, status: UnitStatus, failure: Option<String>) -> ReconcileReport {
        ReconcileReport {
            status,
            config_written: self.config_written,
            restarts: self.restarts,
            trace: self.trace,
            failure,
        }
    }
}

/// Status message for a failure that blocked a pass
fn blocked_message(error: &OperatorError) -> &'static str {
    match error {
        OperatorError::Validation(_) => INVALID_CONFIG,
        OperatorError::Render(_) => RENDER_FAILED,
        _ => CONFIGURE_FAILED,
    }
}

/// Byte comparison; whitespace around the content is not significant
fn same_content(current: Option<&[u8]>, rendered: &str) -> bool {
    current.is_some_and(|current| current.trim_ascii() == rendered.trim().as_bytes())
}

/// Drives one daemon through its lifecycle events
pub struct Reconciler {
    renderer: Arc<dyn TemplateRenderer>,
    service: ServiceController,
    probe: Arc<dyn PlatformProbe>,
    reporter: Arc<dyn StatusReporter>,
    /// Last status handed to the reporter
    reported: Mutex<Option<UnitStatus>>,
}

impl Reconciler {
    pub fn new(
        renderer: Arc<dyn TemplateRenderer>,
        service: ServiceController,
        probe: Arc<dyn PlatformProbe>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        Self {
            renderer,
            service,
            probe,
            reporter,
            reported: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn service(&self) -> &ServiceController {
        &self.service
    }

    /// The status most recently reported, including one reported by an
    /// event that later failed
    #[must_use]
    pub fn last_reported(&self) -> Option<UnitStatus> {
        self.reported.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Handle one lifecycle event and report the resulting status
    ///
    /// # Errors
    /// Install, remove and rule sync failures are returned, as is
    /// `OperatorError::PlatformUnsupported` for an install the platform
    /// cannot run. Reconciliation failures never error; they end `Blocked`.
    pub async fn handle(
        &self,
        event: LifecycleEvent,
        raw: &RawOptions,
    ) -> Result<EventOutcome, OperatorError> {
        info!(%event, "handling lifecycle event");

        match event {
            LifecycleEvent::Install => {
                let status = self.install(event).await?;
                Ok(EventOutcome::new(event, Some(status), None))
            }
            LifecycleEvent::Remove => {
                let status = self.remove(event).await?;
                Ok(EventOutcome::new(event, status, None))
            }
            LifecycleEvent::Upgrade | LifecycleEvent::ConfigChanged | LifecycleEvent::UpdateStatus => {
                let report = self.reconcile(raw).await;
                self.report(event, &report.status);
                Ok(EventOutcome::new(event, Some(report.status.clone()), Some(report)))
            }
        }
    }

    /// Run one reconciliation pass.
    ///
    /// Every failure inside the pass ends it `Blocked`; the detailed cause is
    /// logged and kept in the report, the status message stays generic.
    pub async fn reconcile(&self, raw: &RawOptions) -> ReconcileReport {
        let mut pass = Pass::new();

        match self.run_pass(&mut pass, raw).await {
            Ok(()) => pass.finish(UnitStatus::Active, None),
            Err(e) => {
                let failure = e.chain();
                error!(state = %pass.state, error = %failure, "reconciliation blocked");
                pass.block();
                pass.finish(UnitStatus::blocked(blocked_message(&e)), Some(failure))
            }
        }
    }

    async fn run_pass(&self, pass: &mut Pass, raw: &RawOptions) -> Result<(), OperatorError> {
        use ReconcileState::{
            Active, Comparing, LivenessChecking, Rendering, Restarting, Unchanged, Validating,
            Writing,
        };

        pass.transition_to(Validating)?;
        let config = validate(raw)?;

        pass.transition_to(Rendering)?;
        let rendered = self.renderer.render(&config)?;

        pass.transition_to(Comparing)?;
        let current = self.service.read_config()?;

        if same_content(current.as_deref(), &rendered) {
            pass.transition_to(Unchanged)?;
            pass.transition_to(LivenessChecking)?;
            if !self.service.is_active().await {
                warn!(service = %self.service.spec().service, "service inactive, restarting");
                pass.transition_to(Restarting)?;
                self.restart(pass).await?;
            }
            return pass.transition_to(Active);
        }

        pass.transition_to(Writing)?;
        let mut content = rendered.trim().to_string();
        content.push('\n');
        self.service.write_config(&content)?;
        pass.config_written = true;
        info!(path = %self.service.config_file().display(), "config file updated");

        pass.transition_to(Restarting)?;
        self.restart(pass).await?;

        // The restart above is the only one this pass may issue
        pass.transition_to(LivenessChecking)?;
        if !self.service.is_active().await {
            return Err(OperatorError::NotActive {
                service: self.service.spec().service.clone(),
            });
        }
        pass.transition_to(Active)
    }

    async fn restart(&self, pass: &mut Pass) -> Result<(), OperatorError> {
        pass.restarts += 1;
        self.service.restart().await
    }

    async fn install(&self, event: LifecycleEvent) -> Result<UnitStatus, OperatorError> {
        let virtualization = self
            .probe
            .virtualization()
            .await
            .map_err(OperatorError::Probe)?;

        if !virtualization.supports_auditd() {
            error!(%virtualization, "refusing to install auditd");
            return Err(OperatorError::PlatformUnsupported {
                virtualization: virtualization.to_string(),
            });
        }

        let status = UnitStatus::maintenance(INSTALLING);
        self.report(event, &status);
        self.service.install().await?;
        Ok(status)
    }

    async fn remove(&self, event: LifecycleEvent) -> Result<Option<UnitStatus>, OperatorError> {
        let virtualization = self
            .probe
            .virtualization()
            .await
            .map_err(OperatorError::Probe)?;

        if !virtualization.supports_auditd() {
            warn!(%virtualization, "auditd was never installed on this platform, nothing to remove");
            return Ok(None);
        }

        let status = UnitStatus::maintenance(REMOVING);
        self.report(event, &status);
        self.service.remove().await?;
        Ok(Some(status))
    }

    /// Reporting is best effort: a lost status never fails the event
    fn report(&self, event: LifecycleEvent, status: &UnitStatus) {
        *self.reported.lock().unwrap_or_else(|e| e.into_inner()) = Some(status.clone());
        if let Err(e) = self.reporter.report(event, status) {
            error!(%event, %status, error = %e, "failed to report status");
        }
    }
}
