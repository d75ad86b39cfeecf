//! `OperatorActor`: the sequential event queue
//!
//! The actor's mailbox serializes lifecycle events, so at most one
//! reconciliation is ever in flight.

use chrono::{DateTime, Utc};
use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tracing::{error, info};

use crate::error::OperatorError;
use crate::event::LifecycleEvent;
use crate::message::{Dispatch, EventOutcome, GetStatus, StatusSnapshot};
use crate::reconciler::Reconciler;
use crate::status::UnitStatus;

/// Arguments for spawning an `OperatorActor`
pub struct OperatorActorArgs {
    pub reconciler: Reconciler,
}

/// Owns the reconciler and remembers the last reported status
pub struct OperatorActor {
    reconciler: Reconciler,
    last_status: Option<UnitStatus>,
    last_event: Option<LifecycleEvent>,
    last_handled: Option<DateTime<Utc>>,
    events_handled: u64,
}

impl Actor for OperatorActor {
    type Args = OperatorActorArgs;
    type Error = OperatorError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        info!(
            id = %actor_ref.id(),
            service = %args.reconciler.service().spec().service,
            "OperatorActor starting"
        );

        Ok(Self {
            reconciler: args.reconciler,
            last_status: None,
            last_event: None,
            last_handled: None,
            events_handled: 0,
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        info!(
            reason = ?reason,
            events_handled = self.events_handled,
            "OperatorActor stopping"
        );
        Ok(())
    }
}

impl Message<Dispatch> for OperatorActor {
    type Reply = Result<EventOutcome, OperatorError>;

    async fn handle(&mut self, msg: Dispatch, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let result = self.reconciler.handle(msg.event, &msg.options).await;

        self.events_handled += 1;
        self.last_event = Some(msg.event);
        self.last_handled = Some(Utc::now());
        // A failed install or removal may already have reported maintenance
        if let Some(status) = self.reconciler.last_reported() {
            self.last_status = Some(status);
        }

        if let Err(e) = &result {
            error!(event = %msg.event, fatal = e.is_fatal(), error = %e.chain(), "event failed");
        }

        result
    }
}

impl Message<GetStatus> for OperatorActor {
    type Reply = StatusSnapshot;

    async fn handle(
        &mut self,
        _msg: GetStatus,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        StatusSnapshot {
            status: self.last_status.clone(),
            last_event: self.last_event,
            last_handled: self.last_handled,
            events_handled: self.events_handled,
        }
    }
}
