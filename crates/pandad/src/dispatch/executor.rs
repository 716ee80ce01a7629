//! Execution of planned backend calls under a failure policy.
//!
//! Every call owns one pre-assigned slot, so the order of outcomes always
//! matches the plan regardless of completion order. The deadline only gates
//! the issuing of calls: once a call is in flight it is awaited to the end.

use std::collections::BTreeMap;

use futures::future::join_all;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

use panda_config::{FailurePolicy, normalise_backend_name};

use crate::backends::BackendError;

use super::plan::PlannedCall;
use super::router::DISPATCH_TARGET;

/// Why a planned call was never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotAttempted {
    /// An earlier call failed under the fail-fast policy.
    Aborted,
    /// The request deadline elapsed first.
    DeadlineElapsed,
}

impl NotAttempted {
    /// Human-readable reason reported to callers.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Aborted => "an earlier backend call failed",
            Self::DeadlineElapsed => "request deadline elapsed",
        }
    }
}

/// Outcome of one response slot.
#[derive(Debug)]
pub enum SlotOutcome {
    /// The backend returned a receipt or proof.
    Succeeded(Value),
    /// The backend call failed.
    Failed(BackendError),
    /// The call was never issued.
    NotAttempted(NotAttempted),
}

/// Runs planned calls and collects one outcome per slot.
#[derive(Debug, Clone, Copy)]
pub struct Executor {
    policy: FailurePolicy,
    deadline: Option<Instant>,
}

impl Executor {
    /// Creates an executor. `deadline` of `None` never expires.
    #[must_use]
    pub const fn new(policy: FailurePolicy, deadline: Option<Instant>) -> Self {
        Self { policy, deadline }
    }

    /// Issues `calls` and returns their outcomes in slot order.
    pub async fn run(&self, calls: &[PlannedCall<'_>]) -> Vec<SlotOutcome> {
        match self.policy {
            FailurePolicy::FailFast => self.run_sequential(calls).await,
            FailurePolicy::ContinueOnError => self.run_lanes(calls).await,
        }
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    async fn run_sequential(&self, calls: &[PlannedCall<'_>]) -> Vec<SlotOutcome> {
        let mut outcomes = Vec::with_capacity(calls.len());
        let mut halted: Option<NotAttempted> = None;
        for call in calls {
            if halted.is_none() && self.expired() {
                halted = Some(NotAttempted::DeadlineElapsed);
            }
            if let Some(reason) = halted {
                outcomes.push(SlotOutcome::NotAttempted(reason));
                continue;
            }

            let outcome = issue(call).await;
            if matches!(outcome, SlotOutcome::Failed(_)) {
                halted = Some(NotAttempted::Aborted);
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    /// One lane per backend: sequential within a lane, lanes concurrent.
    async fn run_lanes(&self, calls: &[PlannedCall<'_>]) -> Vec<SlotOutcome> {
        let mut lanes: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (slot, call) in calls.iter().enumerate() {
            lanes
                .entry(normalise_backend_name(call.backend.name()))
                .or_default()
                .push(slot);
        }

        let lane_runs = lanes.into_values().map(|slots| async move {
            let mut finished = Vec::with_capacity(slots.len());
            for slot in slots {
                let outcome = match calls.get(slot) {
                    Some(_) if self.expired() => {
                        SlotOutcome::NotAttempted(NotAttempted::DeadlineElapsed)
                    }
                    Some(call) => issue(call).await,
                    None => continue,
                };
                finished.push((slot, outcome));
            }
            finished
        });

        let mut outcomes: Vec<SlotOutcome> = (0..calls.len())
            .map(|_| SlotOutcome::NotAttempted(NotAttempted::Aborted))
            .collect();
        for (slot, outcome) in join_all(lane_runs).await.into_iter().flatten() {
            if let Some(entry) = outcomes.get_mut(slot) {
                *entry = outcome;
            }
        }
        outcomes
    }
}

async fn issue(call: &PlannedCall<'_>) -> SlotOutcome {
    debug!(
        target: DISPATCH_TARGET,
        item = call.site.item,
        target_index = call.site.target,
        backend = call.backend.name(),
        "calling backend"
    );
    match call.invoke().await {
        Ok(value) => SlotOutcome::Succeeded(value),
        Err(error) => {
            warn!(
                target: DISPATCH_TARGET,
                item = call.site.item,
                target_index = call.site.target,
                backend = call.backend.name(),
                %error,
                "backend call failed"
            );
            SlotOutcome::Failed(error)
        }
    }
}
