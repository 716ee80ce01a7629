//! Method routing and response assembly.
//!
//! [`Dispatcher::dispatch`] is the whole request lifecycle: parse the
//! envelope, route by method, plan and execute backend calls, and fold the
//! slot outcomes into a response. It never fails; every problem becomes a
//! JSON-RPC error object carrying the caller's `id`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::Instant;
use tracing::{debug, warn};

use panda_config::FailurePolicy;

use crate::backends::BackendRegistry;

use super::errors::{DispatchError, FailedCall, PendingCall};
use super::executor::{Executor, NotAttempted, SlotOutcome};
use super::params::{proof_queries, submit_items};
use super::plan::{PlannedCall, plan_proof, plan_submit};
use super::request::RequestEnvelope;
use super::response::{RequestId, RpcResponse};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Methods served by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Post payloads to their targets.
    SubmitBlob,
    /// Fetch inclusion proofs.
    GetProof,
}

impl Method {
    /// Looks a method up by its wire name. Names are case-sensitive.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "panda.submitBlob" => Some(Self::SubmitBlob),
            "panda.getProof" => Some(Self::GetProof),
            _ => None,
        }
    }

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SubmitBlob => "panda.submitBlob",
            Self::GetProof => "panda.getProof",
        }
    }
}

/// Routes requests to backends and aggregates their results.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<BackendRegistry>,
    policy: FailurePolicy,
    request_timeout: Duration,
}

impl Dispatcher {
    /// Creates a dispatcher over a shared registry.
    #[must_use]
    pub const fn new(
        registry: Arc<BackendRegistry>,
        policy: FailurePolicy,
        request_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            policy,
            request_timeout,
        }
    }

    /// Backends requests can be routed to.
    #[must_use]
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Failure policy applied to every request.
    #[must_use]
    pub const fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Handles one request body and returns the response to send back.
    pub async fn dispatch(&self, body: &[u8]) -> RpcResponse {
        let envelope = match RequestEnvelope::parse(body) {
            Ok(envelope) => envelope,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "rejected request body");
                return RpcResponse::failure(RequestId::null(), &error);
            }
        };

        let id = envelope.id();
        match self.route(envelope).await {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    id = id.as_json(),
                    code = error.code(),
                    %error,
                    "request failed"
                );
                RpcResponse::failure(id, &error)
            }
        }
    }

    async fn route(&self, envelope: RequestEnvelope) -> Result<Value, DispatchError> {
        let (name, params) = envelope.into_call()?;
        let method =
            Method::from_name(&name).ok_or_else(|| DispatchError::method_not_found(name))?;
        let params = params.ok_or_else(|| DispatchError::invalid_request("params is missing"))?;

        debug!(target: DISPATCH_TARGET, method = method.as_str(), "routing request");
        let executor = Executor::new(self.policy, Instant::now().checked_add(self.request_timeout));
        match method {
            Method::SubmitBlob => {
                let items = submit_items(params)?;
                let calls = plan_submit(&self.registry, &items);
                self.execute(&executor, &calls).await
            }
            Method::GetProof => {
                let queries = proof_queries(params)?;
                let calls = plan_proof(&self.registry, &queries);
                self.execute(&executor, &calls).await
            }
        }
    }

    async fn execute(
        &self,
        executor: &Executor,
        calls: &[PlannedCall<'_>],
    ) -> Result<Value, DispatchError> {
        let outcomes = executor.run(calls).await;
        match self.policy {
            FailurePolicy::FailFast => fold_fail_fast(calls, outcomes),
            FailurePolicy::ContinueOnError => Ok(fold_tagged(calls, outcomes)),
        }
    }
}

/// Plain result list, or the first failure with everything obtained so far.
fn fold_fail_fast(
    calls: &[PlannedCall<'_>],
    outcomes: Vec<SlotOutcome>,
) -> Result<Value, DispatchError> {
    let mut completed = Vec::with_capacity(outcomes.len());
    let mut pending = Vec::new();
    for (call, outcome) in calls.iter().zip(outcomes) {
        match outcome {
            SlotOutcome::Succeeded(value) => completed.push(value),
            SlotOutcome::Failed(error) => {
                return Err(DispatchError::BackendFailed {
                    completed,
                    failed: FailedCall {
                        site: call.site,
                        backend: call.backend.name().to_owned(),
                        message: error.to_string(),
                    },
                });
            }
            SlotOutcome::NotAttempted(_) => pending.push(PendingCall {
                site: call.site,
                backend: call.backend.name().to_owned(),
            }),
        }
    }

    if pending.is_empty() {
        Ok(Value::Array(completed))
    } else {
        Err(DispatchError::DeadlineElapsed { completed, pending })
    }
}

/// One tagged entry per slot; never an error.
fn fold_tagged(calls: &[PlannedCall<'_>], outcomes: Vec<SlotOutcome>) -> Value {
    calls
        .iter()
        .zip(outcomes)
        .map(|(call, outcome)| {
            let backend = call.backend.name();
            match outcome {
                SlotOutcome::Succeeded(result) => json!({
                    "status": "ok",
                    "backend": backend,
                    "result": result,
                }),
                SlotOutcome::Failed(error) => json!({
                    "status": "error",
                    "backend": backend,
                    "error": { "message": error.to_string() },
                }),
                SlotOutcome::NotAttempted(reason) => json!({
                    "status": "not_attempted",
                    "backend": backend,
                    "reason": NotAttempted::reason(reason),
                }),
            }
        })
        .collect()
}
