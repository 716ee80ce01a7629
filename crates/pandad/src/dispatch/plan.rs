//! Resolution of request targets into backend calls.
//!
//! Planning is synchronous and side-effect free: it walks items (or queries)
//! in input order and targets in input order, tags each as matched or
//! skipped, and emits one [`PlannedCall`] per match. The order of the
//! returned calls is the order of the response slots.

use serde_json::Value;
use tracing::debug;

use crate::backends::{
    BackendError, BackendRegistry, BlobSubmission, ProofRequest, RegisteredBackend,
};

use super::errors::CallSite;
use super::params::{ProofQuery, SubmitItem};
use super::router::DISPATCH_TARGET;

/// Why a named target produced no call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No backend is configured under the name.
    UnknownBackend,
    /// The backend exists but cannot serve proofs.
    ProofsUnsupported,
}

impl SkipReason {
    /// Short label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownBackend => "unknown_backend",
            Self::ProofsUnsupported => "proofs_unsupported",
        }
    }
}

/// Outcome of resolving one target name.
#[derive(Debug, Clone, Copy)]
pub enum Resolution<'r> {
    /// The target maps to a backend that will be called.
    Matched(&'r RegisteredBackend),
    /// The target is dropped without a result entry or error.
    Skipped(SkipReason),
}

/// Resolves a submission target.
#[must_use]
pub fn resolve_submit<'r>(registry: &'r BackendRegistry, name: &str) -> Resolution<'r> {
    registry
        .get(name)
        .map_or(Resolution::Skipped(SkipReason::UnknownBackend), Resolution::Matched)
}

/// Resolves a proof target, skipping backends without proof support.
#[must_use]
pub fn resolve_proof<'r>(registry: &'r BackendRegistry, name: &str) -> Resolution<'r> {
    match resolve_submit(registry, name) {
        Resolution::Matched(backend) if !backend.kind().supports_proofs() => {
            Resolution::Skipped(SkipReason::ProofsUnsupported)
        }
        resolution => resolution,
    }
}

/// Backend operation bound to its arguments.
#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    /// `submit` with the backend's fee tier applied.
    Submit(BlobSubmission<'a>),
    /// `getProof`.
    Proof(ProofRequest<'a>),
}

/// One backend call occupying one response slot.
#[derive(Debug, Clone, Copy)]
pub struct PlannedCall<'a> {
    /// Position of the call in the request.
    pub site: CallSite,
    /// Backend to call.
    pub backend: &'a RegisteredBackend,
    /// Operation and arguments.
    pub operation: Operation<'a>,
}

impl PlannedCall<'_> {
    /// Issues the call.
    pub async fn invoke(&self) -> Result<Value, BackendError> {
        let client = self.backend.client();
        match self.operation {
            Operation::Submit(submission) => client.submit(submission).await,
            Operation::Proof(request) => client.get_proof(request).await,
        }
    }
}

/// Plans `panda.submitBlob`: one call per matched (item, target) pair.
#[must_use]
pub fn plan_submit<'a>(
    registry: &'a BackendRegistry,
    items: &'a [SubmitItem],
) -> Vec<PlannedCall<'a>> {
    let mut calls = Vec::new();
    for (item_index, item) in items.iter().enumerate() {
        for (target_index, target) in item.targets.iter().enumerate() {
            let site = CallSite {
                item: item_index,
                target: Some(target_index),
            };
            match resolve_submit(registry, &target.name) {
                Resolution::Matched(backend) => calls.push(PlannedCall {
                    site,
                    backend,
                    operation: Operation::Submit(BlobSubmission {
                        content: item.data.as_bytes(),
                        address: target.address.as_deref(),
                        namespace: target.namespace.as_deref(),
                        fees: backend.fees(),
                    }),
                }),
                Resolution::Skipped(reason) => log_skip(site, &target.name, reason),
            }
        }
    }
    calls
}

/// Plans `panda.getProof`: one call per query naming a proof-capable backend.
#[must_use]
pub fn plan_proof<'a>(
    registry: &'a BackendRegistry,
    queries: &'a [ProofQuery],
) -> Vec<PlannedCall<'a>> {
    let mut calls = Vec::new();
    for (index, query) in queries.iter().enumerate() {
        let site = CallSite {
            item: index,
            target: None,
        };
        match resolve_proof(registry, &query.name) {
            Resolution::Matched(backend) => calls.push(PlannedCall {
                site,
                backend,
                operation: Operation::Proof(ProofRequest {
                    height: query.height,
                    namespace: query.namespace.as_deref(),
                    verify_on: query.verify_on.as_deref(),
                }),
            }),
            Resolution::Skipped(reason) => log_skip(site, &query.name, reason),
        }
    }
    calls
}

fn log_skip(site: CallSite, name: &str, reason: SkipReason) {
    debug!(
        target: DISPATCH_TARGET,
        item = site.item,
        target_index = site.target,
        backend = name,
        reason = reason.as_str(),
        "skipping target"
    );
}
