//! Network clients for the data-availability backends.
//!
//! Each configured backend is served by one [`BackendClient`], built once at
//! startup by a [`BackendFactory`] and shared read-only by every request
//! through the [`BackendRegistry`]. Clients make a single attempt per call:
//! submissions spend real funds, so retrying is left to callers that can
//! reconcile the outcome.

mod celestia;
mod errors;
mod evm;
mod factory;
mod registry;
mod rpc;

use async_trait::async_trait;
use serde_json::Value;

use panda_config::{BackendKind, FeeProfile};

pub use self::celestia::CelestiaClient;
pub use self::errors::{BackendError, BackendStartupError};
pub use self::evm::EvmClient;
pub use self::factory::{BackendFactory, HttpBackendFactory};
#[cfg(test)]
pub use self::factory::MockBackendFactory;
pub use self::registry::{BackendRegistry, RegisteredBackend};

pub(crate) const BACKEND_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::backends");

/// Payload and addressing for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobSubmission<'a> {
    /// Raw payload bytes.
    pub content: &'a [u8],
    /// Destination account on settlement backends.
    pub address: Option<&'a str>,
    /// Namespace on blob backends.
    pub namespace: Option<&'a str>,
    /// Fee tier resolved for the receiving backend.
    pub fees: FeeProfile,
}

/// Inclusion proof lookup forwarded to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofRequest<'a> {
    /// Block height the proof refers to.
    pub height: u64,
    /// Namespace the blob was posted under, when the caller supplied one.
    pub namespace: Option<&'a str>,
    /// Backend the proof should additionally be checked against.
    pub verify_on: Option<&'a str>,
}

/// Submit and proof capabilities of one named backend.
///
/// Receipts and proofs are opaque JSON documents; the dispatcher forwards
/// them to callers without inspecting their shape.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Configured name of the backend.
    fn name(&self) -> &str;

    /// Protocol family, which decides the supported operations.
    fn kind(&self) -> BackendKind;

    /// Posts one payload and returns the backend's receipt.
    async fn submit(&self, submission: BlobSubmission<'_>) -> Result<Value, BackendError>;

    /// Fetches an inclusion proof at the requested height.
    ///
    /// Backends without proof support keep the default, which reports the
    /// operation as unsupported.
    async fn get_proof(&self, request: ProofRequest<'_>) -> Result<Value, BackendError> {
        let _ = request;
        Err(BackendError::unsupported(self.name(), "getProof"))
    }
}
