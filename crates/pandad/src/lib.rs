//! Panda data-availability gateway.
//!
//! The gateway accepts JSON-RPC 2.0 requests over HTTP and fans them out to
//! the configured backends: a Celestia node for blob submission and any
//! number of EVM execution clients for blob-carrying transactions and block
//! proofs. The crate is organised around the request lifecycle:
//!
//! - [`bootstrap_with`] loads configuration through [`panda_config`],
//!   installs telemetry and builds one client per configured backend.
//! - The [`Dispatcher`] parses a request body, routes `panda.submitBlob` and
//!   `panda.getProof`, runs the planned backend calls under the configured
//!   failure policy and folds their outcomes into a single response.
//! - The transport serves the dispatcher on `POST /v1`, with `GET /health`
//!   as a liveness probe.
//!
//! [`run_gateway`] wires these together for the `pandad` binary. Tests and
//! embedders use [`run_gateway_with`] to inject their own collaborators.

mod backends;
mod bootstrap;
mod dispatch;
mod health;
mod process;
mod telemetry;
mod transport;

pub use backends::{
    BackendClient, BackendError, BackendFactory, BackendRegistry, BackendStartupError,
    BlobSubmission, CelestiaClient, EvmClient, HttpBackendFactory, ProofRequest,
    RegisteredBackend,
};
pub use bootstrap::{BootstrapError, ConfigLoader, Gateway, SystemConfigLoader, bootstrap_with};
pub use dispatch::{
    CallSite, DispatchError, Dispatcher, ErrorObject, FailedCall, Method, PendingCall, ProofQuery,
    RequestId, Resolution, RpcResponse, SkipReason, SubmitItem, Target, resolve_proof,
    resolve_submit,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, ShutdownError, run_gateway, run_gateway_with};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{GatewayListener, HEALTH_PATH, ListenerError, RPC_PATH, router};

#[cfg(test)]
mod tests;
