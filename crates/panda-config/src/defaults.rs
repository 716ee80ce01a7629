use url::Url;

use crate::backend::{BackendDefinition, BackendKind};
use crate::fees::FeeProfile;
use crate::listen::ListenEndpoint;
use crate::modes::{FailurePolicy, LogFormat};

/// Default port of the HTTP listener.
pub const DEFAULT_LISTEN_PORT: u16 = 3000;

/// Default log filter expression used by the gateway.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default budget for a whole request before further backend calls stop.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Default budget for a single backend call.
pub const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 20_000;

/// Namespace the built-in Celestia backend posts under when a target names
/// none.
pub const DEFAULT_BLOB_NAMESPACE: &str = "panda";

/// Default cap on an inbound request body.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Default listener endpoint: loopback on [`DEFAULT_LISTEN_PORT`].
#[must_use]
pub fn default_listen_endpoint() -> ListenEndpoint {
    ListenEndpoint::new("127.0.0.1", DEFAULT_LISTEN_PORT)
}

/// Default log filter expression used by the gateway.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default failure policy.
#[must_use]
pub fn default_failure_policy() -> FailurePolicy {
    FailurePolicy::FailFast
}

/// Default request budget in milliseconds.
#[must_use]
pub const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// Default backend call budget in milliseconds.
#[must_use]
pub const fn default_backend_timeout_ms() -> u64 {
    DEFAULT_BACKEND_TIMEOUT_MS
}

/// Default request body cap in bytes.
#[must_use]
pub const fn default_max_request_bytes() -> usize {
    DEFAULT_MAX_REQUEST_BYTES
}

/// Backends used when configuration declares none.
///
/// The set mirrors a local development deployment: a Celestia light node on
/// its standard RPC port, plus Sepolia and Chiado execution clients. The two
/// EVM backends carry distinct fee tiers: Sepolia needs a far higher ceiling
/// than Chiado for blob transactions to land.
#[must_use]
pub fn default_backends() -> Vec<BackendDefinition> {
    let celestia = local_backend("celestia", BackendKind::Blob, 26658).map(|definition| {
        definition
            .with_auth_token_env("PANDA_CELESTIA_AUTH_TOKEN")
            .with_namespace(DEFAULT_BLOB_NAMESPACE)
    });
    let ethereum = local_backend("ethereum", BackendKind::Evm, 8545)
        .map(|definition| definition.with_fees(FeeProfile::from_gwei(180, 1, 25)));
    let gnosis = local_backend("gnosis", BackendKind::Evm, 8546)
        .map(|definition| definition.with_fees(FeeProfile::from_gwei(1, 1, 1)));
    [celestia, ethereum, gnosis].into_iter().flatten().collect()
}

/// Loopback definition on `port`. A port number always yields a valid URL.
fn local_backend(name: &str, kind: BackendKind, port: u16) -> Option<BackendDefinition> {
    Url::parse(&format!("http://127.0.0.1:{port}"))
        .ok()
        .map(|url| BackendDefinition::new(name, kind, url))
}
