//! Shared configuration for the Panda data-availability gateway.
//!
//! Configuration is layered with `ortho_config`: built-in defaults, then an
//! optional TOML file (`--config-path` or `PANDA_CONFIG_PATH`), then
//! `PANDA_*` environment variables, then command-line flags. The resolved
//! [`Config`] describes where the gateway listens, how it logs, how it reacts
//! to backend failures and which backends it fans requests out to.
//!
//! ```toml
//! listen = { host = "0.0.0.0", port = 3000 }
//! failure_policy = "fail_fast"
//! fee_overrides = ["ethereum:max_fee_per_blob_gas=30gwei"]
//!
//! [[backends]]
//! name = "celestia"
//! kind = "blob"
//! rpc_url = "http://127.0.0.1:26658"
//! auth_token_env = "PANDA_CELESTIA_AUTH_TOKEN"
//! namespace = "panda"
//!
//! [[backends]]
//! name = "ethereum"
//! kind = "evm"
//! rpc_url = "https://sepolia.example"
//! sender = "0x00000000000000000000000000000000000000aa"
//! fees = { max_fee_per_gas = 180000000000, max_priority_fee_per_gas = 1000000000, max_fee_per_blob_gas = 25000000000 }
//! ```

mod backend;
mod defaults;
mod fees;
mod listen;
mod modes;

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use backend::{
    BackendDefinition, BackendDefinitionParseError, BackendKind, normalise_backend_name,
};
pub use defaults::{
    DEFAULT_BACKEND_TIMEOUT_MS, DEFAULT_BLOB_NAMESPACE, DEFAULT_LISTEN_PORT, DEFAULT_LOG_FILTER,
    DEFAULT_MAX_REQUEST_BYTES, DEFAULT_REQUEST_TIMEOUT_MS, default_backend_timeout_ms,
    default_backends, default_failure_policy, default_listen_endpoint, default_log_filter,
    default_log_filter_string, default_log_format, default_max_request_bytes,
    default_request_timeout_ms,
};
pub use fees::{
    FeeDirective, FeeDirectiveParseError, FeeField, FeeProfile, FeeTable, GWEI,
    deduplicate_fee_directives,
};
pub use listen::{ListenEndpoint, ListenParseError};
pub use modes::{FailurePolicy, LogFormat, ModeParseError};

/// Resolved gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PANDA")]
pub struct Config {
    /// Address of the HTTP listener.
    #[ortho_config(default = default_listen_endpoint())]
    #[serde(default = "default_listen_endpoint")]
    pub listen: ListenEndpoint,
    /// `tracing` filter expression.
    #[ortho_config(default = default_log_filter_string())]
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = default_log_format())]
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Budget for one request; no new backend calls start once it elapses.
    #[ortho_config(default = default_request_timeout_ms())]
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Budget for a single backend call.
    #[ortho_config(default = default_backend_timeout_ms())]
    #[serde(default = "default_backend_timeout_ms")]
    pub backend_timeout_ms: u64,
    /// Largest accepted request body.
    #[ortho_config(default = default_max_request_bytes())]
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
    /// Reaction to a failed backend call.
    #[ortho_config(default = default_failure_policy())]
    #[serde(default = "default_failure_policy")]
    pub failure_policy: FailurePolicy,
    /// Origins allowed by CORS. Empty allows any origin without credentials.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
    /// Backends requests may target. Empty selects [`default_backends`].
    #[serde(default)]
    pub backends: Vec<BackendDefinition>,
    /// Fee tier adjustments applied on top of the backend definitions.
    #[serde(default)]
    pub fee_overrides: Vec<FeeDirective>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen_endpoint(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            request_timeout_ms: default_request_timeout_ms(),
            backend_timeout_ms: default_backend_timeout_ms(),
            max_request_bytes: default_max_request_bytes(),
            failure_policy: default_failure_policy(),
            cors_allowed_origins: Vec::new(),
            backends: Vec::new(),
            fee_overrides: Vec::new(),
        }
    }
}

impl Config {
    /// Listener address.
    #[must_use]
    pub fn listen(&self) -> &ListenEndpoint {
        &self.listen
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Failure policy shared by every dispatch operation.
    #[must_use]
    pub const fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Request budget.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Per-call backend budget.
    #[must_use]
    pub const fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }

    /// Largest accepted request body in bytes.
    #[must_use]
    pub const fn max_request_bytes(&self) -> usize {
        self.max_request_bytes
    }

    /// Origins allowed by CORS.
    #[must_use]
    pub fn cors_allowed_origins(&self) -> &[String] {
        &self.cors_allowed_origins
    }

    /// Backend definitions in effect, falling back to the built-in set when
    /// none are configured.
    #[must_use]
    pub fn backend_definitions(&self) -> Cow<'_, [BackendDefinition]> {
        if self.backends.is_empty() {
            Cow::Owned(default_backends())
        } else {
            Cow::Borrowed(&self.backends)
        }
    }

    /// Resolves the fee table from the backend definitions and overrides.
    #[must_use]
    pub fn fee_table(&self) -> FeeTable {
        let mut directives = self.fee_overrides.clone();
        deduplicate_fee_directives(&mut directives);
        FeeTable::resolve(&self.backend_definitions(), &directives)
    }

    /// Checks cross-field consistency that the loader cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigValidationError`] when two backends share a name or a
    /// fee directive names a backend that is not defined.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let definitions = self.backend_definitions();
        let mut names = BTreeSet::new();
        for definition in definitions.iter() {
            let key = definition.key();
            if key.is_empty() {
                return Err(ConfigValidationError::EmptyBackendName);
            }
            if !names.insert(key.clone()) {
                return Err(ConfigValidationError::DuplicateBackend { name: key });
            }
        }
        if let Some(directive) = self
            .fee_overrides
            .iter()
            .find(|directive| !names.contains(&normalise_backend_name(&directive.backend)))
        {
            return Err(ConfigValidationError::UnknownFeeBackend {
                directive: directive.to_string(),
            });
        }
        Ok(())
    }
}

/// Inconsistencies detected by [`Config::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// A backend was declared with a blank name.
    #[error("backend definitions must have a non-empty name")]
    EmptyBackendName,
    /// Two backends normalise to the same name.
    #[error("backend '{name}' is defined more than once")]
    DuplicateBackend {
        /// Normalised name shared by the definitions.
        name: String,
    },
    /// A fee directive targets a backend that does not exist.
    #[error("fee override '{directive}' names an undefined backend")]
    UnknownFeeBackend {
        /// Offending directive in textual form.
        directive: String,
    },
}
