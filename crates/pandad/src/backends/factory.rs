//! Construction of backend clients from their definitions.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use panda_config::{BackendDefinition, BackendKind};

use super::errors::BackendStartupError;
use super::rpc::JsonRpcClient;
use super::{BACKEND_TARGET, BackendClient, CelestiaClient, EvmClient};

/// Builds the client serving one backend definition.
#[cfg_attr(test, mockall::automock)]
pub trait BackendFactory: Send + Sync {
    /// Creates the client for `definition`, giving each call `call_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendStartupError`] when the client cannot be created.
    fn build(
        &self,
        definition: &BackendDefinition,
        call_timeout: Duration,
    ) -> Result<Arc<dyn BackendClient>, BackendStartupError>;
}

/// Factory producing HTTP JSON-RPC clients that share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpBackendFactory {
    http: reqwest::Client,
}

impl HttpBackendFactory {
    /// Creates a factory with a fresh connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`BackendStartupError`] when the HTTP client cannot be built.
    pub fn new() -> Result<Self, BackendStartupError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| {
                BackendStartupError::with_source("http", "failed to build HTTP client", error)
            })?;
        Ok(Self { http })
    }

    fn bearer_token(definition: &BackendDefinition) -> Option<String> {
        let variable = definition.auth_token_env.as_deref()?;
        match std::env::var(variable) {
            Ok(token) if !token.trim().is_empty() => Some(token.trim().to_owned()),
            _ => {
                warn!(
                    target: BACKEND_TARGET,
                    backend = %definition.name,
                    variable,
                    "auth token variable is unset; calling the node without credentials"
                );
                None
            }
        }
    }
}

impl BackendFactory for HttpBackendFactory {
    fn build(
        &self,
        definition: &BackendDefinition,
        call_timeout: Duration,
    ) -> Result<Arc<dyn BackendClient>, BackendStartupError> {
        if !matches!(definition.rpc_url.scheme(), "http" | "https") {
            return Err(BackendStartupError::new(
                definition.name.clone(),
                format!("unsupported RPC URL scheme '{}'", definition.rpc_url.scheme()),
            ));
        }

        let rpc = JsonRpcClient::new(
            definition.name.trim(),
            self.http.clone(),
            definition.rpc_url.clone(),
            Self::bearer_token(definition),
            call_timeout,
        );
        let client: Arc<dyn BackendClient> = match definition.kind {
            BackendKind::Blob => {
                Arc::new(CelestiaClient::new(rpc, definition.namespace.clone()))
            }
            BackendKind::Evm => Arc::new(EvmClient::new(rpc, definition.sender.clone())),
        };
        Ok(client)
    }
}
