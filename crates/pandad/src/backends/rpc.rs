//! Minimal JSON-RPC 2.0 client shared by the backend implementations.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use super::BACKEND_TARGET;
use super::errors::BackendError;

/// Posts JSON-RPC calls to a single node endpoint.
#[derive(Debug, Clone)]
pub(crate) struct JsonRpcClient {
    backend: String,
    http: reqwest::Client,
    endpoint: Url,
    bearer: Option<String>,
    timeout: Duration,
    next_id: Arc<AtomicU64>,
}

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Fault>,
}

#[derive(Debug, Deserialize)]
struct Fault {
    code: i64,
    message: String,
}

impl JsonRpcClient {
    pub(crate) fn new(
        backend: impl Into<String>,
        http: reqwest::Client,
        endpoint: Url,
        bearer: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            backend: backend.into(),
            http,
            endpoint,
            bearer,
            timeout,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub(crate) fn backend(&self) -> &str {
        self.backend.as_str()
    }

    /// Calls `method` once and decodes its `result`.
    ///
    /// A `null` or absent result decodes as JSON `null`, so callers that
    /// expect optional data should request an `Option<T>`.
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, BackendError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let mut request = self
            .http
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .json(&body);
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }

        debug!(
            target: BACKEND_TARGET,
            backend = %self.backend,
            method,
            id,
            "calling backend"
        );
        let response = request
            .send()
            .await
            .map_err(|source| BackendError::transport(&self.backend, source))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| BackendError::transport(&self.backend, source))?;

        let reply: Reply = serde_json::from_slice(&bytes).map_err(|error| {
            let detail = if status.is_success() {
                format!("malformed JSON-RPC reply: {error}")
            } else {
                format!("HTTP status {status}")
            };
            BackendError::invalid_response(&self.backend, method, detail)
        })?;

        if let Some(fault) = reply.error {
            return Err(BackendError::Rpc {
                backend: self.backend.clone(),
                method,
                code: fault.code,
                message: fault.message,
            });
        }

        serde_json::from_value(reply.result.unwrap_or(Value::Null)).map_err(|error| {
            BackendError::invalid_response(&self.backend, method, error.to_string())
        })
    }
}
