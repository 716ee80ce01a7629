//! In-memory [`BackendClient`] that records calls in the order they start.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use panda_config::{BackendDefinition, BackendKind};

use crate::backends::{
    BackendClient, BackendError, BackendFactory, BackendStartupError, BlobSubmission,
    ProofRequest,
};

/// Shared, ordered record of `backend:operation:detail` entries.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    fn push(&self, entry: String) {
        self.entries
            .lock()
            .expect("call log mutex poisoned")
            .push(entry);
    }

    /// Snapshot of the recorded calls.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .expect("call log mutex poisoned")
            .clone()
    }

    /// Number of calls that reached `backend`.
    #[must_use]
    pub fn count_for(&self, backend: &str) -> usize {
        let prefix = format!("{backend}:");
        self.entries()
            .iter()
            .filter(|entry| entry.starts_with(&prefix))
            .count()
    }
}

/// Scriptable backend used in place of the HTTP clients.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    name: String,
    kind: BackendKind,
    log: CallLog,
    fail_with: Option<String>,
    delay: Option<Duration>,
}

impl FakeBackend {
    /// Backend that succeeds immediately.
    #[must_use]
    pub fn new(name: &str, kind: BackendKind, log: &CallLog) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            log: log.clone(),
            fail_with: None,
            delay: None,
        }
    }

    /// Makes every call fail with `message`.
    #[must_use]
    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_owned());
        self
    }

    /// Makes every call take `delay` before completing.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn finish(&self, operation: &str, detail: String) -> Result<Value, BackendError> {
        self.log.push(format!("{}:{operation}:{detail}", self.name));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.fail_with {
            Some(message) => Err(BackendError::invalid_input(&self.name, message.clone())),
            None => Ok(json!({
                "backend": self.name,
                "call": operation,
                "content": detail,
            })),
        }
    }
}

#[async_trait]
impl BackendClient for FakeBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn submit(&self, submission: BlobSubmission<'_>) -> Result<Value, BackendError> {
        let content = String::from_utf8_lossy(submission.content).into_owned();
        self.finish("submit", content).await
    }

    async fn get_proof(&self, request: ProofRequest<'_>) -> Result<Value, BackendError> {
        if !self.kind.supports_proofs() {
            return Err(BackendError::unsupported(&self.name, "getProof"));
        }
        self.finish("getProof", request.height.to_string()).await
    }
}

/// Factory handing out prepared fakes by definition name.
#[derive(Debug, Clone, Default)]
pub struct FakeFactory {
    backends: BTreeMap<String, FakeBackend>,
    broken: Option<String>,
}

impl FakeFactory {
    /// Serves `backend` for the definition with the same name.
    #[must_use]
    pub fn with(mut self, backend: FakeBackend) -> Self {
        self.backends.insert(backend.name.clone(), backend);
        self
    }

    /// Refuses to build the backend called `name`.
    #[must_use]
    pub fn refusing(mut self, name: &str) -> Self {
        self.broken = Some(name.to_owned());
        self
    }
}

impl BackendFactory for FakeFactory {
    fn build(
        &self,
        definition: &BackendDefinition,
        _call_timeout: Duration,
    ) -> Result<Arc<dyn BackendClient>, BackendStartupError> {
        let name = definition.key();
        if self.broken.as_deref() == Some(name.as_str()) {
            return Err(BackendStartupError::new(name, "refused by test factory"));
        }
        self.backends
            .get(&name)
            .map(|backend| Arc::new(backend.clone()) as Arc<dyn BackendClient>)
            .ok_or_else(|| BackendStartupError::new(name, "no fake prepared"))
    }
}
