//! Scenario worlds for the bootstrap and dispatch suites.
//!
//! Steps run synchronously, so the dispatch world owns a private runtime and
//! blocks on each request.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Runtime;

use panda_config::{BackendKind, Config, FailurePolicy, FeeProfile};

use crate::backends::{BackendClient, BackendRegistry};
use crate::bootstrap::{BootstrapError, ConfigLoader, Gateway, bootstrap_with};
use crate::dispatch::Dispatcher;

use super::config_loader::{FailingConfigLoader, TestConfigLoader, fake_config};
use super::fake_backend::{CallLog, FakeBackend, FakeFactory};
use super::reporter::RecordingHealthReporter;

/// Registry holding `backends` with a zero fee tier.
#[must_use]
pub fn registry_of(backends: impl IntoIterator<Item = FakeBackend>) -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    for backend in backends {
        registry.register(Arc::new(backend) as Arc<dyn BackendClient>, FeeProfile::default());
    }
    registry
}

/// Scenario world shared across dispatch steps.
pub struct DispatchWorld {
    runtime: Runtime,
    pub log: CallLog,
    backends: Vec<FakeBackend>,
    policy: FailurePolicy,
    request_timeout: Duration,
    response: Option<Value>,
    raw_response: Option<String>,
}

impl DispatchWorld {
    /// World with no backends under the fail-fast policy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runtime: Runtime::new().expect("build test runtime"),
            log: CallLog::default(),
            backends: Vec::new(),
            policy: FailurePolicy::FailFast,
            request_timeout: Duration::from_secs(5),
            response: None,
            raw_response: None,
        }
    }

    /// Adds a healthy backend.
    pub fn add_backend(&mut self, name: &str, kind: BackendKind) {
        let backend = FakeBackend::new(name, kind, &self.log);
        self.backends.push(backend);
    }

    /// Makes the named backend fail every call.
    pub fn break_backend(&mut self, name: &str) {
        for backend in &mut self.backends {
            if backend.name() == name {
                *backend = backend.clone().failing("node unavailable");
            }
        }
    }

    /// Makes every backend take `delay` per call.
    pub fn slow_down(&mut self, delay: Duration) {
        for backend in &mut self.backends {
            *backend = backend.clone().delayed(delay);
        }
    }

    pub fn set_policy(&mut self, policy: FailurePolicy) {
        self.policy = policy;
    }

    pub fn set_request_timeout(&mut self, timeout: Duration) {
        self.request_timeout = timeout;
    }

    /// Dispatches `body` and stores the serialised response.
    pub fn send(&mut self, body: &str) {
        let registry = registry_of(self.backends.iter().cloned());
        let dispatcher = Dispatcher::new(Arc::new(registry), self.policy, self.request_timeout);
        let response = self.runtime.block_on(dispatcher.dispatch(body.as_bytes()));
        let raw = serde_json::to_string(&response).expect("serialise response");
        self.response = Some(serde_json::from_str(&raw).expect("response is JSON"));
        self.raw_response = Some(raw);
    }

    /// Last response as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error when nothing has been sent yet.
    pub fn response(&self) -> Result<&Value, String> {
        self.response
            .as_ref()
            .ok_or_else(|| "no request has been dispatched".to_owned())
    }

    /// Last response exactly as it would be written to the wire.
    ///
    /// # Errors
    ///
    /// Returns an error when nothing has been sent yet.
    pub fn raw_response(&self) -> Result<&str, String> {
        self.raw_response
            .as_deref()
            .ok_or_else(|| "no request has been dispatched".to_owned())
    }
}

/// Scenario world shared across bootstrap steps.
pub struct BootstrapWorld {
    loader: Box<dyn ConfigLoader>,
    pub reporter: Arc<RecordingHealthReporter>,
    factory: FakeFactory,
    gateway: Option<Gateway>,
    error: Option<BootstrapError>,
}

impl BootstrapWorld {
    /// World whose factory can build the three backends of [`fake_config`].
    #[must_use]
    pub fn new() -> Self {
        let log = CallLog::default();
        let factory = FakeFactory::default()
            .with(FakeBackend::new("celestia", BackendKind::Blob, &log))
            .with(FakeBackend::new("ethereum", BackendKind::Evm, &log))
            .with(FakeBackend::new("gnosis", BackendKind::Evm, &log));
        Self {
            loader: Box::new(TestConfigLoader::new()),
            reporter: Arc::new(RecordingHealthReporter::default()),
            factory,
            gateway: None,
            error: None,
        }
    }

    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
    }

    /// Loads `config` instead of the default test configuration.
    pub fn use_config(&mut self, config: Config) {
        self.loader = Box::new(TestConfigLoader::with_config(config));
    }

    /// Configuration the default loader would hand out.
    #[must_use]
    pub fn base_config() -> Config {
        fake_config(FailurePolicy::FailFast)
    }

    /// Makes the factory refuse to build `name`.
    pub fn refuse_backend(&mut self, name: &str) {
        self.factory = self.factory.clone().refusing(name);
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.gateway.is_some() || self.error.is_some() {
            return;
        }
        match bootstrap_with(&*self.loader, self.reporter.clone(), &self.factory) {
            Ok(gateway) => self.gateway = Some(gateway),
            Err(error) => self.error = Some(error),
        }
    }

    #[must_use]
    pub const fn gateway(&self) -> Option<&Gateway> {
        self.gateway.as_ref()
    }

    #[must_use]
    pub const fn error(&self) -> Option<&BootstrapError> {
        self.error.as_ref()
    }
}
