//! Gateway bootstrap orchestration.
//!
//! Bootstrap loads and validates configuration, installs telemetry, resolves
//! the fee table and builds one backend client per definition. Clients are
//! built eagerly so a misconfigured backend stops the gateway before it
//! accepts requests rather than on the first submission.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use panda_config::{Config, ConfigValidationError};

use crate::backends::{BackendFactory, BackendRegistry, BackendStartupError};
use crate::dispatch::Dispatcher;
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when any configuration layer is invalid.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Configuration loaded but is inconsistent.
    #[error("invalid configuration: {source}")]
    Validation {
        /// Underlying validation error.
        #[source]
        source: ConfigValidationError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// A backend client could not be built.
    #[error("failed to build backend: {source}")]
    Backend {
        /// Underlying startup error.
        #[source]
        source: BackendStartupError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Gateway {
    config: Config,
    dispatcher: Arc<Dispatcher>,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Gateway {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Shared dispatcher serving every request.
    #[must_use]
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Reporter receiving lifecycle events.
    #[must_use]
    pub fn reporter(&self) -> Arc<dyn HealthReporter> {
        Arc::clone(&self.reporter)
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Gateway")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Bootstraps the gateway using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] for the first stage that fails. The reporter
/// sees the failure before it is returned.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    factory: &dyn BackendFactory,
) -> Result<Gateway, BootstrapError> {
    reporter.bootstrap_starting();

    let config = loader
        .load()
        .map_err(|source| fail(&*reporter, BootstrapError::Configuration { source }))?;

    let telemetry = telemetry::initialise(&config)
        .map_err(|source| fail(&*reporter, BootstrapError::Telemetry { source }))?;

    config
        .validate()
        .map_err(|source| fail(&*reporter, BootstrapError::Validation { source }))?;

    let registry = build_registry(&config, &*reporter, factory)
        .map_err(|source| fail(&*reporter, BootstrapError::Backend { source }))?;

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(registry),
        config.failure_policy(),
        config.request_timeout(),
    ));
    reporter.bootstrap_succeeded(&config);

    Ok(Gateway {
        config,
        dispatcher,
        telemetry,
        reporter,
    })
}

fn build_registry(
    config: &Config,
    reporter: &dyn HealthReporter,
    factory: &dyn BackendFactory,
) -> Result<BackendRegistry, BackendStartupError> {
    let fees = config.fee_table();
    let mut registry = BackendRegistry::new();
    for definition in config.backend_definitions().iter() {
        let client = factory
            .build(definition, config.backend_timeout())
            .inspect_err(|error| reporter.backend_failed(error))?;
        let profile = fees.profile_for(&definition.name).unwrap_or(definition.fees);
        reporter.backend_registered(client.name(), client.kind());
        registry.register(client, profile);
    }
    Ok(registry)
}

fn fail(reporter: &dyn HealthReporter, error: BootstrapError) -> BootstrapError {
    reporter.bootstrap_failed(&error);
    error
}
