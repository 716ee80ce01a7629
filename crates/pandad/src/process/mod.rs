//! Gateway process lifecycle: runtime, bootstrap, serving and shutdown.

mod errors;
mod shutdown;

use std::future::Future;
use std::sync::Arc;

use tracing::info;

use crate::backends::{BackendFactory, HttpBackendFactory};
use crate::bootstrap::{BootstrapError, ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::transport::{GatewayListener, router};

pub use self::errors::LaunchError;
pub use self::shutdown::ShutdownError;

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Runs the gateway with the production collaborators until SIGINT or
/// SIGTERM.
///
/// # Errors
///
/// Returns [`LaunchError`] when the runtime, bootstrap or listener fails.
pub fn run_gateway() -> Result<(), LaunchError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|source| LaunchError::Runtime { source })?;

    runtime.block_on(async {
        let factory = HttpBackendFactory::new()
            .map_err(|source| LaunchError::Bootstrap {
                source: BootstrapError::Backend { source },
            })?;
        let shutdown = shutdown::system_signal()?;
        run_gateway_with(
            &SystemConfigLoader,
            Arc::new(StructuredHealthReporter::new()),
            &factory,
            shutdown,
        )
        .await
    })
}

/// Runs the gateway with injected collaborators until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap or the listener fails.
pub async fn run_gateway_with<F>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    factory: &dyn BackendFactory,
    shutdown: F,
) -> Result<(), LaunchError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let gateway = bootstrap_with(loader, Arc::clone(&reporter), factory)?;
    let config = gateway.config();

    let listener = GatewayListener::bind(config.listen()).await?;
    let app = router(gateway.dispatcher(), config);
    reporter.listener_ready(listener.local_addr());

    listener.serve(app, shutdown).await?;
    reporter.listener_stopped();
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
