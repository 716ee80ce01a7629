use std::future::Future;
use std::io;

use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Installs SIGINT and SIGTERM handlers and returns a future that resolves
/// on the first of them.
///
/// Handlers are installed before the future is returned so a signal that
/// arrives during startup is not lost.
#[cfg(unix)]
pub(crate) fn system_signal() -> Result<impl Future<Output = ()> + Send + 'static, ShutdownError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate =
        signal(SignalKind::terminate()).map_err(|source| ShutdownError::Install { source })?;
    let mut interrupt =
        signal(SignalKind::interrupt()).map_err(|source| ShutdownError::Install { source })?;

    Ok(async move {
        let name = tokio::select! {
            _ = terminate.recv() => "SIGTERM",
            _ = interrupt.recv() => "SIGINT",
        };
        info!(target: PROCESS_TARGET, signal = name, "shutdown signal received");
    })
}

#[cfg(not(unix))]
pub(crate) fn system_signal() -> Result<impl Future<Output = ()> + Send + 'static, ShutdownError> {
    use tracing::warn;

    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!(target: PROCESS_TARGET, signal = "ctrl_c", "shutdown signal received"),
            Err(error) => warn!(target: PROCESS_TARGET, %error, "failed to await ctrl-c"),
        }
    })
}
