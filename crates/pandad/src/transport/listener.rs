//! TCP listener serving the HTTP adapter.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::{TcpListener, lookup_host};
use tracing::info;

use panda_config::ListenEndpoint;

use super::{ListenerError, TRANSPORT_TARGET};

/// Bound listener ready to serve requests.
#[derive(Debug)]
pub struct GatewayListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl GatewayListener {
    /// Resolves `endpoint` and binds the first address it yields.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when resolution or binding fails.
    pub async fn bind(endpoint: &ListenEndpoint) -> Result<Self, ListenerError> {
        let host = endpoint.host.as_str();
        let port = endpoint.port;
        let addr = lookup_host((host, port))
            .await
            .map_err(|source| ListenerError::Resolve {
                host: host.to_owned(),
                port,
                source,
            })?
            .next()
            .ok_or_else(|| ListenerError::ResolveEmpty {
                host: host.to_owned(),
                port,
            })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenerError::LocalAddr { source })?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Address actually bound, including any ephemeral port.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves `router` until `shutdown` resolves, then drains open requests.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Serve`] when the server stops abnormally.
    pub async fn serve<F>(self, router: Router, shutdown: F) -> Result<(), ListenerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(
            target: TRANSPORT_TARGET,
            address = %self.local_addr,
            "listening for JSON-RPC requests"
        );
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ListenerError::Serve { source })
    }
}
