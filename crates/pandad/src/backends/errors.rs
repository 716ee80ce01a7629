//! Error types for backend clients.

use thiserror::Error;

/// Failure of a single backend call.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The HTTP exchange with the node failed.
    #[error("{backend}: transport failure: {source}")]
    Transport {
        /// Backend that was being called.
        backend: String,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// The node answered with a JSON-RPC error object.
    #[error("{backend}: {method} rejected with code {code}: {message}")]
    Rpc {
        /// Backend that was being called.
        backend: String,
        /// JSON-RPC method that failed.
        method: &'static str,
        /// Error code reported by the node.
        code: i64,
        /// Error message reported by the node.
        message: String,
    },
    /// The node answered with something that is not a usable reply.
    #[error("{backend}: unexpected reply to {method}: {message}")]
    InvalidResponse {
        /// Backend that was being called.
        backend: String,
        /// JSON-RPC method that was called.
        method: &'static str,
        /// Description of the problem.
        message: String,
    },
    /// The request cannot be expressed for this backend.
    #[error("{backend}: invalid request: {message}")]
    InvalidInput {
        /// Backend that rejected the request.
        backend: String,
        /// Description of the problem.
        message: String,
    },
    /// The node has no block at the requested height.
    #[error("{backend}: no block at height {height}")]
    MissingBlock {
        /// Backend that was queried.
        backend: String,
        /// Requested height.
        height: u64,
    },
    /// The operation is not offered by this backend kind.
    #[error("{backend}: {operation} is not supported")]
    Unsupported {
        /// Backend that was called.
        backend: String,
        /// Operation name.
        operation: &'static str,
    },
}

impl BackendError {
    /// Creates a transport error.
    pub fn transport(backend: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            backend: backend.into(),
            source,
        }
    }

    /// Creates an invalid response error.
    pub fn invalid_response(
        backend: impl Into<String>,
        method: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidResponse {
            backend: backend.into(),
            method,
            message: message.into(),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(backend: impl Into<String>, operation: &'static str) -> Self {
        Self::Unsupported {
            backend: backend.into(),
            operation,
        }
    }

    /// Name of the backend the error came from.
    #[must_use]
    pub fn backend(&self) -> &str {
        match self {
            Self::Transport { backend, .. }
            | Self::Rpc { backend, .. }
            | Self::InvalidResponse { backend, .. }
            | Self::InvalidInput { backend, .. }
            | Self::MissingBlock { backend, .. }
            | Self::Unsupported { backend, .. } => backend,
        }
    }
}

/// Errors surfaced when a backend client cannot be built at startup.
#[derive(Debug, Error)]
#[error("backend {name} failed to start: {message}")]
pub struct BackendStartupError {
    /// Name of the backend that failed.
    pub name: String,
    message: String,
    /// Optional source error reported by the client implementation.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BackendStartupError {
    /// Builds an error without an underlying source.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error that wraps an underlying source.
    #[must_use]
    pub fn with_source(
        name: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-readable message describing the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}
