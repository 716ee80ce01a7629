//! Name-indexed set of backend clients shared by every request.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use panda_config::{BackendKind, FeeProfile, normalise_backend_name};

use super::BackendClient;

/// A client together with the fee tier resolved for its backend.
#[derive(Clone)]
pub struct RegisteredBackend {
    client: Arc<dyn BackendClient>,
    fees: FeeProfile,
}

impl RegisteredBackend {
    /// Client that performs the calls.
    #[must_use]
    pub fn client(&self) -> &Arc<dyn BackendClient> {
        &self.client
    }

    /// Configured name of the backend.
    #[must_use]
    pub fn name(&self) -> &str {
        self.client.name()
    }

    /// Protocol family of the backend.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.client.kind()
    }

    /// Fee tier applied to submissions.
    #[must_use]
    pub const fn fees(&self) -> FeeProfile {
        self.fees
    }
}

impl fmt::Debug for RegisteredBackend {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RegisteredBackend")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("fees", &self.fees)
            .finish()
    }
}

/// Backends keyed by normalised name.
///
/// The registry is populated at startup and read without locking afterwards.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    backends: BTreeMap<String, RegisteredBackend>,
}

impl BackendRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a client, returning the entry it replaced under the same name.
    pub fn register(
        &mut self,
        client: Arc<dyn BackendClient>,
        fees: FeeProfile,
    ) -> Option<RegisteredBackend> {
        let key = normalise_backend_name(client.name());
        self.backends.insert(key, RegisteredBackend { client, fees })
    }

    /// Looks a backend up by caller-supplied name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegisteredBackend> {
        self.backends.get(&normalise_backend_name(name))
    }

    /// Iterates over the registered backends in name order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredBackend> {
        self.backends.values()
    }

    /// Number of registered backends.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Returns `true` when no backend is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
