//! Configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::fs;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;
use url::Url;

use panda_config::{BackendDefinition, BackendKind, Config, FailurePolicy, ListenEndpoint};

use crate::bootstrap::ConfigLoader;

/// Configuration naming a blob backend and two EVM backends on loopback
/// URLs that are never dialled, listening on an ephemeral port.
#[must_use]
pub fn fake_config(policy: FailurePolicy) -> Config {
    let url = |port: u16| Url::parse(&format!("http://127.0.0.1:{port}")).expect("loopback url");
    Config {
        listen: ListenEndpoint::new("127.0.0.1", 0),
        log_filter: "off".to_owned(),
        failure_policy: policy,
        backends: vec![
            BackendDefinition::new("celestia", BackendKind::Blob, url(1)),
            BackendDefinition::new("ethereum", BackendKind::Evm, url(2)),
            BackendDefinition::new("gnosis", BackendKind::Evm, url(3)),
        ],
        ..Config::default()
    }
}

/// Loader returning [`fake_config`] with the fail-fast policy.
#[derive(Debug, Clone)]
pub struct TestConfigLoader {
    config: Config,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(fake_config(FailurePolicy::FailFast))
    }

    #[must_use]
    pub const fn with_config(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Loader that fails by pointing the real loader at malformed TOML.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("broken.toml");
        fs::write(&path, "request_timeout_ms = not_a_number").expect("write broken config");
        let args = vec![
            OsString::from("pandad"),
            OsString::from("--config-path"),
            path.into_os_string(),
        ];
        Config::load_from_iter(args)
    }
}
