//! Test doubles and scenario worlds shared by the gateway suites.

mod config_loader;
mod fake_backend;
mod reporter;
mod world;

pub use config_loader::TestConfigLoader;
pub use fake_backend::{CallLog, FakeBackend, FakeFactory};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{BootstrapWorld, DispatchWorld, registry_of};
