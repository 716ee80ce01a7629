//! Named backend definitions.
//!
//! A backend pairs a caller-facing name with a protocol kind and the node
//! endpoint serving it. Definitions come from configuration files or from
//! the `name=kind@url` command-line form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use url::Url;

use crate::fees::FeeProfile;

/// Family of protocol a backend speaks.
///
/// The kind decides which client implementation serves a backend and which
/// operations it supports.
#[derive(
    Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BackendKind {
    /// Blob-availability chain (Celestia node API). Submit only.
    Blob,
    /// EVM settlement chain reached over Ethereum JSON-RPC. Submit and proofs.
    Evm,
}

impl BackendKind {
    /// Returns `true` when backends of this kind can serve inclusion proofs.
    #[must_use]
    pub const fn supports_proofs(self) -> bool {
        matches!(self, Self::Evm)
    }
}

/// Declarative description of one named backend.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct BackendDefinition {
    /// Identifier callers use in request targets.
    pub name: String,
    /// Protocol family of the backend.
    pub kind: BackendKind,
    /// JSON-RPC endpoint of the node.
    pub rpc_url: Url,
    /// Environment variable holding a bearer token for the node, if any.
    #[serde(default)]
    pub auth_token_env: Option<String>,
    /// Node-managed account that signs EVM submissions. EVM backends refuse
    /// submissions until one is set; proofs do not need it.
    #[serde(default)]
    pub sender: Option<String>,
    /// Namespace used for blob submissions whose target names none.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Fee tier applied to every submission on this backend.
    #[serde(default)]
    pub fees: FeeProfile,
}

impl BackendDefinition {
    /// Builds a definition with an empty fee tier and no credentials.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: BackendKind, rpc_url: Url) -> Self {
        Self {
            name: name.into(),
            kind,
            rpc_url,
            auth_token_env: None,
            sender: None,
            namespace: None,
            fees: FeeProfile::default(),
        }
    }

    /// Replaces the fee tier.
    #[must_use]
    pub fn with_fees(mut self, fees: FeeProfile) -> Self {
        self.fees = fees;
        self
    }

    /// Names the environment variable carrying the node's bearer token.
    #[must_use]
    pub fn with_auth_token_env(mut self, variable: impl Into<String>) -> Self {
        self.auth_token_env = Some(variable.into());
        self
    }

    /// Sets the signing account for EVM submissions.
    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Sets the namespace applied when a blob target does not name one.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Returns the lookup key used for routing: trimmed and lower-cased.
    #[must_use]
    pub fn key(&self) -> String {
        normalise_backend_name(&self.name)
    }
}

impl fmt::Display for BackendDefinition {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}={}@{}", self.name, self.kind, self.rpc_url)
    }
}

impl FromStr for BackendDefinition {
    type Err = BackendDefinitionParseError;

    /// Parses the command-line form `name=kind@url`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (name, rest) = input
            .split_once('=')
            .ok_or_else(|| BackendDefinitionParseError::MissingName(input.to_owned()))?;
        let (kind, url) = rest
            .split_once('@')
            .ok_or_else(|| BackendDefinitionParseError::MissingUrl(input.to_owned()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(BackendDefinitionParseError::MissingName(input.to_owned()));
        }
        let kind = BackendKind::from_str(kind.trim())
            .map_err(|_| BackendDefinitionParseError::UnknownKind(kind.trim().to_owned()))?;
        let rpc_url = Url::parse(url.trim())?;
        Ok(Self::new(name, kind, rpc_url))
    }
}

/// Normalises a backend identifier for lookups.
#[must_use]
pub fn normalise_backend_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Errors produced when parsing a [`BackendDefinition`] from text.
#[derive(Debug, Error)]
pub enum BackendDefinitionParseError {
    /// The `name=` prefix was missing or empty.
    #[error("backend definition '{0}' is missing a name before '='")]
    MissingName(String),
    /// The `@url` suffix was missing.
    #[error("backend definition '{0}' is missing the '@' before its RPC URL")]
    MissingUrl(String),
    /// The kind was not one of the supported families.
    #[error("unsupported backend kind '{0}'")]
    UnknownKind(String),
    /// The RPC URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
