use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// TCP address the gateway's HTTP listener binds to.
///
/// Configuration files may spell it as a table (`{ host, port }`) or as the
/// same text accepted on the command line.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(try_from = "ListenRepr", into = "String")]
pub struct ListenEndpoint {
    /// Host name or IP address.
    pub host: String,
    /// TCP port; `0` asks the operating system for an ephemeral port.
    pub port: u16,
}

impl ListenEndpoint {
    /// Builds an endpoint from its parts.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the `host:port` pair accepted by socket resolvers.
    #[must_use]
    pub fn authority(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for ListenEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "tcp://{}", self.authority())
    }
}

impl FromStr for ListenEndpoint {
    type Err = ListenParseError;

    /// Accepts `tcp://host:port`, `http://host:port` or a bare `host:port`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let candidate = if input.contains("://") {
            input.to_owned()
        } else {
            format!("tcp://{input}")
        };
        let url = Url::parse(&candidate)?;
        match url.scheme() {
            "tcp" | "http" => {}
            other => return Err(ListenParseError::UnsupportedScheme(other.to_owned())),
        }
        let host = url
            .host_str()
            .ok_or_else(|| ListenParseError::MissingHost(input.to_owned()))?
            .trim_start_matches('[')
            .trim_end_matches(']');
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ListenParseError::MissingPort(input.to_owned()))?;
        Ok(Self::new(host, port))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListenRepr {
    Text(String),
    Table { host: String, port: u16 },
}

impl TryFrom<ListenRepr> for ListenEndpoint {
    type Error = ListenParseError;

    fn try_from(repr: ListenRepr) -> Result<Self, Self::Error> {
        match repr {
            ListenRepr::Text(text) => text.parse(),
            ListenRepr::Table { host, port } => Ok(Self::new(host, port)),
        }
    }
}

impl From<ListenEndpoint> for String {
    fn from(endpoint: ListenEndpoint) -> Self {
        endpoint.to_string()
    }
}

/// Errors encountered while parsing a [`ListenEndpoint`] from text.
#[derive(Debug, Error)]
pub enum ListenParseError {
    /// Scheme was not recognised.
    #[error("unsupported listen scheme '{0}'")]
    UnsupportedScheme(String),
    /// Host name was missing.
    #[error("missing listen host in '{0}'")]
    MissingHost(String),
    /// Port was missing from the address.
    #[error("missing listen port in '{0}'")]
    MissingPort(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
