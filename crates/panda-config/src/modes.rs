//! Enumerated switches selected by configuration.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output format for gateway logs.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, for log shippers.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// How the dispatcher reacts when a backend call fails mid-request.
///
/// The policy applies uniformly to submissions and proof queries.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FailurePolicy {
    /// Calls run one at a time in request order and the first failure stops
    /// the request. The error payload lists every receipt already obtained.
    #[default]
    FailFast,
    /// Every matched call is attempted. Calls to distinct backends run
    /// concurrently and each result slot carries a success or failure tag.
    ContinueOnError,
}

/// Errors encountered while parsing a [`LogFormat`] or [`FailurePolicy`].
pub type ModeParseError = strum::ParseError;
