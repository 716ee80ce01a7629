//! Per-backend fee tiers.
//!
//! Every settlement backend submits with a fixed fee tier: the maximum fee per
//! gas, the maximum priority fee per gas and the maximum fee per blob gas, all
//! in wei. Tiers are declared on each [`BackendDefinition`] and can be
//! adjusted with `backend:field=value` directives. The resolved [`FeeTable`]
//! is built once at startup and looked up by backend identity.
//!
//! [`BackendDefinition`]: crate::BackendDefinition

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::backend::{BackendDefinition, normalise_backend_name};

/// One gwei expressed in wei.
pub const GWEI: u64 = 1_000_000_000;

/// Fixed fee parameters for submissions to one backend, in wei.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct FeeProfile {
    /// Upper bound on the total fee per unit of execution gas.
    #[serde(default)]
    pub max_fee_per_gas: u64,
    /// Upper bound on the tip per unit of execution gas.
    #[serde(default)]
    pub max_priority_fee_per_gas: u64,
    /// Upper bound on the fee per unit of blob gas.
    #[serde(default)]
    pub max_fee_per_blob_gas: u64,
}

impl FeeProfile {
    /// Builds a profile from values expressed in gwei.
    #[must_use]
    pub const fn from_gwei(max_fee: u64, max_priority_fee: u64, max_blob_fee: u64) -> Self {
        Self {
            max_fee_per_gas: max_fee.saturating_mul(GWEI),
            max_priority_fee_per_gas: max_priority_fee.saturating_mul(GWEI),
            max_fee_per_blob_gas: max_blob_fee.saturating_mul(GWEI),
        }
    }

    /// Returns the value stored for `field`.
    #[must_use]
    pub const fn get(&self, field: FeeField) -> u64 {
        match field {
            FeeField::MaxFeePerGas => self.max_fee_per_gas,
            FeeField::MaxPriorityFeePerGas => self.max_priority_fee_per_gas,
            FeeField::MaxFeePerBlobGas => self.max_fee_per_blob_gas,
        }
    }

    /// Overwrites the value stored for `field`.
    pub const fn set(&mut self, field: FeeField, value: u64) {
        match field {
            FeeField::MaxFeePerGas => self.max_fee_per_gas = value,
            FeeField::MaxPriorityFeePerGas => self.max_priority_fee_per_gas = value,
            FeeField::MaxFeePerBlobGas => self.max_fee_per_blob_gas = value,
        }
    }
}

/// Field of a [`FeeProfile`] addressed by a directive.
#[derive(
    Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FeeField {
    /// `max_fee_per_gas`
    MaxFeePerGas,
    /// `max_priority_fee_per_gas`
    MaxPriorityFeePerGas,
    /// `max_fee_per_blob_gas`
    MaxFeePerBlobGas,
}

/// Override for a single fee field of a named backend.
///
/// The textual form is `backend:field=value`, where `value` is an integer
/// number of wei or an integer followed by `gwei`. Configuration files use
/// the same textual form.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct FeeDirective {
    /// Backend the directive applies to.
    pub backend: String,
    /// Field being overridden.
    pub field: FeeField,
    /// New value in wei.
    pub value: u64,
}

impl FeeDirective {
    /// Creates a new directive.
    #[must_use]
    pub fn new(backend: impl Into<String>, field: FeeField, value: u64) -> Self {
        Self {
            backend: backend.into(),
            field,
            value,
        }
    }
}

impl fmt::Display for FeeDirective {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}={}", self.backend, self.field, self.value)
    }
}

impl TryFrom<String> for FeeDirective {
    type Error = FeeDirectiveParseError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<FeeDirective> for String {
    fn from(directive: FeeDirective) -> Self {
        directive.to_string()
    }
}

impl FromStr for FeeDirective {
    type Err = FeeDirectiveParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (backend, rest) = input
            .split_once(':')
            .ok_or_else(|| FeeDirectiveParseError::MissingBackend(input.to_owned()))?;
        let (field, value) = rest
            .split_once('=')
            .ok_or_else(|| FeeDirectiveParseError::MissingValue(input.to_owned()))?;
        let field = FeeField::from_str(field.trim())
            .map_err(|_| FeeDirectiveParseError::UnknownField(field.trim().to_owned()))?;
        let value = parse_wei(value.trim())
            .ok_or_else(|| FeeDirectiveParseError::InvalidValue(value.trim().to_owned()))?;
        Ok(Self::new(backend.trim(), field, value))
    }
}

fn parse_wei(value: &str) -> Option<u64> {
    match value.strip_suffix("gwei") {
        Some(gwei) => gwei.trim().parse::<u64>().ok()?.checked_mul(GWEI),
        None => value.parse().ok(),
    }
}

/// Errors produced when parsing [`FeeDirective`] values.
#[derive(Debug, Error)]
pub enum FeeDirectiveParseError {
    /// Backend separator (`:`) was missing.
    #[error("fee directive '{0}' is missing the backend separator ':'")]
    MissingBackend(String),
    /// Value assignment (`=`) was missing.
    #[error("fee directive '{0}' is missing the value assignment '='")]
    MissingValue(String),
    /// The field name was not recognised.
    #[error("unknown fee field '{0}'")]
    UnknownField(String),
    /// The value was not a wei or gwei integer.
    #[error("invalid fee value '{0}'")]
    InvalidValue(String),
}

/// Resolved fee tiers keyed by normalised backend name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeTable {
    profiles: BTreeMap<String, FeeProfile>,
}

impl FeeTable {
    /// Builds the table from backend definitions, then applies directives in
    /// order. Directives naming undefined backends are ignored; use
    /// [`Config::validate`](crate::Config::validate) to reject them up front.
    #[must_use]
    pub fn resolve<'a, D>(definitions: &[BackendDefinition], directives: D) -> Self
    where
        D: IntoIterator<Item = &'a FeeDirective>,
    {
        let mut profiles: BTreeMap<String, FeeProfile> = definitions
            .iter()
            .map(|definition| (definition.key(), definition.fees))
            .collect();
        for directive in directives {
            if let Some(profile) = profiles.get_mut(&normalise_backend_name(&directive.backend)) {
                profile.set(directive.field, directive.value);
            }
        }
        Self { profiles }
    }

    /// Returns the tier for `backend`, when one is known.
    #[must_use]
    pub fn profile_for(&self, backend: &str) -> Option<FeeProfile> {
        self.profiles.get(&normalise_backend_name(backend)).copied()
    }
}

/// Deduplicates fee directives in place, keeping the last value per
/// (backend, field) pair.
pub fn deduplicate_fee_directives(directives: &mut Vec<FeeDirective>) {
    let mut merged: BTreeMap<(String, FeeField), FeeDirective> = BTreeMap::new();
    for mut directive in directives.drain(..) {
        directive.backend = normalise_backend_name(&directive.backend);
        merged.insert((directive.backend.clone(), directive.field), directive);
    }
    *directives = merged.into_values().collect();
}
