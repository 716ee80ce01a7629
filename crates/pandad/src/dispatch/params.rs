//! Typed params for the two dispatch methods.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::DispatchError;

/// One payload and the backends it should be posted to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitItem {
    /// Payload, submitted as its UTF-8 bytes.
    pub data: String,
    /// Destinations in call order. Older callers send this as `das`.
    #[serde(alias = "das", default)]
    pub targets: Vec<Target>,
}

/// Destination of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Target {
    /// Backend name.
    pub name: String,
    /// Namespace on blob backends.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Destination account on settlement backends.
    #[serde(default)]
    pub address: Option<String>,
}

/// Inclusion proof lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProofQuery {
    /// Block height.
    pub height: u64,
    /// Backend name.
    pub name: String,
    /// Namespace the blob was posted under.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Backend to cross-verify the proof on.
    #[serde(default, rename = "verifyOn", alias = "verify_on")]
    pub verify_on: Option<String>,
}

/// Reads `panda.submitBlob` params: `[items...]`.
///
/// # Errors
///
/// Returns `DispatchError::InvalidParams` when params are not a list of
/// items or the list is empty.
pub fn submit_items(params: Value) -> Result<Vec<SubmitItem>, DispatchError> {
    non_empty_list(params, "item")
}

/// Reads `panda.getProof` params.
///
/// Both `[queries...]` and the older `[<ignored>, [queries...]]` layouts are
/// accepted. A query is always an object, so an array in second position
/// identifies the older layout.
///
/// # Errors
///
/// Returns `DispatchError::InvalidParams` when params are not a list of
/// queries or the list is empty.
pub fn proof_queries(params: Value) -> Result<Vec<ProofQuery>, DispatchError> {
    let params = match params {
        Value::Array(mut layout) if is_wrapped_layout(&layout) => layout.swap_remove(1),
        other => other,
    };
    non_empty_list(params, "query")
}

fn is_wrapped_layout(layout: &[Value]) -> bool {
    layout.len() == 2 && layout.get(1).is_some_and(Value::is_array)
}

fn non_empty_list<T: DeserializeOwned>(
    params: Value,
    noun: &str,
) -> Result<Vec<T>, DispatchError> {
    if !params.is_array() {
        return Err(DispatchError::invalid_params(format!(
            "params must be a list of {noun} objects"
        )));
    }
    let list: Vec<T> = serde_json::from_value(params)
        .map_err(|error| DispatchError::invalid_params(format!("malformed {noun}: {error}")))?;
    if list.is_empty() {
        return Err(DispatchError::invalid_params(format!(
            "at least one {noun} is required"
        )));
    }
    Ok(list)
}
