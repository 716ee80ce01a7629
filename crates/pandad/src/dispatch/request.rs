//! Request envelope parsing.
//!
//! The envelope is read leniently: `jsonrpc` is ignored and every member is
//! optional at the serde level so that a missing `method` or `params` still
//! yields the caller's `id` for the error response. The `id` is kept as raw
//! JSON text and echoed back without re-encoding.

use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_json::Value;
use serde_json::error::Category;
use serde_json::value::RawValue;

use super::errors::DispatchError;
use super::response::RequestId;

/// Parsed JSON-RPC request envelope.
#[derive(Debug, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    id: Option<Box<RawValue>>,
    #[serde(default)]
    method: Option<Value>,
    #[serde(default)]
    params: Option<Value>,
}

impl RequestEnvelope {
    /// Parses a request body.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Parse` when the body is not JSON and
    /// `DispatchError::InvalidRequest` when it is JSON but not an object.
    pub fn parse(body: &[u8]) -> Result<Self, DispatchError> {
        if starts_with_array(body) {
            return match serde_json::from_slice::<IgnoredAny>(body) {
                Ok(_) => Err(DispatchError::invalid_request(
                    "batch requests are not supported",
                )),
                Err(error) => Err(DispatchError::from_json_error(&error)),
            };
        }

        serde_json::from_slice(body).map_err(|error| match error.classify() {
            Category::Data => DispatchError::invalid_request("request must be a JSON object"),
            Category::Io | Category::Syntax | Category::Eof => {
                DispatchError::from_json_error(&error)
            }
        })
    }

    /// Identifier to echo in the response.
    #[must_use]
    pub fn id(&self) -> RequestId {
        RequestId::from_raw(self.id.clone())
    }

    /// Splits the envelope into its method name and optional params.
    ///
    /// Params are checked only once the method is known, so an unknown
    /// method without params still reports method-not-found.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::InvalidRequest` when `method` is missing or
    /// not a string.
    pub fn into_call(self) -> Result<(String, Option<Value>), DispatchError> {
        let method = match self.method {
            Some(Value::String(method)) => method,
            Some(_) => return Err(DispatchError::invalid_request("method must be a string")),
            None => return Err(DispatchError::invalid_request("method is missing")),
        };
        Ok((method, self.params))
    }
}

fn starts_with_array(body: &[u8]) -> bool {
    body.iter()
        .find(|byte| !byte.is_ascii_whitespace())
        .is_some_and(|byte| *byte == b'[')
}
