//! JSON-RPC response envelopes.

use serde::{Serialize, Serializer};
use serde_json::Value;
use serde_json::value::RawValue;

use super::errors::DispatchError;

const JSONRPC_VERSION: &str = "2.0";

/// Request identifier echoed exactly as the caller wrote it.
#[derive(Debug, Clone, Default)]
pub struct RequestId(Option<Box<RawValue>>);

impl RequestId {
    /// Identifier used when the request carried none or could not be read.
    #[must_use]
    pub const fn null() -> Self {
        Self(None)
    }

    pub(crate) const fn from_raw(raw: Option<Box<RawValue>>) -> Self {
        Self(raw)
    }

    /// JSON text of the identifier.
    #[must_use]
    pub fn as_json(&self) -> &str {
        self.0.as_deref().map_or("null", RawValue::get)
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(raw) => raw.serialize(serializer),
            None => serializer.serialize_unit(),
        }
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorObject {
    code: i64,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl ErrorObject {
    /// Numeric error code.
    #[must_use]
    pub const fn code(&self) -> i64 {
        self.code
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Structured error data, when present.
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

impl From<&DispatchError> for ErrorObject {
    fn from(error: &DispatchError) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
            data: error.data(),
        }
    }
}

/// Response envelope carrying either a `result` or an `error`.
#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    jsonrpc: &'static str,
    id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorObject>,
}

impl RpcResponse {
    /// Builds a success response.
    #[must_use]
    pub const fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response.
    #[must_use]
    pub fn failure(id: RequestId, error: &DispatchError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(ErrorObject::from(error)),
        }
    }

    /// Identifier echoed to the caller.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        &self.id
    }

    /// Result of a successful call.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Error of a failed call.
    #[must_use]
    pub const fn error(&self) -> Option<&ErrorObject> {
        self.error.as_ref()
    }
}
