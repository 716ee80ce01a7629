//! Error types for request dispatch failures.
//!
//! Each variant maps to one JSON-RPC error code. Variants raised after
//! backend calls have started carry the partial outcome so callers can
//! reconcile submissions that already went through.

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// JSON-RPC code for bodies that are not JSON.
pub const PARSE_ERROR: i64 = -32700;
/// JSON-RPC code for envelopes of the wrong shape.
pub const INVALID_REQUEST: i64 = -32600;
/// JSON-RPC code for unknown methods.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC code for params of the wrong shape.
pub const INVALID_PARAMS: i64 = -32602;
/// JSON-RPC code for faults inside the gateway.
pub const INTERNAL_ERROR: i64 = -32603;
/// Server-defined code for a failed backend call.
pub const BACKEND_FAILED: i64 = -32000;
/// Server-defined code for a request that ran out of time.
pub const DEADLINE_ELAPSED: i64 = -32001;

/// Position of a backend call within the request.
///
/// `target` is absent for proof queries, which address one backend each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CallSite {
    /// Index of the item or query in `params`.
    pub item: usize,
    /// Index of the target within the item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<usize>,
}

/// Backend call that failed and aborted the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCall {
    /// Where the call sits in the request.
    #[serde(flatten)]
    pub site: CallSite,
    /// Backend that was called.
    pub backend: String,
    /// Failure reported by the backend client.
    pub message: String,
}

/// Backend call that was never issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingCall {
    /// Where the call sits in the request.
    #[serde(flatten)]
    pub site: CallSite,
    /// Backend the call was planned for.
    pub backend: String,
}

/// Errors surfaced while parsing and dispatching a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Body could not be parsed as JSON.
    #[error("parse error: {message}")]
    Parse {
        /// Parser diagnostic.
        message: String,
    },

    /// Body is JSON but not a usable request envelope.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// What is wrong with the envelope.
        message: String,
    },

    /// Method is not served by the gateway.
    #[error("method not found: {method}")]
    MethodNotFound {
        /// Method as sent by the caller.
        method: String,
    },

    /// Params do not match the method's schema.
    #[error("invalid params: {message}")]
    InvalidParams {
        /// What is wrong with the params.
        message: String,
    },

    /// A backend call failed under the fail-fast policy.
    #[error("backend call failed: {}", failed.message)]
    BackendFailed {
        /// Results obtained before the failure, in request order.
        completed: Vec<Value>,
        /// The call that failed.
        failed: FailedCall,
    },

    /// The request deadline passed before every call was issued.
    #[error("request deadline elapsed with {} call(s) not issued", pending.len())]
    DeadlineElapsed {
        /// Results obtained before the deadline, in request order.
        completed: Vec<Value>,
        /// Calls that were never issued.
        pending: Vec<PendingCall>,
    },

    /// Fault inside the gateway.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the fault.
        message: String,
    },
}

impl DispatchError {
    /// Returns the JSON-RPC error code for this error.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::Parse { .. } => PARSE_ERROR,
            Self::InvalidRequest { .. } => INVALID_REQUEST,
            Self::MethodNotFound { .. } => METHOD_NOT_FOUND,
            Self::InvalidParams { .. } => INVALID_PARAMS,
            Self::BackendFailed { .. } => BACKEND_FAILED,
            Self::DeadlineElapsed { .. } => DEADLINE_ELAPSED,
            Self::Internal { .. } => INTERNAL_ERROR,
        }
    }

    /// Returns the structured `data` member of the error object, if any.
    #[must_use]
    pub fn data(&self) -> Option<Value> {
        match self {
            Self::BackendFailed { completed, failed } => Some(json!({
                "completed": completed,
                "failed": failed,
            })),
            Self::DeadlineElapsed { completed, pending } => Some(json!({
                "completed": completed,
                "pending": pending,
            })),
            _ => None,
        }
    }

    /// Creates a parse error from a serde error.
    pub fn from_json_error(source: &serde_json::Error) -> Self {
        Self::Parse {
            message: source.to_string(),
        }
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates the error returned for bodies over the configured limit.
    #[must_use]
    pub fn request_too_large(max_size: usize) -> Self {
        Self::invalid_request(format!("request body exceeds {max_size} byte limit"))
    }

    /// Creates a method not found error.
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    /// Creates an invalid params error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
