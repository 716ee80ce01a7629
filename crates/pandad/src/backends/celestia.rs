//! Celestia node client.
//!
//! Payloads are posted with `blob.Submit` under a version-0 namespace. The
//! caller's namespace is an identifier of at most ten bytes, written as hex
//! (with or without a `0x` prefix) or as plain text, and is left-padded into
//! the 29-byte namespace the node expects. Targets that name no namespace
//! fall back to the backend's configured one.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

use panda_config::BackendKind;

use super::errors::BackendError;
use super::rpc::JsonRpcClient;
use super::{BackendClient, BlobSubmission};

const NAMESPACE_SIZE: usize = 29;
const NAMESPACE_ID_SIZE: usize = 10;
const NAMESPACE_VERSION_ZERO: u8 = 0;
const SHARE_VERSION_ZERO: u8 = 0;
const SUBMIT_METHOD: &str = "blob.Submit";

/// Blob backend speaking the Celestia node API.
#[derive(Debug, Clone)]
pub struct CelestiaClient {
    rpc: JsonRpcClient,
    default_namespace: Option<String>,
}

impl CelestiaClient {
    pub(crate) const fn new(rpc: JsonRpcClient, default_namespace: Option<String>) -> Self {
        Self {
            rpc,
            default_namespace,
        }
    }
}

#[async_trait]
impl BackendClient for CelestiaClient {
    fn name(&self) -> &str {
        self.rpc.backend()
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Blob
    }

    async fn submit(&self, submission: BlobSubmission<'_>) -> Result<Value, BackendError> {
        let Some(requested) = submission
            .namespace
            .or(self.default_namespace.as_deref())
        else {
            return Err(BackendError::invalid_input(
                self.name(),
                "blob submissions require a namespace and none is configured",
            ));
        };
        let namespace = encode_namespace(requested)
            .map_err(|message| BackendError::invalid_input(self.name(), message))?;

        let blob = json!({
            "namespace": STANDARD.encode(namespace),
            "data": STANDARD.encode(submission.content),
            "share_version": SHARE_VERSION_ZERO,
        });
        let height: u64 = self
            .rpc
            .call(SUBMIT_METHOD, json!([[blob], {}]))
            .await?;

        Ok(json!({
            "backend": self.name(),
            "height": height,
            "namespace": hex::encode(namespace),
        }))
    }
}

/// Builds a version-0 namespace from a caller-supplied identifier.
fn encode_namespace(requested: &str) -> Result<[u8; NAMESPACE_SIZE], String> {
    let trimmed = requested.trim();
    let id = decode_identifier(trimmed);
    if id.is_empty() {
        return Err("namespace must not be empty".to_owned());
    }
    if id.len() > NAMESPACE_ID_SIZE {
        return Err(format!(
            "namespace '{trimmed}' exceeds {NAMESPACE_ID_SIZE} bytes"
        ));
    }

    let mut namespace = [0_u8; NAMESPACE_SIZE];
    namespace[0] = NAMESPACE_VERSION_ZERO;
    let offset = NAMESPACE_SIZE - id.len();
    namespace[offset..].copy_from_slice(&id);
    Ok(namespace)
}

fn decode_identifier(text: &str) -> Vec<u8> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    match hex::decode(digits) {
        Ok(bytes) if !digits.is_empty() => bytes,
        _ => text.as_bytes().to_vec(),
    }
}
