//! EVM settlement chain client.
//!
//! Submissions are type-3 transactions signed by a node-managed account via
//! `eth_sendTransaction`, carrying the payload as calldata and as a blob.
//! The blob is a full 131072-byte sidecar: the payload is packed 31 bytes per
//! 32-byte field element, each element keeping a zero top byte so it stays
//! below the field modulus, and the remainder is zero padding. Submissions
//! need a configured sender; proofs are block header commitments read with
//! `eth_getBlockByNumber` and need none.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use panda_config::{BackendKind, FeeProfile};

use super::errors::BackendError;
use super::rpc::JsonRpcClient;
use super::{BackendClient, BlobSubmission, ProofRequest};

const SEND_METHOD: &str = "eth_sendTransaction";
const BLOCK_METHOD: &str = "eth_getBlockByNumber";

const FIELD_ELEMENTS_PER_BLOB: usize = 4096;
const BYTES_PER_FIELD_ELEMENT: usize = 32;
const USABLE_BYTES_PER_FIELD_ELEMENT: usize = 31;
const BLOB_SIZE: usize = FIELD_ELEMENTS_PER_BLOB * BYTES_PER_FIELD_ELEMENT;

/// Largest payload a single blob can carry.
const BLOB_CAPACITY: usize = FIELD_ELEMENTS_PER_BLOB * USABLE_BYTES_PER_FIELD_ELEMENT;

/// Settlement backend speaking Ethereum JSON-RPC.
#[derive(Debug, Clone)]
pub struct EvmClient {
    rpc: JsonRpcClient,
    sender: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockHeader {
    hash: Option<String>,
    number: Option<String>,
    state_root: String,
    transactions_root: String,
    receipts_root: String,
}

impl EvmClient {
    pub(crate) const fn new(rpc: JsonRpcClient, sender: Option<String>) -> Self {
        Self { rpc, sender }
    }

    fn transaction(
        &self,
        sender: &str,
        to: &str,
        content: &[u8],
        fees: FeeProfile,
    ) -> Result<Value, BackendError> {
        let blob = encode_blob(content).ok_or_else(|| {
            BackendError::invalid_input(
                self.name(),
                format!(
                    "payload of {} bytes exceeds the {BLOB_CAPACITY} byte blob capacity",
                    content.len()
                ),
            )
        })?;
        let mut transaction = Map::new();
        transaction.insert("from".to_owned(), json!(sender));
        transaction.insert("to".to_owned(), json!(to));
        transaction.insert("data".to_owned(), json!(format!("0x{}", hex::encode(content))));
        transaction.insert("blobs".to_owned(), json!([format!("0x{}", hex::encode(blob))]));
        transaction.insert("maxFeePerGas".to_owned(), quantity(fees.max_fee_per_gas));
        transaction.insert(
            "maxPriorityFeePerGas".to_owned(),
            quantity(fees.max_priority_fee_per_gas),
        );
        transaction.insert(
            "maxFeePerBlobGas".to_owned(),
            quantity(fees.max_fee_per_blob_gas),
        );
        Ok(Value::Object(transaction))
    }
}

#[async_trait]
impl BackendClient for EvmClient {
    fn name(&self) -> &str {
        self.rpc.backend()
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Evm
    }

    async fn submit(&self, submission: BlobSubmission<'_>) -> Result<Value, BackendError> {
        let Some(to) = submission.address.map(str::trim).filter(|to| !to.is_empty()) else {
            return Err(BackendError::invalid_input(
                self.name(),
                "settlement submissions require a destination address",
            ));
        };

        let Some(sender) = self.sender.as_deref() else {
            return Err(BackendError::invalid_input(
                self.name(),
                "no sender account is configured for submissions",
            ));
        };

        let transaction = self.transaction(sender, to, submission.content, submission.fees)?;
        let hash: Option<String> = self.rpc.call(SEND_METHOD, json!([transaction])).await?;
        let hash = hash.ok_or_else(|| {
            BackendError::invalid_response(self.name(), SEND_METHOD, "no transaction hash")
        })?;

        Ok(json!({
            "backend": self.name(),
            "transactionHash": hash,
            "to": to,
        }))
    }

    async fn get_proof(&self, request: ProofRequest<'_>) -> Result<Value, BackendError> {
        let header: Option<BlockHeader> = self
            .rpc
            .call(BLOCK_METHOD, json!([quantity(request.height), false]))
            .await?;
        let Some(header) = header else {
            return Err(BackendError::MissingBlock {
                backend: self.name().to_owned(),
                height: request.height,
            });
        };

        Ok(json!({
            "backend": self.name(),
            "height": request.height,
            "blockNumber": header.number,
            "blockHash": header.hash,
            "stateRoot": header.state_root,
            "transactionsRoot": header.transactions_root,
            "receiptsRoot": header.receipts_root,
            "namespace": request.namespace,
            "verifyOn": request.verify_on,
        }))
    }
}

/// Packs `content` into a zero-padded blob, or `None` when it does not fit.
fn encode_blob(content: &[u8]) -> Option<Vec<u8>> {
    if content.len() > BLOB_CAPACITY {
        return None;
    }
    let mut blob = vec![0_u8; BLOB_SIZE];
    let elements = blob.chunks_exact_mut(BYTES_PER_FIELD_ELEMENT);
    for (element, chunk) in elements.zip(content.chunks(USABLE_BYTES_PER_FIELD_ELEMENT)) {
        if let Some(body) = element.get_mut(1..=chunk.len()) {
            body.copy_from_slice(chunk);
        }
    }
    Some(blob)
}

/// Encodes an integer as a JSON-RPC quantity.
fn quantity(value: u64) -> Value {
    Value::String(format!("0x{value:x}"))
}
