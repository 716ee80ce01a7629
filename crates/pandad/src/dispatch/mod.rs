//! JSON-RPC request dispatch.
//!
//! The dispatcher turns one request body into one response envelope. It
//! knows two methods:
//!
//! ```json
//! {"id":1,"method":"panda.submitBlob","params":[{"data":"A","targets":[{"name":"celestia","namespace":"0x01"},{"name":"ethereum","address":"0x1"}]}]}
//! {"id":2,"method":"panda.getProof","params":[{"height":100,"name":"ethereum","verifyOn":"gnosis"}]}
//! ```
//!
//! ## Ordering
//!
//! Items are visited in input order and targets within an item in input
//! order. Each matched (item, target) pair is one backend call and one
//! result slot, so results line up with the request even when targets are
//! skipped. Unknown backend names, and proof queries naming backends without
//! proof support, are skipped silently.
//!
//! ## Failures
//!
//! Under `fail_fast` calls run one after another and the first failure ends
//! the request with a `-32000` error listing the results already obtained.
//! Under `continue_on_error` every slot is reported with a status tag.

mod errors;
mod executor;
mod params;
mod plan;
mod request;
mod response;
mod router;

pub use self::errors::{CallSite, DispatchError, FailedCall, PendingCall};
pub use self::params::{ProofQuery, SubmitItem, Target};
pub use self::plan::{Resolution, SkipReason, resolve_proof, resolve_submit};
pub use self::response::{ErrorObject, RequestId, RpcResponse};
pub use self::router::{Dispatcher, Method};
