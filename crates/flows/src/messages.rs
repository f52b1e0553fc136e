//! Wire payloads exchanged between initiating and responding flows.

use {
    ledger::{FinalizedTransaction, StatesToRecord},
    model::SignedTransaction,
    serde::{Deserialize, Serialize},
};

pub const CONSUME_ASSET: &str = "consume-asset";
pub const CREATE_AUCTION: &str = "create-auction";
pub const INFORM_TRANSACTION: &str = "inform-transaction";

/// Reply to a co-signing request. The proposal itself is a bare
/// [`SignedTransaction`] carrying the signatures gathered so far.
#[derive(Debug, Serialize, Deserialize)]
pub enum SignResponse {
    Signed(SignedTransaction),
    Refused(String),
}

/// A finalized transaction pushed to a party that should record it.
#[derive(Debug, Serialize, Deserialize)]
pub struct InformRequest {
    pub ftx: FinalizedTransaction,
    pub policy: StatesToRecord,
}
