//! Transaction orchestration protocols.
//!
//! One flow per lifecycle transition. Each flow is a finite state machine
//! run by the initiating party: it queries the local vault, assembles a
//! candidate transaction, collects counter-party signatures where the
//! contract demands them, submits to the notary, and distributes the
//! finalized transaction to everyone who needs a copy. Counter-parties
//! never trust the initiator's claim of validity; they re-run contract
//! verification before co-signing.
//!
//! Every multi-step flow persists a serialized checkpoint before each
//! suspension, so a restarted process resumes from the last completed step
//! instead of starting over. Flows are plain futures: callers bound their
//! runtime with [`tokio::time::timeout`] and a timed-out flow can be
//! resumed later from its checkpoint.

pub mod bid_auction;
pub mod consume_asset;
pub mod create_auction;
pub mod decrease_auction;
pub mod end_auction;
pub mod inform;
pub mod issue_asset;
mod messages;
pub mod node;
pub mod responder;
pub mod transfer_asset;

pub use {
    bid_auction::BidAuctionFlow,
    consume_asset::ConsumeAssetFlow,
    create_auction::{AuctionResponse, CreateAuctionFlow},
    decrease_auction::DecreaseAuctionFlow,
    end_auction::EndAuctionFlow,
    inform::InformTransactionFlow,
    issue_asset::{IssueAssetFlow, TransactionAndId},
    node::Node,
    transfer_asset::TransferAssetFlow,
};

use {
    contracts::Rejection,
    ledger::{NotaryError, SessionError},
    model::StateRef,
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("asset id does not uniquely refer to an existing asset")]
    AssetNotFound,
    #[error("auction id does not uniquely refer to an existing auction")]
    AuctionNotFound,
    #[error("the initiating party is not a bidder of this auction")]
    NotABidder,
    #[error("the initiating party does not own this asset")]
    NotTheOwner,
    /// A contract rule was violated, either locally or by a co-signer's
    /// independent verification. Carries the violated rule verbatim.
    #[error("{0}")]
    Rejected(#[from] Rejection),
    /// A competing transaction consumed one of our inputs first. Not
    /// retried automatically: a retry needs a fresh look at current state
    /// and is a new flow.
    #[error("the auction has already been settled: input {0} was consumed by a competing transaction")]
    Conflict(StateRef),
    #[error("finalization failed: {0}")]
    Notary(NotaryError),
    #[error("the counterparty refused to sign: {0}")]
    Refused(String),
    #[error("transport failure: {0}")]
    Transport(#[from] SessionError),
    #[error("corrupt checkpoint: {0}")]
    Checkpoint(#[from] serde_json::Error),
}

impl From<NotaryError> for FlowError {
    fn from(error: NotaryError) -> Self {
        match error {
            NotaryError::Conflict(reference) => Self::Conflict(reference),
            NotaryError::Rejected(rejection) => Self::Rejected(rejection),
            other => Self::Notary(other),
        }
    }
}
