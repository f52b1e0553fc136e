//! Domain data model for the Dutch-auction settlement engine.
//!
//! Everything in here is an immutable value type: states are never updated in
//! place, a "mutation" consumes the old version as a transaction input and
//! produces a new version as an output. The verification engines in the
//! `contracts` crate operate purely on these types.

pub mod amount;
pub mod asset;
pub mod auction;
pub mod identity;
pub mod ids;
pub mod transaction;

pub use {
    amount::{Amount, AmountError, TokenType},
    asset::AuctionableAsset,
    auction::AuctionState,
    identity::{Party, PublicKey},
    ids::{LinearId, TxHash},
    transaction::{
        AssetCommand,
        AuctionCommand,
        Command,
        CommandKind,
        LedgerTransaction,
        OutputState,
        SignedTransaction,
        StateRef,
        TimeWindow,
        TokenTransfer,
        TransactionBuilder,
    },
};
