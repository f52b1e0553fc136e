//! Contract rules for the Dutch-auction ledger.
//!
//! Verification is pure and synchronous: every engine is handed a complete
//! transaction bundle and either accepts it or rejects it with a named rule
//! violation. Every required signer of a transaction runs the exact same
//! code over the exact same bundle, so nothing in here may read clocks,
//! randomness, or any other ambient state.

pub mod asset;
pub mod auction;
pub mod pricing;
mod rejection;

pub use rejection::Rejection;

use model::LedgerTransaction;

pub(crate) fn require(condition: bool, rejection: Rejection) -> Result<(), Rejection> {
    condition.then_some(()).ok_or(rejection)
}

/// Runs every engine whose states or commands appear in the transaction.
///
/// This is the single entry point used by flows before signing and by the
/// notary before finalizing.
pub fn verify(tx: &LedgerTransaction) -> Result<(), Rejection> {
    let touches_assets = !tx.asset_commands().is_empty()
        || !tx.input_assets().is_empty()
        || !tx.output_assets().is_empty();
    if touches_assets {
        asset::verify(tx)?;
    }

    let touches_auctions = !tx.auction_commands().is_empty()
        || !tx.input_auctions().is_empty()
        || !tx.output_auctions().is_empty();
    if touches_auctions {
        auction::verify(tx)?;
    }

    Ok(())
}
