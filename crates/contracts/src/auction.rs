//! Lifecycle rules for Dutch auctions.
//!
//! An auction is created atomically with locking its asset, optionally
//! decreased in price by the owner, and consumed terminally by either an
//! owner-initiated end or a bidder's bid. The bid rule recomputes the
//! clearing price from the transaction's attested time window; a bidder
//! cannot claim a lower price than the schedule allows for the real time at
//! which the bid is notarized.

use {
    crate::{Rejection, pricing, require},
    chrono::Duration,
    itertools::Itertools,
    model::{AssetCommand, AuctionCommand, AuctionState, LedgerTransaction, PublicKey},
    std::collections::BTreeSet,
};

/// Verifies the auction rules of the transaction, dispatching on its single
/// auction command.
pub fn verify(tx: &LedgerTransaction) -> Result<(), Rejection> {
    let (command, signers) = tx
        .auction_commands()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::AuctionCommandCardinality)?;
    match command {
        AuctionCommand::Create => verify_create(tx, signers),
        AuctionCommand::Decrease => verify_decrease(tx, signers),
        AuctionCommand::End => verify_end(tx, signers),
        AuctionCommand::Bid => verify_bid(tx, signers),
    }
}

fn verify_create(tx: &LedgerTransaction, signers: &BTreeSet<PublicKey>) -> Result<(), Rejection> {
    require(
        tx.input_auctions().is_empty(),
        Rejection::CreateHasAuctionInputs,
    )?;
    let output = tx
        .output_auctions()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::CreateOutputCount)?;
    require(!output.bidders.contains(&output.owner), Rejection::OwnerIsBidder)?;
    require(!output.bidders.is_empty(), Rejection::NoBidders)?;
    require(!output.price.is_zero(), Rejection::StartPriceNotPositive)?;
    require(!output.decrement.is_zero(), Rejection::DecrementNotPositive)?;
    require(
        output.decrement.token == output.price.token,
        Rejection::TokenMismatch,
    )?;
    require(output.period > Duration::zero(), Rejection::PeriodNotPositive)?;
    require(
        matches!(tx.asset_commands().as_slice(), [(AssetCommand::Lock, _)]),
        Rejection::CreateWithoutLock,
    )?;
    let asset = tx
        .output_assets()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::WrongAssetReference)?;
    require(output.asset_id == asset.id, Rejection::WrongAssetReference)?;
    // Bidder consent is established up front: everyone signs the creation.
    let required: BTreeSet<_> = output
        .participants()
        .iter()
        .map(|party| party.key)
        .collect();
    require(*signers == required, Rejection::AllParticipantsMustSign)
}

fn verify_decrease(tx: &LedgerTransaction, signers: &BTreeSet<PublicKey>) -> Result<(), Rejection> {
    let input = tx
        .input_auctions()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::DecreaseInputCount)?;
    require(tx.inputs.len() == 1, Rejection::DecreaseInputCount)?;
    let output = tx
        .output_auctions()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::DecreaseOutputCount)?;
    require(tx.outputs.len() == 1, Rejection::DecreaseOutputCount)?;
    require(
        output.price.token == input.price.token,
        Rejection::TokenMismatch,
    )?;
    require(
        *output == input.clone().with_price(output.price.clone()),
        Rejection::OnlyPriceMayChange,
    )?;
    require(
        output.price.quantity < input.price.quantity,
        Rejection::PriceMustDecrease,
    )?;
    require(!output.price.is_zero(), Rejection::NewPriceNotPositive)?;
    require(
        *signers == BTreeSet::from([input.owner.key]),
        Rejection::OwnerMustSign,
    )
}

fn verify_end(tx: &LedgerTransaction, signers: &BTreeSet<PublicKey>) -> Result<(), Rejection> {
    let input = tx
        .input_auctions()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::EndInputCount)?;
    require(tx.output_auctions().is_empty(), Rejection::EndHasOutputs)?;
    require(
        *signers == BTreeSet::from([input.owner.key]),
        Rejection::OwnerMustSign,
    )?;
    require(
        matches!(tx.asset_commands().as_slice(), [(AssetCommand::Unlock, _)]),
        Rejection::TerminalWithoutUnlock,
    )?;
    let asset = tx
        .input_assets()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::WrongAssetReference)?;
    require(input.asset_id == asset.id, Rejection::WrongAssetReference)
}

fn verify_bid(tx: &LedgerTransaction, signers: &BTreeSet<PublicKey>) -> Result<(), Rejection> {
    let input = tx
        .input_auctions()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::BidInputCount)?;
    require(tx.output_auctions().is_empty(), Rejection::BidHasOutputs)?;
    let bidder_keys: BTreeSet<_> = input.bidders.iter().map(|bidder| bidder.key).collect();
    require(
        !signers.is_empty() && signers.is_subset(&bidder_keys),
        Rejection::MustBeBidder,
    )?;
    require(
        matches!(tx.asset_commands().as_slice(), [(AssetCommand::Unlock, _)]),
        Rejection::TerminalWithoutUnlock,
    )?;
    let asset = tx
        .input_assets()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::WrongAssetReference)?;
    require(input.asset_id == asset.id, Rejection::WrongAssetReference)?;

    let from = tx
        .time_window
        .and_then(|window| window.from)
        .ok_or(Rejection::MissingTimeWindow)?;
    let paid: u64 = tx
        .output_tokens()
        .iter()
        .filter(|transfer| {
            transfer.holder == input.owner && transfer.amount.token == input.price.token
        })
        .map(|transfer| transfer.amount.quantity)
        .sum();
    let expected = pricing::current_price(input, from);
    require(paid >= expected.quantity, Rejection::InsufficientPayment)?;
    require(window_covers_payment(input, from, paid), Rejection::StaleTimeWindow)
}

/// The paid amount implies how many decrements must already have elapsed;
/// the attested window lower bound may not predate that instant. The lower
/// bound comes from the notary, so a bidder cannot backdate its claimed
/// price on its own.
fn window_covers_payment(
    auction: &AuctionState,
    from: chrono::DateTime<chrono::Utc>,
    paid: u64,
) -> bool {
    if auction.decrement.is_zero() {
        return true;
    }
    let implied_periods = auction.price.quantity.saturating_sub(paid) / auction.decrement.quantity;
    let offset_ms = auction
        .period
        .num_milliseconds()
        .saturating_mul(i64::try_from(implied_periods).unwrap_or(i64::MAX));
    from - auction.start_time >= Duration::milliseconds(offset_ms)
}
