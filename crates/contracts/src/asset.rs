//! Lifecycle rules for auctionable assets.
//!
//! An asset is issued, transferred and eventually consumed; while an auction
//! is running it is locked so that no competing transfer or consumption can
//! settle. Lock and unlock are only legal inside a transaction that also
//! carries the matching auction command.

use {
    crate::{Rejection, require},
    itertools::Itertools,
    model::{AssetCommand, AuctionCommand, LedgerTransaction, PublicKey},
    std::collections::BTreeSet,
};

/// Verifies the asset rules of the transaction, dispatching on its single
/// asset command.
pub fn verify(tx: &LedgerTransaction) -> Result<(), Rejection> {
    let (command, signers) = tx
        .asset_commands()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::AssetCommandCardinality)?;
    match command {
        AssetCommand::Issue => verify_issue(tx, signers),
        AssetCommand::Transfer => verify_transfer(tx, signers),
        AssetCommand::Consume => verify_consume(tx, signers),
        AssetCommand::Lock => verify_lock(tx, signers),
        AssetCommand::Unlock => verify_unlock(tx, signers),
    }
}

fn verify_issue(tx: &LedgerTransaction, signers: &BTreeSet<PublicKey>) -> Result<(), Rejection> {
    require(tx.inputs.is_empty(), Rejection::IssueHasInputs)?;
    require(tx.outputs.len() == 1, Rejection::IssueOutputCount)?;
    let output = tx
        .output_assets()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::IssueOutputCount)?;
    require(!output.description.is_empty(), Rejection::EmptyDescription)?;
    require(!output.locked, Rejection::AssetLocked)?;
    require(
        *signers == BTreeSet::from([output.issuer.key]),
        Rejection::IssuerMustSign,
    )
}

fn verify_transfer(tx: &LedgerTransaction, signers: &BTreeSet<PublicKey>) -> Result<(), Rejection> {
    require(tx.inputs.len() == 1, Rejection::TransferInputCount)?;
    require(tx.outputs.len() == 1, Rejection::TransferOutputCount)?;
    let input = tx
        .input_assets()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::TransferInputCount)?;
    let output = tx
        .output_assets()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::TransferOutputCount)?;
    require(!input.locked, Rejection::AssetLocked)?;
    require(
        *output == input.clone().with_owner(output.owner.clone()),
        Rejection::OnlyOwnerMayChange,
    )?;
    require(input.owner != output.owner, Rejection::OwnerMustChange)?;
    require(
        *signers == BTreeSet::from([input.owner.key]),
        Rejection::OldOwnerMustSign,
    )
}

fn verify_consume(tx: &LedgerTransaction, signers: &BTreeSet<PublicKey>) -> Result<(), Rejection> {
    require(tx.inputs.len() == 1, Rejection::ConsumeInputCount)?;
    require(tx.outputs.is_empty(), Rejection::ConsumeHasOutputs)?;
    let input = tx
        .input_assets()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::ConsumeInputCount)?;
    require(!input.locked, Rejection::AssetLocked)?;
    require(
        *signers == BTreeSet::from([input.owner.key, input.issuer.key]),
        Rejection::OwnerAndIssuerMustSign,
    )
}

fn verify_lock(tx: &LedgerTransaction, signers: &BTreeSet<PublicKey>) -> Result<(), Rejection> {
    let input = tx
        .input_assets()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::LockInputCount)?;
    let output = tx
        .output_assets()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::LockOutputCount)?;
    require(!input.locked, Rejection::AssetLocked)?;
    require(output.locked, Rejection::OutputNotLocked)?;
    require(
        *output == input.clone().lock(),
        Rejection::OnlyLockMayChange,
    )?;
    let auction_commands = tx.auction_commands();
    require(
        matches!(auction_commands.as_slice(), [(AuctionCommand::Create, _)]),
        Rejection::LockWithoutCreate,
    )?;
    require(
        *signers == BTreeSet::from([input.owner.key]),
        Rejection::OwnerMustSign,
    )?;
    let auction = tx
        .output_auctions()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::MissingAuctionOutput)?;
    require(auction.asset_id == output.id, Rejection::WrongAssetReference)
}

fn verify_unlock(tx: &LedgerTransaction, signers: &BTreeSet<PublicKey>) -> Result<(), Rejection> {
    let input = tx
        .input_assets()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::UnlockInputCount)?;
    let output = tx
        .output_assets()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::UnlockOutputCount)?;
    require(input.locked, Rejection::AssetNotLocked)?;
    require(!output.locked, Rejection::OutputStillLocked)?;
    require(
        *output == input.clone().unlock().with_owner(output.owner.clone()),
        Rejection::OnlyLockAndOwnerMayChange,
    )?;
    require(
        *signers == BTreeSet::from([output.owner.key]),
        Rejection::NewOwnerMustSign,
    )?;
    let auction_commands = tx.auction_commands();
    require(
        matches!(
            auction_commands.as_slice(),
            [(AuctionCommand::End | AuctionCommand::Bid, _)]
        ),
        Rejection::UnlockWithoutTerminalCommand,
    )?;
    let auction = tx
        .input_auctions()
        .into_iter()
        .exactly_one()
        .map_err(|_| Rejection::MissingAuctionInput)?;
    require(auction.asset_id == input.id, Rejection::WrongAssetReference)
}
