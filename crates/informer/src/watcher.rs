//! Distributes auction-terminating transactions to the bidders.
//!
//! A bid is finalized by the winning bidder, who only informs the owner;
//! an end is finalized by the owner alone. Either way the losing bidders
//! would be left holding a consumed auction state. The watcher runs on the
//! owner's node, follows the vault's recorded feed, and pushes every
//! settlement or withdrawal of an auction this party owns to all of its
//! bidders.

use {
    flows::{InformTransactionFlow, Node},
    ledger::{FinalizedTransaction, StatesToRecord, Vault},
    model::AuctionCommand,
    tokio::sync::broadcast::error::RecvError,
};

/// Follows the node's vault until the vault is dropped.
pub fn spawn(node: Node) -> tokio::task::JoinHandle<()> {
    let mut recorded = node.vault.subscribe();
    tokio::spawn(async move {
        loop {
            match recorded.recv().await {
                Ok(ftx) => distribute(&node, ftx).await,
                Err(RecvError::Lagged(skipped)) => {
                    // A skipped terminal transaction stays undelivered
                    // until the bidder next hears about the auction, so
                    // this is worth a loud log.
                    tracing::warn!(
                        party = %node.party,
                        skipped,
                        "informer lagged behind the vault feed"
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

async fn distribute(node: &Node, ftx: FinalizedTransaction) {
    let terminal = ftx
        .tx
        .tx
        .auction_commands()
        .into_iter()
        .any(|(command, _)| matches!(command, AuctionCommand::Bid | AuctionCommand::End));
    if !terminal {
        return;
    }
    let Some(auction) = ftx.tx.tx.input_auctions().first().map(|auction| (*auction).clone())
    else {
        return;
    };
    if auction.owner != node.party {
        return;
    }

    tracing::debug!(
        party = %node.party,
        auction = %auction.id,
        hash = %ftx.hash,
        "informing bidders of terminated auction"
    );
    for bidder in &auction.bidders {
        let flow = InformTransactionFlow::new(
            node.clone(),
            bidder.clone(),
            ftx.clone(),
            StatesToRecord::OnlyRelevant,
        );
        if let Err(error) = flow.run().await {
            tracing::warn!(party = %node.party, bidder = %bidder, %error, "failed to inform bidder");
        }
    }
}
