//! Withdraws an auction and unlocks its asset.

use {
    crate::{FlowError, node::Node},
    ledger::{FinalizedTransaction, StatesToRecord, Vault},
    model::{
        AssetCommand, AuctionCommand, Command, LinearId, SignedTransaction, TransactionBuilder,
    },
    serde::{Deserialize, Serialize},
};

#[derive(Serialize, Deserialize)]
enum Checkpoint {
    Signed { stx: SignedTransaction },
}

/// Only the owner signs. The flow itself does not notify the bidders; the
/// owner's informer picks the recorded transaction up and distributes it,
/// the same path a settlement takes.
pub struct EndAuctionFlow {
    node: Node,
    auction_id: LinearId,
    flow_id: LinearId,
}

impl EndAuctionFlow {
    pub fn new(node: Node, auction_id: LinearId) -> Self {
        Self {
            node,
            auction_id,
            flow_id: LinearId::random(),
        }
    }

    pub fn with_flow_id(mut self, flow_id: LinearId) -> Self {
        self.flow_id = flow_id;
        self
    }

    pub async fn run(self) -> Result<FinalizedTransaction, FlowError> {
        let Checkpoint::Signed { stx } = match self.node.restore(self.flow_id).await? {
            Some(checkpoint) => checkpoint,
            None => {
                let auction = self.node.unique_auction(self.auction_id).await?;
                if auction.state.owner != self.node.party {
                    return Err(FlowError::NotTheOwner);
                }
                let asset = self.node.unique_asset(auction.state.asset_id).await?;
                tracing::info!(
                    party = %self.node.party,
                    auction = %self.auction_id,
                    "ending auction"
                );
                let tx = TransactionBuilder::new()
                    .input(auction.reference, auction.state.clone())
                    .input(asset.reference, asset.state.clone())
                    .output(asset.state.clone().unlock())
                    .command(Command::new(AuctionCommand::End, [self.node.party.key]))
                    .command(Command::new(AssetCommand::Unlock, [self.node.party.key]))
                    .build();
                contracts::verify(&tx)?;
                let checkpoint = Checkpoint::Signed {
                    stx: tx.sign(self.node.party.key),
                };
                self.node.save(self.flow_id, &checkpoint).await?;
                checkpoint
            }
        };

        let ftx = self.node.finalize(self.flow_id, stx).await?;
        self.node
            .vault
            .record(&ftx, StatesToRecord::OnlyRelevant)
            .await;
        self.node.finish(self.flow_id).await;
        Ok(ftx)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            create_auction::CreateAuctionFlow, issue_asset::IssueAssetFlow, responder,
            testutil::TestNet, transfer_asset::TransferAssetFlow,
        },
        chrono::Duration,
        model::{Amount, TokenType},
    };

    #[tokio::test]
    async fn unlocks_the_asset_for_the_owner() {
        let net = TestNet::new();
        let (seller, _) = net.node("Seller");
        let (bidder, bidder_sessions) = net.node("Bidder");
        responder::spawn(bidder.clone(), bidder_sessions);

        let gbp = TokenType::new("GBP", seller.party.clone());
        let issued = IssueAssetFlow::new(seller.clone(), "house").run().await.unwrap();
        let created = CreateAuctionFlow::new(
            seller.clone(),
            issued.id,
            vec![bidder.party.clone()],
            Amount::new(100, gbp.clone()),
            Amount::new(10, gbp),
            Duration::seconds(10),
        )
        .run()
        .await
        .unwrap();

        EndAuctionFlow::new(seller.clone(), created.auction_id)
            .run()
            .await
            .unwrap();

        let held = seller.unique_asset(issued.id).await.unwrap();
        assert!(!held.state.locked);
        assert!(seller.vault.auctions_by_id(created.auction_id).await.is_empty());

        // The asset is ordinary property again.
        TransferAssetFlow::new(seller.clone(), issued.id, bidder.party.clone())
            .run()
            .await
            .unwrap();
        assert_eq!(
            bidder.unique_asset(issued.id).await.unwrap().state.owner,
            bidder.party
        );
    }
}
