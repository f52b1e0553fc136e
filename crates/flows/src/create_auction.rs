//! Opens a Dutch auction over an asset the initiator owns.

use {
    crate::{FlowError, inform::InformTransactionFlow, messages, node::Node},
    chrono::{DateTime, Duration, Utc},
    ledger::{FinalizedTransaction, StatesToRecord, Vault},
    model::{
        Amount, AssetCommand, AuctionCommand, AuctionState, Command, LinearId, Party,
        SignedTransaction, TransactionBuilder,
    },
    serde::{Deserialize, Serialize},
};

/// A finalized auction creation plus the id of the auction it opened.
#[derive(Clone, Debug)]
pub struct AuctionResponse {
    pub ftx: FinalizedTransaction,
    pub auction_id: LinearId,
}

#[derive(Serialize, Deserialize)]
enum Checkpoint {
    Signed {
        stx: SignedTransaction,
        auction_id: LinearId,
    },
    Collected {
        stx: SignedTransaction,
        auction_id: LinearId,
    },
    Finalized {
        ftx: FinalizedTransaction,
        auction_id: LinearId,
    },
}

/// Creation needs every participant's signature, so the flow walks the
/// bidders one by one over the `create-auction` protocol before handing the
/// transaction to the notary. Bidders then receive the finalized
/// transaction with the `AllVisible` policy: they must store the locked
/// asset as well, or they could not assemble a bid later.
pub struct CreateAuctionFlow {
    node: Node,
    asset_id: LinearId,
    bidders: Vec<Party>,
    price: Amount,
    decrement: Amount,
    period: Duration,
    start_time: DateTime<Utc>,
    flow_id: LinearId,
}

impl CreateAuctionFlow {
    pub fn new(
        node: Node,
        asset_id: LinearId,
        bidders: Vec<Party>,
        price: Amount,
        decrement: Amount,
        period: Duration,
    ) -> Self {
        Self {
            node,
            asset_id,
            bidders,
            price,
            decrement,
            period,
            start_time: Utc::now(),
            flow_id: LinearId::random(),
        }
    }

    /// Overrides the price schedule's start, which defaults to the moment
    /// the flow was constructed.
    pub fn starting_at(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_flow_id(mut self, flow_id: LinearId) -> Self {
        self.flow_id = flow_id;
        self
    }

    pub async fn run(self) -> Result<AuctionResponse, FlowError> {
        let mut step = match self.node.restore(self.flow_id).await? {
            Some(checkpoint) => checkpoint,
            None => {
                let asset = self.node.unique_asset(self.asset_id).await?;
                if asset.state.owner != self.node.party {
                    return Err(FlowError::NotTheOwner);
                }
                let auction = AuctionState::new(
                    asset.state.id,
                    self.node.party.clone(),
                    self.bidders.clone(),
                    self.price.clone(),
                    self.decrement.clone(),
                    self.period,
                    self.start_time,
                );
                tracing::info!(
                    party = %self.node.party,
                    auction = %auction.id,
                    asset = %self.asset_id,
                    price = auction.price.quantity,
                    "creating auction"
                );
                let participants = auction.participants();
                let tx = TransactionBuilder::new()
                    .input(asset.reference, asset.state.clone())
                    .output(asset.state.clone().lock())
                    .output(auction.clone())
                    .command(Command::new(
                        AuctionCommand::Create,
                        participants.iter().map(|party| party.key),
                    ))
                    .command(Command::new(AssetCommand::Lock, [self.node.party.key]))
                    .build();
                contracts::verify(&tx)?;
                let checkpoint = Checkpoint::Signed {
                    stx: tx.sign(self.node.party.key),
                    auction_id: auction.id,
                };
                self.node.save(self.flow_id, &checkpoint).await?;
                checkpoint
            }
        };

        loop {
            step = match step {
                Checkpoint::Signed { stx, auction_id } => {
                    // Re-requesting an already granted signature is fine;
                    // co-signing is idempotent on the responder side.
                    let bidders: Vec<Party> = stx
                        .tx
                        .output_auctions()
                        .first()
                        .map(|auction| auction.bidders.clone())
                        .unwrap_or_default();
                    let mut stx = stx;
                    for bidder in &bidders {
                        stx = self
                            .node
                            .collect_signature(messages::CREATE_AUCTION, bidder, &stx)
                            .await?;
                    }
                    let checkpoint = Checkpoint::Collected { stx, auction_id };
                    self.node.save(self.flow_id, &checkpoint).await?;
                    checkpoint
                }
                Checkpoint::Collected { stx, auction_id } => {
                    let ftx = self.node.finalize(self.flow_id, stx).await?;
                    self.node
                        .vault
                        .record(&ftx, StatesToRecord::OnlyRelevant)
                        .await;
                    let checkpoint = Checkpoint::Finalized { ftx, auction_id };
                    self.node.save(self.flow_id, &checkpoint).await?;
                    checkpoint
                }
                Checkpoint::Finalized { ftx, auction_id } => {
                    let bidders: Vec<Party> = ftx
                        .tx
                        .tx
                        .output_auctions()
                        .first()
                        .map(|auction| auction.bidders.clone())
                        .unwrap_or_default();
                    for bidder in bidders {
                        InformTransactionFlow::new(
                            self.node.clone(),
                            bidder,
                            ftx.clone(),
                            StatesToRecord::AllVisible,
                        )
                        .run()
                        .await?;
                    }
                    self.node.finish(self.flow_id).await;
                    return Ok(AuctionResponse { ftx, auction_id });
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{issue_asset::IssueAssetFlow, responder, testutil::TestNet},
        model::TokenType,
    };

    #[tokio::test]
    async fn locks_the_asset_and_informs_the_bidders() {
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

        assert!(created.ftx.tx.signatures.contains(&bidder.party.key));
        assert!(seller.unique_asset(issued.id).await.unwrap().state.locked);

        // The bidder holds both the auction and the locked asset, so a
        // later bid can reference each as a transaction input.
        let auction = bidder.unique_auction(created.auction_id).await.unwrap();
        assert_eq!(auction.state.asset_id, issued.id);
        assert!(bidder.unique_asset(issued.id).await.unwrap().state.locked);
    }

    #[tokio::test]
    async fn only_the_owner_may_auction() {
        let net = TestNet::new();
        let (seller, _) = net.node("Seller");
        let (other, _) = net.node("Other");
        let gbp = TokenType::new("GBP", seller.party.clone());

        let issued = IssueAssetFlow::new(seller.clone(), "house").run().await.unwrap();
        // The stranger has no copy of the asset at all.
        let result = CreateAuctionFlow::new(
            other.clone(),
            issued.id,
            vec![seller.party.clone()],
            Amount::new(100, gbp.clone()),
            Amount::new(10, gbp),
            Duration::seconds(10),
        )
        .run()
        .await;
        assert!(matches!(result, Err(FlowError::AssetNotFound)));
    }
}
