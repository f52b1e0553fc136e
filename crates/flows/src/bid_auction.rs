//! Settles an auction by bidding at the current clearing price.

use {
    crate::{FlowError, inform::InformTransactionFlow, node::Node},
    chrono::Utc,
    ledger::{FinalizedTransaction, StatesToRecord, Vault},
    model::{
        AssetCommand, AuctionCommand, Command, LinearId, SignedTransaction, TimeWindow,
        TokenTransfer, TransactionBuilder,
    },
    serde::{Deserialize, Serialize},
};

#[derive(Serialize, Deserialize)]
enum Checkpoint {
    Signed { stx: SignedTransaction },
    Finalized { ftx: FinalizedTransaction },
}

/// The bidder settles unilaterally: it pays the clearing price implied by
/// its attested time window, takes ownership of the unlocked asset, and
/// consumes the auction. The owner never co-signs; the contract rules and
/// the notary's double-spend protection are what keep a bid honest, and
/// the notary resolves races between concurrent bidders by accepting
/// exactly one.
pub struct BidAuctionFlow {
    node: Node,
    auction_id: LinearId,
    flow_id: LinearId,
}

impl BidAuctionFlow {
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
        let mut step = match self.node.restore(self.flow_id).await? {
            Some(checkpoint) => checkpoint,
            None => {
                let auction = self.node.unique_auction(self.auction_id).await?;
                if !auction.state.is_bidder(&self.node.party) {
                    return Err(FlowError::NotABidder);
                }
                let asset = self.node.unique_asset(auction.state.asset_id).await?;
                let now = Utc::now();
                let payment = contracts::pricing::current_price(&auction.state, now);
                tracing::info!(
                    party = %self.node.party,
                    auction = %self.auction_id,
                    paying = payment.quantity,
                    "bidding on auction"
                );
                let tx = TransactionBuilder::new()
                    .input(auction.reference, auction.state.clone())
                    .input(asset.reference, asset.state.clone())
                    .output(
                        asset
                            .state
                            .clone()
                            .with_owner(self.node.party.clone())
                            .unlock(),
                    )
                    .output(TokenTransfer {
                        holder: auction.state.owner.clone(),
                        amount: payment,
                    })
                    .command(Command::new(AuctionCommand::Bid, [self.node.party.key]))
                    .command(Command::new(AssetCommand::Unlock, [self.node.party.key]))
                    .time_window(TimeWindow::from_only(now))
                    .build();
                contracts::verify(&tx)?;
                let checkpoint = Checkpoint::Signed {
                    stx: tx.sign(self.node.party.key),
                };
                self.node.save(self.flow_id, &checkpoint).await?;
                checkpoint
            }
        };

        loop {
            step = match step {
                Checkpoint::Signed { stx } => {
                    let ftx = self.node.finalize(self.flow_id, stx).await?;
                    self.node
                        .vault
                        .record(&ftx, StatesToRecord::OnlyRelevant)
                        .await;
                    let checkpoint = Checkpoint::Finalized { ftx };
                    self.node.save(self.flow_id, &checkpoint).await?;
                    checkpoint
                }
                Checkpoint::Finalized { ftx } => {
                    // The owner learns of the settlement directly; the
                    // other bidders learn of it from the owner's informer.
                    let owner = ftx
                        .tx
                        .tx
                        .input_auctions()
                        .first()
                        .map(|auction| auction.owner.clone())
                        .ok_or(FlowError::AuctionNotFound)?;
                    InformTransactionFlow::new(
                        self.node.clone(),
                        owner,
                        ftx.clone(),
                        StatesToRecord::OnlyRelevant,
                    )
                    .run()
                    .await?;
                    self.node.finish(self.flow_id).await;
                    return Ok(ftx);
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            create_auction::CreateAuctionFlow, issue_asset::IssueAssetFlow, responder,
            testutil::TestNet,
        },
        chrono::Duration,
        ledger::CheckpointStore,
        model::{Amount, TokenType},
    };

    async fn auction_started_ago(
        seller: &Node,
        bidder: &Node,
        ago: Duration,
    ) -> (LinearId, LinearId) {
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
        .starting_at(Utc::now() - ago)
        .run()
        .await
        .unwrap();
        (issued.id, created.auction_id)
    }

    #[tokio::test]
    async fn pays_the_decayed_price_and_takes_the_asset() {
        let net = TestNet::new();
        let (seller, seller_sessions) = net.node("Seller");
        let (bidder, bidder_sessions) = net.node("Bidder");
        responder::spawn(seller.clone(), seller_sessions);
        responder::spawn(bidder.clone(), bidder_sessions);

        let (asset_id, auction_id) =
            auction_started_ago(&seller, &bidder, Duration::seconds(15)).await;
        let ftx = BidAuctionFlow::new(bidder.clone(), auction_id).run().await.unwrap();

        // One whole period elapsed, so the clearing price is 90.
        let payment = ftx.tx.tx.output_tokens()[0].clone();
        assert_eq!(payment.holder, seller.party);
        assert_eq!(payment.amount.quantity, 90);

        let won = bidder.unique_asset(asset_id).await.unwrap();
        assert_eq!(won.state.owner, bidder.party);
        assert!(!won.state.locked);
        assert!(bidder.vault.auctions_by_id(auction_id).await.is_empty());

        // The owner's vault settles too once informed.
        assert!(seller.vault.transaction(ftx.hash).await.is_some());
        assert!(seller.vault.auctions_by_id(auction_id).await.is_empty());
    }

    #[tokio::test]
    async fn a_lost_race_clears_the_checkpoint() {
        let net = TestNet::new();
        let (seller, seller_sessions) = net.node("Seller");
        let (first, first_sessions) = net.node("First");
        let (second, second_sessions) = net.node("Second");
        responder::spawn(seller.clone(), seller_sessions);
        responder::spawn(first.clone(), first_sessions);
        responder::spawn(second.clone(), second_sessions);

        let gbp = TokenType::new("GBP", seller.party.clone());
        let issued = IssueAssetFlow::new(seller.clone(), "house").run().await.unwrap();
        let created = CreateAuctionFlow::new(
            seller.clone(),
            issued.id,
            vec![first.party.clone(), second.party.clone()],
            Amount::new(100, gbp.clone()),
            Amount::new(10, gbp),
            Duration::seconds(10),
        )
        .run()
        .await
        .unwrap();

        BidAuctionFlow::new(first.clone(), created.auction_id)
            .run()
            .await
            .unwrap();

        // The second bidder never heard of the settlement and builds its
        // bid against the stale auction version.
        let flow_id = LinearId::random();
        let result = BidAuctionFlow::new(second.clone(), created.auction_id)
            .with_flow_id(flow_id)
            .run()
            .await;
        assert!(matches!(result, Err(FlowError::Conflict(_))));
        // The loss is terminal, so nothing is left to resume.
        assert!(second.checkpoints.load(flow_id).await.is_none());
    }

    #[tokio::test]
    async fn a_non_bidder_may_not_bid() {
        let net = TestNet::new();
        let (seller, seller_sessions) = net.node("Seller");
        let (bidder, bidder_sessions) = net.node("Bidder");
        let (stranger, stranger_sessions) = net.node("Stranger");
        responder::spawn(seller.clone(), seller_sessions);
        responder::spawn(bidder.clone(), bidder_sessions);
        responder::spawn(stranger.clone(), stranger_sessions);

        let (_, auction_id) =
            auction_started_ago(&seller, &bidder, Duration::zero()).await;
        // The stranger never saw the auction at all.
        let result = BidAuctionFlow::new(stranger.clone(), auction_id).run().await;
        assert!(matches!(result, Err(FlowError::AuctionNotFound)));
    }
}
