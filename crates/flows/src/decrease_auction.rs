//! Lowers an auction's current price ahead of its schedule.

use {
    crate::{FlowError, inform::InformTransactionFlow, node::Node},
    ledger::{FinalizedTransaction, StatesToRecord, Vault},
    model::{
        Amount, AuctionCommand, Command, LinearId, Party, SignedTransaction, TransactionBuilder,
    },
    serde::{Deserialize, Serialize},
};

#[derive(Serialize, Deserialize)]
enum Checkpoint {
    Signed { stx: SignedTransaction },
    Finalized { ftx: FinalizedTransaction },
}

/// Only the owner signs a decrease, but every bidder receives the
/// finalized transaction: a bidder left on the old version would build its
/// next bid against an already consumed auction state and lose the race at
/// the notary.
pub struct DecreaseAuctionFlow {
    node: Node,
    auction_id: LinearId,
    new_price: Amount,
    flow_id: LinearId,
}

impl DecreaseAuctionFlow {
    pub fn new(node: Node, auction_id: LinearId, new_price: Amount) -> Self {
        Self {
            node,
            auction_id,
            new_price,
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
                if auction.state.owner != self.node.party {
                    return Err(FlowError::NotTheOwner);
                }
                tracing::info!(
                    party = %self.node.party,
                    auction = %self.auction_id,
                    new_price = self.new_price.quantity,
                    "decreasing auction price"
                );
                let tx = TransactionBuilder::new()
                    .input(auction.reference, auction.state.clone())
                    .output(auction.state.clone().with_price(self.new_price.clone()))
                    .command(Command::new(AuctionCommand::Decrease, [self.node.party.key]))
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
                            StatesToRecord::OnlyRelevant,
                        )
                        .run()
                        .await?;
                    }
                    self.node.finish(self.flow_id).await;
                    return Ok(ftx);
                }
            };
        }
    }
}
