//! Permanently removes an asset from the ledger.

use {
    crate::{FlowError, inform::InformTransactionFlow, messages, node::Node},
    ledger::{FinalizedTransaction, StatesToRecord, Vault},
    model::{AssetCommand, Command, LinearId, Party, SignedTransaction, TransactionBuilder},
    serde::{Deserialize, Serialize},
};

#[derive(Serialize, Deserialize)]
enum Checkpoint {
    Signed { stx: SignedTransaction },
    Collected { stx: SignedTransaction },
    Finalized { ftx: FinalizedTransaction },
}

/// Consumption retires the state for good, so both the owner and the
/// original issuer must agree: the issuer co-signs over the
/// `consume-asset` protocol unless they are the owner themselves.
pub struct ConsumeAssetFlow {
    node: Node,
    asset_id: LinearId,
    flow_id: LinearId,
}

impl ConsumeAssetFlow {
    pub fn new(node: Node, asset_id: LinearId) -> Self {
        Self {
            node,
            asset_id,
            flow_id: LinearId::random(),
        }
    }

    pub fn with_flow_id(mut self, flow_id: LinearId) -> Self {
        self.flow_id = flow_id;
        self
    }

    fn issuer_of(stx: &SignedTransaction) -> Result<Party, FlowError> {
        stx.tx
            .input_assets()
            .first()
            .map(|asset| asset.issuer.clone())
            .ok_or(FlowError::AssetNotFound)
    }

    pub async fn run(self) -> Result<FinalizedTransaction, FlowError> {
        let mut step = match self.node.restore(self.flow_id).await? {
            Some(checkpoint) => checkpoint,
            None => {
                let asset = self.node.unique_asset(self.asset_id).await?;
                if asset.state.owner != self.node.party {
                    return Err(FlowError::NotTheOwner);
                }
                tracing::info!(
                    party = %self.node.party,
                    asset = %self.asset_id,
                    "consuming asset"
                );
                let tx = TransactionBuilder::new()
                    .input(asset.reference, asset.state.clone())
                    .command(Command::new(
                        AssetCommand::Consume,
                        [asset.state.owner.key, asset.state.issuer.key],
                    ))
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
                    let issuer = Self::issuer_of(&stx)?;
                    let stx = if issuer == self.node.party {
                        stx
                    } else {
                        self.node
                            .collect_signature(messages::CONSUME_ASSET, &issuer, &stx)
                            .await?
                    };
                    let checkpoint = Checkpoint::Collected { stx };
                    self.node.save(self.flow_id, &checkpoint).await?;
                    checkpoint
                }
                Checkpoint::Collected { stx } => {
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
                    let issuer = Self::issuer_of(&ftx.tx)?;
                    if issuer != self.node.party {
                        InformTransactionFlow::new(
                            self.node.clone(),
                            issuer,
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
