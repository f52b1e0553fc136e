//! Transfers an asset to a new owner.

use {
    crate::{FlowError, inform::InformTransactionFlow, node::Node},
    ledger::{FinalizedTransaction, StatesToRecord, Vault},
    model::{AssetCommand, Command, LinearId, Party, SignedTransaction, TransactionBuilder},
    serde::{Deserialize, Serialize},
};

#[derive(Serialize, Deserialize)]
enum Checkpoint {
    Signed { stx: SignedTransaction },
    Finalized { ftx: FinalizedTransaction },
}

/// Only the current owner signs; the new owner receives a copy of the
/// finalized transaction so their vault picks up the state.
pub struct TransferAssetFlow {
    node: Node,
    asset_id: LinearId,
    new_owner: Party,
    flow_id: LinearId,
}

impl TransferAssetFlow {
    pub fn new(node: Node, asset_id: LinearId, new_owner: Party) -> Self {
        Self {
            node,
            asset_id,
            new_owner,
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
                let asset = self.node.unique_asset(self.asset_id).await?;
                if asset.state.owner != self.node.party {
                    return Err(FlowError::NotTheOwner);
                }
                tracing::info!(
                    party = %self.node.party,
                    asset = %self.asset_id,
                    new_owner = %self.new_owner,
                    "transferring asset"
                );
                let tx = TransactionBuilder::new()
                    .input(asset.reference, asset.state.clone())
                    .output(asset.state.clone().with_owner(self.new_owner.clone()))
                    .command(Command::new(AssetCommand::Transfer, [self.node.party.key]))
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
                    InformTransactionFlow::new(
                        self.node.clone(),
                        self.new_owner.clone(),
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
        crate::{issue_asset::IssueAssetFlow, responder, testutil::TestNet},
    };

    #[tokio::test]
    async fn transfers_to_a_new_owner() {
        let net = TestNet::new();
        let (alice, _) = net.node("Alice");
        let (bob, bob_sessions) = net.node("Bob");
        responder::spawn(bob.clone(), bob_sessions);

        let issued = IssueAssetFlow::new(alice.clone(), "house").run().await.unwrap();
        TransferAssetFlow::new(alice.clone(), issued.id, bob.party.clone())
            .run()
            .await
            .unwrap();

        let held = bob.unique_asset(issued.id).await.unwrap();
        assert_eq!(held.state.owner, bob.party);
        // The issuer keeps the issuer-relevant copy of the new version.
        assert_eq!(
            alice.unique_asset(issued.id).await.unwrap().state.owner,
            bob.party
        );
    }

    #[tokio::test]
    async fn only_the_owner_may_transfer() {
        let net = TestNet::new();
        let (alice, _) = net.node("Alice");
        let (bob, bob_sessions) = net.node("Bob");
        responder::spawn(bob.clone(), bob_sessions);

        let issued = IssueAssetFlow::new(alice.clone(), "house").run().await.unwrap();
        TransferAssetFlow::new(alice.clone(), issued.id, bob.party.clone())
            .run()
            .await
            .unwrap();

        // Alice no longer owns the asset, but her vault still sees it.
        let result = TransferAssetFlow::new(alice.clone(), issued.id, alice.party.clone())
            .run()
            .await;
        assert!(matches!(result, Err(FlowError::NotTheOwner)));
    }

    #[tokio::test]
    async fn unknown_assets_are_rejected() {
        let net = TestNet::new();
        let (alice, _) = net.node("Alice");
        let result = TransferAssetFlow::new(alice.clone(), LinearId::random(), alice.party.clone())
            .run()
            .await;
        assert!(matches!(result, Err(FlowError::AssetNotFound)));
    }
}
