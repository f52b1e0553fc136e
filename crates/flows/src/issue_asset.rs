//! Issues a new asset onto the ledger.

use {
    crate::{FlowError, node::Node},
    ledger::{FinalizedTransaction, StatesToRecord, Vault},
    model::{
        AssetCommand, AuctionableAsset, Command, LinearId, SignedTransaction, TransactionBuilder,
    },
    serde::{Deserialize, Serialize},
};

/// A finalized transaction plus the linear id of the state it created.
#[derive(Clone, Debug)]
pub struct TransactionAndId {
    pub ftx: FinalizedTransaction,
    pub id: LinearId,
}

#[derive(Serialize, Deserialize)]
enum Checkpoint {
    Signed {
        stx: SignedTransaction,
        asset_id: LinearId,
    },
}

/// The issuer is the only required signer, so no counterparties are
/// involved; the new asset exists once the notary commits the issuance.
pub struct IssueAssetFlow {
    node: Node,
    description: String,
    flow_id: LinearId,
}

impl IssueAssetFlow {
    pub fn new(node: Node, description: impl Into<String>) -> Self {
        Self {
            node,
            description: description.into(),
            flow_id: LinearId::random(),
        }
    }

    /// Runs under a caller-chosen id so an interrupted flow can be resumed
    /// from its checkpoint.
    pub fn with_flow_id(mut self, flow_id: LinearId) -> Self {
        self.flow_id = flow_id;
        self
    }

    pub async fn run(self) -> Result<TransactionAndId, FlowError> {
        let Checkpoint::Signed { stx, asset_id } = match self.node.restore(self.flow_id).await? {
            Some(checkpoint) => checkpoint,
            None => {
                let asset =
                    AuctionableAsset::new(self.description.clone(), self.node.party.clone());
                let tx = TransactionBuilder::new()
                    .output(asset.clone())
                    .command(Command::new(AssetCommand::Issue, [self.node.party.key]))
                    .build();
                contracts::verify(&tx)?;
                let checkpoint = Checkpoint::Signed {
                    stx: tx.sign(self.node.party.key),
                    asset_id: asset.id,
                };
                self.node.save(self.flow_id, &checkpoint).await?;
                checkpoint
            }
        };

        tracing::info!(party = %self.node.party, asset = %asset_id, "issuing asset");
        let ftx = self.node.finalize(self.flow_id, stx).await?;
        self.node.vault.record(&ftx, StatesToRecord::OnlyRelevant).await;
        self.node.finish(self.flow_id).await;
        Ok(TransactionAndId { ftx, id: asset_id })
    }
}
