//! Pushes a finalized transaction to a party that needs a copy.

use {
    crate::{FlowError, messages, messages::InformRequest, node::Node},
    ledger::{FinalizedTransaction, Network, StatesToRecord},
    model::Party,
};

/// Single round trip, so no checkpoint: a crashed sender simply re-sends,
/// and recording is idempotent on the receiving side.
pub struct InformTransactionFlow {
    node: Node,
    recipient: Party,
    ftx: FinalizedTransaction,
    policy: StatesToRecord,
}

impl InformTransactionFlow {
    pub fn new(
        node: Node,
        recipient: Party,
        ftx: FinalizedTransaction,
        policy: StatesToRecord,
    ) -> Self {
        Self {
            node,
            recipient,
            ftx,
            policy,
        }
    }

    pub async fn run(self) -> Result<(), FlowError> {
        tracing::debug!(
            party = %self.node.party,
            recipient = %self.recipient,
            hash = %self.ftx.hash,
            "distributing finalized transaction"
        );
        let session = self
            .node
            .network
            .open(&self.node.party, &self.recipient, messages::INFORM_TRANSACTION)
            .await?;
        session.send(&InformRequest {
            ftx: self.ftx,
            policy: self.policy,
        })?;
        match session.recv::<bool>().await? {
            true => Ok(()),
            false => Err(FlowError::Refused(
                "the recipient rejected the transaction".into(),
            )),
        }
    }
}
