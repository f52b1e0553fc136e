//! The capability bundle a flow runs against.

use {
    crate::{FlowError, messages::SignResponse},
    ledger::{CheckpointStore, FinalizedTransaction, Identities, Network, Notary, StateAndRef, Vault},
    model::{AuctionState, AuctionableAsset, LinearId, Party, SignedTransaction},
    serde::{Serialize, de::DeserializeOwned},
    std::sync::Arc,
};

/// One party's handle on the network: its identity plus the platform
/// capabilities every flow is constructed against. Cloning is cheap and
/// every clone operates on the same underlying stores.
#[derive(Clone)]
pub struct Node {
    pub party: Party,
    pub vault: Arc<dyn Vault>,
    pub notary: Arc<dyn Notary>,
    pub network: Arc<dyn Network>,
    pub identities: Arc<dyn Identities>,
    pub checkpoints: Arc<dyn CheckpointStore>,
}

impl Node {
    /// The single unconsumed version of the asset with the given id.
    pub async fn unique_asset(
        &self,
        id: LinearId,
    ) -> Result<StateAndRef<AuctionableAsset>, FlowError> {
        let [asset] = <[_; 1]>::try_from(self.vault.assets_by_id(id).await)
            .map_err(|_| FlowError::AssetNotFound)?;
        Ok(asset)
    }

    /// The single unconsumed version of the auction with the given id.
    pub async fn unique_auction(
        &self,
        id: LinearId,
    ) -> Result<StateAndRef<AuctionState>, FlowError> {
        let [auction] = <[_; 1]>::try_from(self.vault.auctions_by_id(id).await)
            .map_err(|_| FlowError::AuctionNotFound)?;
        Ok(auction)
    }

    pub(crate) async fn restore<T: DeserializeOwned>(
        &self,
        flow_id: LinearId,
    ) -> Result<Option<T>, FlowError> {
        match self.checkpoints.load(flow_id).await {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn save<T: Serialize>(
        &self,
        flow_id: LinearId,
        checkpoint: &T,
    ) -> Result<(), FlowError> {
        self.checkpoints
            .save(flow_id, serde_json::to_value(checkpoint)?)
            .await;
        Ok(())
    }

    pub(crate) async fn finish(&self, flow_id: LinearId) {
        self.checkpoints.clear(flow_id).await;
    }

    /// Submits the proposal for finalization. A conflict or a rejection is
    /// terminal for this flow: the checkpoint is cleared before the error
    /// propagates, since resuming would only re-submit a transaction the
    /// notary has already refused.
    pub(crate) async fn finalize(
        &self,
        flow_id: LinearId,
        stx: SignedTransaction,
    ) -> Result<FinalizedTransaction, FlowError> {
        match self.notary.finalize(stx).await {
            Ok(ftx) => Ok(ftx),
            Err(error) => {
                let error = FlowError::from(error);
                if matches!(error, FlowError::Conflict(_) | FlowError::Rejected(_)) {
                    self.finish(flow_id).await;
                }
                Err(error)
            }
        }
    }

    /// Asks `counterparty` to co-sign the proposal over the named protocol
    /// and returns the proposal with their signature added.
    pub(crate) async fn collect_signature(
        &self,
        protocol: &str,
        counterparty: &Party,
        stx: &SignedTransaction,
    ) -> Result<SignedTransaction, FlowError> {
        let session = self.network.open(&self.party, counterparty, protocol).await?;
        session.send(stx)?;
        match session.recv::<SignResponse>().await? {
            SignResponse::Signed(signed) => {
                // A co-signer may only add signatures, never alter the
                // transaction under them.
                if signed.hash() != stx.hash() {
                    return Err(FlowError::Refused(
                        "the returned transaction differs from the proposal".into(),
                    ));
                }
                Ok(signed)
            }
            SignResponse::Refused(reason) => Err(FlowError::Refused(reason)),
        }
    }
}
