//! Per-party store of unconsumed states and known transactions.
//!
//! Each party's vault is its own eventually-consistent projection, fed only
//! by finalized transactions the party has been made a recipient of. It is
//! never consulted during verification.

use {
    crate::notary::FinalizedTransaction,
    dashmap::DashMap,
    model::{AuctionState, AuctionableAsset, LinearId, OutputState, Party, StateRef, TxHash},
    serde::{Deserialize, Serialize},
    tokio::sync::broadcast,
};

/// How much of a received transaction to persist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatesToRecord {
    /// Store the transaction but none of its output states.
    None,
    /// Store only output states the local party participates in.
    OnlyRelevant,
    /// Store every output state.
    AllVisible,
}

/// An unconsumed state together with the pointer naming it on the ledger.
#[derive(Clone, Debug, PartialEq)]
pub struct StateAndRef<T> {
    pub reference: StateRef,
    pub state: T,
}

#[async_trait::async_trait]
pub trait Vault: Send + Sync {
    /// Unconsumed asset versions carrying the given linear id.
    async fn assets_by_id(&self, id: LinearId) -> Vec<StateAndRef<AuctionableAsset>>;
    /// Unconsumed auction versions carrying the given linear id.
    async fn auctions_by_id(&self, id: LinearId) -> Vec<StateAndRef<AuctionState>>;
    async fn assets(&self) -> Vec<AuctionableAsset>;
    async fn auctions(&self) -> Vec<AuctionState>;
    /// A finalized transaction this party has recorded, by hash.
    async fn transaction(&self, hash: TxHash) -> Option<FinalizedTransaction>;
    /// Applies a finalized transaction: consumes its inputs and stores
    /// outputs according to the policy. Recording the same transaction
    /// twice is harmless.
    async fn record(&self, ftx: &FinalizedTransaction, policy: StatesToRecord);
    /// Feed of transactions recorded into this vault, in recording order.
    /// This is what the informer watches.
    fn subscribe(&self) -> broadcast::Receiver<FinalizedTransaction>;
}

/// In-memory vault for one party.
pub struct InMemoryVault {
    party: Party,
    unconsumed: DashMap<StateRef, OutputState>,
    transactions: DashMap<TxHash, FinalizedTransaction>,
    recorded: broadcast::Sender<FinalizedTransaction>,
}

impl InMemoryVault {
    pub fn new(party: Party) -> Self {
        let (recorded, _) = broadcast::channel(256);
        Self {
            party,
            unconsumed: DashMap::new(),
            transactions: DashMap::new(),
            recorded,
        }
    }

    fn is_relevant(&self, state: &OutputState) -> bool {
        match state {
            OutputState::Asset(asset) => {
                asset.owner == self.party || asset.issuer == self.party
            }
            OutputState::Auction(auction) => auction.participants().contains(&self.party),
            OutputState::Tokens(tokens) => tokens.holder == self.party,
        }
    }
}

#[async_trait::async_trait]
impl Vault for InMemoryVault {
    async fn assets_by_id(&self, id: LinearId) -> Vec<StateAndRef<AuctionableAsset>> {
        self.unconsumed
            .iter()
            .filter_map(|entry| {
                let asset = entry.value().as_asset()?;
                (asset.id == id).then(|| StateAndRef {
                    reference: *entry.key(),
                    state: asset.clone(),
                })
            })
            .collect()
    }

    async fn auctions_by_id(&self, id: LinearId) -> Vec<StateAndRef<AuctionState>> {
        self.unconsumed
            .iter()
            .filter_map(|entry| {
                let auction = entry.value().as_auction()?;
                (auction.id == id).then(|| StateAndRef {
                    reference: *entry.key(),
                    state: auction.clone(),
                })
            })
            .collect()
    }

    async fn assets(&self) -> Vec<AuctionableAsset> {
        self.unconsumed
            .iter()
            .filter_map(|entry| entry.value().as_asset().cloned())
            .collect()
    }

    async fn auctions(&self) -> Vec<AuctionState> {
        self.unconsumed
            .iter()
            .filter_map(|entry| entry.value().as_auction().cloned())
            .collect()
    }

    async fn transaction(&self, hash: TxHash) -> Option<FinalizedTransaction> {
        self.transactions.get(&hash).map(|entry| entry.clone())
    }

    async fn record(&self, ftx: &FinalizedTransaction, policy: StatesToRecord) {
        for (reference, _) in &ftx.tx.tx.inputs {
            self.unconsumed.remove(reference);
        }
        for (index, output) in ftx.tx.tx.outputs.iter().enumerate() {
            let keep = match policy {
                StatesToRecord::None => false,
                StatesToRecord::OnlyRelevant => self.is_relevant(output),
                StatesToRecord::AllVisible => true,
            };
            if keep {
                let reference = StateRef {
                    txhash: ftx.hash,
                    index: index.try_into().expect("fewer than 2^32 outputs"),
                };
                self.unconsumed.insert(reference, output.clone());
            }
        }
        self.transactions.insert(ftx.hash, ftx.clone());
        tracing::debug!(party = %self.party, hash = %ftx.hash, ?policy, "recorded transaction");
        let _ = self.recorded.send(ftx.clone());
    }

    fn subscribe(&self) -> broadcast::Receiver<FinalizedTransaction> {
        self.recorded.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        chrono::Utc,
        model::{AssetCommand, Command, TokenTransfer, TransactionBuilder},
    };

    fn finalized(tx: model::LedgerTransaction, key: model::PublicKey) -> FinalizedTransaction {
        let stx = tx.sign(key);
        FinalizedTransaction {
            hash: stx.hash(),
            tx: stx,
            finalized_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn records_consumes_and_queries() {
        let issuer = Party::new("Issuer");
        let vault = InMemoryVault::new(issuer.clone());
        let asset = AuctionableAsset::new("house", issuer.clone());
        let issue = finalized(
            TransactionBuilder::new()
                .output(asset.clone())
                .command(Command::new(AssetCommand::Issue, [issuer.key]))
                .build(),
            issuer.key,
        );
        vault.record(&issue, StatesToRecord::OnlyRelevant).await;

        let found = vault.assets_by_id(asset.id).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].state, asset);
        assert_eq!(vault.assets().await, vec![asset.clone()]);
        assert!(vault.transaction(issue.hash).await.is_some());

        let consume = finalized(
            TransactionBuilder::new()
                .input(found[0].reference, asset.clone())
                .command(Command::new(AssetCommand::Consume, [issuer.key]))
                .build(),
            issuer.key,
        );
        vault.record(&consume, StatesToRecord::OnlyRelevant).await;
        assert!(vault.assets_by_id(asset.id).await.is_empty());
    }

    #[tokio::test]
    async fn only_relevant_skips_foreign_states() {
        let issuer = Party::new("Issuer");
        let other = Party::new("Other");
        let vault = InMemoryVault::new(other.clone());
        let asset = AuctionableAsset::new("house", issuer.clone());
        let payment = TokenTransfer {
            holder: other.clone(),
            amount: model::Amount::new(5, model::TokenType::new("GBP", issuer.clone())),
        };
        let ftx = finalized(
            TransactionBuilder::new()
                .output(asset.clone())
                .output(payment)
                .command(Command::new(AssetCommand::Issue, [issuer.key]))
                .build(),
            issuer.key,
        );

        vault.record(&ftx, StatesToRecord::OnlyRelevant).await;
        assert!(vault.assets().await.is_empty());
        assert_eq!(vault.unconsumed.len(), 1);

        let all = InMemoryVault::new(other);
        all.record(&ftx, StatesToRecord::AllVisible).await;
        assert_eq!(all.unconsumed.len(), 2);
    }
}
