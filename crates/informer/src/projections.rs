//! Read-side views answered straight from a node's vault.

use {
    chrono::{DateTime, Utc},
    contracts::pricing,
    ledger::Vault,
    model::{Amount, AuctionState, AuctionableAsset},
    std::sync::Arc,
};

/// An auction together with the price its schedule implies.
#[derive(Clone, Debug, PartialEq)]
pub struct AuctionView {
    pub auction: AuctionState,
    pub current_price: Amount,
}

pub struct Projections {
    vault: Arc<dyn Vault>,
}

impl Projections {
    pub fn new(vault: Arc<dyn Vault>) -> Self {
        Self { vault }
    }

    pub async fn assets(&self) -> Vec<AuctionableAsset> {
        self.vault.assets().await
    }

    pub async fn auctions(&self) -> Vec<AuctionView> {
        self.auctions_at(Utc::now()).await
    }

    /// Deterministic variant of [`Self::auctions`], priced at `at`.
    pub async fn auctions_at(&self, at: DateTime<Utc>) -> Vec<AuctionView> {
        self.vault
            .auctions()
            .await
            .into_iter()
            .map(|auction| AuctionView {
                current_price: pricing::current_price(&auction, at),
                auction,
            })
            .collect()
    }
}
