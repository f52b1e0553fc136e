use {
    crate::{identity::Party, ids::LinearId},
    serde::{Deserialize, Serialize},
};

/// A unique item eligible for auction.
///
/// The asset is locked for the duration of an auction so that it cannot be
/// transferred or consumed while bidders may still settle against it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionableAsset {
    pub id: LinearId,
    pub description: String,
    pub owner: Party,
    pub issuer: Party,
    pub locked: bool,
}

impl AuctionableAsset {
    /// A freshly issued asset: unlocked, owned by its issuer.
    pub fn new(description: impl Into<String>, issuer: Party) -> Self {
        Self {
            id: LinearId::random(),
            description: description.into(),
            owner: issuer.clone(),
            issuer,
            locked: false,
        }
    }

    pub fn with_owner(self, owner: Party) -> Self {
        Self { owner, ..self }
    }

    pub fn lock(self) -> Self {
        Self {
            locked: true,
            ..self
        }
    }

    pub fn unlock(self) -> Self {
        Self {
            locked: false,
            ..self
        }
    }
}
