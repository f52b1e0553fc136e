//! Identity resolution.
//!
//! Platforms distinguish well-known node identities from transaction-scoped
//! ones. The engine only needs one capability: given a key observed in a
//! state or signature, find the well-known party to talk to.

use {
    dashmap::DashMap,
    model::{Party, PublicKey},
};

pub trait Identities: Send + Sync {
    fn party_for_key(&self, key: PublicKey) -> Option<Party>;
}

/// Static directory of every well-known party on the network.
#[derive(Default)]
pub struct KnownParties {
    parties: DashMap<PublicKey, Party>,
}

impl KnownParties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, party: Party) {
        self.parties.insert(party.key, party);
    }
}

impl Identities for KnownParties {
    fn party_for_key(&self, key: PublicKey) -> Option<Party> {
        self.parties.get(&key).map(|entry| entry.clone())
    }
}
