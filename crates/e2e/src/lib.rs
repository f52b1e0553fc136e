//! Helpers for multi-party integration tests.
//!
//! Every test spins up a whole network inside one process: a single notary,
//! a single message bus, and one fully wired node per party with its own
//! vault, protocol responder and informer.

use {
    flows::{Node, responder},
    ledger::{InMemoryCheckpoints, InMemoryNotary, InMemoryVault, KnownParties, LocalNetwork},
    model::Party,
    std::sync::Arc,
};

pub struct TestNetwork {
    pub notary: Arc<InMemoryNotary>,
    pub network: Arc<LocalNetwork>,
    pub identities: Arc<KnownParties>,
}

impl Default for TestNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl TestNetwork {
    pub fn new() -> Self {
        observe::tracing::initialize_reentrant(
            "e2e=debug,flows=debug,informer=debug,ledger=debug",
        );
        Self {
            notary: Arc::new(InMemoryNotary::new()),
            network: Arc::new(LocalNetwork::new()),
            identities: Arc::new(KnownParties::new()),
        }
    }

    /// Joins a node that answers every protocol and runs its informer, the
    /// way a deployed node would.
    pub fn join(&self, name: &str) -> Node {
        let party = Party::new(name);
        self.identities.add(party.clone());
        let sessions = self.network.register(&party);
        let node = Node {
            party: party.clone(),
            vault: Arc::new(InMemoryVault::new(party)),
            notary: self.notary.clone(),
            network: self.network.clone(),
            identities: self.identities.clone(),
            checkpoints: Arc::new(InMemoryCheckpoints::new()),
        };
        responder::spawn(node.clone(), sessions);
        informer::spawn(node.clone());
        node
    }
}

/// Polls `condition` until it holds. Used for effects that arrive over the
/// network rather than as part of a flow's own await chain.
pub async fn wait_for(mut condition: impl AsyncFnMut() -> bool) {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while !condition().await {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not met within five seconds");
}
