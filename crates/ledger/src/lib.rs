//! Injected ledger-platform capabilities.
//!
//! The flows never talk to a concrete platform; they are handed these
//! capabilities at construction. The in-memory implementations in this crate
//! are complete enough to run a whole multi-party network inside one
//! process, which is how the integration tests exercise the system.

pub mod checkpoint;
pub mod identity;
pub mod network;
pub mod notary;
pub mod vault;

pub use {
    checkpoint::{CheckpointStore, InMemoryCheckpoints},
    identity::{Identities, KnownParties},
    network::{IncomingSession, LocalNetwork, Network, Session, SessionError},
    notary::{FinalizedTransaction, InMemoryNotary, Notary, NotaryError},
    vault::{InMemoryVault, StateAndRef, StatesToRecord, Vault},
};
