//! The uniqueness and ordering service.
//!
//! The notary is the sole authority on which transaction gets to consume a
//! given input. Everything else about a transaction has already been agreed
//! upon by its signers; finalization is the atomic commit point after which
//! input consumption is irrevocable.

use {
    chrono::{DateTime, Utc},
    dashmap::DashMap,
    model::{PublicKey, SignedTransaction, StateRef, TimeWindow, TxHash},
    serde::{Deserialize, Serialize},
    std::sync::Mutex,
    thiserror::Error,
    tokio::sync::broadcast,
};

/// A transaction the notary has committed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalizedTransaction {
    pub tx: SignedTransaction,
    pub hash: TxHash,
    pub finalized_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum NotaryError {
    /// Another transaction already consumed one of this transaction's
    /// inputs. Surfaced as-is, never retried automatically: a retry would
    /// reference now-stale inputs and needs a fresh protocol run.
    #[error("input state {0} has already been consumed")]
    Conflict(StateRef),
    #[error("transaction verification failed: {0}")]
    Rejected(#[from] contracts::Rejection),
    #[error("missing signature for required signer {0}")]
    MissingSignature(PublicKey),
    /// The transaction's time window does not contain the instant the
    /// notary is committing at. The window is what the contract's price
    /// math trusts, so the notary must attest it rather than take the
    /// initiator's word for it.
    #[error("the time window does not contain the notarization time")]
    InvalidTimeWindow(TimeWindow),
}

#[async_trait::async_trait]
pub trait Notary: Send + Sync {
    /// Atomically commits the transaction, or fails without consuming
    /// anything. Re-finalizing a transaction that was already committed is
    /// idempotent and returns the original commit.
    async fn finalize(&self, stx: SignedTransaction) -> Result<FinalizedTransaction, NotaryError>;

    /// Feed of every transaction this notary finalizes.
    fn subscribe(&self) -> broadcast::Receiver<FinalizedTransaction>;
}

/// Single-process notary used by tests and local networks.
pub struct InMemoryNotary {
    consumed: DashMap<StateRef, TxHash>,
    finalized: DashMap<TxHash, FinalizedTransaction>,
    feed: broadcast::Sender<FinalizedTransaction>,
    // Serializes commit attempts so a multi-input transaction either
    // consumes all of its inputs or none of them.
    commit_lock: Mutex<()>,
}

impl Default for InMemoryNotary {
    fn default() -> Self {
        let (feed, _) = broadcast::channel(256);
        Self {
            consumed: DashMap::new(),
            finalized: DashMap::new(),
            feed,
            commit_lock: Mutex::new(()),
        }
    }
}

impl InMemoryNotary {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Notary for InMemoryNotary {
    async fn finalize(&self, stx: SignedTransaction) -> Result<FinalizedTransaction, NotaryError> {
        let hash = stx.hash();
        if let Some(existing) = self.finalized.get(&hash) {
            tracing::debug!(%hash, "transaction already finalized, returning original commit");
            return Ok(existing.clone());
        }

        // The notary is a required validator of every transaction: verify
        // before looking at signatures or input consumption.
        contracts::verify(&stx.tx)?;
        if let Some(missing) = stx.missing_signers().into_iter().next() {
            return Err(NotaryError::MissingSignature(missing));
        }
        // The window is attested here, against the notary's own clock. A
        // forward-dated lower bound would let a bidder claim a price the
        // schedule has not yet reached.
        if let Some(window) = stx.tx.time_window {
            let now = Utc::now();
            if window.from.is_some_and(|from| from > now)
                || window.until.is_some_and(|until| until <= now)
            {
                return Err(NotaryError::InvalidTimeWindow(window));
            }
        }

        let finalized = {
            let _guard = self.commit_lock.lock().expect("commit lock not poisoned");
            if let Some(existing) = self.finalized.get(&hash) {
                return Ok(existing.clone());
            }
            for (reference, _) in &stx.tx.inputs {
                if self.consumed.contains_key(reference) {
                    return Err(NotaryError::Conflict(*reference));
                }
            }
            for (reference, _) in &stx.tx.inputs {
                self.consumed.insert(*reference, hash);
            }
            let finalized = FinalizedTransaction {
                tx: stx,
                hash,
                finalized_at: Utc::now(),
            };
            self.finalized.insert(hash, finalized.clone());
            finalized
        };

        tracing::info!(%hash, inputs = finalized.tx.tx.inputs.len(), "finalized transaction");
        // Nobody listening is fine.
        let _ = self.feed.send(finalized.clone());
        Ok(finalized)
    }

    fn subscribe(&self) -> broadcast::Receiver<FinalizedTransaction> {
        self.feed.subscribe()
    }
}
