//! Party-to-party messaging sessions.
//!
//! A session is a bidirectional, typed message channel between one
//! initiating flow and one responding flow. Delivery retries and backoff
//! belong to the platform; this abstraction only promises that a sent
//! message either arrives in order or the session errors out.

use {
    dashmap::DashMap,
    model::{Party, PublicKey},
    serde::{Serialize, de::DeserializeOwned},
    thiserror::Error,
    tokio::sync::{Mutex, mpsc},
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no node registered for party {0}")]
    UnknownParty(Party),
    #[error("the counterparty closed the session")]
    Closed,
    #[error("unexpected message payload: {0}")]
    Codec(#[from] serde_json::Error),
}

/// One end of a session. Messages are serde payloads; each side must
/// receive exactly what the other sends, in order.
pub struct Session {
    outgoing: mpsc::UnboundedSender<serde_json::Value>,
    incoming: Mutex<mpsc::UnboundedReceiver<serde_json::Value>>,
}

impl Session {
    pub fn send<T: Serialize>(&self, message: &T) -> Result<(), SessionError> {
        let payload = serde_json::to_value(message)?;
        self.outgoing.send(payload).map_err(|_| SessionError::Closed)
    }

    pub async fn recv<T: DeserializeOwned>(&self) -> Result<T, SessionError> {
        let payload = self
            .incoming
            .lock()
            .await
            .recv()
            .await
            .ok_or(SessionError::Closed)?;
        Ok(serde_json::from_value(payload)?)
    }
}

/// A session opened towards this node by a remote initiator.
pub struct IncomingSession {
    pub protocol: String,
    pub initiator: Party,
    pub session: Session,
}

#[async_trait::async_trait]
pub trait Network: Send + Sync {
    /// Opens a session to `counterparty` for the named protocol. The
    /// counterparty's registered responder receives the matching
    /// [`IncomingSession`].
    async fn open(
        &self,
        initiator: &Party,
        counterparty: &Party,
        protocol: &str,
    ) -> Result<Session, SessionError>;
}

/// All parties of one test network, connected by in-process channels.
#[derive(Default)]
pub struct LocalNetwork {
    inboxes: DashMap<PublicKey, mpsc::UnboundedSender<IncomingSession>>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins a party to the network, returning the stream of sessions
    /// opened towards it.
    pub fn register(&self, party: &Party) -> mpsc::UnboundedReceiver<IncomingSession> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inboxes.insert(party.key, sender);
        receiver
    }
}

#[async_trait::async_trait]
impl Network for LocalNetwork {
    async fn open(
        &self,
        initiator: &Party,
        counterparty: &Party,
        protocol: &str,
    ) -> Result<Session, SessionError> {
        let inbox = self
            .inboxes
            .get(&counterparty.key)
            .ok_or_else(|| SessionError::UnknownParty(counterparty.clone()))?;
        let (to_responder, from_initiator) = mpsc::unbounded_channel();
        let (to_initiator, from_responder) = mpsc::unbounded_channel();
        let incoming = IncomingSession {
            protocol: protocol.to_string(),
            initiator: initiator.clone(),
            session: Session {
                outgoing: to_initiator,
                incoming: Mutex::new(from_initiator),
            },
        };
        inbox.send(incoming).map_err(|_| SessionError::Closed)?;
        Ok(Session {
            outgoing: to_responder,
            incoming: Mutex::new(from_responder),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_carry_typed_messages_both_ways() {
        let network = LocalNetwork::new();
        let alice = Party::new("Alice");
        let bob = Party::new("Bob");
        let mut bob_sessions = network.register(&bob);

        let session = network.open(&alice, &bob, "ping").await.unwrap();
        session.send(&42u64).unwrap();

        let incoming = bob_sessions.recv().await.unwrap();
        assert_eq!(incoming.protocol, "ping");
        assert_eq!(incoming.initiator, alice);
        assert_eq!(incoming.session.recv::<u64>().await.unwrap(), 42);

        incoming.session.send(&"pong".to_string()).unwrap();
        assert_eq!(session.recv::<String>().await.unwrap(), "pong");
    }

    #[tokio::test]
    async fn opening_to_an_unregistered_party_fails() {
        let network = LocalNetwork::new();
        let alice = Party::new("Alice");
        let ghost = Party::new("Ghost");
        assert!(matches!(
            network.open(&alice, &ghost, "ping").await,
            Err(SessionError::UnknownParty(party)) if party == ghost
        ));
    }

    #[tokio::test]
    async fn dropped_counterparty_surfaces_as_closed() {
        let network = LocalNetwork::new();
        let alice = Party::new("Alice");
        let bob = Party::new("Bob");
        let mut bob_sessions = network.register(&bob);

        let session = network.open(&alice, &bob, "ping").await.unwrap();
        drop(bob_sessions.recv().await.unwrap());
        assert!(matches!(
            session.recv::<u64>().await,
            Err(SessionError::Closed)
        ));
    }
}
