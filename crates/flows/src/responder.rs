//! The counterparty side of every protocol.
//!
//! One dispatcher task per node drains its incoming sessions and spawns a
//! handler per session, so a slow or stuck counterparty never blocks the
//! rest of the node.

use {
    crate::{
        FlowError,
        messages::{self, InformRequest, SignResponse},
        node::Node,
    },
    ledger::{Identities, IncomingSession, Session, Vault},
    model::SignedTransaction,
    tokio::sync::mpsc,
};

/// Serves sessions opened towards this node until the receiver closes.
pub fn spawn(
    node: Node,
    mut sessions: mpsc::UnboundedReceiver<IncomingSession>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(incoming) = sessions.recv().await {
            let node = node.clone();
            tokio::spawn(async move {
                let protocol = incoming.protocol.clone();
                if let Err(error) = handle(&node, incoming).await {
                    tracing::warn!(
                        party = %node.party,
                        protocol,
                        %error,
                        "responder session failed"
                    );
                }
            });
        }
    })
}

async fn handle(node: &Node, incoming: IncomingSession) -> Result<(), FlowError> {
    if node.identities.party_for_key(incoming.initiator.key).is_none() {
        tracing::warn!(
            party = %node.party,
            initiator = %incoming.initiator,
            "dropping session from unknown party"
        );
        return Ok(());
    }
    match incoming.protocol.as_str() {
        messages::CONSUME_ASSET => {
            co_sign(node, &incoming.session, |node, stx| {
                let issued_here = stx
                    .tx
                    .input_assets()
                    .iter()
                    .any(|asset| asset.issuer == node.party);
                issued_here
                    .then_some(())
                    .ok_or_else(|| "this node did not issue the asset".to_string())
            })
            .await
        }
        messages::CREATE_AUCTION => {
            co_sign(node, &incoming.session, |node, stx| {
                let invited = stx
                    .tx
                    .output_auctions()
                    .iter()
                    .any(|auction| auction.is_bidder(&node.party));
                invited
                    .then_some(())
                    .ok_or_else(|| "this node is not a bidder of the proposed auction".to_string())
            })
            .await
        }
        messages::INFORM_TRANSACTION => record(node, &incoming.session).await,
        other => {
            tracing::warn!(party = %node.party, protocol = other, "unknown protocol");
            Ok(())
        }
    }
}

/// Receives a proposal, verifies it independently, applies the
/// protocol-specific acceptance check, and replies with a signature or a
/// refusal. Never signs anything it could not verify itself.
async fn co_sign(
    node: &Node,
    session: &Session,
    accept: impl Fn(&Node, &SignedTransaction) -> Result<(), String>,
) -> Result<(), FlowError> {
    let stx: SignedTransaction = session.recv().await?;
    let verdict = contracts::verify(&stx.tx)
        .map_err(|rejection| rejection.to_string())
        .and_then(|()| accept(node, &stx));
    let response = match verdict {
        Ok(()) => {
            tracing::debug!(party = %node.party, hash = %stx.hash(), "co-signing proposal");
            SignResponse::Signed(stx.with_signature(node.party.key))
        }
        Err(reason) => {
            tracing::warn!(party = %node.party, reason, "refusing to co-sign");
            SignResponse::Refused(reason)
        }
    };
    session.send(&response)?;
    Ok(())
}

/// Records a pushed finalized transaction. The sender is not trusted: a
/// transaction that is not contract-valid and fully signed must not be
/// able to plant states in the vault.
async fn record(node: &Node, session: &Session) -> Result<(), FlowError> {
    let request: InformRequest = session.recv().await?;
    let acceptable = request.ftx.hash == request.ftx.tx.hash()
        && request.ftx.tx.missing_signers().is_empty()
        && contracts::verify(&request.ftx.tx.tx).is_ok();
    if acceptable {
        node.vault.record(&request.ftx, request.policy).await;
    } else {
        tracing::warn!(
            party = %node.party,
            hash = %request.ftx.hash,
            "refusing to record invalid transaction"
        );
    }
    session.send(&acceptable)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::testutil::TestNet,
        ledger::{FinalizedTransaction, Network},
        model::{AssetCommand, AuctionableAsset, Command, TransactionBuilder},
    };

    #[tokio::test]
    async fn refuses_to_record_an_unverifiable_transaction() {
        let net = TestNet::new();
        let (alice, _) = net.node("Alice");
        let (bob, bob_sessions) = net.node("Bob");
        spawn(bob.clone(), bob_sessions);

        // Never notarized, not even validly signed.
        let asset = AuctionableAsset::new("house", alice.party.clone());
        let stx = TransactionBuilder::new()
            .output(asset.clone())
            .command(Command::new(AssetCommand::Issue, [alice.party.key]))
            .build()
            .sign(bob.party.key);
        let forged = FinalizedTransaction {
            hash: stx.hash(),
            tx: stx,
            finalized_at: chrono::Utc::now(),
        };

        let session = alice
            .network
            .open(&alice.party, &bob.party, messages::INFORM_TRANSACTION)
            .await
            .unwrap();
        session
            .send(&InformRequest {
                ftx: forged,
                policy: ledger::StatesToRecord::AllVisible,
            })
            .unwrap();
        assert!(!session.recv::<bool>().await.unwrap());
        assert!(bob.vault.assets_by_id(asset.id).await.is_empty());
    }

    #[tokio::test]
    async fn refuses_to_co_sign_a_foreign_consume() {
        let net = TestNet::new();
        let (alice, _) = net.node("Alice");
        let (bob, bob_sessions) = net.node("Bob");
        spawn(bob.clone(), bob_sessions);

        // Bob is not the issuer of Alice's asset.
        let asset = AuctionableAsset::new("house", alice.party.clone());
        let reference = model::StateRef {
            txhash: model::TxHash([0; 32]),
            index: 0,
        };
        let stx = TransactionBuilder::new()
            .input(reference, asset.clone())
            .command(Command::new(
                AssetCommand::Consume,
                [alice.party.key, bob.party.key],
            ))
            .build()
            .sign(alice.party.key);

        let session = alice
            .network
            .open(&alice.party, &bob.party, messages::CONSUME_ASSET)
            .await
            .unwrap();
        session.send(&stx).unwrap();
        match session.recv::<SignResponse>().await.unwrap() {
            SignResponse::Refused(reason) => {
                assert!(reason.contains("must sign"));
            }
            SignResponse::Signed(_) => panic!("expected a refusal"),
        }
    }
}
