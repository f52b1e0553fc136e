use {
    chrono::{Duration, Utc},
    e2e::{TestNetwork, wait_for},
    flows::{
        BidAuctionFlow, CreateAuctionFlow, DecreaseAuctionFlow, EndAuctionFlow, FlowError,
        IssueAssetFlow, Node,
    },
    informer::Projections,
    ledger::Vault,
    model::{Amount, LinearId, TokenType},
};

/// Issues an asset and opens a 100 GBP auction over it, decrementing by 10
/// every 10 seconds from `started_ago` in the past.
async fn open_auction(seller: &Node, bidders: &[&Node], started_ago: Duration) -> (LinearId, LinearId) {
    let gbp = TokenType::new("GBP", seller.party.clone());
    let issued = IssueAssetFlow::new(seller.clone(), "house")
        .run()
        .await
        .unwrap();
    let created = CreateAuctionFlow::new(
        seller.clone(),
        issued.id,
        bidders.iter().map(|node| node.party.clone()).collect(),
        Amount::new(100, gbp.clone()),
        Amount::new(10, gbp),
        Duration::seconds(10),
    )
    .starting_at(Utc::now() - started_ago)
    .run()
    .await
    .unwrap();
    (issued.id, created.auction_id)
}

#[tokio::test]
async fn a_bid_settles_the_auction_and_informs_everyone() {
    let net = TestNetwork::new();
    let seller = net.join("Seller");
    let b = net.join("B");
    let c = net.join("C");

    let (asset_id, auction_id) =
        open_auction(&seller, &[&b, &c], Duration::seconds(15)).await;

    // Everyone sees the auction, priced one decrement down.
    let views = Projections::new(c.vault.clone()).auctions().await;
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].current_price.quantity, 90);

    let settled = BidAuctionFlow::new(b.clone(), auction_id).run().await.unwrap();
    let payment = settled.tx.tx.output_tokens()[0].clone();
    assert_eq!(payment.holder, seller.party);
    assert_eq!(payment.amount.quantity, 90);

    let won = b.unique_asset(asset_id).await.unwrap();
    assert_eq!(won.state.owner, b.party);
    assert!(!won.state.locked);

    // The seller is informed by the winner, the losing bidder by the
    // seller's informer.
    wait_for(async || seller.vault.auctions_by_id(auction_id).await.is_empty()).await;
    wait_for(async || c.vault.auctions_by_id(auction_id).await.is_empty()).await;
    wait_for(async || c.vault.transaction(settled.hash).await.is_some()).await;
}

#[tokio::test]
async fn concurrent_bids_settle_exactly_once() {
    let net = TestNetwork::new();
    let seller = net.join("Seller");
    let b = net.join("B");
    let c = net.join("C");

    let (asset_id, auction_id) =
        open_auction(&seller, &[&b, &c], Duration::seconds(15)).await;

    let (from_b, from_c) = tokio::join!(
        BidAuctionFlow::new(b.clone(), auction_id).run(),
        BidAuctionFlow::new(c.clone(), auction_id).run(),
    );
    let (winner, loss) = match (from_b, from_c) {
        (Ok(_), Ok(_)) => panic!("both bids settled"),
        (Err(b_loss), Err(c_loss)) => panic!("no bid settled: {b_loss}, {c_loss}"),
        (Ok(_), Err(loss)) => (&b, loss),
        (Err(loss), Ok(_)) => (&c, loss),
    };
    assert!(matches!(loss, FlowError::Conflict(_)));

    wait_for(async || {
        winner
            .vault
            .assets_by_id(asset_id)
            .await
            .first()
            .is_some_and(|held| held.state.owner == winner.party && !held.state.locked)
    })
    .await;
    wait_for(async || seller.vault.auctions_by_id(auction_id).await.is_empty()).await;
}

#[tokio::test]
async fn bidding_after_a_decrease_pays_the_lowered_price() {
    let net = TestNetwork::new();
    let seller = net.join("Seller");
    let b = net.join("B");

    // A schedule that never decays on its own within the test.
    let gbp = TokenType::new("GBP", seller.party.clone());
    let issued = IssueAssetFlow::new(seller.clone(), "house")
        .run()
        .await
        .unwrap();
    let created = CreateAuctionFlow::new(
        seller.clone(),
        issued.id,
        vec![b.party.clone()],
        Amount::new(100, gbp.clone()),
        Amount::new(10, gbp.clone()),
        Duration::hours(1),
    )
    .run()
    .await
    .unwrap();

    // The decrease flow distributes the new version before returning, so
    // the bid right after it already spends the decreased state.
    DecreaseAuctionFlow::new(seller.clone(), created.auction_id, Amount::new(50, gbp))
        .run()
        .await
        .unwrap();
    let settled = BidAuctionFlow::new(b.clone(), created.auction_id)
        .run()
        .await
        .unwrap();
    assert_eq!(settled.tx.tx.output_tokens()[0].amount.quantity, 50);
    assert_eq!(
        b.unique_asset(issued.id).await.unwrap().state.owner,
        b.party
    );
}

#[tokio::test]
async fn ending_an_auction_returns_the_asset_to_circulation() {
    let net = TestNetwork::new();
    let seller = net.join("Seller");
    let b = net.join("B");

    let (asset_id, auction_id) = open_auction(&seller, &[&b], Duration::zero()).await;
    EndAuctionFlow::new(seller.clone(), auction_id).run().await.unwrap();

    let held = seller.unique_asset(asset_id).await.unwrap();
    assert_eq!(held.state.owner, seller.party);
    assert!(!held.state.locked);

    // The informer withdraws the auction from the bidder's vault; a late
    // bid then has nothing to spend.
    wait_for(async || b.vault.auctions_by_id(auction_id).await.is_empty()).await;
    let late = BidAuctionFlow::new(b.clone(), auction_id).run().await;
    assert!(matches!(late, Err(FlowError::AuctionNotFound)));
}
