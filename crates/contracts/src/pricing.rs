//! Deterministic Dutch-auction price decay.
//!
//! Every validating party recomputes the clearing price from the auction's
//! schedule and an attested instant; nobody's claimed "current price" is
//! trusted. Integer arithmetic only, so independent computations cannot
//! diverge.

use {
    chrono::{DateTime, Utc},
    model::{Amount, AuctionState},
};

/// Whole periods elapsed between the auction's start and `at`.
///
/// Negative elapsed time (clock skew between parties) counts as zero
/// periods rather than being an error.
pub fn periods_elapsed(auction: &AuctionState, at: DateTime<Utc>) -> u64 {
    let elapsed_ms = (at - auction.start_time).num_milliseconds();
    let period_ms = auction.period.num_milliseconds();
    if elapsed_ms <= 0 || period_ms <= 0 {
        return 0;
    }
    (elapsed_ms / period_ms).unsigned_abs()
}

/// The price a bid placed at `at` must pay.
///
/// `price - periods * decrement`, floored at the last strictly-positive step
/// of the schedule so the clearing price never reaches zero.
pub fn current_price(auction: &AuctionState, at: DateTime<Utc>) -> Amount {
    let decrement = auction.decrement.quantity;
    let start = auction.price.quantity;
    let max_steps = if decrement == 0 {
        0
    } else {
        start.saturating_sub(1) / decrement
    };
    let steps = periods_elapsed(auction, at).min(max_steps);
    Amount::new(start - steps * decrement, auction.price.token.clone())
}
