//! Owner-side services layered on the vault: the watcher that keeps
//! bidders up to date, and the read-side views clients query.

pub mod projections;
pub mod watcher;

pub use {
    projections::{AuctionView, Projections},
    watcher::spawn,
};
