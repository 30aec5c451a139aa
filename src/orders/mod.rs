//! # Orders Module
//!
//! Everything between the off-chain order book and a ranked list of orders:
//! which pairs to ask for, paging through the book under its rate limit,
//! and ranking the result by USD volume.

/// Paginated, rate-limited collection across pairs
pub mod aggregator;
/// Order-book clients
pub mod book;
/// Pair enumeration
pub mod pairs;
/// Normalization and volume ranking
pub mod ranker;

pub use aggregator::{Aggregation, Aggregator, AggregatorSettings, PageFailure};
pub use book::{OneInchOrderBook, OrderBook};
pub use pairs::{enumerate, Pair};
pub use ranker::rank;
