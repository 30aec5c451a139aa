//! # Arbitrage Module
//!
//! Decides whether a limit order is worth filling. For each order the
//! counter-trade is routed through the deepest Uniswap V3 pools, simulated on
//! the quoter contract, and compared with what the maker offers.

/// Fee tiers and liquidity reads
pub mod fee_tier;
/// Order vs. market comparison
pub mod opportunity;
/// Swap quoting and router calldata
pub mod quote;
/// Multi-hop routes and their packed encoding
pub mod route;
/// Test helpers and fakes
#[cfg(test)]
pub(crate) mod test_helpers;

pub use fee_tier::{FeeTier, LiquiditySource};
pub use opportunity::{compare, Comparison, Opportunity};
pub use quote::{
    fulfilled, Quote, QuoteEngine, QuoteError, QuoteRequest, QuotedOrder, SwapQuoter, TradeKind,
};
pub use route::{Route, RouteBuilder, RouteError};
