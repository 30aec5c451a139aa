use std::fmt;

use alloy::primitives::Address;
use itertools::Itertools;

/// A market to query in the order book.
///
/// `base` is the asset the maker sells, `quote` the asset the maker asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pair {
    /// Maker asset
    pub base: Address,
    /// Taker asset
    pub quote: Address,
}

impl Pair {
    /// Create a new pair
    #[must_use]
    pub const fn new(base: Address, quote: Address) -> Self {
        Self { base, quote }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Lists the pairs to query for `tokens`.
///
/// Without an anchor every ordered pair of distinct tokens is returned, in
/// nested order over `tokens` (`(t0,t1), (t0,t2), (t1,t0), ...`). With an
/// anchor only `(anchor, t)` pairs are returned. The order is stable because
/// it drives the order of the rate-limited requests.
#[must_use]
pub fn enumerate(tokens: &[Address], anchor: Option<Address>) -> Vec<Pair> {
    match anchor {
        Some(anchor) => tokens
            .iter()
            .filter(|token| **token != anchor)
            .map(|token| Pair::new(anchor, *token))
            .collect(),
        None => tokens
            .iter()
            .cartesian_product(tokens.iter())
            .filter(|(base, quote)| base != quote)
            .map(|(base, quote)| Pair::new(*base, *quote))
            .collect(),
    }
}
