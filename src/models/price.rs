use std::collections::HashMap;

use alloy::primitives::Address;
use bigdecimal::BigDecimal;

/// USD unit prices for a set of tokens.
///
/// A token without an entry is worth zero, so orders in unpriced tokens rank
/// last instead of failing the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    /// Token address to USD unit price
    prices: HashMap<Address, BigDecimal>,
}

impl PriceQuote {
    /// Create a quote from a price map
    #[must_use]
    pub const fn new(prices: HashMap<Address, BigDecimal>) -> Self {
        Self { prices }
    }

    /// A quote with no prices
    #[must_use]
    pub fn empty() -> Self {
        Self::new(HashMap::new())
    }

    /// The USD price of `token`, zero when unknown
    #[must_use]
    pub fn price(&self, token: &Address) -> BigDecimal {
        self.prices
            .get(token)
            .cloned()
            .unwrap_or_else(|| BigDecimal::from(0))
    }

    /// Number of priced tokens
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether no token is priced
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
