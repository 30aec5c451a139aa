//! A Uniswap V3 swap route: a direct or one-hop token path with a fee tier
//! per hop, and the packed byte path the quoter and router take.

use std::fmt;
use std::sync::Arc;

use alloy::primitives::{Address, Bytes};
use futures::future::join_all;
use thiserror::Error;

use super::fee_tier::{deepest, FeeTier, LiquiditySample, LiquiditySource};

/// Bytes of an address in a packed path
const ADDRESS_LEN: usize = 20;
/// Bytes of a fee in a packed path
const FEE_LEN: usize = 3;
/// Input, optional hop, output
const MAX_TOKENS: usize = 3;

/// Why a route could not be built or decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Fewer than two tokens
    #[error("a route needs at least two tokens, got {0}")]
    TooShort(usize),
    /// More than one intermediate token
    #[error("a route has at most one hop token, got {0} tokens")]
    TooLong(usize),
    /// Fees do not line up with hops
    #[error("{tokens} tokens need one fee tier per hop, got {fees} fee tiers")]
    FeeCountMismatch {
        /// Number of tokens
        tokens: usize,
        /// Number of fees
        fees: usize,
    },
    /// Packed path has an impossible length
    #[error("packed path of {0} bytes is not address(,fee,address)*")]
    Malformed(usize),
    /// Packed path names a fee that is not a known tier
    #[error("unknown fee tier {0}")]
    UnknownFee(u32),
}

/// Tokens to swap through, with the fee tier of every hop
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    /// Tokens from input to output
    tokens: Vec<Address>,
    /// `fees[i]` is the tier of the `tokens[i] -> tokens[i + 1]` pool
    fees: Vec<FeeTier>,
}

impl Route {
    /// Creates a route, checking that there is one fee per hop.
    ///
    /// # Errors
    /// * If there are fewer than two or more than three tokens
    /// * If the number of fees is not the number of hops
    pub fn new(tokens: Vec<Address>, fees: Vec<FeeTier>) -> Result<Self, RouteError> {
        if tokens.len() < 2 {
            return Err(RouteError::TooShort(tokens.len()));
        }
        if tokens.len() > MAX_TOKENS {
            return Err(RouteError::TooLong(tokens.len()));
        }
        if fees.len() + 1 != tokens.len() {
            return Err(RouteError::FeeCountMismatch {
                tokens: tokens.len(),
                fees: fees.len(),
            });
        }
        Ok(Self { tokens, fees })
    }

    /// A single-pool route
    #[must_use]
    pub fn direct(token_in: Address, fee: FeeTier, token_out: Address) -> Self {
        Self {
            tokens: vec![token_in, token_out],
            fees: vec![fee],
        }
    }

    /// A route through `hop`
    #[must_use]
    pub fn via(
        token_in: Address,
        first_fee: FeeTier,
        hop: Address,
        second_fee: FeeTier,
        token_out: Address,
    ) -> Self {
        Self {
            tokens: vec![token_in, hop, token_out],
            fees: vec![first_fee, second_fee],
        }
    }

    /// Tokens from input to output
    #[must_use]
    pub fn tokens(&self) -> &[Address] {
        &self.tokens
    }

    /// Fee tier of every hop
    #[must_use]
    pub fn fees(&self) -> &[FeeTier] {
        &self.fees
    }

    /// Number of pools swapped through
    #[must_use]
    pub fn hops(&self) -> usize {
        self.fees.len()
    }

    /// Packs the route as `token | fee | token | ... | token`, each fee a
    /// 3-byte big-endian integer. This is the path exact-input calls take.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        pack(self.tokens.iter(), self.fees.iter())
    }

    /// Packs the route output-first, the path exact-output calls take
    #[must_use]
    pub fn encode_reversed(&self) -> Bytes {
        pack(self.tokens.iter().rev(), self.fees.iter().rev())
    }

    /// Parses a packed path.
    ///
    /// # Errors
    /// * If the length is not `20 + n * 23` for some `n >= 1`
    /// * If a fee is not one of the known tiers
    pub fn decode(path: &[u8]) -> Result<Self, RouteError> {
        let step = FEE_LEN + ADDRESS_LEN;
        if path.len() < ADDRESS_LEN + step || (path.len() - ADDRESS_LEN) % step != 0 {
            return Err(RouteError::Malformed(path.len()));
        }

        let mut tokens = vec![Address::from_slice(&path[..ADDRESS_LEN])];
        let mut fees = Vec::new();
        for chunk in path[ADDRESS_LEN..].chunks_exact(step) {
            let units = u32::from_be_bytes([0, chunk[0], chunk[1], chunk[2]]);
            fees.push(FeeTier::from_units(units).ok_or(RouteError::UnknownFee(units))?);
            tokens.push(Address::from_slice(&chunk[FEE_LEN..]));
        }
        Self::new(tokens, fees)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens[0])?;
        for (fee, token) in self.fees.iter().zip(&self.tokens[1..]) {
            write!(f, " -({fee})-> {token}")?;
        }
        Ok(())
    }
}

/// Writes tokens and fees interleaved, tokens first and last
fn pack<'a>(
    mut tokens: impl Iterator<Item = &'a Address>,
    fees: impl Iterator<Item = &'a FeeTier>,
) -> Bytes {
    let mut out = Vec::new();
    if let Some(first) = tokens.next() {
        out.extend_from_slice(first.as_slice());
    }
    for (fee, token) in fees.zip(tokens) {
        out.extend_from_slice(&fee.units().to_be_bytes()[1..]);
        out.extend_from_slice(token.as_slice());
    }
    Bytes::from(out)
}

/// Picks fee tiers from live liquidity and assembles routes
#[derive(Clone)]
pub struct RouteBuilder {
    /// Chain reads
    liquidity: Arc<dyn LiquiditySource>,
}

impl RouteBuilder {
    /// Create a new route builder
    #[must_use]
    pub fn new(liquidity: Arc<dyn LiquiditySource>) -> Self {
        Self { liquidity }
    }

    /// The fee tier whose pool holds the most liquidity for the pair.
    ///
    /// The three tiers are read concurrently and never cached. Ties, including
    /// a pair without pools, go to the cheapest tier.
    ///
    /// # Errors
    /// * If any of the liquidity reads fails
    pub async fn best_fee_tier(&self, token_a: Address, token_b: Address) -> eyre::Result<FeeTier> {
        let reads = FeeTier::ALL
            .map(|fee| LiquiditySample::read(self.liquidity.as_ref(), token_a, token_b, fee));
        let samples = join_all(reads)
            .await
            .into_iter()
            .collect::<eyre::Result<Vec<_>>>()?;

        let fee = deepest(&samples);
        log::debug!(
            "arb::route: {token_a} / {token_b} liquidity {:?}, picked {fee}",
            samples.iter().map(|s| s.liquidity).collect::<Vec<_>>()
        );
        Ok(fee)
    }

    /// Builds the route from `send` to `receive`.
    ///
    /// Without a hop, or with a hop equal to either end, the route is a single
    /// pool. Otherwise it goes through `hop`, with each leg's tier picked on
    /// its own.
    ///
    /// # Errors
    /// * If a liquidity read fails
    pub async fn build(
        &self,
        send: Address,
        receive: Address,
        hop: Option<Address>,
    ) -> eyre::Result<Route> {
        match hop {
            Some(hop) if hop != send && hop != receive => {
                let first = self.best_fee_tier(send, hop).await?;
                let second = self.best_fee_tier(hop, receive).await?;
                Ok(Route::via(send, first, hop, second, receive))
            }
            _ => {
                let fee = self.best_fee_tier(send, receive).await?;
                Ok(Route::direct(send, fee, receive))
            }
        }
    }
}
