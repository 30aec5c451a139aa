//! Uniswap V3 fee tiers and picking the deepest one for a token pair.

use alloy::primitives::Address;
use async_trait::async_trait;
use derive_more::Display;
use eyre::Result;

/// The swap fee of a Uniswap V3 pool, in hundredths of a basis point.
///
/// Ordered from cheapest to most expensive.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum FeeTier {
    /// 0.05%
    #[display("0.05%")]
    Low = 500,
    /// 0.30%
    #[display("0.30%")]
    Medium = 3000,
    /// 1.00%
    #[display("1.00%")]
    High = 10_000,
}

impl FeeTier {
    /// Every tier, cheapest first
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// The fee as the `uint24` the contracts use
    #[must_use]
    pub const fn units(self) -> u32 {
        self as u32
    }

    /// Parses a contract fee value
    #[must_use]
    pub const fn from_units(units: u32) -> Option<Self> {
        match units {
            500 => Some(Self::Low),
            3000 => Some(Self::Medium),
            10_000 => Some(Self::High),
            _ => None,
        }
    }
}

/// On-chain pool discovery and liquidity reads
#[async_trait]
pub trait LiquiditySource: Send + Sync {
    /// Pool address for the pair at `fee`; the zero address when the pool
    /// does not exist.
    ///
    /// # Errors
    /// * If the chain read fails
    async fn pool(&self, token_a: Address, token_b: Address, fee: FeeTier) -> Result<Address>;

    /// In-range liquidity of `pool`
    ///
    /// # Errors
    /// * If the chain read fails
    async fn liquidity(&self, pool: Address) -> Result<u128>;
}

/// A point-in-time liquidity read for one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquiditySample {
    /// First token as requested
    pub token_a: Address,
    /// Second token as requested
    pub token_b: Address,
    /// Pool fee tier
    pub fee: FeeTier,
    /// Pool liquidity, zero when the pool does not exist
    pub liquidity: u128,
}

impl LiquiditySample {
    /// Reads the liquidity of the `fee` pool for a pair. A missing pool
    /// reads as zero liquidity.
    ///
    /// # Errors
    /// * If a chain read fails
    pub async fn read(
        source: &dyn LiquiditySource,
        token_a: Address,
        token_b: Address,
        fee: FeeTier,
    ) -> Result<Self> {
        let pool = source.pool(token_a, token_b, fee).await?;
        let liquidity = if pool.is_zero() {
            0
        } else {
            source.liquidity(pool).await?
        };
        Ok(Self {
            token_a,
            token_b,
            fee,
            liquidity,
        })
    }
}

/// The tier with the most liquidity. Ties go to the cheaper tier, so a pair
/// without any pool falls back to [`FeeTier::Low`].
#[must_use]
pub fn deepest(samples: &[LiquiditySample]) -> FeeTier {
    let mut ordered = samples.to_vec();
    ordered.sort_by_key(|sample| sample.fee);
    ordered
        .iter()
        .fold(None::<&LiquiditySample>, |best, sample| match best {
            Some(best) if best.liquidity >= sample.liquidity => Some(best),
            _ => Some(sample),
        })
        .map_or(FeeTier::Low, |best| best.fee)
}
