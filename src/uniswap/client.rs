use alloy::network::Ethereum;
use alloy::primitives::aliases::U24;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::RootProvider;
use async_trait::async_trait;
use eyre::Result;

use super::contracts::{IQuoterV2, IUniswapV3Factory, IUniswapV3Pool};
use crate::arb::fee_tier::{FeeTier, LiquiditySource};
use crate::arb::quote::SwapQuoter;
use crate::utils::constants::{UNISWAP_V3_FACTORY, UNISWAP_V3_QUOTER};

/// Uniswap V3 reads and quoter simulations over one RPC connection
#[derive(Clone)]
pub struct UniswapV3 {
    /// RPC connection
    provider: RootProvider<Ethereum>,
    /// Pool factory
    factory: Address,
    /// QuoterV2
    quoter: Address,
}

impl UniswapV3 {
    /// Uniswap V3 on mainnet. The provider must point at chain
    /// [`crate::utils::constants::MAINNET_CHAIN_ID`]; `Config` refuses any
    /// other chain.
    #[must_use]
    pub fn mainnet(provider: RootProvider<Ethereum>) -> Self {
        Self::new(provider, UNISWAP_V3_FACTORY, UNISWAP_V3_QUOTER)
    }

    /// Uniswap V3 deployed at `factory`, simulated through `quoter`
    #[must_use]
    pub const fn new(provider: RootProvider<Ethereum>, factory: Address, quoter: Address) -> Self {
        Self {
            provider,
            factory,
            quoter,
        }
    }
}

#[async_trait]
impl LiquiditySource for UniswapV3 {
    async fn pool(&self, token_a: Address, token_b: Address, fee: FeeTier) -> Result<Address> {
        let factory = IUniswapV3Factory::new(self.factory, &self.provider);
        let pool = factory
            .getPool(token_a, token_b, U24::from(fee.units()))
            .call()
            .await?
            .pool;
        Ok(pool)
    }

    async fn liquidity(&self, pool: Address) -> Result<u128> {
        let pool = IUniswapV3Pool::new(pool, &self.provider);
        Ok(pool.liquidity().call().await?.liquidity)
    }
}

#[async_trait]
impl SwapQuoter for UniswapV3 {
    async fn quote_exact_input(&self, path: Bytes, amount_in: U256) -> Result<U256> {
        let quoter = IQuoterV2::new(self.quoter, &self.provider);
        let quoted = quoter.quoteExactInput(path, amount_in).call().await?;
        log::debug!(
            "uniswap::quote_exact_input: {amount_in} -> {} (gas {})",
            quoted.amountOut,
            quoted.gasEstimate
        );
        Ok(quoted.amountOut)
    }

    async fn quote_exact_output(&self, path: Bytes, amount_out: U256) -> Result<U256> {
        let quoter = IQuoterV2::new(self.quoter, &self.provider);
        let quoted = quoter.quoteExactOutput(path, amount_out).call().await?;
        log::debug!(
            "uniswap::quote_exact_output: {} -> {amount_out} (gas {})",
            quoted.amountIn,
            quoted.gasEstimate
        );
        Ok(quoted.amountIn)
    }
}
