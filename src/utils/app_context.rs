//! Shared clients for one scout run.
//!
//! Builds the RPC provider and every external client from a [`Config`], so
//! the bot and the CLI commands receive ready-made handles.

use std::sync::Arc;

use alloy::network::Ethereum;
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use eyre::Result;

use crate::config::Config;
use crate::flash_loan::BalancerLiquidity;
use crate::notify::SlackNotifier;
use crate::orders::{Aggregator, OneInchOrderBook};
use crate::prices::{OneInchPriceFeed, PriceOracle};
use crate::uniswap::UniswapV3;
use crate::utils::constants::CACHE_TTL;

/// Connections and clients built from the configuration
pub struct AppContext {
    /// The configuration everything was built from
    pub config: Config,
    /// Order-book pagination
    pub aggregator: Aggregator,
    /// Cached USD prices
    pub prices: PriceOracle,
    /// Uniswap V3 reads and simulations
    pub uniswap: Arc<UniswapV3>,
    /// Balancer flash-loan liquidity
    pub balancer: BalancerLiquidity,
    /// Opportunity reports, when a Slack token is configured
    pub slack: Option<SlackNotifier>,
}

impl AppContext {
    /// Creates the context for `config`.
    ///
    /// # Errors
    /// * If an HTTP client cannot be built
    pub fn new(config: Config) -> Result<Self> {
        let provider = ProviderBuilder::new().on_http(config.rpc_url.clone());
        let provider: RootProvider<Ethereum> = (*provider.root()).clone();

        let book = OneInchOrderBook::new(
            &config.oneinch_api_url,
            config.chain_id,
            &config.oneinch_api_key,
        )?;
        let feed = OneInchPriceFeed::new(
            &config.oneinch_api_url,
            config.chain_id,
            &config.oneinch_api_key,
        )?;
        let slack = config
            .slack_token
            .as_deref()
            .map(SlackNotifier::new)
            .transpose()?;

        Ok(Self {
            aggregator: Aggregator::new(Arc::new(book), config.aggregator, config.tokens.clone()),
            prices: PriceOracle::new(Arc::new(feed), config.price_ttl),
            uniswap: Arc::new(UniswapV3::mainnet(provider)),
            balancer: BalancerLiquidity::new(
                &config.balancer_subgraph_url,
                config.balancer_subgraph_key.clone(),
                CACHE_TTL,
            )?,
            slack,
            config,
        })
    }
}
