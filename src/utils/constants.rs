use std::time::Duration;

use alloy::primitives::{address, Address};

/// The only chain the addresses below are deployed on
pub const MAINNET_CHAIN_ID: u64 = 1;

/// Uniswap V3 factory on Ethereum mainnet
pub const UNISWAP_V3_FACTORY: Address = address!("0x1F98431c8aD98523631AE4a59f267346ea31F984");
/// Uniswap V3 `QuoterV2` on Ethereum mainnet
pub const UNISWAP_V3_QUOTER: Address = address!("0x61fFE014bA17989E743c5F6cB21bF9697530B21e");
/// Uniswap V3 `SwapRouter` on Ethereum mainnet
pub const UNISWAP_V3_ROUTER: Address = address!("0xE592427A0AEce92De3Edee1F18E0157C05861564");

/// Contract that receives the swap output
pub const BOT_CONTRACT: Address = address!("0x27E82Ba6AfEbf3Eee3A8E1613C2Af5987929a546");

/// Default token universe
pub const USDT: Address = address!("0xdAC17F958D2ee523a2206206994597C13D831ec7");
/// Wrapped ether
pub const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
/// Wrapped bitcoin
pub const WBTC: Address = address!("0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599");
/// USD Coin
pub const USDC: Address = address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

/// 1inch developer API root
pub const ONEINCH_API_URL: &str = "https://api.1inch.dev";
/// Balancer V2 mainnet subgraph
pub const BALANCER_SUBGRAPH_URL: &str =
    "https://gateway.thegraph.com/api/subgraphs/id/C4ayEZP2yTXRAB8vSaTrgN4m9anTe9Mdm2ViyiAuV9TV";

/// Orders requested per order-book page
pub const PAGE_LIMIT: usize = 500;
/// Pause before every order-book request
pub const PAGE_DELAY: Duration = Duration::from_millis(1000);
/// How long prices and flash-loan liquidity stay cached
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);
/// Router call deadline, from now
pub const DEADLINE_MINUTES: i64 = 30;
