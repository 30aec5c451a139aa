//! Runtime configuration, read from the environment (and `.env`).

use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;
use eyre::{eyre, Result, WrapErr};
use url::Url;

use crate::models::{Token, TokenList};
use crate::orders::AggregatorSettings;
use crate::utils::constants::{
    BALANCER_SUBGRAPH_URL, BOT_CONTRACT, CACHE_TTL, MAINNET_CHAIN_ID, ONEINCH_API_URL, PAGE_DELAY,
    PAGE_LIMIT, USDC, USDT, WBTC, WETH,
};

/// Everything the scout needs to run
#[derive(Debug, Clone)]
pub struct Config {
    /// 1inch developer portal key
    pub oneinch_api_key: String,
    /// 1inch API root
    pub oneinch_api_url: String,
    /// JSON-RPC endpoint
    pub rpc_url: Url,
    /// Chain the order book and prices are requested for; always mainnet
    pub chain_id: u64,
    /// Recipient of the quoted swaps
    pub receiver: Address,
    /// Token universe
    pub tokens: TokenList,
    /// Only pairs selling this token are scanned; `None` scans all pairs
    pub anchor: Option<Address>,
    /// Intermediate token for two-hop routes
    pub hop: Option<Address>,
    /// Order-book pacing
    pub aggregator: AggregatorSettings,
    /// Price cache lifetime
    pub price_ttl: Duration,
    /// Balancer V2 subgraph endpoint
    pub balancer_subgraph_url: String,
    /// Balancer subgraph gateway key
    pub balancer_subgraph_key: Option<String>,
    /// Slack bot token; reporting is off without one
    pub slack_token: Option<String>,
}

impl Config {
    /// Loads `.env` if present, then reads the configuration from the process
    /// environment.
    ///
    /// # Errors
    /// * If a required variable is missing
    /// * If a variable cannot be parsed
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Empty values count as unset.
    ///
    /// # Errors
    /// * If a required variable is missing
    /// * If a variable cannot be parsed
    /// * If `SCOUT_PAGE_LIMIT` is zero or `CHAIN_ID` is not mainnet
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| var(key).ok_or_else(|| eyre!("{key} must be set"));

        let tokens = match var("SCOUT_TOKENS") {
            Some(list) => TokenList::from_str(&list).wrap_err("SCOUT_TOKENS")?,
            None => default_tokens(),
        };
        if tokens.is_empty() {
            return Err(eyre!("SCOUT_TOKENS lists no tokens"));
        }

        let anchor = match var("SCOUT_ANCHOR") {
            Some(anchor) if anchor.eq_ignore_ascii_case("none") => None,
            Some(anchor) => Some(resolve(&tokens, &anchor).wrap_err("SCOUT_ANCHOR")?),
            None => Some(WETH),
        };
        let hop = var("SCOUT_HOP")
            .map(|hop| resolve(&tokens, &hop).wrap_err("SCOUT_HOP"))
            .transpose()?;

        let aggregator = AggregatorSettings {
            page_limit: parse_or(&var, "SCOUT_PAGE_LIMIT", PAGE_LIMIT)?,
            page_delay: var("SCOUT_PAGE_DELAY_MS")
                .map(|ms| parse::<u64>("SCOUT_PAGE_DELAY_MS", &ms).map(Duration::from_millis))
                .transpose()?
                .unwrap_or(PAGE_DELAY),
            pair_concurrency: parse_or(&var, "SCOUT_PAIR_CONCURRENCY", 1_usize)?.max(1),
        };
        if aggregator.page_limit == 0 {
            return Err(eyre!("SCOUT_PAGE_LIMIT must be at least 1"));
        }

        // Contract addresses and default tokens are mainnet deployments
        let chain_id = parse_or(&var, "CHAIN_ID", MAINNET_CHAIN_ID)?;
        if chain_id != MAINNET_CHAIN_ID {
            return Err(eyre!(
                "CHAIN_ID={chain_id} is not supported, only mainnet ({MAINNET_CHAIN_ID})"
            ));
        }

        Ok(Self {
            oneinch_api_key: required("ONEINCH_API_KEY")?,
            oneinch_api_url: var("ONEINCH_API_URL").unwrap_or_else(|| ONEINCH_API_URL.to_string()),
            rpc_url: parse("RPC_URL", &required("RPC_URL")?)?,
            chain_id,
            receiver: parse_or(&var, "SCOUT_RECEIVER", BOT_CONTRACT)?,
            tokens,
            anchor,
            hop,
            aggregator,
            price_ttl: var("SCOUT_PRICE_TTL_SECS")
                .map(|secs| parse::<u64>("SCOUT_PRICE_TTL_SECS", &secs).map(Duration::from_secs))
                .transpose()?
                .unwrap_or(CACHE_TTL),
            balancer_subgraph_url: var("BALANCER_SUBGRAPH_URL")
                .unwrap_or_else(|| BALANCER_SUBGRAPH_URL.to_string()),
            balancer_subgraph_key: var("BALANCER_SUBGRAPH_KEY"),
            slack_token: var("SLACK_OAUTH_TOKEN"),
        })
    }
}

/// USDT, WETH, USDC and WBTC on mainnet
fn default_tokens() -> TokenList {
    TokenList::new(vec![
        Token::new("USDT", USDT),
        Token::new("WETH", WETH),
        Token::new("USDC", USDC),
        Token::new("WBTC", WBTC),
    ])
}

/// A symbol from the token list, or any address
fn resolve(tokens: &TokenList, needle: &str) -> Result<Address> {
    if let Some(token) = tokens.resolve(needle) {
        return Ok(token.address);
    }
    Address::from_str(needle.trim()).map_err(|_| eyre!("unknown token `{needle}`"))
}

/// Parses `value`, naming `key` in the error
fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| eyre!("{key}=`{value}` is invalid: {e}"))
}

/// Parses `key` if set, else `default`
fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key).map_or(Ok(default), |value| parse(key, &value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let mut env: HashMap<String, String> = HashMap::from([
            ("ONEINCH_API_KEY".to_string(), "key".to_string()),
            ("RPC_URL".to_string(), "http://localhost:8545".to_string()),
        ]);
        for (key, value) in vars {
            env.insert((*key).to_string(), (*value).to_string());
        }
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.chain_id, 1);
        assert_eq!(config.receiver, BOT_CONTRACT);
        assert_eq!(config.tokens.len(), 4);
        assert_eq!(config.anchor, Some(WETH));
        assert_eq!(config.hop, None);
        assert_eq!(config.aggregator.page_limit, 500);
        assert_eq!(config.aggregator.page_delay, Duration::from_millis(1000));
        assert_eq!(config.aggregator.pair_concurrency, 1);
        assert_eq!(config.price_ttl, Duration::from_secs(300));
        assert_eq!(config.oneinch_api_url, ONEINCH_API_URL);
        assert!(config.slack_token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("SCOUT_TOKENS", "WETH:0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2, USDC:0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            ("SCOUT_ANCHOR", "none"),
            ("SCOUT_HOP", "usdc"),
            ("SCOUT_PAGE_DELAY_MS", "250"),
            ("SCOUT_PAIR_CONCURRENCY", "0"),
            ("SLACK_OAUTH_TOKEN", "xoxb"),
        ])
        .unwrap();
        assert_eq!(config.tokens.addresses(), vec![WETH, USDC]);
        assert_eq!(config.anchor, None);
        assert_eq!(config.hop, Some(USDC));
        assert_eq!(config.aggregator.page_delay, Duration::from_millis(250));
        assert_eq!(config.aggregator.pair_concurrency, 1);
        assert_eq!(config.slack_token.as_deref(), Some("xoxb"));
    }

    #[test]
    fn test_errors() {
        assert!(Config::from_lookup(|_| None).is_err());
        assert!(config(&[("CHAIN_ID", "mainnet")]).is_err());
        assert!(config(&[("SCOUT_ANCHOR", "DOGE")]).is_err());
        assert!(config(&[("SCOUT_TOKENS", "WETH")]).is_err());
        assert!(config(&[("RPC_URL", "not a url")]).is_err());
    }

    #[test]
    fn test_zero_page_limit_is_rejected() {
        let err = config(&[("SCOUT_PAGE_LIMIT", "0")]).unwrap_err();
        assert_eq!(err.to_string(), "SCOUT_PAGE_LIMIT must be at least 1");
        assert_eq!(
            config(&[("SCOUT_PAGE_LIMIT", "1")]).unwrap().aggregator.page_limit,
            1
        );
    }

    #[test]
    fn test_only_mainnet_is_supported() {
        assert_eq!(config(&[("CHAIN_ID", "1")]).unwrap().chain_id, 1);
        let err = config(&[("CHAIN_ID", "137")]).unwrap_err();
        assert!(err.to_string().contains("CHAIN_ID=137 is not supported"));
    }
}
