//! USD prices for the token universe.
//!
//! Prices come from one batched request for the whole token set, cached for a
//! few minutes. A failed fetch never fails the caller: it logs and hands back
//! an empty quote, so every order simply ranks with zero volume.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use eyre::Result;
use itertools::Itertools;
use reqwest::Client;

use crate::models::PriceQuote;
use crate::utils::cache::TtlCache;

/// Cache key for a price request: the requested addresses, sorted and
/// de-duplicated, so the same set always maps to the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenSet(Vec<Address>);

impl TokenSet {
    /// Build the key for `tokens`
    #[must_use]
    pub fn new(tokens: &[Address]) -> Self {
        Self(tokens.iter().copied().sorted().dedup().collect())
    }

    /// The addresses in the set
    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.0
    }
}

/// A source of USD prices
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetches prices for every token of `tokens` in one request.
    ///
    /// # Errors
    /// * If the request fails or the response cannot be decoded
    async fn fetch(&self, tokens: &TokenSet) -> Result<PriceQuote>;
}

/// 1inch spot price API
#[derive(Debug, Clone)]
pub struct OneInchPriceFeed {
    /// The HTTP client
    client: Client,
    /// `.../price/v1.1/{chain}`
    url: String,
    /// 1inch developer portal key
    api_key: String,
}

impl OneInchPriceFeed {
    /// Create a client for `chain_id` on the API rooted at `base_url`
    ///
    /// # Errors
    /// * If the HTTP client cannot be built
    pub fn new(base_url: &str, chain_id: u64, api_key: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            url: format!("{}/price/v1.1/{chain_id}", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl PriceFeed for OneInchPriceFeed {
    async fn fetch(&self, tokens: &TokenSet) -> Result<PriceQuote> {
        let url = format!(
            "{}/{}",
            self.url,
            tokens.addresses().iter().map(ToString::to_string).join(",")
        );
        let response: HashMap<String, String> = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .query(&[("currency", "USD")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut prices = HashMap::with_capacity(response.len());
        for (address, price) in response {
            match (Address::from_str(&address), BigDecimal::from_str(&price)) {
                (Ok(address), Ok(price)) => {
                    prices.insert(address, price);
                }
                _ => log::warn!("prices: Ignoring unusable price entry {address} = {price}"),
            }
        }
        log::info!("prices: Fetched {} token prices", prices.len());
        Ok(PriceQuote::new(prices))
    }
}

/// Cached access to a [`PriceFeed`]
pub struct PriceOracle {
    /// Upstream prices
    feed: Arc<dyn PriceFeed>,
    /// Quotes by token set
    cache: TtlCache<TokenSet, PriceQuote>,
}

impl PriceOracle {
    /// Create an oracle caching quotes for `ttl`
    #[must_use]
    pub fn new(feed: Arc<dyn PriceFeed>, ttl: Duration) -> Self {
        Self {
            feed,
            cache: TtlCache::new(ttl),
        }
    }

    /// USD prices for `tokens`.
    ///
    /// Served from the cache when the same set was fetched within the TTL.
    /// On failure the error is logged and an empty quote is returned; the
    /// failed entry is evicted so the next call asks again.
    pub async fn get_prices(&self, tokens: &[Address]) -> PriceQuote {
        let feed = Arc::clone(&self.feed);
        let fetched = self
            .cache
            .get(TokenSet::new(tokens), move |key| async move {
                feed.fetch(&key).await
            })
            .await;

        match fetched {
            Ok(quote) => quote,
            Err(e) => {
                log::error!("prices: Error fetching token prices: {e}");
                PriceQuote::empty()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::test_helpers::FakePriceFeed;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_token_set_is_order_insensitive() {
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        assert_eq!(TokenSet::new(&[b, a, b]), TokenSet::new(&[a, b]));
        assert_eq!(TokenSet::new(&[b, a]).addresses(), &[a, b]);
    }

    #[tokio::test]
    async fn test_one_inch_feed_normalizes_addresses() {
        let server = MockServer::start().await;
        let weth = Address::from_str("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").unwrap();
        let usdc = Address::from_str("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").unwrap();
        let tokens = TokenSet::new(&[weth, usdc]);
        let expected_path = format!(
            "/price/v1.1/1/{}",
            tokens.addresses().iter().map(ToString::to_string).join(",")
        );

        Mock::given(method("GET"))
            .and(path(expected_path.as_str()))
            .and(query_param("currency", "USD"))
            .and(header("authorization", "Bearer key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2": "2412.5",
                "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48": "0.9998",
                "not-an-address": "1"
            })))
            .mount(&server)
            .await;

        let feed = OneInchPriceFeed::new(&server.uri(), 1, "key").unwrap();
        let quote = feed.fetch(&tokens).await.unwrap();

        assert_eq!(quote.len(), 2);
        assert_eq!(quote.price(&weth), BigDecimal::from_str("2412.5").unwrap());
        assert_eq!(quote.price(&usdc), BigDecimal::from_str("0.9998").unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_oracle_caches_per_token_set() {
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        let feed = Arc::new(FakePriceFeed::new(&[(a, "3")]));
        let oracle = PriceOracle::new(feed.clone(), Duration::from_secs(300));

        let first = oracle.get_prices(&[a, b]).await;
        let second = oracle.get_prices(&[b, a]).await;
        assert_eq!(first, second);
        assert_eq!(feed.calls(), 1);

        oracle.get_prices(&[a]).await;
        assert_eq!(feed.calls(), 2);

        tokio::time::advance(Duration::from_secs(301)).await;
        oracle.get_prices(&[a, b]).await;
        assert_eq!(feed.calls(), 3);
    }

    #[tokio::test]
    async fn test_oracle_degrades_to_empty_and_retries() {
        let a = Address::repeat_byte(1);
        let feed = Arc::new(FakePriceFeed::failing());
        let oracle = PriceOracle::new(feed.clone(), Duration::from_secs(300));

        assert!(oracle.get_prices(&[a]).await.is_empty());
        assert!(oracle.get_prices(&[a]).await.is_empty());
        assert_eq!(feed.calls(), 2);
    }
}
