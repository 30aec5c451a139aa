use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use reqwest::Client;

use crate::models::RawOrder;
use crate::orders::pairs::Pair;

/// A paginated source of open limit orders
#[async_trait]
pub trait OrderBook: Send + Sync {
    /// Fetches one page (1-based) of open orders selling `pair.base` for
    /// `pair.quote`.
    ///
    /// # Errors
    /// * If the request fails or the response cannot be decoded
    async fn fetch_page(&self, pair: Pair, page: u32, limit: usize) -> Result<Vec<RawOrder>>;
}

/// Client for the 1inch limit-order protocol order book
#[derive(Debug, Clone)]
pub struct OneInchOrderBook {
    /// The HTTP client
    client: Client,
    /// `.../orderbook/v4.0/{chain}/all`
    url: String,
    /// 1inch developer portal key
    api_key: String,
}

impl OneInchOrderBook {
    /// Create a client for `chain_id` on the API rooted at `base_url`
    ///
    /// # Errors
    /// * If the HTTP client cannot be built
    pub fn new(base_url: &str, chain_id: u64, api_key: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            url: format!(
                "{}/orderbook/v4.0/{chain_id}/all",
                base_url.trim_end_matches('/')
            ),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl OrderBook for OneInchOrderBook {
    async fn fetch_page(&self, pair: Pair, page: u32, limit: usize) -> Result<Vec<RawOrder>> {
        let orders = self
            .client
            .get(&self.url)
            .bearer_auth(&self.api_key)
            .query(&[
                ("takerAsset", pair.quote.to_string()),
                ("makerAsset", pair.base.to_string()),
                ("page", page.to_string()),
                ("limit", limit.to_string()),
                ("statuses", "1".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<RawOrder>>()
            .await?;
        Ok(orders)
    }
}
