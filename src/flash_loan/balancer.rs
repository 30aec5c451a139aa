//! How much of a token Balancer V2 could flash-lend, summed over every pool
//! that holds it.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, U256};
use eyre::{eyre, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::utils::cache::TtlCache;

/// Subgraph response envelope
#[derive(Debug, Deserialize)]
struct GraphResponse {
    /// Query result
    data: Option<PoolsData>,
    /// GraphQL errors, if any
    #[serde(default)]
    errors: Vec<GraphError>,
}

/// `data` of the pools query
#[derive(Debug, Deserialize)]
struct PoolsData {
    /// Matching pools
    pools: Vec<PoolBalances>,
}

/// One pool and the balance it holds of the queried token
#[derive(Debug, Deserialize)]
struct PoolBalances {
    /// Pool id
    id: String,
    /// The queried token, when its balance is positive
    tokens: Vec<TokenBalance>,
}

/// A pool token balance in whole-token decimal units
#[derive(Debug, Deserialize)]
struct TokenBalance {
    /// Balance as a decimal string
    balance: String,
}

/// A GraphQL error entry
#[derive(Debug, Deserialize)]
struct GraphError {
    /// Error text
    message: String,
}

/// Balancer V2 subgraph client
struct Subgraph {
    /// The HTTP client
    client: Client,
    /// GraphQL endpoint
    url: String,
    /// Gateway key, sent as a bearer token
    api_key: Option<String>,
}

impl Subgraph {
    /// Sums the queried token's balance over pools with meaningful liquidity
    async fn total_liquidity(&self, token: Address) -> Result<U256> {
        let token = format!("{token:#x}");
        let query = format!(
            r#"{{
  pools(where: {{ tokensList_contains: ["{token}"], totalLiquidity_gt: 0.1 }}) {{
    id
    tokens(where: {{ address: "{token}", balance_gt: "0" }}) {{
      balance
      address
    }}
  }}
}}"#
        );

        let mut request = self.client.post(&self.url).json(&json!({ "query": query }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response: GraphResponse = request.send().await?.error_for_status()?.json().await?;

        if let Some(error) = response.errors.first() {
            return Err(eyre!("balancer subgraph: {}", error.message));
        }
        let pools = response
            .data
            .ok_or_else(|| eyre!("balancer subgraph returned no data"))?
            .pools;

        let mut total = U256::ZERO;
        for pool in &pools {
            let Some(balance) = pool.tokens.first() else {
                continue;
            };
            let amount = parse_ether(&balance.balance)
                .map_err(|e| eyre!("pool {}: bad balance `{}`: {e}", pool.id, balance.balance))?;
            total = total.saturating_add(amount);
        }
        log::debug!(
            "flash_loan::balancer: {token} has {total} across {} pools",
            pools.len()
        );
        Ok(total)
    }
}

/// Flash-loanable Balancer liquidity per token, cached by token address
pub struct BalancerLiquidity {
    /// Upstream subgraph
    subgraph: Arc<Subgraph>,
    /// Totals by token
    cache: TtlCache<Address, U256>,
}

impl BalancerLiquidity {
    /// Create a client for the subgraph at `url`, caching totals for `ttl`
    ///
    /// # Errors
    /// * If the HTTP client cannot be built
    pub fn new(url: &str, api_key: Option<String>, ttl: Duration) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            subgraph: Arc::new(Subgraph {
                client,
                url: url.to_string(),
                api_key,
            }),
            cache: TtlCache::new(ttl),
        })
    }

    /// Total balance of `token` held by Balancer pools with meaningful
    /// liquidity, scaled by 10^18.
    ///
    /// # Errors
    /// * If the subgraph request fails or returns an error
    pub async fn liquidity(&self, token: Address) -> Result<U256> {
        let subgraph = Arc::clone(&self.subgraph);
        let total = self
            .cache
            .get(token, move |token| async move {
                subgraph.total_liquidity(token).await
            })
            .await?;
        Ok(total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token() -> Address {
        Address::repeat_byte(0xab)
    }

    #[tokio::test]
    async fn test_sums_pool_balances_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer graph-key"))
            .and(body_string_contains("abababababababababababababababababababab"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "pools": [
                        { "id": "0x01", "tokens": [{ "balance": "1.5", "address": "0xab" }] },
                        { "id": "0x02", "tokens": [] },
                        { "id": "0x03", "tokens": [{ "balance": "2", "address": "0xab" }] }
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let balancer = BalancerLiquidity::new(
            &server.uri(),
            Some("graph-key".to_string()),
            Duration::from_secs(300),
        )
        .unwrap();

        let expected = U256::from(3_500_000_000_000_000_000_u128);
        assert_eq!(balancer.liquidity(token()).await.unwrap(), expected);
        assert_eq!(balancer.liquidity(token()).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_graphql_errors_fail_and_are_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{ "message": "indexer unavailable" }]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let balancer = BalancerLiquidity::new(&server.uri(), None, Duration::from_secs(300)).unwrap();

        let err = balancer.liquidity(token()).await.unwrap_err();
        assert!(err.to_string().contains("indexer unavailable"));
        assert!(balancer.liquidity(token()).await.is_err());
    }
}
