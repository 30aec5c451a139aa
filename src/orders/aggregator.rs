//! Walks the order book page by page for every pair of the token universe.
//!
//! Every request is preceded by a fixed delay to stay under the API rate
//! limit. Pages of one pair are fetched strictly one after the other; a page
//! shorter than the page size is the last one. A failed page is logged,
//! recorded, and ends that pair without failing the run.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::models::{RawOrder, TokenList};
use crate::orders::book::OrderBook;
use crate::orders::pairs::Pair;
use crate::utils::constants::{PAGE_DELAY, PAGE_LIMIT};

/// Pagination and pacing knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorSettings {
    /// Orders requested per page
    pub page_limit: usize,
    /// Pause before every request
    pub page_delay: Duration,
    /// How many pairs are walked at the same time
    pub pair_concurrency: usize,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            page_limit: PAGE_LIMIT,
            page_delay: PAGE_DELAY,
            pair_concurrency: 1,
        }
    }
}

/// A page that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    /// The pair being paginated
    pub pair: Pair,
    /// The 1-based page number
    pub page: u32,
    /// Rendered error
    pub error: String,
}

/// Everything collected in one aggregation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// Raw orders, grouped by pair in enumeration order, pages in request order
    pub orders: Vec<RawOrder>,
    /// Pages that failed and were counted as empty
    pub failures: Vec<PageFailure>,
}

impl Aggregation {
    fn extend(&mut self, other: Self) {
        self.orders.extend(other.orders);
        self.failures.extend(other.failures);
    }
}

/// Collects open orders across pairs
pub struct Aggregator {
    /// Where orders come from
    book: Arc<dyn OrderBook>,
    /// Pagination knobs
    settings: AggregatorSettings,
    /// Symbols for log lines
    tokens: TokenList,
}

impl Aggregator {
    /// Create a new aggregator
    #[must_use]
    pub fn new(book: Arc<dyn OrderBook>, settings: AggregatorSettings, tokens: TokenList) -> Self {
        Self {
            book,
            settings,
            tokens,
        }
    }

    /// Fetches all pages of all `pairs`.
    ///
    /// The result keeps pair order even when several pairs are walked at
    /// once.
    pub async fn collect(&self, pairs: &[Pair]) -> Aggregation {
        let per_pair: Vec<Aggregation> = stream::iter(pairs.iter().copied())
            .map(|pair| self.collect_pair(pair))
            .buffered(self.settings.pair_concurrency.max(1))
            .collect()
            .await;

        let mut all = Aggregation::default();
        for aggregation in per_pair {
            all.extend(aggregation);
        }

        log::info!(
            "orders::aggregator: Collected {} orders over {} pairs ({} failed pages)",
            all.orders.len(),
            pairs.len(),
            all.failures.len()
        );
        all
    }

    /// Pages through a single pair until a short or empty page comes back
    async fn collect_pair(&self, pair: Pair) -> Aggregation {
        let mut aggregation = Aggregation::default();
        let label = format!(
            "{} -> {}",
            self.tokens.symbol(&pair.quote),
            self.tokens.symbol(&pair.base)
        );
        let mut page = 1;

        loop {
            tokio::time::sleep(self.settings.page_delay).await;

            let orders = match self
                .book
                .fetch_page(pair, page, self.settings.page_limit)
                .await
            {
                Ok(orders) => {
                    log::info!(
                        "orders::aggregator: Fetched page {page} for pair {label}, orders: {}",
                        orders.len()
                    );
                    orders
                }
                Err(e) => {
                    log::error!("orders::aggregator: Error fetching page {page} for pair {label}: {e:#}");
                    aggregation.failures.push(PageFailure {
                        pair,
                        page,
                        error: format!("{e:#}"),
                    });
                    Vec::new()
                }
            };

            // an empty page ends the pair even when the limit is zero
            let last_page = orders.is_empty() || orders.len() < self.settings.page_limit;
            aggregation.orders.extend(orders);
            if last_page {
                break;
            }
            page += 1;
        }

        log::info!(
            "orders::aggregator: Total orders fetched for {label}: {}",
            aggregation.orders.len()
        );
        aggregation
    }
}
