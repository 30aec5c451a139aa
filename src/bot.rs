//! The scan pipeline: pairs, orders, prices, ranking, then a quote and a
//! comparison for every ranked order.

use std::sync::Arc;

use alloy::primitives::Address;
use eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::arb::{
    compare, Comparison, LiquiditySource, Opportunity, Quote, QuoteEngine, QuoteRequest,
    RouteBuilder, SwapQuoter, TradeKind,
};
use crate::models::{Order, TokenList};
use crate::notify::SlackNotifier;
use crate::orders::{enumerate, rank, Aggregator};
use crate::prices::PriceOracle;
use crate::utils::app_context::AppContext;
use crate::utils::constants::UNISWAP_V3_ROUTER;

/// What to scan and where quoted swaps would go
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Token universe
    pub tokens: TokenList,
    /// Only pairs selling this token, when set
    pub anchor: Option<Address>,
    /// Recipient of the quoted swaps
    pub receiver: Address,
    /// Intermediate token for two-hop routes
    pub hop: Option<Address>,
}

/// Outcome of one scan
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Ranked orders considered
    pub scanned: usize,
    /// Orders whose counter-trade got a quote
    pub quoted: usize,
    /// Orders skipped because quoting failed on chain
    pub skipped: usize,
    /// Orders the market beats, in ranking order
    pub opportunities: Vec<Opportunity>,
}

/// Limit order scanner
pub struct Bot {
    /// Order-book pagination
    aggregator: Aggregator,
    /// Cached USD prices
    prices: PriceOracle,
    /// Routing and quoting
    quotes: QuoteEngine,
    /// Scan scope
    settings: BotSettings,
    /// Where opportunities are reported
    reporter: Option<SlackNotifier>,
}

impl Bot {
    /// Wires the bot against Uniswap V3 and the 1inch APIs
    #[must_use]
    pub fn new(ctx: AppContext) -> Self {
        let quotes = quote_engine(ctx.uniswap, UNISWAP_V3_ROUTER);
        let settings = BotSettings {
            tokens: ctx.config.tokens.clone(),
            anchor: ctx.config.anchor,
            receiver: ctx.config.receiver,
            hop: ctx.config.hop,
        };
        Self::from_parts(ctx.aggregator, ctx.prices, quotes, settings, ctx.slack)
    }

    /// Builds a bot from its components
    #[must_use]
    pub fn from_parts(
        aggregator: Aggregator,
        prices: PriceOracle,
        quotes: QuoteEngine,
        settings: BotSettings,
        reporter: Option<SlackNotifier>,
    ) -> Self {
        Self {
            aggregator,
            prices,
            quotes,
            settings,
            reporter,
        }
    }

    /// Open orders across the token universe, highest USD volume first
    pub async fn ranked_orders(&self) -> Vec<Order> {
        let pairs = enumerate(&self.settings.tokens.addresses(), self.settings.anchor);
        log::info!("bot::ranked_orders: Scanning {} pairs", pairs.len());

        let aggregation = self.aggregator.collect(&pairs).await;
        if !aggregation.failures.is_empty() {
            log::warn!(
                "bot::ranked_orders: {} pages failed and were skipped",
                aggregation.failures.len()
            );
        }

        let prices = self.prices.get_prices(&self.settings.tokens.addresses()).await;
        let ranked = rank(&aggregation.orders, &prices);
        log::info!(
            "bot::ranked_orders: Ranked {} of {} orders",
            ranked.len(),
            aggregation.orders.len()
        );
        ranked
    }

    /// Quotes every ranked order one at a time.
    ///
    /// An order whose quote fails on chain is logged and skipped.
    ///
    /// # Errors
    /// * If a quote request is malformed; this is a bug, not a market
    ///   condition, so the scan stops
    pub async fn scan(&self) -> Result<ScanReport> {
        let orders = self.ranked_orders().await;
        let mut report = ScanReport {
            scanned: orders.len(),
            ..ScanReport::default()
        };

        let progress = ProgressBar::new(orders.len() as u64);
        progress.set_style(ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}",
        )?);

        for order in &orders {
            let request = QuoteRequest::counter_trade(
                order,
                self.settings.receiver,
                TradeKind::ExactInput,
                self.settings.hop,
            );
            match self.quotes.quote(&request).await {
                Ok(quote) => self.record(order, &quote, &mut report).await,
                Err(e) if e.is_precondition() => {
                    progress.abandon();
                    return Err(e.into());
                }
                Err(e) => {
                    log::warn!("bot::scan: Skipping order {}: {e}", order.hash);
                    report.skipped += 1;
                }
            }
            progress.inc(1);
        }

        progress.finish_with_message(format!("{} opportunities", report.opportunities.len()));
        Ok(report)
    }

    /// Quotes every ranked order concurrently, then compares them in ranking
    /// order.
    ///
    /// # Errors
    /// * If any quote request is malformed
    pub async fn scan_batch(&self) -> Result<ScanReport> {
        let orders = self.ranked_orders().await;
        let batch = self
            .quotes
            .quote_batch(
                &orders,
                self.settings.receiver,
                TradeKind::ExactInput,
                self.settings.hop,
            )
            .await;

        let mut report = ScanReport {
            scanned: orders.len(),
            ..ScanReport::default()
        };
        for quoted in batch {
            match quoted.result {
                Ok(quote) => self.record(&quoted.order, &quote, &mut report).await,
                Err(e) if e.is_precondition() => return Err(e.into()),
                Err(e) => {
                    log::warn!("bot::scan_batch: Skipping order {}: {e}", quoted.order.hash);
                    report.skipped += 1;
                }
            }
        }
        Ok(report)
    }

    /// Sends a failed scan to the error channel, if reporting is on
    pub async fn report_error(&self, error: &eyre::Report) {
        if let Some(reporter) = &self.reporter {
            if let Err(e) = reporter.send_error(&format!("{error:#}")).await {
                log::error!("bot::report_error: Error reporting failure: {e}");
            }
        }
    }

    /// Counts a quoted order and keeps it if the market beats it
    async fn record(&self, order: &Order, quote: &Quote, report: &mut ScanReport) {
        report.quoted += 1;
        let tokens = &self.settings.tokens;
        match compare(order, quote) {
            Comparison::Unprofitable { required, achieved } => {
                log::debug!(
                    "bot::record: No opportunity for {}: market {achieved} vs order {required} {}",
                    order.hash,
                    tokens.symbol(&order.send_asset)
                );
            }
            Comparison::Profitable(opportunity) => {
                log::info!(
                    "bot::record: Opportunity on {}: +{} {} via {}",
                    order.hash,
                    opportunity.profit,
                    tokens.symbol(&opportunity.profit_token),
                    quote.route
                );
                if let Some(reporter) = &self.reporter {
                    if let Err(e) = reporter.report(&opportunity, tokens).await {
                        log::error!("bot::record: Error reporting opportunity: {e}");
                    }
                }
                report.opportunities.push(opportunity);
            }
        }
    }
}

/// Shares one chain adapter between routing and quoting
#[must_use]
pub fn quote_engine<C>(chain: Arc<C>, router: Address) -> QuoteEngine
where
    C: LiquiditySource + SwapQuoter + 'static,
{
    QuoteEngine::new(RouteBuilder::new(chain.clone()), chain, router)
}
