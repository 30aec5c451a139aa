/*!
 * # Limit Scout - Limit Order Arbitrage Discovery
 *
 * Limit Scout cross-references the 1inch limit-order book against Uniswap V3
 * liquidity on Ethereum, looking for orders whose terms the on-chain market
 * beats.
 *
 * ## Core Features
 *
 * - **Order Aggregation**: Paginated, rate-limited collection of open orders
 *   across every pair of a token universe
 * - **Volume Ranking**: Orders sorted by USD value using cached spot prices
 * - **Routing**: Fee tier selection by pool liquidity, single and two-hop paths
 * - **Quoting**: Exact-input and exact-output simulation with router calldata
 * - **Opportunity Detection**: Orders the market beats, reported to Slack
 *
 * ## Module Structure
 *
 * - `arb`: Routing, quoting and the order vs. market comparison
 * - `bot`: The scan pipeline
 * - `config`: Configuration from the environment
 * - `flash_loan`: Flash-loan liquidity lookups
 * - `models`: Data models for the application
 * - `notify`: Slack reporting
 * - `orders`: Order-book aggregation and ranking
 * - `prices`: Cached USD prices
 * - `uniswap`: Uniswap V3 contract bindings and RPC adapter
 * - `utils`: Utility functions and helpers
 */

/// Routing, quoting and opportunity detection
pub mod arb;
/// The scan pipeline
pub mod bot;
/// Configuration management for the system
pub mod config;
/// Flash-loan liquidity
pub mod flash_loan;
/// Data models for the application
pub mod models;
/// Reporting
pub mod notify;
/// Order-book aggregation and ranking
pub mod orders;
/// USD prices
pub mod prices;
/// Uniswap V3 chain access
pub mod uniswap;
/// Utility functions and helpers
pub mod utils;
