//! Swap quotes against Uniswap V3.
//!
//! A quote routes the trade, asks the on-chain quoter what the route yields,
//! and encodes the router call that would execute it. Nothing is sent.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use derive_more::Display;
use futures::future::join_all;
use thiserror::Error;

use super::route::{Route, RouteBuilder};
use crate::models::Order;
use crate::uniswap::contracts::ISwapRouter;
use crate::utils::constants::DEADLINE_MINUTES;
use crate::utils::time::deadline;

/// Simulates swaps along a packed path without executing them
#[async_trait]
pub trait SwapQuoter: Send + Sync {
    /// Output of swapping exactly `amount_in` along `path`
    ///
    /// # Errors
    /// * If the simulation reverts or the call fails
    async fn quote_exact_input(&self, path: Bytes, amount_in: U256) -> eyre::Result<U256>;

    /// Input needed to receive exactly `amount_out` along `path`, which is
    /// packed output token first
    ///
    /// # Errors
    /// * If the simulation reverts or the call fails
    async fn quote_exact_output(&self, path: Bytes, amount_out: U256) -> eyre::Result<U256>;
}

/// Which side of the swap is fixed
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeKind {
    /// The send amount is fixed, the receive amount is quoted
    #[display("exact-input")]
    ExactInput,
    /// The receive amount is fixed, the send amount is quoted
    #[display("exact-output")]
    ExactOutput,
}

/// Everything needed to quote one swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    /// Who gets the swap output
    pub receiver: Address,
    /// Which side is fixed
    pub kind: TradeKind,
    /// Token paid in
    pub send_token: Address,
    /// Amount paid in; required for exact-input
    pub send_amount: Option<U256>,
    /// Slippage floor for exact-input; defaults to 1
    pub min_receive: Option<U256>,
    /// Optional intermediate token
    pub hop: Option<Address>,
    /// Token received
    pub receive_token: Address,
    /// Amount received; required for exact-output
    pub receive_amount: Option<U256>,
    /// Slippage ceiling for exact-output; defaults to the quoted input
    pub max_send: Option<U256>,
}

impl QuoteRequest {
    /// The trade that fills `order` from the other side: pay what the maker
    /// asks for and receive what the maker offers. The order's own amounts
    /// are the slippage bounds.
    #[must_use]
    pub fn counter_trade(
        order: &Order,
        receiver: Address,
        kind: TradeKind,
        hop: Option<Address>,
    ) -> Self {
        Self {
            receiver,
            kind,
            send_token: order.receive_asset,
            send_amount: Some(order.receive_amount),
            min_receive: Some(order.send_amount),
            hop,
            receive_token: order.send_asset,
            receive_amount: Some(order.send_amount),
            max_send: Some(order.receive_amount),
        }
    }
}

/// A simulated swap and the router call that would execute it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// Which side was fixed
    pub kind: TradeKind,
    /// Amount paid in
    pub amount_in: U256,
    /// Amount received
    pub amount_out: U256,
    /// Route swapped through, input first
    pub route: Route,
    /// Packed path as passed to the quoter and router
    pub path: Bytes,
    /// Router the calldata targets
    pub router: Address,
    /// Encoded `exactInput` / `exactOutput` call
    pub calldata: Bytes,
}

/// Why a swap could not be quoted
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Exact-input request without a send amount
    #[error("exact-input quote needs a send amount")]
    MissingSendAmount,
    /// Exact-output request without a receive amount
    #[error("exact-output quote needs a receive amount")]
    MissingReceiveAmount,
    /// A chain read or simulation failed
    #[error(transparent)]
    Chain(#[from] eyre::Report),
}

impl QuoteError {
    /// Whether the request itself was malformed, as opposed to a chain
    /// failure that may succeed on a later attempt
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::MissingSendAmount | Self::MissingReceiveAmount)
    }
}

/// An order together with the outcome of quoting its counter-trade
#[derive(Debug)]
pub struct QuotedOrder {
    /// The order
    pub order: Order,
    /// Its quote, or why there is none
    pub result: Result<Quote, QuoteError>,
}

/// Keeps the orders that were quoted successfully
#[must_use]
pub fn fulfilled(batch: Vec<QuotedOrder>) -> Vec<(Order, Quote)> {
    batch
        .into_iter()
        .filter_map(|quoted| quoted.result.ok().map(|quote| (quoted.order, quote)))
        .collect()
}

/// Routes, simulates and encodes swaps
#[derive(Clone)]
pub struct QuoteEngine {
    /// Fee tier selection and path building
    routes: RouteBuilder,
    /// Swap simulation
    quoter: Arc<dyn SwapQuoter>,
    /// Router the calldata targets
    router: Address,
}

impl QuoteEngine {
    /// Create a new quote engine
    #[must_use]
    pub fn new(routes: RouteBuilder, quoter: Arc<dyn SwapQuoter>, router: Address) -> Self {
        Self {
            routes,
            quoter,
            router,
        }
    }

    /// Quotes a single swap.
    ///
    /// The amount for the fixed side is checked before anything touches the
    /// chain. The router deadline is 30 minutes from now.
    ///
    /// # Errors
    /// * [`QuoteError::MissingSendAmount`] / [`QuoteError::MissingReceiveAmount`]
    ///   if the fixed side has no amount
    /// * [`QuoteError::Chain`] if routing or simulation fails
    pub async fn quote(&self, request: &QuoteRequest) -> Result<Quote, QuoteError> {
        match request.kind {
            TradeKind::ExactInput => self.quote_exact_input(request).await,
            TradeKind::ExactOutput => self.quote_exact_output(request).await,
        }
    }

    /// Quotes the counter-trade of every order concurrently.
    ///
    /// Every order comes back, in input order, with its own result; a failed
    /// quote does not affect the others.
    pub async fn quote_batch(
        &self,
        orders: &[Order],
        receiver: Address,
        kind: TradeKind,
        hop: Option<Address>,
    ) -> Vec<QuotedOrder> {
        join_all(orders.iter().map(|order| async move {
            let request = QuoteRequest::counter_trade(order, receiver, kind, hop);
            QuotedOrder {
                order: order.clone(),
                result: self.quote(&request).await,
            }
        }))
        .await
    }

    async fn quote_exact_input(&self, request: &QuoteRequest) -> Result<Quote, QuoteError> {
        let amount_in = request
            .send_amount
            .ok_or(QuoteError::MissingSendAmount)?;
        let route = self
            .routes
            .build(request.send_token, request.receive_token, request.hop)
            .await?;
        let path = route.encode();
        let amount_out = self
            .quoter
            .quote_exact_input(path.clone(), amount_in)
            .await?;

        let calldata = ISwapRouter::exactInputCall {
            params: ISwapRouter::ExactInputParams {
                path: path.clone(),
                recipient: request.receiver,
                deadline: deadline(DEADLINE_MINUTES),
                amountIn: amount_in,
                amountOutMinimum: request.min_receive.unwrap_or(U256::from(1)),
            },
        }
        .abi_encode();

        Ok(Quote {
            kind: TradeKind::ExactInput,
            amount_in,
            amount_out,
            route,
            path,
            router: self.router,
            calldata: calldata.into(),
        })
    }

    async fn quote_exact_output(&self, request: &QuoteRequest) -> Result<Quote, QuoteError> {
        let amount_out = request
            .receive_amount
            .ok_or(QuoteError::MissingReceiveAmount)?;
        let route = self
            .routes
            .build(request.send_token, request.receive_token, request.hop)
            .await?;
        let path = route.encode_reversed();
        let amount_in = self
            .quoter
            .quote_exact_output(path.clone(), amount_out)
            .await?;

        let calldata = ISwapRouter::exactOutputCall {
            params: ISwapRouter::ExactOutputParams {
                path: path.clone(),
                recipient: request.receiver,
                deadline: deadline(DEADLINE_MINUTES),
                amountOut: amount_out,
                amountInMaximum: request.max_send.unwrap_or(amount_in),
            },
        }
        .abi_encode();

        Ok(Quote {
            kind: TradeKind::ExactOutput,
            amount_in,
            amount_out,
            route,
            path,
            router: self.router,
            calldata: calldata.into(),
        })
    }
}
