//! Comparing an order against the market price of its counter-trade.

use alloy::primitives::{Address, U256};

use super::quote::{Quote, TradeKind};
use crate::models::Order;

/// An order that can be filled at a profit by trading its counter-side on
/// Uniswap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opportunity {
    /// The order
    pub order: Order,
    /// Quote for the counter-trade
    pub quote: Quote,
    /// Break-even amount
    pub required: U256,
    /// What the quote beats the break-even amount by
    pub profit: U256,
    /// Token `profit` is denominated in
    pub profit_token: Address,
}

/// Outcome of comparing an order with its counter-trade quote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// The market does not beat the order
    Unprofitable {
        /// Break-even amount
        required: U256,
        /// What the market offers
        achieved: U256,
    },
    /// The market beats the order
    Profitable(Opportunity),
}

impl Comparison {
    /// The opportunity, if there is one
    #[must_use]
    pub fn opportunity(self) -> Option<Opportunity> {
        match self {
            Self::Profitable(opportunity) => Some(opportunity),
            Self::Unprofitable { .. } => None,
        }
    }
}

/// Compares `order` with the quote for its counter-trade.
///
/// For an exact-input quote the counter-trade spends what the maker asks
/// for, and is profitable when it yields strictly more of the maker's asset
/// than the maker offers. For an exact-output quote the counter-trade buys
/// exactly what the maker offers, and is profitable when that costs strictly
/// less than the maker asks for.
#[must_use]
pub fn compare(order: &Order, quote: &Quote) -> Comparison {
    let (required, achieved, profit_token) = match quote.kind {
        TradeKind::ExactInput => (order.send_amount, quote.amount_out, order.send_asset),
        TradeKind::ExactOutput => (order.receive_amount, quote.amount_in, order.receive_asset),
    };
    let profit = match quote.kind {
        TradeKind::ExactInput => achieved.checked_sub(required),
        TradeKind::ExactOutput => required.checked_sub(achieved),
    };

    match profit {
        Some(profit) if !profit.is_zero() => Comparison::Profitable(Opportunity {
            order: order.clone(),
            quote: quote.clone(),
            required,
            profit,
            profit_token,
        }),
        _ => Comparison::Unprofitable { required, achieved },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::fee_tier::FeeTier;
    use crate::arb::route::Route;
    use crate::arb::test_helpers::order;
    use alloy::primitives::Bytes;

    fn quote(kind: TradeKind, amount_in: u64, amount_out: u64) -> Quote {
        let route = Route::direct(Address::repeat_byte(2), FeeTier::Low, Address::repeat_byte(1));
        Quote {
            kind,
            amount_in: U256::from(amount_in),
            amount_out: U256::from(amount_out),
            path: route.encode(),
            route,
            router: Address::ZERO,
            calldata: Bytes::new(),
        }
    }

    fn order_of(send: u64, receive: u64) -> Order {
        order(7, Address::repeat_byte(1), send, Address::repeat_byte(2), receive)
    }

    #[test]
    fn test_market_below_order_is_unprofitable() {
        let order = order_of(1_000, 500);
        let comparison = compare(&order, &quote(TradeKind::ExactInput, 500, 900));
        assert_eq!(
            comparison,
            Comparison::Unprofitable {
                required: U256::from(1_000),
                achieved: U256::from(900),
            }
        );
        assert!(comparison.opportunity().is_none());
    }

    #[test]
    fn test_market_above_order_is_profitable() {
        let order = order_of(1_000, 500);
        let opportunity = compare(&order, &quote(TradeKind::ExactInput, 500, 1_200))
            .opportunity()
            .unwrap();
        assert_eq!(opportunity.required, U256::from(1_000));
        assert_eq!(opportunity.profit, U256::from(200));
        assert_eq!(opportunity.profit_token, Address::repeat_byte(1));
        assert_eq!(opportunity.order, order);
    }

    #[test]
    fn test_break_even_is_not_an_opportunity() {
        let order = order_of(1_000, 500);
        assert!(compare(&order, &quote(TradeKind::ExactInput, 500, 1_000))
            .opportunity()
            .is_none());
    }

    #[test]
    fn test_exact_output_compares_cost() {
        let order = order_of(1_000, 500);

        let cheap = compare(&order, &quote(TradeKind::ExactOutput, 420, 1_000))
            .opportunity()
            .unwrap();
        assert_eq!(cheap.required, U256::from(500));
        assert_eq!(cheap.profit, U256::from(80));
        assert_eq!(cheap.profit_token, Address::repeat_byte(2));

        assert!(compare(&order, &quote(TradeKind::ExactOutput, 600, 1_000))
            .opportunity()
            .is_none());
    }
}
