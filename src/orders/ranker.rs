use std::str::FromStr;

use alloy::primitives::U256;
use bigdecimal::BigDecimal;
use eyre::{eyre, Result};

use crate::models::{Order, PriceQuote, RawOrder};

/// USD volume of an order: the maker amount still open, priced in the
/// maker's asset.
///
/// Both factors refer to the same asset, so the score is the USD value the
/// maker still offers (in raw token units). `remainingMakerAmount` is used
/// when the API provides a usable one, `makingAmount` otherwise. An unpriced
/// asset scores zero.
#[must_use]
pub fn volume(raw: &RawOrder, prices: &PriceQuote) -> BigDecimal {
    let amount = raw
        .remaining_maker_amount
        .as_deref()
        .and_then(|remaining| BigDecimal::from_str(remaining).ok())
        .or_else(|| BigDecimal::from_str(&raw.data.making_amount).ok())
        .unwrap_or_else(|| BigDecimal::from(0));
    amount * prices.price(&raw.data.maker_asset)
}

/// Converts an order-book record into an [`Order`].
///
/// # Errors
/// * If the making or taking amount is not a decimal integer
pub fn normalize(raw: &RawOrder, prices: &PriceQuote) -> Result<Order> {
    Ok(Order {
        hash: raw.order_hash,
        salt: raw.data.salt.clone(),
        signature: raw.signature.clone(),
        sender: raw.data.maker,
        send_asset: raw.data.maker_asset,
        send_amount: parse_amount(&raw.data.making_amount)
            .map_err(|e| eyre!("order {}: makingAmount: {e}", raw.order_hash))?,
        receiver: raw.data.receiver,
        receive_asset: raw.data.taker_asset,
        receive_amount: parse_amount(&raw.data.taking_amount)
            .map_err(|e| eyre!("order {}: takingAmount: {e}", raw.order_hash))?,
        maker_traits: raw.data.maker_traits.clone(),
        volume: volume(raw, prices),
    })
}

/// Normalizes `raw` orders and sorts them by USD volume, largest first.
///
/// Orders with equal volume keep their input order. Records that cannot be
/// normalized are logged and left out.
#[must_use]
pub fn rank(raw: &[RawOrder], prices: &PriceQuote) -> Vec<Order> {
    let mut orders: Vec<Order> = raw
        .iter()
        .filter_map(|raw| match normalize(raw, prices) {
            Ok(order) => Some(order),
            Err(e) => {
                log::warn!("orders::ranker: Skipping malformed order: {e}");
                None
            }
        })
        .collect();

    orders.sort_by(|a, b| b.volume.cmp(&a.volume));
    orders
}

/// Parses a base-10 token amount
fn parse_amount(amount: &str) -> Result<U256> {
    U256::from_str_radix(amount.trim(), 10).map_err(|e| eyre!("`{amount}` is not an amount: {e}"))
}
