#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use eyre::{eyre, Result};

use super::fee_tier::{FeeTier, LiquiditySource};
use super::quote::SwapQuoter;
use super::route::Route;
use crate::models::{Order, PriceQuote, RawOrder, RawOrderData};
use crate::orders::{OrderBook, Pair};
use crate::prices::{PriceFeed, TokenSet};

fn hash(id: u8) -> B256 {
    B256::with_last_byte(id)
}

pub fn raw_order(
    id: u8,
    maker_asset: Address,
    taker_asset: Address,
    making: &str,
    taking: &str,
) -> RawOrder {
    RawOrder {
        order_hash: hash(id),
        signature: Bytes::from(vec![id; 65]),
        remaining_maker_amount: None,
        data: RawOrderData {
            maker_asset,
            taker_asset,
            salt: id.to_string(),
            receiver: Address::ZERO,
            making_amount: making.to_string(),
            taking_amount: taking.to_string(),
            maker: Address::repeat_byte(0x4d),
            maker_traits: "0".to_string(),
            extension: "0x".to_string(),
        },
        create_date_time: None,
        maker_balance: None,
        maker_allowance: None,
        is_maker_contract: None,
        order_invalid_reason: None,
    }
}

/// The order as the order-book API serializes it
pub fn raw_order_json(
    id: u8,
    maker_asset: Address,
    taker_asset: Address,
    making: &str,
    taking: &str,
) -> serde_json::Value {
    serde_json::json!({
        "signature": Bytes::from(vec![id; 65]).to_string(),
        "orderHash": hash(id).to_string(),
        "createDateTime": "2024-05-01T12:00:00.000Z",
        "remainingMakerAmount": making,
        "makerBalance": "0",
        "makerAllowance": "0",
        "data": {
            "makerAsset": maker_asset.to_string(),
            "takerAsset": taker_asset.to_string(),
            "salt": id.to_string(),
            "receiver": Address::ZERO.to_string(),
            "makingAmount": making,
            "takingAmount": taking,
            "maker": Address::repeat_byte(0x4d).to_string(),
            "extension": "0x",
            "makerTraits": "0"
        },
        "isMakerContract": false,
        "orderInvalidReason": null
    })
}

pub fn order(
    id: u8,
    send_asset: Address,
    send_amount: u64,
    receive_asset: Address,
    receive_amount: u64,
) -> Order {
    Order {
        hash: hash(id),
        salt: id.to_string(),
        signature: Bytes::from(vec![id; 65]),
        sender: Address::repeat_byte(0x4d),
        send_asset,
        send_amount: U256::from(send_amount),
        receiver: Address::ZERO,
        receive_asset,
        receive_amount: U256::from(receive_amount),
        maker_traits: "0".to_string(),
        volume: BigDecimal::from(0),
    }
}

pub fn prices(entries: &[(Address, &str)]) -> PriceQuote {
    PriceQuote::new(
        entries
            .iter()
            .map(|(token, price)| (*token, BigDecimal::from_str(price).unwrap()))
            .collect(),
    )
}

/// Order book serving canned pages. Unknown pages are empty.
#[derive(Default)]
pub struct FakeOrderBook {
    pages: HashMap<(Pair, u32), Vec<RawOrder>>,
    failures: HashMap<(Pair, u32), String>,
    requests: Mutex<Vec<(Pair, u32)>>,
}

impl FakeOrderBook {
    pub fn with_page(mut self, pair: Pair, page: u32, orders: Vec<RawOrder>) -> Self {
        self.pages.insert((pair, page), orders);
        self
    }

    pub fn with_failure(mut self, pair: Pair, page: u32, message: &str) -> Self {
        self.failures.insert((pair, page), message.to_string());
        self
    }

    /// Every page requested so far, in request order
    pub fn requests(&self) -> Vec<(Pair, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderBook for FakeOrderBook {
    async fn fetch_page(&self, pair: Pair, page: u32, _limit: usize) -> Result<Vec<RawOrder>> {
        self.requests.lock().unwrap().push((pair, page));
        if let Some(message) = self.failures.get(&(pair, page)) {
            return Err(eyre!("{message}"));
        }
        Ok(self.pages.get(&(pair, page)).cloned().unwrap_or_default())
    }
}

pub struct FakePriceFeed {
    prices: Option<PriceQuote>,
    calls: AtomicUsize,
}

impl FakePriceFeed {
    pub fn new(entries: &[(Address, &str)]) -> Self {
        Self {
            prices: Some(prices(entries)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            prices: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceFeed for FakePriceFeed {
    async fn fetch(&self, _tokens: &TokenSet) -> Result<PriceQuote> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prices
            .clone()
            .ok_or_else(|| eyre!("price service unavailable"))
    }
}

/// Uniswap stand-in: pools with fixed liquidity and swaps at a fixed integer
/// rate per directed token pair. A swap over a pair without a rate reverts.
#[derive(Default)]
pub struct FakeChain {
    pools: HashMap<(Address, Address, FeeTier), Address>,
    liquidity: HashMap<Address, u128>,
    broken: HashSet<(Address, Address, FeeTier)>,
    rates: HashMap<(Address, Address), u64>,
}

fn pool_key(a: Address, b: Address, fee: FeeTier) -> (Address, Address, FeeTier) {
    if a < b {
        (a, b, fee)
    } else {
        (b, a, fee)
    }
}

impl FakeChain {
    pub fn with_pool(mut self, a: Address, b: Address, fee: FeeTier, liquidity: u128) -> Self {
        let pool = Address::with_last_byte(u8::try_from(self.pools.len() + 1).unwrap());
        self.pools.insert(pool_key(a, b, fee), pool);
        self.liquidity.insert(pool, liquidity);
        self
    }

    pub fn with_broken_pool(mut self, a: Address, b: Address, fee: FeeTier) -> Self {
        self.broken.insert(pool_key(a, b, fee));
        self
    }

    /// One `from` buys `rate` of `to`
    pub fn with_rate(mut self, from: Address, to: Address, rate: u64) -> Self {
        self.rates.insert((from, to), rate);
        self
    }

    fn rate(&self, route: &Route) -> Result<U256> {
        route
            .tokens()
            .windows(2)
            .try_fold(U256::from(1), |acc, leg| {
                self.rates
                    .get(&(leg[0], leg[1]))
                    .map(|rate| acc * U256::from(*rate))
                    .ok_or_else(|| eyre!("execution reverted: no liquidity {} -> {}", leg[0], leg[1]))
            })
    }
}

#[async_trait]
impl LiquiditySource for FakeChain {
    async fn pool(&self, token_a: Address, token_b: Address, fee: FeeTier) -> Result<Address> {
        let key = pool_key(token_a, token_b, fee);
        if self.broken.contains(&key) {
            return Err(eyre!("getPool call failed"));
        }
        Ok(self.pools.get(&key).copied().unwrap_or(Address::ZERO))
    }

    async fn liquidity(&self, pool: Address) -> Result<u128> {
        self.liquidity
            .get(&pool)
            .copied()
            .ok_or_else(|| eyre!("no pool at {pool}"))
    }
}

#[async_trait]
impl SwapQuoter for FakeChain {
    async fn quote_exact_input(&self, path: Bytes, amount_in: U256) -> Result<U256> {
        let route = Route::decode(&path)?;
        Ok(amount_in * self.rate(&route)?)
    }

    async fn quote_exact_output(&self, path: Bytes, amount_out: U256) -> Result<U256> {
        // exact-output paths are packed output first
        let reversed = Route::decode(&path)?;
        let route = Route::decode(&reversed.encode_reversed())?;
        Ok(amount_out / self.rate(&route)?)
    }
}
