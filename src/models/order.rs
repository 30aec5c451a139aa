use alloy::primitives::{Address, Bytes, B256, U256};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// A limit order as the order-book API returns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    /// EIP-712 hash of the order
    pub order_hash: B256,
    /// Maker signature over the order
    pub signature: Bytes,
    /// Maker amount still fillable, decimal string
    #[serde(default)]
    pub remaining_maker_amount: Option<String>,
    /// The signed order itself
    pub data: RawOrderData,
    /// When the order was posted
    #[serde(default)]
    pub create_date_time: Option<String>,
    /// Maker balance of the maker asset at indexing time
    #[serde(default)]
    pub maker_balance: Option<String>,
    /// Maker allowance of the maker asset at indexing time
    #[serde(default)]
    pub maker_allowance: Option<String>,
    /// Whether the maker is a smart contract
    #[serde(default)]
    pub is_maker_contract: Option<bool>,
    /// Why the API considers the order invalid, if it does
    #[serde(default)]
    pub order_invalid_reason: Option<String>,
}

/// Signed fields of a limit order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrderData {
    /// Asset the maker gives
    pub maker_asset: Address,
    /// Asset the maker wants
    pub taker_asset: Address,
    /// Order salt
    pub salt: String,
    /// Who receives the taker asset
    pub receiver: Address,
    /// Amount of maker asset offered, decimal string
    pub making_amount: String,
    /// Amount of taker asset demanded, decimal string
    pub taking_amount: String,
    /// Order maker
    pub maker: Address,
    /// Encoded maker trait flags
    pub maker_traits: String,
    /// Order extension blob
    #[serde(default)]
    pub extension: String,
}

/// A normalized order, ready to be quoted.
///
/// `send_*` is what the maker offers, `receive_*` what the maker asks for in
/// return. `volume` is the USD ranking score, it is not part of the signed
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Order hash
    pub hash: B256,
    /// Order salt
    pub salt: String,
    /// Maker signature
    pub signature: Bytes,
    /// Order maker
    pub sender: Address,
    /// Asset the maker gives
    pub send_asset: Address,
    /// Amount the maker gives
    pub send_amount: U256,
    /// Who receives the taker asset
    pub receiver: Address,
    /// Asset the maker wants
    pub receive_asset: Address,
    /// Amount the maker wants
    pub receive_amount: U256,
    /// Encoded maker trait flags
    pub maker_traits: String,
    /// USD ranking score
    pub volume: BigDecimal,
}
