use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use eyre::{eyre, Error, Result};

/// An ERC-20 token the scout watches.
///
/// The symbol is only used to make logs readable. Tokens are identified by
/// their address, which compares as raw bytes no matter how it was cased in
/// the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// Contract address
    pub address: Address,
    /// Display symbol, e.g. `WETH`
    pub symbol: String,
}

impl Token {
    /// Create a new token
    #[must_use]
    pub fn new(symbol: &str, address: Address) -> Self {
        Self {
            address,
            symbol: symbol.to_string(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// Parses `SYMBOL:0xaddress`
impl FromStr for Token {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let (symbol, address) = s
            .split_once(':')
            .ok_or_else(|| eyre!("token `{s}` must look like SYMBOL:0xaddress"))?;
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(eyre!("token `{s}` has an empty symbol"));
        }
        let address = Address::from_str(address.trim())
            .map_err(|e| eyre!("token `{s}` has an invalid address: {e}"))?;
        Ok(Self::new(symbol, address))
    }
}

/// The token universe, in the order it was configured.
///
/// The order matters: pair enumeration walks it, and so does the order in
/// which the order book gets queried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenList {
    /// Configured tokens
    tokens: Vec<Token>,
}

impl TokenList {
    /// Create a token list, dropping repeated addresses
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut unique: Vec<Token> = Vec::with_capacity(tokens.len());
        for token in tokens {
            if !unique.iter().any(|t| t.address == token.address) {
                unique.push(token);
            }
        }
        Self { tokens: unique }
    }

    /// Token addresses in configured order
    #[must_use]
    pub fn addresses(&self) -> Vec<Address> {
        self.tokens.iter().map(|t| t.address).collect()
    }

    /// Finds a token by symbol (case-insensitive) or by address
    #[must_use]
    pub fn resolve(&self, needle: &str) -> Option<&Token> {
        let needle = needle.trim();
        if let Ok(address) = Address::from_str(needle) {
            return self.tokens.iter().find(|t| t.address == address);
        }
        self.tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(needle))
    }

    /// Symbol for logging; unknown addresses print as their checksummed hex
    #[must_use]
    pub fn symbol(&self, address: &Address) -> String {
        self.tokens
            .iter()
            .find(|t| &t.address == address)
            .map_or_else(|| address.to_string(), |t| t.symbol.clone())
    }

    /// Number of tokens
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl FromStr for TokenList {
    type Err = Error;

    /// Parses a comma separated list of `SYMBOL:0xaddress` entries
    fn from_str(s: &str) -> Result<Self, Error> {
        let tokens = s
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(Token::from_str)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(tokens))
    }
}
