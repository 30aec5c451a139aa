/// Order-book records and normalized orders
pub mod order;
/// USD price snapshots
pub mod price;
/// Tokens and the configured token universe
pub mod token;

pub use order::{Order, RawOrder, RawOrderData};
pub use price::PriceQuote;
pub use token::{Token, TokenList};
