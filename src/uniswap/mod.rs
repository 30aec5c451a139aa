//! # Uniswap Module
//!
//! Chain access for Uniswap V3: contract bindings and the adapter that backs
//! route building and quoting with real RPC calls.

/// Uniswap V3 RPC adapter
pub mod client;
/// Contract bindings
pub mod contracts;

pub use client::UniswapV3;
