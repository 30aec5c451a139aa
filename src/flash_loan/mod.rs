//! # Flash Loan Module
//!
//! Sizing flash loans: how much of a token the lending venues can provide.

/// Balancer V2 liquidity
pub mod balancer;

pub use balancer::BalancerLiquidity;
