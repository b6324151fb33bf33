//! Mint-to-burn compensation bot.
//!
//! Watches a token contract for `Mint` events and, after a fixed delay,
//! sends a `burn` for the same receiver and amount.

pub mod config;
pub mod onchain;
pub mod reaction;
