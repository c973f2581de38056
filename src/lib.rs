//! zkPredict engine: client-side odds, payouts, parlays, and reputation
//! tiers for a private prediction market.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod pricing;
pub mod reputation;
pub mod engine;
pub mod storage;
