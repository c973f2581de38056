//! Integration tests for the zkPredict engine.
//!
//! Exercises the public API end to end against an in-memory ledger.

mod mock_ledger;
mod scenarios;
