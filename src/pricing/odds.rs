//! Parimutuel odds.
//!
//! Converts the per-outcome pool balances of a market into odds, implied
//! probabilities, and pool shares. Probability is taken to equal pool share.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::{round_odds, round_percent};
use crate::types::{Market, ValidationError, MAX_OUTCOMES};

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

/// Derived odds for one outcome. Recomputed on every pool change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsQuote {
    pub outcome_index: u8,
    /// Microcredits staked on this outcome.
    pub pool_size: u64,
    /// Share of the total pool, 0–100, 1 dp.
    pub pool_share: Decimal,
    /// Implied probability, 0–100, 1 dp.
    pub probability: Decimal,
    /// Decimal odds, 2 dp. `0` means nobody has bet on this outcome yet.
    pub odds: Decimal,
}

impl OddsQuote {
    /// False when the outcome has no stake yet, i.e. `odds == 0` is a
    /// missing price rather than a heavy favourite.
    pub fn has_liquidity(&self) -> bool {
        self.pool_size > 0
    }
}

impl fmt::Display for OddsQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_liquidity() {
            write!(
                f,
                "outcome {}: {}x ({}% of pool)",
                self.outcome_index, self.odds, self.pool_share
            )
        } else {
            write!(f, "outcome {}: no bets yet", self.outcome_index)
        }
    }
}

/// One full recomputation of a market's odds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsBook {
    /// Sum of all outcome pools (the market's total volume).
    pub total_pool: u64,
    pub quotes: Vec<OddsQuote>,
}

impl OddsBook {
    pub fn quote(&self, outcome: u8) -> Option<&OddsQuote> {
        self.quotes.get(outcome as usize)
    }

    /// The outcome holding the largest pool, if any outcome has stake.
    /// Ties resolve to the lowest index.
    pub fn favorite(&self) -> Option<&OddsQuote> {
        self.quotes
            .iter()
            .filter(|q| q.has_liquidity())
            .fold(None, |best: Option<&OddsQuote>, q| match best {
                Some(b) if b.pool_size >= q.pool_size => Some(b),
                _ => Some(q),
            })
    }

    /// Sum of the rounded pool shares. Equals 100 up to rounding when the
    /// market has any volume.
    pub fn share_total(&self) -> Decimal {
        self.quotes.iter().map(|q| q.pool_share).sum()
    }

    pub fn has_volume(&self) -> bool {
        self.total_pool > 0
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct OddsEngine;

impl OddsEngine {
    /// Quote every outcome of a pool array.
    ///
    /// For outcome `i` with `total = sum(pools)`:
    ///   pool_share = pools[i] / total × 100   (0 when total is 0)
    ///   odds       = total / pools[i]          (0 when pools[i] is 0)
    pub fn quote(pools: &[u64]) -> Result<OddsBook, ValidationError> {
        if pools.is_empty() {
            return Err(ValidationError::EmptyPools);
        }
        if pools.len() > MAX_OUTCOMES as usize {
            let count = u8::try_from(pools.len()).unwrap_or(u8::MAX);
            return Err(ValidationError::InvalidOutcomeCount(count));
        }

        let total_pool = pools
            .iter()
            .try_fold(0u64, |acc, &p| acc.checked_add(p))
            .ok_or(ValidationError::PoolOverflow)?;
        let total = Decimal::from(total_pool);

        let quotes = pools
            .iter()
            .enumerate()
            .map(|(index, &pool_size)| {
                let pool = Decimal::from(pool_size);
                let pool_share = if total_pool > 0 {
                    round_percent(pool * dec!(100) / total)
                } else {
                    Decimal::ZERO
                };
                // total >= pool, so the ratio is never below 1 once staked
                let odds = if pool_size > 0 {
                    round_odds(total / pool).max(Decimal::ONE)
                } else {
                    Decimal::ZERO
                };
                OddsQuote {
                    // bounded by MAX_OUTCOMES above
                    outcome_index: index as u8,
                    pool_size,
                    pool_share,
                    probability: pool_share,
                    odds,
                }
            })
            .collect();

        debug!(
            outcomes = pools.len(),
            total_pool,
            "Odds recomputed"
        );

        Ok(OddsBook { total_pool, quotes })
    }

    /// Quote a market, checking that one pool was supplied per outcome.
    pub fn quote_market(market: &Market, pools: &[u64]) -> Result<OddsBook, ValidationError> {
        if pools.len() != market.outcome_count as usize {
            return Err(ValidationError::PoolCountMismatch {
                market_id: market.id.clone(),
                expected: market.outcome_count,
                actual: pools.len(),
            });
        }
        Self::quote(pools)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
