//! Odds polling.
//!
//! Re-fetches every outcome pool of the watched markets on a fixed interval
//! and recomputes odds from scratch each time. Pools of one market are
//! fetched concurrently; a pool that fails to fetch counts as empty for that
//! refresh.

use futures::future::join_all;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::PoolSource;
use crate::pricing::{OddsBook, OddsEngine};
use crate::types::{ValidationError, MAX_OUTCOMES, MIN_OUTCOMES};

/// Default refresh cadence.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// A market whose odds are kept fresh.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatchedMarket {
    pub id: String,
    #[serde(default = "default_outcome_count")]
    pub outcome_count: u8,
}

fn default_outcome_count() -> u8 {
    MIN_OUTCOMES
}

impl WatchedMarket {
    pub fn new(id: impl Into<String>, outcome_count: u8) -> Result<Self, ValidationError> {
        if !(MIN_OUTCOMES..=MAX_OUTCOMES).contains(&outcome_count) {
            return Err(ValidationError::InvalidOutcomeCount(outcome_count));
        }
        Ok(Self {
            id: id.into(),
            outcome_count,
        })
    }
}

/// Result of refreshing one market.
#[derive(Debug, Clone)]
pub struct MarketOdds {
    pub market_id: String,
    pub pools: Vec<u64>,
    pub book: Result<OddsBook, ValidationError>,
    /// Outcomes whose pool could not be fetched this round.
    pub failed_fetches: usize,
}

pub struct OddsPoller<S: PoolSource> {
    source: S,
    markets: Vec<WatchedMarket>,
    interval: Duration,
}

impl<S: PoolSource> OddsPoller<S> {
    pub fn new(source: S, markets: Vec<WatchedMarket>, interval: Duration) -> Self {
        Self {
            source,
            markets,
            interval,
        }
    }

    pub fn markets(&self) -> &[WatchedMarket] {
        &self.markets
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch every outcome pool of one market in parallel.
    pub async fn fetch_pools(&self, market: &WatchedMarket) -> (Vec<u64>, usize) {
        let fetches = (0..market.outcome_count)
            .map(|outcome| self.source.fetch_outcome_pool(&market.id, outcome));
        let results = join_all(fetches).await;

        let mut failed = 0;
        let pools = results
            .into_iter()
            .enumerate()
            .map(|(outcome, result)| match result {
                Ok(pool) => pool,
                Err(e) => {
                    warn!(
                        market_id = %market.id,
                        outcome,
                        error = %e,
                        "Pool fetch failed; treating as empty"
                    );
                    failed += 1;
                    0
                }
            })
            .collect();
        (pools, failed)
    }

    /// Recompute odds for every watched market once.
    pub async fn refresh_once(&self) -> Vec<MarketOdds> {
        let mut updates = Vec::with_capacity(self.markets.len());
        for market in &self.markets {
            let (pools, failed_fetches) = self.fetch_pools(market).await;
            let book = OddsEngine::quote(&pools);
            if let Err(ref e) = book {
                debug!(market_id = %market.id, error = %e, "Could not quote market");
            }
            updates.push(MarketOdds {
                market_id: market.id.clone(),
                pools,
                book,
                failed_fetches,
            });
        }
        updates
    }

    /// Refresh on every tick until `shutdown` resolves. Returns the number
    /// of completed refreshes.
    pub async fn run<F, Fut>(&self, mut on_update: F, shutdown: Fut) -> u64
    where
        F: FnMut(&[MarketOdds]),
        Fut: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.interval);
        tokio::pin!(shutdown);
        let mut cycles = 0u64;

        info!(
            markets = self.markets.len(),
            interval_secs = self.interval.as_secs(),
            "Odds polling started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let updates = self.refresh_once().await;
                    cycles += 1;
                    on_update(&updates);
                }
                _ = &mut shutdown => {
                    info!(cycles, "Odds polling stopped");
                    break;
                }
            }
        }
        cycles
    }
}
