//! Mock ledger for integration testing.
//!
//! Provides deterministic `PoolSource`, `ReputationSource`, and
//! `TransactionSubmitter` implementations backed by in-memory state that
//! test code controls directly.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use zkpredict_engine::engine::{
    PoolSource, ReputationSource, TransactionRequest, TransactionSubmitter, TxStatus,
};
use zkpredict_engine::types::Reputation;

#[derive(Clone, Default)]
pub struct MockLedger {
    pools: Arc<Mutex<HashMap<String, Vec<u64>>>>,
    reputations: Arc<Mutex<HashMap<String, Reputation>>>,
    statuses: Arc<Mutex<HashMap<String, TxStatus>>>,
    submitted: Arc<Mutex<Vec<TransactionRequest>>>,
    /// Outcomes whose pool lookups fail.
    broken_outcomes: Arc<Mutex<Vec<(String, u8)>>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pools(&self, market_id: &str, pools: Vec<u64>) {
        self.pools.lock().unwrap().insert(market_id.to_string(), pools);
    }

    /// Add stake to one outcome, as a confirmed bet would.
    pub fn add_stake(&self, market_id: &str, outcome: u8, amount: u64) {
        let mut pools = self.pools.lock().unwrap();
        let market = pools.get_mut(market_id).expect("unknown market");
        market[usize::from(outcome)] += amount;
    }

    pub fn set_reputation(&self, reputation: Reputation) {
        self.reputations
            .lock()
            .unwrap()
            .insert(reputation.owner.clone(), reputation);
    }

    pub fn break_outcome(&self, market_id: &str, outcome: u8) {
        self.broken_outcomes
            .lock()
            .unwrap()
            .push((market_id.to_string(), outcome));
    }

    /// Set what the ledger reports for a transaction.
    pub fn settle(&self, tx_id: &str, status: TxStatus) {
        self.statuses.lock().unwrap().insert(tx_id.to_string(), status);
    }

    pub fn submitted(&self) -> Vec<TransactionRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl PoolSource for MockLedger {
    async fn fetch_outcome_pool(&self, market_id: &str, outcome: u8) -> Result<u64> {
        let broken = self
            .broken_outcomes
            .lock()
            .unwrap()
            .iter()
            .any(|(m, o)| m == market_id && *o == outcome);
        if broken {
            return Err(anyhow!("RPC error for {market_id}#{outcome}"));
        }
        self.pools
            .lock()
            .unwrap()
            .get(market_id)
            .and_then(|p| p.get(usize::from(outcome)).copied())
            .ok_or_else(|| anyhow!("no pool for {market_id}#{outcome}"))
    }
}

#[async_trait]
impl ReputationSource for MockLedger {
    async fn fetch_reputation(&self, owner: &str) -> Result<Option<Reputation>> {
        Ok(self.reputations.lock().unwrap().get(owner).cloned())
    }
}

#[async_trait]
impl TransactionSubmitter for MockLedger {
    async fn submit(&self, request: &TransactionRequest) -> Result<String> {
        let tx_id = format!("at1{}", Uuid::new_v4().simple());
        self.submitted.lock().unwrap().push(request.clone());
        self.statuses
            .lock()
            .unwrap()
            .insert(tx_id.clone(), TxStatus::NotFound);
        Ok(tx_id)
    }

    async fn status(&self, tx_id: &str) -> Result<TxStatus> {
        self.statuses
            .lock()
            .unwrap()
            .get(tx_id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown transaction {tx_id}"))
    }
}
