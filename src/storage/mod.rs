//! Persistence layer.
//!
//! The ledger is external; a JSON chain snapshot stands in for it. The
//! snapshot maps market ids to their outcome pools (microcredits) and
//! addresses to their reputation records. `SnapshotFile` re-reads the file
//! on every fetch, so a process that rewrites it is picked up on the next
//! poll.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::engine::{PoolSource, ReputationSource};
use crate::types::Reputation;

/// Public chain state the engine reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    #[serde(default)]
    pub markets: BTreeMap<String, Vec<u64>>,
    #[serde(default)]
    pub reputations: BTreeMap<String, Reputation>,
}

impl ChainSnapshot {
    pub fn outcome_pool(&self, market_id: &str, outcome: u8) -> Result<u64> {
        let pools = self
            .markets
            .get(market_id)
            .ok_or_else(|| anyhow!("Market {market_id} not in snapshot"))?;
        pools
            .get(usize::from(outcome))
            .copied()
            .ok_or_else(|| anyhow!("Outcome {outcome} not in market {market_id}"))
    }

    pub fn reputation(&self, owner: &str) -> Option<Reputation> {
        self.reputations.get(owner).cloned().map(|mut rep| {
            if rep.owner.is_empty() {
                rep.owner = owner.to_string();
            }
            rep
        })
    }
}

/// Save a snapshot to a JSON file.
pub fn save_snapshot(snapshot: &ChainSnapshot, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot).context("Failed to serialise snapshot")?;
    std::fs::write(path, &json)
        .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
    debug!(path = %path.display(), markets = snapshot.markets.len(), "Snapshot saved");
    Ok(())
}

/// Load a snapshot from a JSON file.
/// Returns None if the file doesn't exist.
pub fn load_snapshot(path: &Path) -> Result<Option<ChainSnapshot>> {
    if !path.exists() {
        info!(path = %path.display(), "No snapshot found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot from {}", path.display()))?;
    let snapshot: ChainSnapshot = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse snapshot from {}", path.display()))?;

    debug!(
        path = %path.display(),
        markets = snapshot.markets.len(),
        reputations = snapshot.reputations.len(),
        "Snapshot loaded"
    );
    Ok(Some(snapshot))
}

// ---------------------------------------------------------------------------
// File-backed collaborator
// ---------------------------------------------------------------------------

/// Snapshot file acting as the pool and reputation source.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<ChainSnapshot> {
        load_snapshot(&self.path)?
            .ok_or_else(|| anyhow!("Snapshot {} does not exist", self.path.display()))
    }
}

#[async_trait]
impl PoolSource for SnapshotFile {
    async fn fetch_outcome_pool(&self, market_id: &str, outcome: u8) -> Result<u64> {
        self.read()?.outcome_pool(market_id, outcome)
    }
}

#[async_trait]
impl ReputationSource for SnapshotFile {
    async fn fetch_reputation(&self, owner: &str) -> Result<Option<Reputation>> {
        Ok(self.read()?.reputation(owner))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
