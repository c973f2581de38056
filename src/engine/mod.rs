//! Collaborator seams around the pure pricing core.
//!
//! The ledger, its RPC endpoints, and the wallet are external. This module
//! defines the traits they are reached through, the transaction requests the
//! client may build, a poller that keeps odds fresh, and a tracker that keeps
//! every submitted transaction pending until the ledger says otherwise.

pub mod poller;
pub mod submissions;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pricing::ParlaySlip;
use crate::types::{Market, ParlayLeg, Reputation, ValidationError};

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Source of public outcome-pool balances.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PoolSource: Send + Sync {
    /// Microcredits staked on one outcome of a market.
    async fn fetch_outcome_pool(&self, market_id: &str, outcome: u8) -> Result<u64>;
}

/// Source of a user's reputation record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReputationSource: Send + Sync {
    /// `None` when the user has not initialised a record yet.
    async fn fetch_reputation(&self, owner: &str) -> Result<Option<Reputation>>;
}

/// Ledger status of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed(String),
    /// Not visible yet; treated the same as pending.
    NotFound,
}

/// Wallet/ledger endpoint that signs, broadcasts, and reports transactions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Submit a request, returning the transaction id on acceptance.
    async fn submit(&self, request: &TransactionRequest) -> Result<String>;

    /// Current status of a previously returned transaction id.
    async fn status(&self, tx_id: &str) -> Result<TxStatus>;
}

// ---------------------------------------------------------------------------
// Transaction requests
// ---------------------------------------------------------------------------

/// A ledger call the client wants to make. Constructors validate their
/// inputs, so an invalid bet or parlay never becomes a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransactionRequest {
    PlaceBet {
        market_id: String,
        outcome: u8,
        /// Microcredits.
        amount: u64,
    },
    PlaceParlay {
        legs: Vec<ParlayLeg>,
        amount: u64,
    },
    /// Claim the winnings of a settled bet or parlay record.
    Claim { record_id: String },
}

impl TransactionRequest {
    pub fn place_bet(
        market: &Market,
        outcome: u8,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if market.resolved {
            return Err(ValidationError::MarketResolved(market.id.clone()));
        }
        if !market.is_open(now) {
            return Err(ValidationError::MarketClosed(market.id.clone()));
        }
        market.check_outcome(outcome)?;
        check_amount(amount)?;
        Ok(Self::PlaceBet {
            market_id: market.id.clone(),
            outcome,
            amount,
        })
    }

    pub fn place_parlay(slip: &ParlaySlip, amount: u64) -> Result<Self, ValidationError> {
        slip.validate()?;
        check_amount(amount)?;
        Ok(Self::PlaceParlay {
            legs: slip.legs().to_vec(),
            amount,
        })
    }

    pub fn claim(record_id: impl Into<String>) -> Self {
        Self::Claim {
            record_id: record_id.into(),
        }
    }

    /// The record a claim targets, if this is a claim.
    pub fn claimed_record(&self) -> Option<&str> {
        match self {
            Self::Claim { record_id } => Some(record_id),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlaceBet { market_id, outcome, amount } => {
                write!(f, "bet {amount}µc on {market_id}#{outcome}")
            }
            Self::PlaceParlay { legs, amount } => {
                let legs: Vec<String> = legs.iter().map(|l| l.to_string()).collect();
                write!(f, "{}-leg parlay {amount}µc [{}]", legs.len(), legs.join(", "))
            }
            Self::Claim { record_id } => write!(f, "claim {record_id}"),
        }
    }
}

fn check_amount(amount: u64) -> Result<(), ValidationError> {
    if amount == 0 {
        return Err(ValidationError::InvalidArgument {
            field: "amount",
            reason: "stake must be greater than zero".into(),
        });
    }
    Ok(())
}
