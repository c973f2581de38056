//! Shared types for the pricing engine.
//!
//! These types form the data model consumed by the odds, returns, parlay,
//! and reputation modules. Everything here is a plain value: the engine
//! reads them, it never mutates ledger state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 1 credit = 1,000,000 microcredits.
pub const MICROCREDITS_PER_CREDIT: u64 = 1_000_000;

/// Smallest number of outcomes a market may have.
pub const MIN_OUTCOMES: u8 = 2;

/// Largest number of outcomes a market may have.
pub const MAX_OUTCOMES: u8 = 10;

/// Convert a microcredit amount to whole credits (exact, 6 dp).
pub fn microcredits_to_credits(amount: u64) -> Decimal {
    Decimal::from(amount) / dec!(1_000_000)
}

/// Convert a credit amount to microcredits, truncating any dust below
/// one microcredit.
pub fn credits_to_microcredits(credits: Decimal) -> Result<u64, ValidationError> {
    if credits.is_sign_negative() && !credits.is_zero() {
        return Err(ValidationError::InvalidArgument {
            field: "credits",
            reason: format!("must be non-negative, got {credits}"),
        });
    }
    let micro = credits
        .checked_mul(dec!(1_000_000))
        .ok_or(ValidationError::AmountOverflow("credits"))?
        .trunc();
    u64::try_from(micro).map_err(|_| ValidationError::InvalidArgument {
        field: "credits",
        reason: format!("{credits} does not fit in a microcredit amount"),
    })
}

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

/// A market as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    /// Number of outcomes (2–10).
    pub outcome_count: u8,
    pub resolved: bool,
    /// Winning outcome index. Only meaningful once `resolved` is set.
    #[serde(default)]
    pub winning_outcome: Option<u8>,
    pub end_time: DateTime<Utc>,
    /// Block height at creation, used for early-bet time weighting.
    #[serde(default)]
    pub created_at_block: u32,
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match (self.resolved, self.winning_outcome) {
            (true, Some(w)) => format!("resolved: outcome {w}"),
            (true, None) => "resolved".to_string(),
            (false, _) => format!("ends {}", self.end_time.format("%Y-%m-%d %H:%M")),
        };
        write!(f, "[{}] {} outcomes ({status})", self.id, self.outcome_count)
    }
}

impl Market {
    /// Build an unresolved market, validating the outcome count.
    pub fn new(
        id: impl Into<String>,
        outcome_count: u8,
        end_time: DateTime<Utc>,
        created_at_block: u32,
    ) -> Result<Self, ValidationError> {
        let market = Market {
            id: id.into(),
            outcome_count,
            resolved: false,
            winning_outcome: None,
            end_time,
            created_at_block,
        };
        market.validate()?;
        Ok(market)
    }

    /// The same market, marked resolved with the given winner.
    pub fn resolved_with(mut self, winning_outcome: u8) -> Result<Self, ValidationError> {
        self.resolved = true;
        self.winning_outcome = Some(winning_outcome);
        self.validate()?;
        Ok(self)
    }

    /// Check the structural invariants (useful after deserialising).
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_OUTCOMES..=MAX_OUTCOMES).contains(&self.outcome_count) {
            return Err(ValidationError::InvalidOutcomeCount(self.outcome_count));
        }
        if let Some(winner) = self.winning_outcome {
            if !self.resolved {
                return Err(ValidationError::InvalidArgument {
                    field: "winning_outcome",
                    reason: format!("market {} is not resolved", self.id),
                });
            }
            self.check_outcome(winner)?;
        }
        Ok(())
    }

    /// Reject outcome indices outside this market.
    pub fn check_outcome(&self, outcome: u8) -> Result<(), ValidationError> {
        if outcome >= self.outcome_count {
            return Err(ValidationError::InvalidOutcome {
                market_id: self.id.clone(),
                outcome,
                outcome_count: self.outcome_count,
            });
        }
        Ok(())
    }

    /// Still accepting bets at `now`.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        !self.resolved && self.end_time > now
    }

    pub fn is_winning_outcome(&self, outcome: u8) -> bool {
        self.resolved && self.winning_outcome == Some(outcome)
    }
}

/// One pick within a parlay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParlayLeg {
    pub market_id: String,
    pub outcome_index: u8,
}

impl ParlayLeg {
    pub fn new(market_id: impl Into<String>, outcome_index: u8) -> Self {
        Self {
            market_id: market_id.into(),
            outcome_index,
        }
    }
}

impl fmt::Display for ParlayLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.market_id, self.outcome_index)
    }
}

// ---------------------------------------------------------------------------
// Reputation
// ---------------------------------------------------------------------------

/// Reputation tier. Ordering is load-bearing: advancement only moves up.
///
/// Serialised as its `u8` discriminant (1–4), matching the ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum ReputationTier {
    Novice = 1,
    Skilled = 2,
    Expert = 3,
    Oracle = 4,
}

impl ReputationTier {
    /// All tiers in ascending order.
    pub const ALL: [ReputationTier; 4] = [
        ReputationTier::Novice,
        ReputationTier::Skilled,
        ReputationTier::Expert,
        ReputationTier::Oracle,
    ];

    /// The tier above this one, or `None` at the top.
    pub fn next(self) -> Option<Self> {
        match self {
            ReputationTier::Novice => Some(ReputationTier::Skilled),
            ReputationTier::Skilled => Some(ReputationTier::Expert),
            ReputationTier::Expert => Some(ReputationTier::Oracle),
            ReputationTier::Oracle => None,
        }
    }

    /// Zero-based position, for indexing per-tier tables.
    pub fn index(self) -> usize {
        self as usize - 1
    }

    pub fn label(self) -> &'static str {
        match self {
            ReputationTier::Novice => "Novice",
            ReputationTier::Skilled => "Skilled",
            ReputationTier::Expert => "Expert",
            ReputationTier::Oracle => "Oracle",
        }
    }
}

impl fmt::Display for ReputationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<ReputationTier> for u8 {
    fn from(tier: ReputationTier) -> Self {
        tier as u8
    }
}

impl TryFrom<u8> for ReputationTier {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ReputationTier::Novice),
            2 => Ok(ReputationTier::Skilled),
            3 => Ok(ReputationTier::Expert),
            4 => Ok(ReputationTier::Oracle),
            other => Err(ValidationError::InvalidTier(other)),
        }
    }
}

/// Parse a tier name (case-insensitive).
impl std::str::FromStr for ReputationTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "novice" => Ok(ReputationTier::Novice),
            "skilled" => Ok(ReputationTier::Skilled),
            "expert" => Ok(ReputationTier::Expert),
            "oracle" => Ok(ReputationTier::Oracle),
            _ => Err(anyhow::anyhow!("Unknown reputation tier: {s}")),
        }
    }
}

/// A user's reputation counters as last reported by the ledger.
///
/// The engine only reads this record; the ledger updates it after each
/// settlement and the caller passes the refreshed copy back in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reputation {
    #[serde(default)]
    pub owner: String,
    pub total_bets: u32,
    pub total_wins: u32,
    pub total_parlays: u32,
    pub parlay_wins: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    /// Lifetime wagered amount in microcredits.
    pub total_wagered: u64,
    /// Lifetime winnings in microcredits.
    pub total_won: u64,
    pub tier: ReputationTier,
    /// Block height of the last ledger update.
    pub last_updated: u32,
}

impl fmt::Display for Reputation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | bets={} wins={} parlays={} (W{}) | streak={} best={}",
            self.tier,
            self.total_bets,
            self.total_wins,
            self.total_parlays,
            self.parlay_wins,
            self.current_streak,
            self.best_streak,
        )
    }
}

impl Reputation {
    /// A freshly initialised record: Novice with all counters at zero.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            total_bets: 0,
            total_wins: 0,
            total_parlays: 0,
            parlay_wins: 0,
            current_streak: 0,
            best_streak: 0,
            total_wagered: 0,
            total_won: 0,
            tier: ReputationTier::Novice,
            last_updated: 0,
        }
    }

    /// Parse the record JSON a wallet exports for the ledger's Reputation
    /// record. Values carry type suffixes (`"12u32"`, `"3u8.private"`);
    /// missing counters default to zero and a missing tier to Novice.
    pub fn from_record_json(json: &str) -> Result<Self, ValidationError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ValidationError::InvalidRecord(e.to_string()))?;
        let obj = value
            .as_object()
            .ok_or_else(|| ValidationError::InvalidRecord("expected a JSON object".into()))?;

        let field = |name: &str| -> Result<u64, ValidationError> {
            match obj.get(name) {
                None | Some(serde_json::Value::Null) => Ok(0),
                Some(v) => parse_record_integer(v).ok_or_else(|| {
                    ValidationError::InvalidRecord(format!("field {name} is not an integer: {v}"))
                }),
            }
        };
        let narrow = |name: &str| -> Result<u32, ValidationError> {
            u32::try_from(field(name)?)
                .map_err(|_| ValidationError::InvalidRecord(format!("field {name} overflows u32")))
        };

        let tier = match obj.get("tier") {
            None | Some(serde_json::Value::Null) => ReputationTier::Novice,
            Some(v) => {
                let raw = parse_record_integer(v).ok_or_else(|| {
                    ValidationError::InvalidRecord(format!("field tier is not an integer: {v}"))
                })?;
                let raw = u8::try_from(raw)
                    .map_err(|_| ValidationError::InvalidRecord(format!("tier {raw} out of range")))?;
                ReputationTier::try_from(raw)?
            }
        };

        Ok(Self {
            owner: obj
                .get("owner")
                .and_then(|v| v.as_str())
                .map(|s| s.split('.').next().unwrap_or(s).to_string())
                .unwrap_or_default(),
            total_bets: narrow("total_bets")?,
            total_wins: narrow("total_wins")?,
            total_parlays: narrow("total_parlays")?,
            parlay_wins: narrow("parlay_wins")?,
            current_streak: narrow("current_streak")?,
            best_streak: narrow("best_streak")?,
            total_wagered: field("total_wagered")?,
            total_won: field("total_won")?,
            tier,
            last_updated: narrow("last_updated")?,
        })
    }
}

/// Read an integer that is either a JSON number or a Leo literal such as
/// `"42u64"` / `"42u64.private"`.
fn parse_record_integer(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Input rejected by the engine. Always recoverable by correcting the
/// input; the engine never retries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid argument `{field}`: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    #[error("No outcome pools supplied")]
    EmptyPools,

    #[error("Outcome pools overflow the total pool")]
    PoolOverflow,

    #[error("Market {market_id} has {expected} outcomes but {actual} pools were supplied")]
    PoolCountMismatch {
        market_id: String,
        expected: u8,
        actual: usize,
    },

    #[error("Outcome count {0} outside 2..=10")]
    InvalidOutcomeCount(u8),

    #[error("Outcome {outcome} is out of range for market {market_id} ({outcome_count} outcomes)")]
    InvalidOutcome {
        market_id: String,
        outcome: u8,
        outcome_count: u8,
    },

    #[error("Market {0} is already resolved")]
    MarketResolved(String),

    #[error("Market {0} has closed for betting")]
    MarketClosed(String),

    #[error("Amount overflow computing {0}")]
    AmountOverflow(&'static str),

    #[error("Parlay must have 2-5 legs, got {0}")]
    LegCountOutOfRange(usize),

    #[error("{tier} tier allows at most {max_legs} legs, attempted {attempted}")]
    TierLegLimit {
        tier: ReputationTier,
        max_legs: usize,
        attempted: usize,
    },

    #[error("Market {0} is already in the parlay")]
    DuplicateMarket(String),

    #[error("Market {0} is not in the parlay")]
    UnknownLeg(String),

    #[error("Invalid reputation tier value: {0}")]
    InvalidTier(u8),

    #[error("Invalid reputation record: {0}")]
    InvalidRecord(String),

    #[error("Cannot disclose {claim}: requested {requested}, record has {actual}")]
    DisclosureExceedsRecord {
        claim: &'static str,
        requested: String,
        actual: String,
    },

    #[error("Record {0} already has a confirmed claim")]
    DuplicateClaim(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
