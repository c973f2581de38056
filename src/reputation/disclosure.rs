//! Selective-disclosure requests.
//!
//! A holder may prove lower bounds on their record (tier, accuracy, wins,
//! streak) without revealing it. The proof itself is generated by the
//! ledger; this only checks a request before it is submitted, since the
//! ledger rejects any claim the record does not support.

use serde::{Deserialize, Serialize};

use super::exact_accuracy;
use crate::types::{Reputation, ReputationTier, ValidationError};

/// Lower bounds to prove. Zero means "do not prove this dimension".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureRequest {
    pub min_tier: ReputationTier,
    /// Whole percent, 0–100.
    pub min_accuracy: u8,
    pub min_wins: u32,
    pub min_streak: u32,
}

impl DisclosureRequest {
    /// Prove only the tier floor.
    pub fn tier_only(min_tier: ReputationTier) -> Self {
        Self {
            min_tier,
            min_accuracy: 0,
            min_wins: 0,
            min_streak: 0,
        }
    }

    /// The strongest request this record supports: its own tier, floored
    /// accuracy, total wins, and best streak.
    pub fn strongest(reputation: &Reputation) -> Self {
        Self {
            min_tier: reputation.tier,
            min_accuracy: floored_accuracy(reputation),
            min_wins: reputation.total_wins,
            min_streak: reputation.best_streak,
        }
    }

    /// Reject any bound the record cannot back.
    pub fn validate_against(&self, reputation: &Reputation) -> Result<(), ValidationError> {
        if self.min_tier > reputation.tier {
            return Err(exceeds("tier", self.min_tier, reputation.tier));
        }
        if self.min_accuracy > 100 {
            return Err(ValidationError::InvalidArgument {
                field: "min_accuracy",
                reason: format!("{}% is not a percentage", self.min_accuracy),
            });
        }
        let accuracy = floored_accuracy(reputation);
        if self.min_accuracy > accuracy {
            return Err(exceeds("accuracy", self.min_accuracy, accuracy));
        }
        if self.min_wins > reputation.total_wins {
            return Err(exceeds("wins", self.min_wins, reputation.total_wins));
        }
        if self.min_streak > reputation.best_streak {
            return Err(exceeds("streak", self.min_streak, reputation.best_streak));
        }
        Ok(())
    }
}

fn floored_accuracy(reputation: &Reputation) -> u8 {
    let exact = exact_accuracy(reputation.total_wins, reputation.total_bets).floor();
    u8::try_from(exact).unwrap_or(100).min(100)
}

fn exceeds(
    claim: &'static str,
    requested: impl std::fmt::Display,
    actual: impl std::fmt::Display,
) -> ValidationError {
    ValidationError::DisclosureExceedsRecord {
        claim,
        requested: requested.to_string(),
        actual: actual.to_string(),
    }
}
