//! Reputation tiers: accuracy and progress toward the next tier.
//!
//! Advisory only: the ledger performs promotions. This module projects the
//! distance from a user's counters to the next tier so the client can show
//! it. Tiers only move up (Novice → Skilled → Expert → Oracle).

pub mod disclosure;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pricing::{round_percent, ParlayPricer};
use crate::types::{microcredits_to_credits, Reputation, ReputationTier, ValidationError};

pub use disclosure::DisclosureRequest;

/// (tier, wins, accuracy %) needed to reach each tier above Novice.
const TIER_REQUIREMENTS: [(ReputationTier, u32, Decimal); 3] = [
    (ReputationTier::Skilled, 6, dec!(60)),
    (ReputationTier::Expert, 16, dec!(70)),
    (ReputationTier::Oracle, 31, dec!(80)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRequirement {
    pub tier: ReputationTier,
    pub wins: u32,
    /// Minimum accuracy, percent.
    pub accuracy: Decimal,
}

impl TierRequirement {
    /// Both gates: enough wins and enough accuracy.
    fn is_met(&self, wins: u32, exact_accuracy: Decimal) -> bool {
        wins >= self.wins && exact_accuracy >= self.accuracy
    }
}

/// Distance from the current counters to the next tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierProgress {
    pub current_tier: ReputationTier,
    /// Win rate, percent, 1 dp.
    pub accuracy: Decimal,
    /// `None` once the user is an Oracle.
    pub next_tier: Option<ReputationTier>,
    /// Wins the next tier requires (0 at the top).
    pub wins_needed: u32,
    /// Accuracy the next tier requires (0 at the top).
    pub accuracy_needed: Decimal,
    /// Wins-driven progress, 0–100, 1 dp.
    pub progress_percent: Decimal,
    pub wins_remaining: u32,
    pub accuracy_remaining: Decimal,
    /// Accuracy gate progress, 0–100, 1 dp.
    pub accuracy_progress_percent: Decimal,
    /// Both gates for the next tier are satisfied.
    pub ready_to_advance: bool,
}

impl fmt::Display for TierProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.next_tier {
            None => write!(f, "{} (maximum tier, {}% accuracy)", self.current_tier, self.accuracy),
            Some(next) if self.ready_to_advance => {
                write!(f, "{} → {}: ready to advance", self.current_tier, next)
            }
            Some(next) => write!(
                f,
                "{} → {}: {}% (wins {} more, accuracy +{}%)",
                self.current_tier, next, self.progress_percent, self.wins_remaining, self.accuracy_remaining
            ),
        }
    }
}

pub struct ReputationStateMachine;

impl ReputationStateMachine {
    /// Win rate as a percentage, rounded to 1 dp. Zero with no bets.
    pub fn accuracy(total_wins: u32, total_bets: u32) -> Decimal {
        round_percent(exact_accuracy(total_wins, total_bets))
    }

    /// Requirements to *reach* `tier`. Novice has none.
    pub fn requirement(tier: ReputationTier) -> Option<TierRequirement> {
        TIER_REQUIREMENTS
            .iter()
            .find(|(t, _, _)| *t == tier)
            .map(|&(tier, wins, accuracy)| TierRequirement {
                tier,
                wins,
                accuracy,
            })
    }

    /// Progress from `current_tier` toward the tier above it.
    ///
    /// progress_percent = min(100, wins / required_wins × 100). Accuracy is
    /// tracked as a second, independent gate.
    pub fn progress(
        total_wins: u32,
        total_bets: u32,
        current_tier: ReputationTier,
    ) -> Result<TierProgress, ValidationError> {
        check_counters(total_wins, total_bets)?;
        let exact = exact_accuracy(total_wins, total_bets);
        let accuracy = round_percent(exact);

        let requirement = current_tier.next().and_then(Self::requirement);
        let Some(req) = requirement else {
            return Ok(TierProgress {
                current_tier,
                accuracy,
                next_tier: None,
                wins_needed: 0,
                accuracy_needed: Decimal::ZERO,
                progress_percent: dec!(100),
                wins_remaining: 0,
                accuracy_remaining: Decimal::ZERO,
                accuracy_progress_percent: dec!(100),
                ready_to_advance: false,
            });
        };

        let progress_percent =
            round_percent((Decimal::from(total_wins) / Decimal::from(req.wins) * dec!(100)).min(dec!(100)));
        let accuracy_progress_percent = round_percent((exact / req.accuracy * dec!(100)).min(dec!(100)));

        Ok(TierProgress {
            current_tier,
            accuracy,
            next_tier: Some(req.tier),
            wins_needed: req.wins,
            accuracy_needed: req.accuracy,
            progress_percent,
            wins_remaining: req.wins.saturating_sub(total_wins),
            accuracy_remaining: round_percent((req.accuracy - exact).max(Decimal::ZERO)),
            accuracy_progress_percent,
            ready_to_advance: req.is_met(total_wins, exact),
        })
    }

    /// Progress for a ledger record.
    pub fn progress_for(reputation: &Reputation) -> Result<TierProgress, ValidationError> {
        Self::progress(reputation.total_wins, reputation.total_bets, reputation.tier)
    }

    /// Highest tier whose thresholds the counters satisfy. A projection for
    /// display; the ledger record's tier stays authoritative.
    pub fn qualifying_tier(total_wins: u32, total_bets: u32) -> ReputationTier {
        let exact = exact_accuracy(total_wins, total_bets);
        TIER_REQUIREMENTS
            .iter()
            .rev()
            .find(|&&(tier, wins, accuracy)| {
                TierRequirement { tier, wins, accuracy }.is_met(total_wins, exact)
            })
            .map(|(tier, _, _)| *tier)
            .unwrap_or(ReputationTier::Novice)
    }
}

fn exact_accuracy(total_wins: u32, total_bets: u32) -> Decimal {
    if total_bets == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(total_wins) / Decimal::from(total_bets) * dec!(100)
}

fn check_counters(total_wins: u32, total_bets: u32) -> Result<(), ValidationError> {
    if total_wins > total_bets {
        return Err(ValidationError::InvalidArgument {
            field: "total_wins",
            reason: format!("{total_wins} wins exceed {total_bets} bets"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Profile summary
// ---------------------------------------------------------------------------

/// Display metrics derived from a reputation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationSummary {
    pub tier: ReputationTier,
    pub accuracy: Decimal,
    pub parlay_accuracy: Decimal,
    /// Credits, not microcredits.
    pub total_wagered: Decimal,
    pub total_won: Decimal,
    /// `total_won − total_wagered`, credits. Negative when down.
    pub net_profit: Decimal,
    /// Net profit over wagered, percent, 1 dp. Zero with nothing wagered.
    pub profit_percent: Decimal,
    pub max_parlay_legs: usize,
    pub parlay_bonus: Decimal,
    pub progress: TierProgress,
}

impl ReputationSummary {
    pub fn from_record(reputation: &Reputation) -> Result<Self, ValidationError> {
        check_counters(reputation.parlay_wins, reputation.total_parlays)?;
        let progress = ReputationStateMachine::progress_for(reputation)?;

        let wagered = microcredits_to_credits(reputation.total_wagered);
        let won = microcredits_to_credits(reputation.total_won);
        let net_profit = won - wagered;
        let profit_percent = if reputation.total_wagered > 0 {
            round_percent(net_profit / wagered * dec!(100))
        } else {
            Decimal::ZERO
        };

        Ok(Self {
            tier: reputation.tier,
            accuracy: progress.accuracy,
            parlay_accuracy: ReputationStateMachine::accuracy(
                reputation.parlay_wins,
                reputation.total_parlays,
            ),
            total_wagered: wagered,
            total_won: won,
            net_profit,
            profit_percent,
            max_parlay_legs: ParlayPricer::max_legs(reputation.tier),
            parlay_bonus: ParlayPricer::tier_bonus(reputation.tier),
            progress,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
