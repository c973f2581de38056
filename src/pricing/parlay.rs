//! Parlay pricing and leg validation.
//!
//! Parlays use flat published multipliers indexed by leg count, scaled by
//! the holder's reputation-tier bonus. They are not derived from the legs'
//! pool odds, so a parlay's price does not move with any single market's
//! liquidity. Payout is all-or-nothing; only the win case is priced here.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use super::returns::{PayoutBreakdown, ReturnCalculator};
use super::round_odds;
use crate::types::{Market, ParlayLeg, ReputationTier, ValidationError};

pub const MIN_LEGS: usize = 2;
pub const MAX_LEGS: usize = 5;

/// Base odds by leg count, starting at 2 legs. Each step doubles.
const PARLAY_BASE_ODDS: [Decimal; MAX_LEGS - MIN_LEGS + 1] =
    [dec!(3.5), dec!(7.0), dec!(14.0), dec!(28.0)];

/// Odds bonus by tier (Novice, Skilled, Expert, Oracle).
const TIER_BONUSES: [Decimal; 4] = [dec!(1.0), dec!(1.1), dec!(1.2), dec!(1.3)];

/// Leg ceiling by tier (Novice, Skilled, Expert, Oracle).
const TIER_MAX_LEGS: [usize; 4] = [2, 3, 4, 5];

// ---------------------------------------------------------------------------
// Pricer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParlayQuote {
    pub leg_count: usize,
    pub base_odds: Decimal,
    pub tier_bonus: Decimal,
    pub combined_odds: Decimal,
}

impl fmt::Display for ParlayQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-leg parlay: {}x base × {}x bonus = {}x",
            self.leg_count, self.base_odds, self.tier_bonus, self.combined_odds
        )
    }
}

pub struct ParlayPricer {
    returns: ReturnCalculator,
}

impl Default for ParlayPricer {
    fn default() -> Self {
        Self::new(ReturnCalculator::default())
    }
}

impl ParlayPricer {
    pub fn new(returns: ReturnCalculator) -> Self {
        Self { returns }
    }

    /// Published base odds for a leg count in `[2, 5]`.
    pub fn base_odds(leg_count: usize) -> Result<Decimal, ValidationError> {
        if !(MIN_LEGS..=MAX_LEGS).contains(&leg_count) {
            return Err(ValidationError::LegCountOutOfRange(leg_count));
        }
        Ok(PARLAY_BASE_ODDS[leg_count - MIN_LEGS])
    }

    pub fn tier_bonus(tier: ReputationTier) -> Decimal {
        TIER_BONUSES[tier.index()]
    }

    /// Most legs a parlay may hold at this tier.
    pub fn max_legs(tier: ReputationTier) -> usize {
        TIER_MAX_LEGS[tier.index()]
    }

    /// Reject leg counts outside `[2, 5]` or above the tier ceiling.
    pub fn check_leg_count(leg_count: usize, tier: ReputationTier) -> Result<(), ValidationError> {
        if !(MIN_LEGS..=MAX_LEGS).contains(&leg_count) {
            return Err(ValidationError::LegCountOutOfRange(leg_count));
        }
        let max_legs = Self::max_legs(tier);
        if leg_count > max_legs {
            return Err(ValidationError::TierLegLimit {
                tier,
                max_legs,
                attempted: leg_count,
            });
        }
        Ok(())
    }

    /// Full leg validation: count, tier ceiling, and distinct markets.
    pub fn validate_legs(legs: &[ParlayLeg], tier: ReputationTier) -> Result<(), ValidationError> {
        Self::check_leg_count(legs.len(), tier)?;
        let mut seen = HashSet::with_capacity(legs.len());
        for leg in legs {
            if !seen.insert(leg.market_id.as_str()) {
                return Err(ValidationError::DuplicateMarket(leg.market_id.clone()));
            }
        }
        Ok(())
    }

    /// combined_odds = base_odds[leg_count] × tier_bonus[tier]
    pub fn quote(leg_count: usize, tier: ReputationTier) -> Result<ParlayQuote, ValidationError> {
        Self::check_leg_count(leg_count, tier)?;
        let base_odds = Self::base_odds(leg_count)?;
        let tier_bonus = Self::tier_bonus(tier);
        Ok(ParlayQuote {
            leg_count,
            base_odds,
            tier_bonus,
            combined_odds: round_odds(base_odds * tier_bonus),
        })
    }

    /// Win-case payout of a quoted parlay, same fee model as single bets.
    pub fn payout(
        &self,
        quote: &ParlayQuote,
        amount: Decimal,
    ) -> Result<PayoutBreakdown, ValidationError> {
        self.returns.potential_return(amount, quote.combined_odds)
    }

    /// Validate a slip, then price it for `amount`.
    pub fn price_slip(
        &self,
        slip: &ParlaySlip,
        amount: Decimal,
    ) -> Result<(ParlayQuote, PayoutBreakdown), ValidationError> {
        let quote = slip.quote()?;
        let payout = self.payout(&quote, amount)?;
        Ok((quote, payout))
    }
}

// ---------------------------------------------------------------------------
// Slip
// ---------------------------------------------------------------------------

/// A parlay under construction. Every mutation is validated against the
/// holder's tier, so an invalid slip can never reach transaction building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParlaySlip {
    tier: ReputationTier,
    legs: Vec<ParlayLeg>,
}

impl ParlaySlip {
    pub fn new(tier: ReputationTier) -> Self {
        Self {
            tier,
            legs: Vec::new(),
        }
    }

    pub fn tier(&self) -> ReputationTier {
        self.tier
    }

    pub fn legs(&self) -> &[ParlayLeg] {
        &self.legs
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Legs that can still be added at this tier.
    pub fn remaining_capacity(&self) -> usize {
        ParlayPricer::max_legs(self.tier).saturating_sub(self.legs.len())
    }

    /// Enough legs to be placed.
    pub fn is_placeable(&self) -> bool {
        self.legs.len() >= MIN_LEGS
    }

    pub fn add_leg(&mut self, leg: ParlayLeg) -> Result<(), ValidationError> {
        let attempted = self.legs.len() + 1;
        let max_legs = ParlayPricer::max_legs(self.tier);
        if attempted > max_legs {
            debug!(tier = %self.tier, max_legs, attempted, "Parlay leg rejected by tier ceiling");
            return Err(ValidationError::TierLegLimit {
                tier: self.tier,
                max_legs,
                attempted,
            });
        }
        if self.contains_market(&leg.market_id) {
            return Err(ValidationError::DuplicateMarket(leg.market_id));
        }
        self.legs.push(leg);
        Ok(())
    }

    /// Add a leg on a known market, rejecting resolved markets and
    /// outcomes the market does not have.
    pub fn add_market_leg(&mut self, market: &Market, outcome: u8) -> Result<(), ValidationError> {
        if market.resolved {
            return Err(ValidationError::MarketResolved(market.id.clone()));
        }
        market.check_outcome(outcome)?;
        self.add_leg(ParlayLeg::new(market.id.clone(), outcome))
    }

    pub fn remove_leg(&mut self, market_id: &str) -> Result<ParlayLeg, ValidationError> {
        let pos = self
            .legs
            .iter()
            .position(|l| l.market_id == market_id)
            .ok_or_else(|| ValidationError::UnknownLeg(market_id.to_string()))?;
        Ok(self.legs.remove(pos))
    }

    /// Change the picked outcome of an existing leg, with the same market
    /// checks as `add_market_leg`.
    pub fn set_outcome(&mut self, market: &Market, outcome: u8) -> Result<(), ValidationError> {
        let leg = self
            .legs
            .iter_mut()
            .find(|l| l.market_id == market.id)
            .ok_or_else(|| ValidationError::UnknownLeg(market.id.clone()))?;
        if market.resolved {
            return Err(ValidationError::MarketResolved(market.id.clone()));
        }
        market.check_outcome(outcome)?;
        leg.outcome_index = outcome;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.legs.clear();
    }

    pub fn contains_market(&self, market_id: &str) -> bool {
        self.legs.iter().any(|l| l.market_id == market_id)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ParlayPricer::validate_legs(&self.legs, self.tier)
    }

    pub fn quote(&self) -> Result<ParlayQuote, ValidationError> {
        self.validate()?;
        ParlayPricer::quote(self.legs.len(), self.tier)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
