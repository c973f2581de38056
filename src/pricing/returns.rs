//! Potential-return calculation.
//!
//! Turns a stake and decimal odds into gross return, protocol fee, net
//! return, and ROI. The protocol fee is charged on the gross return, not
//! on the stake. Wallet transaction fees are a separate, external concern.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::odds::OddsBook;
use super::{round_amount, round_percent};
use crate::types::ValidationError;

/// Protocol fee deducted from every payout (2% of gross).
pub const PROTOCOL_FEE_RATE: Decimal = dec!(0.02);

/// Early-bet weighting by blocks elapsed since market creation:
/// under ~6h → 2.0x, under ~12h → 1.5x, under ~24h → 1.2x, later → 1.0x.
const TIME_WEIGHTS: [(u32, Decimal); 3] = [
    (21_600, dec!(2.0)),
    (43_200, dec!(1.5)),
    (86_400, dec!(1.2)),
];

/// Multiplier for a bet placed at `current_block` on a market created at
/// `created_at_block`.
pub fn time_multiplier(created_at_block: u32, current_block: u32) -> Decimal {
    let elapsed = current_block.saturating_sub(created_at_block);
    TIME_WEIGHTS
        .iter()
        .find(|(limit, _)| elapsed < *limit)
        .map(|(_, weight)| *weight)
        .unwrap_or(Decimal::ONE)
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnConfig {
    /// Fraction of the gross return kept by the protocol, in `[0, 1)`.
    pub protocol_fee_rate: Decimal,
}

impl Default for ReturnConfig {
    fn default() -> Self {
        Self {
            protocol_fee_rate: PROTOCOL_FEE_RATE,
        }
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Payout for the win case. Amounts are 4 dp, ROI is a percentage at 1 dp.
///
/// `gross_return == net_return + fee` holds exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutBreakdown {
    pub gross_return: Decimal,
    pub fee: Decimal,
    pub net_return: Decimal,
    pub roi: Decimal,
}

impl PayoutBreakdown {
    pub fn zero() -> Self {
        Self {
            gross_return: Decimal::ZERO,
            fee: Decimal::ZERO,
            net_return: Decimal::ZERO,
            roi: Decimal::ZERO,
        }
    }
}

impl fmt::Display for PayoutBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gross={} fee={} net={} roi={}%",
            self.gross_return, self.fee, self.net_return, self.roi
        )
    }
}

pub struct ReturnCalculator {
    config: ReturnConfig,
}

impl Default for ReturnCalculator {
    fn default() -> Self {
        Self {
            config: ReturnConfig::default(),
        }
    }
}

impl ReturnCalculator {
    pub fn new(config: ReturnConfig) -> Result<Self, ValidationError> {
        let rate = config.protocol_fee_rate;
        if rate < Decimal::ZERO || rate >= Decimal::ONE {
            return Err(ValidationError::InvalidArgument {
                field: "protocol_fee_rate",
                reason: format!("must be in [0, 1), got {rate}"),
            });
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ReturnConfig {
        &self.config
    }

    /// Potential return of an unweighted bet.
    pub fn potential_return(
        &self,
        bet_amount: Decimal,
        odds: Decimal,
    ) -> Result<PayoutBreakdown, ValidationError> {
        self.weighted_return(bet_amount, odds, Decimal::ONE)
    }

    /// Potential return with an early-bet time multiplier:
    ///
    ///   gross = bet × multiplier × odds
    ///   fee   = gross × fee_rate
    ///   net   = gross − fee
    ///   roi   = (net − bet) / bet × 100      (0 when bet is 0)
    pub fn weighted_return(
        &self,
        bet_amount: Decimal,
        odds: Decimal,
        time_multiplier: Decimal,
    ) -> Result<PayoutBreakdown, ValidationError> {
        check_non_negative("bet_amount", bet_amount)?;
        check_non_negative("odds", odds)?;
        check_non_negative("time_multiplier", time_multiplier)?;

        let effective_bet = bet_amount
            .checked_mul(time_multiplier)
            .ok_or(ValidationError::AmountOverflow("effective_bet"))?;
        let gross_return = round_amount(
            effective_bet
                .checked_mul(odds)
                .ok_or(ValidationError::AmountOverflow("gross_return"))?,
        );
        let fee = round_amount(
            gross_return
                .checked_mul(self.config.protocol_fee_rate)
                .ok_or(ValidationError::AmountOverflow("fee"))?,
        );
        let net_return = gross_return - fee;
        let roi = if bet_amount > Decimal::ZERO {
            let ratio = (net_return - bet_amount)
                .checked_div(bet_amount)
                .and_then(|r| r.checked_mul(dec!(100)))
                .ok_or(ValidationError::AmountOverflow("roi"))?;
            round_percent(ratio)
        } else {
            Decimal::ZERO
        };

        Ok(PayoutBreakdown {
            gross_return,
            fee,
            net_return,
            roi,
        })
    }

    /// Potential return for a microcredit stake.
    pub fn microcredit_return(
        &self,
        amount: u64,
        odds: Decimal,
    ) -> Result<PayoutBreakdown, ValidationError> {
        self.potential_return(Decimal::from(amount), odds)
    }

    /// Price a bet on one outcome of a quoted market at its displayed odds.
    /// An outcome with no stake yet quotes zero odds and so a zero payout.
    pub fn quote_bet(
        &self,
        book: &OddsBook,
        outcome: u8,
        bet_amount: Decimal,
    ) -> Result<PayoutBreakdown, ValidationError> {
        let quote = book.quote(outcome).ok_or_else(|| ValidationError::InvalidArgument {
            field: "outcome",
            reason: format!("outcome {outcome} not in a {}-outcome book", book.quotes.len()),
        })?;
        if !quote.has_liquidity() {
            debug!(outcome, "Bet quoted on an outcome with no liquidity");
        }
        self.potential_return(bet_amount, quote.odds)
    }
}

fn check_non_negative(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        debug!(field, %value, "Rejected negative pricing input");
        return Err(ValidationError::InvalidArgument {
            field,
            reason: format!("must be non-negative, got {value}"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
