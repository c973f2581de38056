//! Pricing engine: parimutuel odds plus the payout and parlay math built on them.
//!
//! Every function here is a pure transformation of its inputs. Displayed
//! values are rounded to fixed precision (odds 2 dp, percentages 1 dp,
//! credit amounts 4 dp) so identical pools always render identically.

pub mod odds;
pub mod parlay;
pub mod returns;

use rust_decimal::{Decimal, RoundingStrategy};

pub use odds::{OddsBook, OddsEngine, OddsQuote};
pub use parlay::{ParlayPricer, ParlayQuote, ParlaySlip};
pub use returns::{PayoutBreakdown, ReturnCalculator, ReturnConfig};

const ODDS_DP: u32 = 2;
const PERCENT_DP: u32 = 1;
const AMOUNT_DP: u32 = 4;

fn round_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

pub(crate) fn round_odds(value: Decimal) -> Decimal {
    round_dp(value, ODDS_DP)
}

pub(crate) fn round_percent(value: Decimal) -> Decimal {
    round_dp(value, PERCENT_DP)
}

pub(crate) fn round_amount(value: Decimal) -> Decimal {
    round_dp(value, AMOUNT_DP)
}
