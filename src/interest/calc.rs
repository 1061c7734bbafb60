//! Interest math
//!
//! Intermediates run at scale 10 and the final figure is rounded to scale 2
//! with banker's rounding, so long-run accrual bias stays neutral.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::money::{INTERMEDIATE_SCALE, Money, MoneyError};

/// Days per year for daily accrual. Fixed basis, no leap-year adjustment.
const DAYS_PER_YEAR: u32 = 365;

/// One day of interest on `principal` at `annual_rate` (fraction, not
/// percent: 4.5% is `0.045`).
///
/// The product `principal × rate / 365` is taken at full decimal precision,
/// normalized once to scale 10, then rounded half-even to scale 2. Rounding
/// the daily rate on its own would shift exact half-cent ties.
pub fn daily_interest(principal: Money, annual_rate: Decimal) -> Result<Money, MoneyError> {
    let accrued = principal
        .as_decimal()
        .checked_mul(annual_rate)
        .and_then(|v| v.checked_div(Decimal::from(DAYS_PER_YEAR)))
        .ok_or(MoneyError::Overflow)?
        .round_dp_with_strategy(INTERMEDIATE_SCALE, RoundingStrategy::MidpointNearestEven);

    Money::round_half_even(accrued)
}
