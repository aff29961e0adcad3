use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TaxError;
use crate::tax::au::THIRTY_DAY_WINDOW_DAYS;

/// Outcome of testing a sale against the 30-day re-characterization window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThirtyDayRuleResult {
    /// Whether the sale re-characterizes the vesting event.
    pub applies: bool,
    /// Whole days between reference date and sale date, never negative.
    pub days_between: i64,
    pub reference_date: NaiveDate,
    pub sale_date: NaiveDate,
    /// Human-readable restatement of `applies`.
    pub reason: String,
}

/// Decide whether a sale within the statutory window re-characterizes its
/// vesting event.
///
/// The boundary is inclusive: a sale exactly 30 days after the reference
/// date still applies, 31 days does not. Fails with `InvalidDateOrder` when
/// the sale precedes the reference date.
pub fn evaluate(
    reference_date: NaiveDate,
    sale_date: NaiveDate,
) -> Result<ThirtyDayRuleResult, TaxError> {
    if sale_date < reference_date {
        return Err(TaxError::InvalidDateOrder {
            reference: reference_date,
            sale: sale_date,
        });
    }

    let days_between = (sale_date - reference_date).num_days();
    let applies = days_between <= THIRTY_DAY_WINDOW_DAYS;
    let reason = if applies {
        format!("sold {days_between} days after vesting, within the 30-day window")
    } else {
        format!("sold {days_between} days after vesting, outside the 30-day window")
    };

    Ok(ThirtyDayRuleResult {
        applies,
        days_between,
        reference_date,
        sale_date,
        reason,
    })
}
