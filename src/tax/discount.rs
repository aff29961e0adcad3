use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::round2;
use crate::error::TaxError;
use crate::tax::au::{cgt_discount_rate, DISCOUNT_HOLDING_DAYS};

/// Outcome of testing a gain for the long-term CGT discount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CgtDiscountResult {
    /// Whether the holding period exceeds the statutory threshold.
    pub eligible: bool,
    /// 0.5 only when eligible and the gross gain is positive, else 0.
    pub discount_rate: Decimal,
    pub holding_period_days: i64,
    pub gross_gain: Decimal,
    /// `gross_gain * (1 - discount_rate)`, rounded to cents.
    pub discounted_gain: Decimal,
}

/// Apply the long-term CGT discount to a gross gain.
///
/// Eligibility is strict: a holding period of exactly 365 days does not
/// qualify, 366 does. Losses are never discounted, even when time-eligible.
pub fn evaluate(
    acquisition_date: NaiveDate,
    sale_date: NaiveDate,
    gross_gain: Decimal,
) -> Result<CgtDiscountResult, TaxError> {
    if sale_date < acquisition_date {
        return Err(TaxError::InvalidDateOrder {
            reference: acquisition_date,
            sale: sale_date,
        });
    }

    let holding_period_days = (sale_date - acquisition_date).num_days();
    let eligible = holding_period_days > DISCOUNT_HOLDING_DAYS;
    let discount_rate = if eligible && gross_gain > Decimal::ZERO {
        cgt_discount_rate()
    } else {
        Decimal::ZERO
    };
    let discounted_gain = round2(gross_gain * (Decimal::ONE - discount_rate));

    Ok(CgtDiscountResult {
        eligible,
        discount_rate,
        holding_period_days,
        gross_gain,
        discounted_gain,
    })
}
