use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Disposals this many days or fewer after vesting move the taxing point
/// from the vest date to the sale date (inclusive boundary).
pub const THIRTY_DAY_WINDOW_DAYS: i64 = 30;

/// Holding periods strictly longer than this qualify a gain for the CGT
/// discount. Exactly 365 days does not qualify.
pub const DISCOUNT_HOLDING_DAYS: i64 = 365;

/// CGT discount rate for individuals.
pub fn cgt_discount_rate() -> Decimal {
    dec!(0.5)
}

/// Australian financial year (runs 1 July to 30 June)
/// The year value represents the end year (e.g., 2025 = 2024/25 financial year)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FinancialYear(pub i32);

impl FinancialYear {
    /// Create a financial year from a date
    pub fn from_date(date: NaiveDate) -> Self {
        let year = date.year();
        // Financial year starts 1 July
        // On or after 1 July, the year ends next June
        // Before 1 July, the year ends this June
        if date >= NaiveDate::from_ymd_opt(year, 7, 1).unwrap() {
            FinancialYear(year + 1)
        } else {
            FinancialYear(year)
        }
    }

    /// Start date of the financial year (1 July of previous year)
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0 - 1, 7, 1).unwrap()
    }

    /// End date of the financial year (30 June)
    pub fn end_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0, 6, 30).unwrap()
    }

    /// Display as "2024/25" format
    pub fn display(&self) -> String {
        format!("{}/{:02}", self.0 - 1, self.0 % 100)
    }
}

impl std::fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
