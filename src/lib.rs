//! Australian Employee Share Scheme (ESS) tax engine.
//!
//! Computes the tax consequences of RSU equity events: vesting income,
//! capital gains and losses on subsequent sales, the statutory 30-day
//! re-characterization rule, and the 50% long-term CGT discount, all
//! normalized to Australian dollars with deterministic rounding.
//!
//! Every operation is a pure function over explicit inputs: exchange rates
//! are supplied by the caller, the "current date" is injected into the
//! [`Converter`] at construction, and identical inputs always produce
//! identical results.

pub mod currency;
pub mod error;
pub mod events;
pub mod tax;

pub use currency::{round2, Converter, Currency, CurrencyConversionResult, REPORTING_CURRENCY};
pub use error::TaxError;
pub use events::{ShareSaleEvent, VestingEvent};
pub use tax::{
    calculate_capital_gains, calculate_taxable_income, process_vesting_and_sale, AppliedRule,
    CapitalGainsResult, CgtDiscountResult, FinancialYear, TaxableIncomeResult,
    ThirtyDayRuleResult, VestingSaleOutcome,
};
