use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::{round2, Converter, Currency, REPORTING_CURRENCY};
use crate::error::TaxError;
use crate::events::{ShareSaleEvent, VestingEvent};
use crate::tax::au::FinancialYear;
use crate::tax::thirty_day::{self, ThirtyDayRuleResult};

/// Valuation inputs behind a taxable income figure.
///
/// Market value and cost base are in the reporting currency; the share
/// price stays in the vesting event's own currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeBreakdown {
    pub market_value: Decimal,
    pub cost_base: Decimal,
    pub shares: Decimal,
    pub share_price: Decimal,
}

/// Income adjustment contributed by one sale against the vesting event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleAdjustment {
    pub sale_date: NaiveDate,
    pub shares_sold: Decimal,
    pub rule: ThirtyDayRuleResult,
    /// Net change to taxable income caused by this sale, rounded to cents.
    /// Zero when the 30-day rule did not apply.
    pub income_delta: Decimal,
}

/// Assessable ESS income for one vesting event and its associated sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxableIncomeResult {
    /// Final figure in the reporting currency, rounded to cents.
    pub taxable_income: Decimal,
    pub currency: Currency,
    pub financial_year: FinancialYear,
    pub breakdown: IncomeBreakdown,
    /// One entry per associated sale, in sale-date order.
    pub sale_adjustments: Vec<SaleAdjustment>,
    /// Shares vested minus every share consumed by the associated sales.
    pub remaining_shares: Decimal,
}

/// Compute assessable income for one vesting event and zero or more sales
/// against it.
///
/// Sales are processed in sale-date order; callers need not pre-sort. A
/// sale inside the 30-day window re-characterizes the income for its shares
/// at the sale: the proportional slice of vesting income is replaced by the
/// sale's net proceeds. A sale outside the window leaves the vesting income
/// untouched; its shares are only tracked as consumed, and any gain belongs
/// to the capital-gains path.
pub fn calculate_taxable_income(
    vesting: &VestingEvent,
    sales: &[ShareSaleEvent],
    converter: &Converter,
) -> Result<TaxableIncomeResult, TaxError> {
    if vesting.shares_vested < Decimal::ZERO {
        return Err(TaxError::InvalidInput {
            reason: format!("negative shares vested: {}", vesting.shares_vested),
        });
    }

    let mut ordered: Vec<&ShareSaleEvent> = sales.iter().collect();
    ordered.sort_by_key(|s| s.date);

    // Overallocation is rejected before any conversion work.
    let mut sold_total = Decimal::ZERO;
    for sale in &ordered {
        if sale.shares_sold < Decimal::ZERO {
            return Err(TaxError::InvalidInput {
                reason: format!("negative shares sold: {}", sale.shares_sold),
            });
        }
        sold_total += sale.shares_sold;
        if sold_total > vesting.shares_vested {
            return Err(TaxError::OverAllocation {
                vested: vesting.shares_vested,
                sold: sold_total,
            });
        }
    }

    let market_value = vesting.converted_market_value(converter)?;
    let cost_base = vesting.converted_cost_base(converter)?;
    let baseline = market_value - cost_base;
    log::debug!(
        "vest {}: mv={}, cost={}, baseline income={}",
        vesting.date,
        market_value,
        cost_base,
        baseline
    );

    let mut taxable_income = baseline;
    let mut sale_adjustments = Vec::with_capacity(ordered.len());

    for sale in &ordered {
        let rule = thirty_day::evaluate(vesting.date, sale.date)?;
        let mut income_delta = Decimal::ZERO;

        if rule.applies {
            let proportion = if vesting.shares_vested.is_zero() {
                Decimal::ZERO
            } else {
                sale.shares_sold / vesting.shares_vested
            };
            let removed = baseline * proportion;

            let proceeds = sale.converted_proceeds(converter)?;
            let fees = sale.converted_fees(converter)?;
            let sale_cost_base = cost_base * proportion;
            let replacement = proceeds - sale_cost_base - fees;

            income_delta = replacement - removed;
            taxable_income += income_delta;
            log::debug!(
                "sale {} re-characterized: removed={}, replaced with={}, delta={}",
                sale.date,
                removed,
                replacement,
                income_delta
            );
        } else {
            log::debug!(
                "sale {} outside window ({} days): vesting income unchanged",
                sale.date,
                rule.days_between
            );
        }

        sale_adjustments.push(SaleAdjustment {
            sale_date: sale.date,
            shares_sold: sale.shares_sold,
            rule,
            income_delta: round2(income_delta),
        });
    }

    Ok(TaxableIncomeResult {
        taxable_income: round2(taxable_income),
        currency: REPORTING_CURRENCY,
        financial_year: FinancialYear::from_date(vesting.date),
        breakdown: IncomeBreakdown {
            market_value,
            cost_base,
            shares: vesting.shares_vested,
            share_price: vesting.share_price,
        },
        sale_adjustments,
        remaining_shares: vesting.shares_vested - sold_total,
    })
}
