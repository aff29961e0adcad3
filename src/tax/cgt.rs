use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::{round2, Converter, Currency, REPORTING_CURRENCY};
use crate::error::TaxError;
use crate::events::{ShareSaleEvent, VestingEvent};
use crate::tax::au::FinancialYear;
use crate::tax::discount::{self, CgtDiscountResult};
use crate::tax::income::{self, TaxableIncomeResult};
use crate::tax::thirty_day;

/// Which disposal rule produced a capital gains figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AppliedRule {
    /// Ordinary CGT treatment, discounted where eligible.
    StandardCgt,
    /// Disposal within 30 days of vesting; taxed as income, no CGT.
    ThirtyDay,
    /// No disposal rule applied.
    #[default]
    None,
}

impl AppliedRule {
    pub fn display(&self) -> &'static str {
        match self {
            AppliedRule::StandardCgt => "standard-cgt",
            AppliedRule::ThirtyDay => "30-day",
            AppliedRule::None => "none",
        }
    }
}

impl std::fmt::Display for AppliedRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Sale inputs behind a capital gains figure. Fees are in the reporting
/// currency; the sale price stays in the sale's own currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainsBreakdown {
    pub shares_sold: Decimal,
    pub sale_price: Decimal,
    pub fees: Decimal,
    pub acquisition_date: Option<NaiveDate>,
}

/// Capital gain or loss on a disposal, in the reporting currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalGainsResult {
    /// Signed final figure after any discount; positive means a gain.
    pub capital_gain: Decimal,
    /// Sign of the final figure, not the gross one.
    pub is_gain: bool,
    pub cost_base: Decimal,
    pub gross_proceeds: Decimal,
    /// Proceeds after fees.
    pub net_proceeds: Decimal,
    pub currency: Currency,
    pub financial_year: FinancialYear,
    pub applied_rule: AppliedRule,
    /// Absent when no acquisition date was available to measure holding.
    pub discount: Option<CgtDiscountResult>,
    pub breakdown: GainsBreakdown,
}

/// Capital gain for a sale processed independently of a vesting event,
/// typically a disposal more than 30 days after the relevant vesting.
///
/// The explicit `acquisition_date` wins over the one recorded on the sale;
/// with neither, the gain is reported undiscounted under standard CGT
/// treatment.
pub fn calculate_capital_gains(
    sale: &ShareSaleEvent,
    cost_base: Decimal,
    acquisition_date: Option<NaiveDate>,
    converter: &Converter,
) -> Result<CapitalGainsResult, TaxError> {
    if sale.shares_sold < Decimal::ZERO {
        return Err(TaxError::InvalidInput {
            reason: format!("negative shares sold: {}", sale.shares_sold),
        });
    }

    let gross_proceeds = sale.converted_proceeds(converter)?;
    let fees = sale.converted_fees(converter)?;
    let net_proceeds = gross_proceeds - fees;
    let gross_gain = net_proceeds - cost_base;

    let acquired = acquisition_date.or(sale.acquisition_date);
    let (capital_gain, discount) = match acquired {
        Some(acquired) => {
            let result = discount::evaluate(acquired, sale.date, gross_gain)?;
            log::debug!(
                "sale {}: gross gain={}, held {} days, discounted to {}",
                sale.date,
                gross_gain,
                result.holding_period_days,
                result.discounted_gain
            );
            (result.discounted_gain, Some(result))
        }
        None => (round2(gross_gain), None),
    };

    Ok(CapitalGainsResult {
        capital_gain,
        is_gain: capital_gain > Decimal::ZERO,
        cost_base,
        gross_proceeds,
        net_proceeds,
        currency: REPORTING_CURRENCY,
        financial_year: FinancialYear::from_date(sale.date),
        applied_rule: AppliedRule::StandardCgt,
        discount,
        breakdown: GainsBreakdown {
            shares_sold: sale.shares_sold,
            sale_price: sale.price_per_share,
            fees,
            acquisition_date: acquired,
        },
    })
}

/// Combined income and capital gains outcome of one vesting/sale pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VestingSaleOutcome {
    pub income: TaxableIncomeResult,
    pub capital_gains: CapitalGainsResult,
}

/// Process a single vesting event and a single sale against it end to end.
///
/// A sale within the 30-day window moves the taxing point to the sale, so
/// the disposal produces no capital gain at all. A later sale leaves the
/// vesting income fixed and realizes a gain over the sold shares' slice of
/// the vesting-date market value, which was already taxed as income and
/// therefore forms their cost base.
///
/// The income side is computed by [`income::calculate_taxable_income`] with
/// a one-element slice, so this specialization and the general reconciler
/// agree exactly.
pub fn process_vesting_and_sale(
    vesting: &VestingEvent,
    sale: &ShareSaleEvent,
    converter: &Converter,
) -> Result<VestingSaleOutcome, TaxError> {
    let rule = thirty_day::evaluate(vesting.date, sale.date)?;
    let income = income::calculate_taxable_income(vesting, std::slice::from_ref(sale), converter)?;

    let capital_gains = if rule.applies {
        let gross_proceeds = sale.converted_proceeds(converter)?;
        let fees = sale.converted_fees(converter)?;

        CapitalGainsResult {
            capital_gain: Decimal::ZERO,
            is_gain: false,
            cost_base: Decimal::ZERO,
            gross_proceeds,
            net_proceeds: gross_proceeds - fees,
            currency: REPORTING_CURRENCY,
            financial_year: FinancialYear::from_date(sale.date),
            applied_rule: AppliedRule::ThirtyDay,
            discount: None,
            breakdown: GainsBreakdown {
                shares_sold: sale.shares_sold,
                sale_price: sale.price_per_share,
                fees,
                acquisition_date: Some(vesting.date),
            },
        }
    } else {
        let proportion = if vesting.shares_vested.is_zero() {
            Decimal::ZERO
        } else {
            sale.shares_sold / vesting.shares_vested
        };
        let cgt_cost_base = round2(income.breakdown.market_value * proportion);
        calculate_capital_gains(sale, cgt_cost_base, Some(vesting.date), converter)?
    };

    Ok(VestingSaleOutcome {
        income,
        capital_gains,
    })
}
