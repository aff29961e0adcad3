use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::currency::{Converter, Currency, REPORTING_CURRENCY};
use crate::error::TaxError;

/// Unified JSON input format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxInput {
    #[serde(default)]
    pub vestings: Vec<VestingEventRecord>,
    #[serde(default)]
    pub sales: Vec<ShareSaleEventRecord>,
}

/// One RSU tranche becoming taxable at its vest date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VestingEvent {
    pub date: NaiveDate,
    /// Price per share, in `currency`.
    pub share_price: Decimal,
    /// Non-negative; fractional shares allowed.
    pub shares_vested: Decimal,
    /// Amount paid for the shares, in `currency`.
    pub cost_base: Decimal,
    pub currency: Currency,
    /// Mandatory when `currency` is not the reporting currency.
    pub exchange_rate: Option<Decimal>,
}

impl VestingEvent {
    /// Market value of the tranche in its own currency.
    pub fn market_value(&self) -> Decimal {
        self.share_price * self.shares_vested
    }

    /// Market value converted to the reporting currency at the vest date.
    pub fn converted_market_value(&self, converter: &Converter) -> Result<Decimal, TaxError> {
        Ok(converter
            .convert_share_event(
                self.share_price,
                self.shares_vested,
                self.currency,
                REPORTING_CURRENCY,
                self.exchange_rate,
                Some(self.date),
            )?
            .converted_amount)
    }

    /// Cost base converted to the reporting currency at the vest date.
    pub fn converted_cost_base(&self, converter: &Converter) -> Result<Decimal, TaxError> {
        Ok(converter
            .convert_share_event(
                self.cost_base,
                Decimal::ONE,
                self.currency,
                REPORTING_CURRENCY,
                self.exchange_rate,
                Some(self.date),
            )?
            .converted_amount)
    }
}

/// A disposal of shares out of a vested tranche.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareSaleEvent {
    pub date: NaiveDate,
    pub shares_sold: Decimal,
    /// Price per share, in `currency`.
    pub price_per_share: Decimal,
    pub currency: Currency,
    /// Mandatory when `currency` is not the reporting currency.
    pub exchange_rate: Option<Decimal>,
    pub brokerage_fee: Decimal,
    pub supplemental_fees: Decimal,
    /// Only consulted by the standalone capital-gains path; the reconciler
    /// always measures from the vesting date.
    pub acquisition_date: Option<NaiveDate>,
}

impl ShareSaleEvent {
    /// Gross proceeds of the sale in its own currency.
    pub fn gross_proceeds(&self) -> Decimal {
        self.price_per_share * self.shares_sold
    }

    /// Total fees in the sale's own currency.
    pub fn total_fees(&self) -> Decimal {
        self.brokerage_fee + self.supplemental_fees
    }

    /// Gross proceeds converted to the reporting currency at the sale date.
    pub fn converted_proceeds(&self, converter: &Converter) -> Result<Decimal, TaxError> {
        Ok(converter
            .convert_share_event(
                self.price_per_share,
                self.shares_sold,
                self.currency,
                REPORTING_CURRENCY,
                self.exchange_rate,
                Some(self.date),
            )?
            .converted_amount)
    }

    /// Total fees converted to the reporting currency at the sale date.
    pub fn converted_fees(&self, converter: &Converter) -> Result<Decimal, TaxError> {
        Ok(converter
            .convert_share_event(
                self.total_fees(),
                Decimal::ONE,
                self.currency,
                REPORTING_CURRENCY,
                self.exchange_rate,
                Some(self.date),
            )?
            .converted_amount)
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, TaxError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| TaxError::InvalidDate {
        value: s.to_string(),
    })
}

/// CSV/JSON record format for vesting events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VestingEventRecord {
    pub date: String,
    pub share_price: Decimal,
    pub shares_vested: Decimal,
    #[serde(default)]
    pub cost_base: Option<Decimal>,
    pub currency: String,
    #[serde(default)]
    pub exchange_rate: Option<Decimal>,
}

impl TryFrom<VestingEventRecord> for VestingEvent {
    type Error = TaxError;

    fn try_from(record: VestingEventRecord) -> Result<Self, Self::Error> {
        Ok(VestingEvent {
            date: parse_date(&record.date)?,
            share_price: record.share_price,
            shares_vested: record.shares_vested,
            cost_base: record.cost_base.unwrap_or(Decimal::ZERO),
            currency: record.currency.parse()?,
            exchange_rate: record.exchange_rate,
        })
    }
}

impl From<&VestingEvent> for VestingEventRecord {
    fn from(event: &VestingEvent) -> Self {
        VestingEventRecord {
            date: event.date.format("%Y-%m-%d").to_string(),
            share_price: event.share_price,
            shares_vested: event.shares_vested,
            cost_base: Some(event.cost_base),
            currency: event.currency.code().to_string(),
            exchange_rate: event.exchange_rate,
        }
    }
}

/// CSV/JSON record format for share sale events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareSaleEventRecord {
    pub date: String,
    pub shares_sold: Decimal,
    pub price_per_share: Decimal,
    pub currency: String,
    #[serde(default)]
    pub exchange_rate: Option<Decimal>,
    #[serde(default)]
    pub brokerage_fee: Option<Decimal>,
    #[serde(default)]
    pub supplemental_fees: Option<Decimal>,
    #[serde(default)]
    pub acquisition_date: Option<String>,
}

impl TryFrom<ShareSaleEventRecord> for ShareSaleEvent {
    type Error = TaxError;

    fn try_from(record: ShareSaleEventRecord) -> Result<Self, Self::Error> {
        let acquisition_date = record
            .acquisition_date
            .as_deref()
            .map(parse_date)
            .transpose()?;
        Ok(ShareSaleEvent {
            date: parse_date(&record.date)?,
            shares_sold: record.shares_sold,
            price_per_share: record.price_per_share,
            currency: record.currency.parse()?,
            exchange_rate: record.exchange_rate,
            brokerage_fee: record.brokerage_fee.unwrap_or(Decimal::ZERO),
            supplemental_fees: record.supplemental_fees.unwrap_or(Decimal::ZERO),
            acquisition_date,
        })
    }
}

impl From<&ShareSaleEvent> for ShareSaleEventRecord {
    fn from(event: &ShareSaleEvent) -> Self {
        ShareSaleEventRecord {
            date: event.date.format("%Y-%m-%d").to_string(),
            shares_sold: event.shares_sold,
            price_per_share: event.price_per_share,
            currency: event.currency.code().to_string(),
            exchange_rate: event.exchange_rate,
            brokerage_fee: Some(event.brokerage_fee),
            supplemental_fees: Some(event.supplemental_fees),
            acquisition_date: event
                .acquisition_date
                .map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Read vesting events from CSV
pub fn read_vestings_csv<R: Read>(reader: R) -> Result<Vec<VestingEvent>, TaxError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let records: Result<Vec<VestingEventRecord>, _> =
        rdr.deserialize::<VestingEventRecord>().collect();
    let mut events: Vec<VestingEvent> = records?
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<_, _>>()?;
    events.sort_by_key(|e| e.date);
    Ok(events)
}

/// Read share sale events from CSV
pub fn read_sales_csv<R: Read>(reader: R) -> Result<Vec<ShareSaleEvent>, TaxError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let records: Result<Vec<ShareSaleEventRecord>, _> =
        rdr.deserialize::<ShareSaleEventRecord>().collect();
    let mut events: Vec<ShareSaleEvent> = records?
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<_, _>>()?;
    events.sort_by_key(|e| e.date);
    Ok(events)
}

/// Read vesting and sale events from JSON
pub fn read_json<R: Read>(reader: R) -> Result<(Vec<VestingEvent>, Vec<ShareSaleEvent>), TaxError> {
    let input: TaxInput = serde_json::from_reader(reader)?;
    let mut vestings: Vec<VestingEvent> = input
        .vestings
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<_, _>>()?;
    let mut sales: Vec<ShareSaleEvent> = input
        .sales
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<_, _>>()?;
    vestings.sort_by_key(|e| e.date);
    sales.sort_by_key(|e| e.date);
    Ok((vestings, sales))
}
