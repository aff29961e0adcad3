use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::TaxError;

/// The currency all final results are expressed in.
pub const REPORTING_CURRENCY: Currency = Currency::Aud;

/// Currencies the engine recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Aud,
    Usd,
    Gbp,
    Eur,
    Nzd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Aud => "AUD",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Nzd => "NZD",
        }
    }

    /// Whether this is the reporting currency.
    pub fn is_reporting(&self) -> bool {
        *self == REPORTING_CURRENCY
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = TaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AUD" => Ok(Currency::Aud),
            "USD" => Ok(Currency::Usd),
            "GBP" => Ok(Currency::Gbp),
            "EUR" => Ok(Currency::Eur),
            "NZD" => Ok(Currency::Nzd),
            _ => Err(TaxError::UnknownCurrency {
                code: s.to_string(),
            }),
        }
    }
}

/// Round a monetary value to cents, half away from zero.
///
/// External reports must reproduce this rounding exactly to match official
/// tax-return figures, so it is part of the public contract.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Outcome of a single currency conversion.
///
/// An exchange rate of exactly 1 together with identical currencies signals
/// that no conversion was performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConversionResult {
    pub original_amount: Decimal,
    pub original_currency: Currency,
    pub converted_amount: Decimal,
    pub converted_currency: Currency,
    pub exchange_rate: Decimal,
    pub conversion_date: NaiveDate,
}

/// Converts foreign-currency amounts into the reporting currency.
///
/// The supported (source, target) pairs are explicit configuration; the
/// default converter handles the single USD -> AUD pair. The `current_date`
/// is injected at construction and used only when a same-currency amount
/// arrives without a date, so the engine never reads the system clock.
#[derive(Debug, Clone)]
pub struct Converter {
    pairs: Vec<(Currency, Currency)>,
    current_date: NaiveDate,
}

impl Converter {
    /// Converter supporting the default USD -> AUD pair.
    pub fn new(current_date: NaiveDate) -> Self {
        Converter {
            pairs: vec![(Currency::Usd, REPORTING_CURRENCY)],
            current_date,
        }
    }

    /// Replace the supported conversion pairs.
    pub fn with_pairs(mut self, pairs: Vec<(Currency, Currency)>) -> Self {
        self.pairs = pairs;
        self
    }

    fn supports(&self, from: Currency, to: Currency) -> bool {
        self.pairs.iter().any(|&(f, t)| f == from && t == to)
    }

    /// The first configured pair, used to label raw [`convert`] results.
    ///
    /// [`convert`]: Converter::convert
    fn primary_pair(&self) -> (Currency, Currency) {
        self.pairs
            .first()
            .copied()
            .unwrap_or((REPORTING_CURRENCY, REPORTING_CURRENCY))
    }

    /// Convert `amount` at `rate`, dividing and rounding to cents.
    ///
    /// The amount is taken to be in the foreign currency of the primary
    /// configured pair. Fails with `InvalidInput` when the amount is
    /// negative or the rate is not positive.
    pub fn convert(
        &self,
        amount: Decimal,
        rate: Decimal,
        date: NaiveDate,
    ) -> Result<CurrencyConversionResult, TaxError> {
        let converted = checked_rate_divide(amount, rate)?;
        let (from, to) = self.primary_pair();
        Ok(CurrencyConversionResult {
            original_amount: amount,
            original_currency: from,
            converted_amount: converted,
            converted_currency: to,
            exchange_rate: rate,
            conversion_date: date,
        })
    }

    /// Convert a per-unit price and quantity into the reporting currency.
    ///
    /// The source-currency amount is `price_per_unit * quantity`. When the
    /// currencies match the amount passes through unchanged with a rate of 1,
    /// dated with the supplied date or, absent that, the converter's current
    /// date. When they differ, the pair must be configured and both the rate
    /// and the date are required.
    pub fn convert_share_event(
        &self,
        price_per_unit: Decimal,
        quantity: Decimal,
        source: Currency,
        target: Currency,
        rate: Option<Decimal>,
        date: Option<NaiveDate>,
    ) -> Result<CurrencyConversionResult, TaxError> {
        let amount = price_per_unit * quantity;

        if source == target {
            return Ok(CurrencyConversionResult {
                original_amount: amount,
                original_currency: source,
                converted_amount: amount,
                converted_currency: target,
                exchange_rate: Decimal::ONE,
                conversion_date: date.unwrap_or(self.current_date),
            });
        }

        if !self.supports(source, target) {
            return Err(TaxError::UnsupportedConversion {
                from: source,
                to: target,
            });
        }
        let rate = rate.ok_or(TaxError::MissingExchangeRate { currency: source })?;
        let date = date.ok_or(TaxError::MissingConversionDate { currency: source })?;

        let converted = checked_rate_divide(amount, rate)?;
        Ok(CurrencyConversionResult {
            original_amount: amount,
            original_currency: source,
            converted_amount: converted,
            converted_currency: target,
            exchange_rate: rate,
            conversion_date: date,
        })
    }
}

fn checked_rate_divide(amount: Decimal, rate: Decimal) -> Result<Decimal, TaxError> {
    if amount < Decimal::ZERO {
        return Err(TaxError::InvalidInput {
            reason: format!("negative amount {amount}"),
        });
    }
    if rate <= Decimal::ZERO {
        return Err(TaxError::InvalidInput {
            reason: format!("non-positive exchange rate {rate}"),
        });
    }
    Ok(round2(amount / rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn converter() -> Converter {
        Converter::new(date("2025-06-30"))
    }

    #[test]
    fn convert_divides_and_rounds() {
        let result = converter()
            .convert(dec!(4000), dec!(0.65), date("2025-01-15"))
            .unwrap();
        assert_eq!(result.converted_amount, dec!(6153.85));
        assert_eq!(result.original_amount, dec!(4000));
        assert_eq!(result.exchange_rate, dec!(0.65));
        assert_eq!(result.original_currency, Currency::Usd);
        assert_eq!(result.converted_currency, Currency::Aud);
    }

    #[test]
    fn convert_rounds_half_up() {
        // 0.25 / 2 = 0.125, which must round to 0.13, not banker's 0.12
        let result = converter()
            .convert(dec!(0.25), dec!(2), date("2025-01-15"))
            .unwrap();
        assert_eq!(result.converted_amount, dec!(0.13));
    }

    #[test]
    fn convert_is_monotonic_in_amount() {
        let c = converter();
        let d = date("2025-01-15");
        let mut previous = Decimal::ZERO;
        for amount in [dec!(0), dec!(0.01), dec!(1), dec!(99.99), dec!(100), dec!(5000)] {
            let converted = c.convert(amount, dec!(0.65), d).unwrap().converted_amount;
            assert!(converted >= previous, "{converted} < {previous}");
            previous = converted;
        }
    }

    #[test]
    fn convert_rejects_negative_amount() {
        let err = converter()
            .convert(dec!(-1), dec!(0.65), date("2025-01-15"))
            .unwrap_err();
        assert!(matches!(err, TaxError::InvalidInput { .. }));
    }

    #[test]
    fn convert_rejects_non_positive_rate() {
        let c = converter();
        for rate in [dec!(0), dec!(-0.65)] {
            let err = c.convert(dec!(100), rate, date("2025-01-15")).unwrap_err();
            assert!(matches!(err, TaxError::InvalidInput { .. }));
        }
    }

    #[test]
    fn share_event_same_currency_passes_through() {
        let result = converter()
            .convert_share_event(
                dec!(50),
                dec!(250),
                Currency::Aud,
                Currency::Aud,
                None,
                Some(date("2025-02-01")),
            )
            .unwrap();
        assert_eq!(result.converted_amount, dec!(12500));
        assert_eq!(result.exchange_rate, Decimal::ONE);
        assert_eq!(result.conversion_date, date("2025-02-01"));
    }

    #[test]
    fn share_event_same_currency_falls_back_to_current_date() {
        let result = converter()
            .convert_share_event(dec!(50), dec!(10), Currency::Aud, Currency::Aud, None, None)
            .unwrap();
        assert_eq!(result.conversion_date, date("2025-06-30"));
    }

    #[test]
    fn share_event_foreign_requires_rate() {
        let err = converter()
            .convert_share_event(
                dec!(40),
                dec!(100),
                Currency::Usd,
                Currency::Aud,
                None,
                Some(date("2025-02-01")),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TaxError::MissingExchangeRate {
                currency: Currency::Usd
            }
        ));
    }

    #[test]
    fn share_event_foreign_requires_date() {
        let err = converter()
            .convert_share_event(
                dec!(40),
                dec!(100),
                Currency::Usd,
                Currency::Aud,
                Some(dec!(0.65)),
                None,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TaxError::MissingConversionDate {
                currency: Currency::Usd
            }
        ));
    }

    #[test]
    fn share_event_rejects_unsupported_pair() {
        let err = converter()
            .convert_share_event(
                dec!(40),
                dec!(100),
                Currency::Gbp,
                Currency::Usd,
                Some(dec!(0.5)),
                Some(date("2025-02-01")),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TaxError::UnsupportedConversion {
                from: Currency::Gbp,
                to: Currency::Usd
            }
        ));
    }

    #[test]
    fn extra_pairs_are_configurable() {
        let c = converter().with_pairs(vec![
            (Currency::Usd, Currency::Aud),
            (Currency::Gbp, Currency::Aud),
        ]);
        let result = c
            .convert_share_event(
                dec!(10),
                dec!(10),
                Currency::Gbp,
                Currency::Aud,
                Some(dec!(0.5)),
                Some(date("2025-02-01")),
            )
            .unwrap();
        assert_eq!(result.converted_amount, dec!(200));
    }

    #[test]
    fn share_event_usd_vesting() {
        // 100 shares at USD 40, rate 0.65 -> 6153.85 AUD
        let result = converter()
            .convert_share_event(
                dec!(40),
                dec!(100),
                Currency::Usd,
                Currency::Aud,
                Some(dec!(0.65)),
                Some(date("2025-02-01")),
            )
            .unwrap();
        assert_eq!(result.converted_amount, dec!(6153.85));
    }

    #[test]
    fn currency_codes_round_trip() {
        for currency in [
            Currency::Aud,
            Currency::Usd,
            Currency::Gbp,
            Currency::Eur,
            Currency::Nzd,
        ] {
            assert_eq!(currency.code().parse::<Currency>().unwrap(), currency);
        }
        assert!("aud".parse::<Currency>().is_ok());
        assert!(matches!(
            "XYZ".parse::<Currency>(),
            Err(TaxError::UnknownCurrency { .. })
        ));
    }

    #[test]
    fn only_aud_is_reporting() {
        assert!(Currency::Aud.is_reporting());
        assert!(!Currency::Usd.is_reporting());
    }
}
