//! Type-safe price representation using decimal arithmetic.
//!
//! The Storefront API returns money as `{ amount: "19.9", currencyCode: "USD" }`
//! with the amount as a decimal string. [`Price`] parses that pair once so
//! templates never have to deal with float rounding.

use core::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is not a valid decimal number.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// The currency code is not a three-letter ISO 4217 code.
    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),
}

/// A price with currency information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Parse a price from the API's decimal string and currency code.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not a decimal or the currency code
    /// is not three ASCII letters.
    pub fn parse(amount: &str, currency_code: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(amount.trim())
            .map_err(|_| PriceError::InvalidAmount(amount.to_string()))?;
        let currency_code = currency_code.parse::<CurrencyCode>()?;
        Ok(Self::new(amount, currency_code))
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Format for display (e.g., "$19.99", "¥1200", "12.00 CHF").
    #[must_use]
    pub fn display(&self) -> String {
        let mut amount = self.amount.round_dp_with_strategy(
            self.currency_code.minor_units(),
            RoundingStrategy::MidpointAwayFromZero,
        );
        amount.rescale(self.currency_code.minor_units());

        match self.currency_code.symbol() {
            Some(symbol) => format!("{symbol}{amount}"),
            None => format!("{amount} {}", self.currency_code.code()),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
///
/// Codes without a dedicated variant are kept verbatim in [`CurrencyCode::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    JPY,
    Other(String),
}

impl CurrencyCode {
    /// Display symbol, if the currency has a well-known one.
    #[must_use]
    pub const fn symbol(&self) -> Option<&'static str> {
        match self {
            Self::USD | Self::CAD | Self::AUD => Some("$"),
            Self::EUR => Some("€"),
            Self::GBP => Some("£"),
            Self::JPY => Some("¥"),
            Self::Other(_) => None,
        }
    }

    /// Three-letter code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
            Self::JPY => "JPY",
            Self::Other(code) => code,
        }
    }

    /// Number of decimal places shown for this currency.
    #[must_use]
    pub const fn minor_units(&self) -> u32 {
        match self {
            Self::JPY => 0,
            _ => 2,
        }
    }
}

impl FromStr for CurrencyCode {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PriceError::InvalidCurrency(s.to_string()));
        }

        Ok(match code.as_str() {
            "USD" => Self::USD,
            "EUR" => Self::EUR,
            "GBP" => Self::GBP,
            "CAD" => Self::CAD,
            "AUD" => Self::AUD,
            "JPY" => Self::JPY,
            _ => Self::Other(code),
        })
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = PriceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.code().to_string()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
