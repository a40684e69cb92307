//! Money Math
//!
//! Catalog prices are `rust_decimal` values in major currency units (rupees).
//! Everything that leaves for the payment gateway is converted to integer
//! minor units (paise) first; no floats ever touch an amount.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Default GST rate applied at checkout, overridable via configuration.
pub const DEFAULT_TAX_RATE_PERCENT: u32 = 18;

/// An amount in integer minor currency units (e.g. paise).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinorUnits(i64);

impl MinorUnits {
    pub const ZERO: Self = Self(0);

    /// Wrap a raw minor-unit amount
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Convert a major-unit decimal price into minor units.
    ///
    /// Rounds half-away-from-zero at the second decimal place, so a price of
    /// `9999.00` becomes `999900`.
    pub fn from_price(price: Decimal) -> Result<Self> {
        let scaled = (price * Decimal::from(100))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        scaled
            .to_i64()
            .map(Self)
            .ok_or_else(|| CoreError::AmountOutOfRange(price.to_string()))
    }

    /// Apply a percentage tax rate, rounding half up.
    ///
    /// `999900` at 18% yields `1179882`.
    pub fn with_tax(self, rate_percent: u32) -> Result<Self> {
        let gross = i128::from(self.0) * i128::from(100 + rate_percent);
        let rounded = (gross + 50) / 100;
        i64::try_from(rounded)
            .map(Self)
            .map_err(|_| CoreError::AmountOutOfRange(format!("{} @ {}%", self.0, rate_percent)))
    }

    /// Raw minor-unit value
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_to_minor_units() {
        assert_eq!(MinorUnits::from_price(dec!(9999)).unwrap().value(), 999_900);
        assert_eq!(MinorUnits::from_price(dec!(0)).unwrap().value(), 0);
        assert_eq!(MinorUnits::from_price(dec!(49.99)).unwrap().value(), 4_999);
    }

    #[test]
    fn test_standard_plan_with_gst() {
        // 9999.00 plus 18% GST = 11798.82, i.e. 1179882 paise
        let total = MinorUnits::from_price(dec!(9999))
            .unwrap()
            .with_tax(18)
            .unwrap();
        assert_eq!(total.value(), 1_179_882);
    }

    #[test]
    fn test_zero_price_with_tax() {
        let total = MinorUnits::ZERO.with_tax(18).unwrap();
        assert_eq!(total.value(), 0);
    }

    #[test]
    fn test_tax_rounding_half_up() {
        // 101 paise at 18% is 119.18, rounds down to 119
        assert_eq!(MinorUnits::new(101).with_tax(18).unwrap().value(), 119);
        // 25 paise at 18% is 29.5, rounds up to 30
        assert_eq!(MinorUnits::new(25).with_tax(18).unwrap().value(), 30);
    }
}
