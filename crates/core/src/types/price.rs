//! Non-negative prices using decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// The amount is above [`Price::MAX`].
    #[error("price cannot exceed {max} (got {0})", max = Price::MAX.0)]
    TooLarge(Decimal),
    /// The amount has fractions of a cent.
    #[error("price cannot have more than two decimal places (got {0})")]
    TooPrecise(Decimal),
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A monetary amount in the store currency.
///
/// Constructed amounts are whole cents between zero and [`Price::MAX`], the
/// range of a `NUMERIC(10,2)` column. Arithmetic stays in [`Decimal`] so sums
/// are exact; computed totals may exceed `MAX` and saturate at
/// `Decimal::MAX` rather than overflow.
///
/// ```
/// use rust_decimal::Decimal;
/// use sage_kitchen_core::Price;
///
/// let price = Price::try_new(Decimal::new(1250, 2)).unwrap();
/// assert_eq!(price.times(2).display(), "$25.00");
/// assert!(Price::try_new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest accepted amount: 99,999,999.99.
    pub const MAX: Self = Self(Decimal::from_parts(1_410_065_407, 2, 0, false, 2));

    /// Create a price.
    ///
    /// # Errors
    ///
    /// - `PriceError::Negative` if `amount < 0`
    /// - `PriceError::TooLarge` if `amount > Price::MAX`
    /// - `PriceError::TooPrecise` if `amount` has more than two decimal places
    pub fn try_new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge(amount));
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::TooPrecise(amount));
        }
        Ok(Self(amount))
    }

    /// Whether this amount fits in [`Price::MAX`]; false only for computed
    /// totals.
    #[must_use]
    pub fn is_storable(&self) -> bool {
        self.0 <= Self::MAX.0
    }

    /// The raw decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// This price multiplied by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(
            self.0
                .checked_mul(Decimal::from(quantity))
                .unwrap_or(Decimal::MAX),
        )
    }

    /// Format for display, e.g. `$19.99`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.0.round_dp(2))
    }

    /// Whether this is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::try_new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|e| PriceError::Invalid(e.to_string()))?;
        Self::try_new(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.checked_add(rhs.0).unwrap_or(Decimal::MAX))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::try_new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert_eq!(
            Price::try_new(dec!(-0.01)),
            Err(PriceError::Negative(dec!(-0.01)))
        );
    }

    #[test]
    fn test_accepts_zero() {
        assert!(Price::try_new(dec!(0)).unwrap().is_zero());
    }

    #[test]
    fn test_times_and_sum_are_exact() {
        let a = Price::try_new(dec!(0.10)).unwrap();
        let b = Price::try_new(dec!(0.20)).unwrap();
        let total: Price = [a.times(3), b].into_iter().sum();
        assert_eq!(total.amount(), dec!(0.50));
    }

    #[test]
    fn test_display_rounds_to_cents() {
        assert_eq!(Price::try_new(dec!(10)).unwrap().display(), "$10.00");
        assert_eq!(Price::try_new(dec!(3.5)).unwrap().display(), "$3.50");
    }

    #[test]
    fn test_max_matches_column_range() {
        assert_eq!(Price::MAX.amount(), dec!(99999999.99));
        assert!(Price::try_new(dec!(99999999.99)).is_ok());
        assert_eq!(
            Price::try_new(dec!(100000000)),
            Err(PriceError::TooLarge(dec!(100000000)))
        );
        assert!(matches!(
            Price::try_new(Decimal::MAX),
            Err(PriceError::TooLarge(_))
        ));
    }

    #[test]
    fn test_rejects_fractions_of_a_cent() {
        assert_eq!(
            Price::try_new(dec!(3.456)),
            Err(PriceError::TooPrecise(dec!(3.456)))
        );
        assert_eq!(Price::try_new(dec!(3.5000)).unwrap().amount(), dec!(3.5000));
    }

    #[test]
    fn test_arithmetic_saturates_instead_of_panicking() {
        let huge = Price(Decimal::MAX);
        assert_eq!((huge + Price::MAX).amount(), Decimal::MAX);
        assert_eq!(
            Price::MAX.times(u32::MAX).amount(),
            dec!(99999999.99) * Decimal::from(u32::MAX)
        );
        assert_eq!(huge.times(2).amount(), Decimal::MAX);
        assert!(!huge.is_storable());
        assert!(Price::MAX.is_storable());
    }

    #[test]
    fn test_parse() {
        assert_eq!("12.5".parse::<Price>().unwrap().amount(), dec!(12.5));
        assert!(matches!("abc".parse::<Price>(), Err(PriceError::Invalid(_))));
        assert!(matches!("-3".parse::<Price>(), Err(PriceError::Negative(_))));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Price = serde_json::from_str("\"9.99\"").unwrap();
        assert_eq!(ok.amount(), dec!(9.99));
        assert!(serde_json::from_str::<Price>("\"-1\"").is_err());
    }
}
