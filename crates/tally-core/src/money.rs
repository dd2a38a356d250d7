//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    23.0 * 0.9 = 20.700000000000003  ❌ WRONG!                           │
//! │                                                                         │
//! │  Discounts stack multiplicatively, so cents alone are not enough:      │
//! │    $0.99 at 10% off = $0.891 (not representable in cents)              │
//! │                                                                         │
//! │  OUR SOLUTION: Exact Decimals                                           │
//! │    rust_decimal keeps 28 significant digits, base 10.                  │
//! │    23.0 * 0.9 = 20.70 exactly; rounding happens only for display.      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//!
//! let doubled = price * 2;                      // $21.98
//! let total = price + Money::from_cents(500);   // $15.99
//! assert_eq!(total.to_string(), "$15.99");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Whole currency units in [`Money::max_amount`].
pub const MAX_AMOUNT_UNITS: i64 = 1_000_000_000_000;

/// A monetary value in the store currency.
///
/// ## Design Decisions
/// - **Decimal (signed)**: negative values are legal (over-discounted lines)
/// - **Single field tuple struct**: zero-cost abstraction over `Decimal`
/// - **No implicit rounding**: computed values keep full precision;
///   [`Money::rounded`] and `Display` are the only places that round
///
/// ## Where Money is Used
/// ```text
/// Product.price ──► LineItem unit price ──► line total ──► cart total
///                                                              │
///                         SaleRequest.total ◄──────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(#[ts(type = "number")] Decimal);

impl Money {
    /// Wraps a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.to_string(), "$10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is strictly negative.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Largest magnitude a price, line or sale amount may take: one trillion.
    ///
    /// Every checked operation below stays far from `Decimal`'s own limit
    /// as long as its inputs are within this bound.
    pub fn max_amount() -> Money {
        Money(Decimal::from(MAX_AMOUNT_UNITS))
    }

    /// True when `|self| <= Money::max_amount()`.
    #[inline]
    pub fn is_within_limit(&self) -> bool {
        self.0.abs() <= Decimal::from(MAX_AMOUNT_UNITS)
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtracts `other`, `None` on overflow.
    #[inline]
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Multiplies money by a quantity, `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.checked_mul_quantity(3), Some(Money::from_cents(897)));
    /// ```
    #[inline]
    pub fn checked_mul_quantity(&self, qty: i64) -> Option<Money> {
        self.0.checked_mul(Decimal::from(qty)).map(Money)
    }

    /// Applies a percentage discount: `amount * (1 - percent / 100)`.
    ///
    /// The percentage is not bounded; values above 100 yield a negative
    /// amount. `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use tally_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(2300);
    /// let discounted = subtotal.checked_percentage_discount(Decimal::from(10));
    /// assert_eq!(discounted, Some(Money::from_cents(2070)));
    /// ```
    pub fn checked_percentage_discount(&self, percent: Decimal) -> Option<Money> {
        let factor = Decimal::ONE.checked_sub(percent.checked_div(Decimal::ONE_HUNDRED)?)?;
        self.0.checked_mul(factor).map(Money)
    }

    /// Sums amounts in order, `None` if any partial sum overflows.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |total, amount| total.checked_add(amount))
    }

    /// Rounds to two decimal places, half away from zero.
    ///
    /// Presentation only: pricing never calls this.
    pub fn rounded(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================
//
// The operators panic on overflow exactly like `Decimal`'s. Pricing and
// reporting go through the `checked_*` methods instead.

/// Shows money rounded to cents, e.g. `$20.70` or `-$5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded().0;
        let sign = if rounded < Decimal::ZERO { "-" } else { "" };
        write!(f, "{}${:.2}", sign, rounded.abs())
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * Decimal::from(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.amount(), dec!(10.99));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_cents(500).to_string(), "$5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
        assert_eq!(Money::new(dec!(0.891)).to_string(), "$0.89");
        assert_eq!(Money::new(dec!(0.125)).to_string(), "$0.13");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!(a + b, Money::from_cents(1500));
        assert_eq!(a - b, Money::from_cents(500));
        assert_eq!(a * 3, Money::from_cents(3000));
        assert_eq!(-b, Money::from_cents(-500));
    }

    #[test]
    fn test_percentage_discount_is_exact() {
        let subtotal = Money::new(dec!(23.0));
        let discounted = subtotal.checked_percentage_discount(dec!(10)).unwrap();
        assert_eq!(discounted.amount(), dec!(20.70));
    }

    #[test]
    fn test_percentage_discount_keeps_fractions() {
        let discounted = Money::from_cents(99)
            .checked_percentage_discount(dec!(10))
            .unwrap();
        assert_eq!(discounted.amount(), dec!(0.891));
        assert_eq!(discounted.rounded(), Money::from_cents(89));
    }

    #[test]
    fn test_discount_over_hundred_percent_goes_negative() {
        let discounted = Money::from_cents(1000)
            .checked_percentage_discount(dec!(150))
            .unwrap();
        assert!(discounted.is_negative());
        assert_eq!(discounted, Money::from_cents(-500));
    }

    #[test]
    fn test_checked_ops_report_overflow() {
        let huge = Money::new(Decimal::MAX);

        assert_eq!(huge.checked_add(Money::from_cents(100)), None);
        assert_eq!(Money::new(Decimal::MIN).checked_sub(Money::from_cents(100)), None);
        assert_eq!(Money::new(dec!(100000000000)).checked_mul_quantity(i64::MAX), None);
        assert_eq!(
            Money::new(dec!(1000000000000000000)).checked_percentage_discount(Decimal::from_i128_with_scale(10i128.pow(27), 0)),
            None
        );
        assert_eq!(Money::checked_sum([huge, huge]), None);
        assert_eq!(
            Money::checked_sum([Money::from_cents(100), Money::from_cents(250)]),
            Some(Money::from_cents(350))
        );
    }

    #[test]
    fn test_amount_limit() {
        assert!(Money::max_amount().is_within_limit());
        assert!((-Money::max_amount()).is_within_limit());
        assert!(!(Money::max_amount() + Money::from_cents(1)).is_within_limit());
    }

    #[test]
    fn test_sum() {
        let amounts = [Money::from_cents(100), Money::from_cents(250)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total, Money::from_cents(350));

        let empty: Money = Vec::<Money>::new().into_iter().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_parse() {
        assert_eq!("20.70".parse::<Money>().unwrap(), Money::from_cents(2070));
        assert!("twenty".parse::<Money>().is_err());
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Money::from_cents(1050)).unwrap();
        assert_eq!(json, "10.5");

        let parsed: Money = serde_json::from_str("1.5").unwrap();
        assert_eq!(parsed, Money::from_cents(150));
    }
}
