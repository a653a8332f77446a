//! # Money Module
//!
//! Provides the `Money` type for menu prices, order totals and discounts.
//!
//! ## Whole Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Menu prices are whole rupees (₹120, ₹50). There is no minor unit in   │
//! │  any price, total or discount the cafe handles, so Money wraps a       │
//! │  plain i64 count of whole units.                                       │
//! │                                                                         │
//! │  The only fractional step is a percentage discount:                    │
//! │    ₹1000 × 10%   = ₹100                                                │
//! │    ₹135  × 10%   = ₹13.5  → ₹14   (round half up)                      │
//! │                                                                         │
//! │  Percentages are held in basis points (DiscountRate) so the whole      │
//! │  computation stays in integers.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cafe_core::money::Money;
//! use cafe_core::types::DiscountRate;
//!
//! let total = Money::new(135);
//! let off = total.percent(DiscountRate::from_percent(10.0));
//! assert_eq!(off.amount(), 14);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

use crate::types::DiscountRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole currency units.
///
/// Serializes as a bare number so it can sit directly in wire records
/// (`"Total": 300`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole units.
    #[inline]
    pub const fn new(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the value in whole units.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies a unit price by a quantity, saturating at the `i64`
    /// bounds.
    #[inline]
    pub const fn times(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Applies a percentage, rounding half up to the nearest whole unit.
    ///
    /// ## Implementation
    /// `(amount × bps + 5000) / 10000` in i128. For non-negative amounts the
    /// `+5000` makes exact halves round up (13.5 → 14).
    ///
    /// ## Example
    /// ```rust
    /// use cafe_core::money::Money;
    /// use cafe_core::types::DiscountRate;
    ///
    /// let subtotal = Money::new(1000);
    /// assert_eq!(subtotal.percent(DiscountRate::from_percent(10.0)).amount(), 100);
    ///
    /// // 25 × 10% = 2.5 → 3
    /// assert_eq!(Money::new(25).percent(DiscountRate::from_percent(10.0)).amount(), 3);
    /// ```
    pub fn percent(&self, rate: DiscountRate) -> Money {
        let scaled = self.0 as i128 * rate.bps() as i128;
        Money((scaled + 5000).div_euclid(10000) as i64)
    }

    /// Subtracts, flooring the result at zero.
    #[inline]
    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Rupee display, used in log lines and receipts.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-₹{}", self.0.unsigned_abs())
        } else {
            write!(f, "₹{}", self.0)
        }
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.times(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Money(amount)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::new(120).to_string(), "₹120");
        assert_eq!(Money::new(0).to_string(), "₹0");
        assert_eq!(Money::new(-50).to_string(), "-₹50");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::new(100);
        let b = Money::new(50);

        assert_eq!((a + b).amount(), 150);
        assert_eq!((a - b).amount(), 50);
        assert_eq!((a * 3).amount(), 300);
        assert_eq!(a.times(2).amount(), 200);
    }

    #[test]
    fn test_arithmetic_saturates_instead_of_panicking() {
        let huge = Money::new(i64::MAX / 50);
        assert_eq!(huge.times(99).amount(), i64::MAX);
        assert_eq!((huge * 99).amount(), i64::MAX);
        assert_eq!((Money::new(i64::MAX) + Money::new(1)).amount(), i64::MAX);

        let mut running = Money::new(i64::MAX - 1);
        running += Money::new(10);
        assert_eq!(running.amount(), i64::MAX);

        let total: Money = [huge.times(99), Money::new(50)].into_iter().sum();
        assert_eq!(total.amount(), i64::MAX);
    }

    #[test]
    fn test_percent_rounds_half_up() {
        let rate = DiscountRate::from_percent(10.0);
        assert_eq!(Money::new(1000).percent(rate).amount(), 100);
        assert_eq!(Money::new(135).percent(rate).amount(), 14);
        assert_eq!(Money::new(25).percent(rate).amount(), 3);
        assert_eq!(Money::new(24).percent(rate).amount(), 2);
    }

    #[test]
    fn test_percent_of_zero_and_full() {
        assert_eq!(Money::zero().percent(DiscountRate::from_percent(50.0)).amount(), 0);
        assert_eq!(Money::new(480).percent(DiscountRate::from_percent(100.0)).amount(), 480);
        assert_eq!(Money::new(480).percent(DiscountRate::zero()).amount(), 0);
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        assert_eq!(Money::new(100).saturating_sub(Money::new(30)).amount(), 70);
        assert_eq!(Money::new(100).saturating_sub(Money::new(300)).amount(), 0);
    }

    #[test]
    fn test_sum_and_serde_transparent() {
        let total: Money = [Money::new(200), Money::new(50)].into_iter().sum();
        assert_eq!(total.amount(), 250);
        assert_eq!(serde_json::to_string(&total).unwrap(), "250");
        let back: Money = serde_json::from_str("250").unwrap();
        assert_eq!(back, total);
    }
}
