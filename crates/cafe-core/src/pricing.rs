//! # Pricing Engine
//!
//! Pure, deterministic arithmetic for order totals.
//!
//! ## Order Total Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  food items ──► subtotal() ─────────────┐                               │
//! │  (sentinel excluded)                    │                               │
//! │                                         ▼                               │
//! │  mode ─────────────────────► delivery_surcharge()                       │
//! │                              Delivery && 0 < subtotal < 500 → 50        │
//! │                                         │                               │
//! │                                         ▼                               │
//! │                    apply_delivery_fee() adds DELIVERY_FEE line          │
//! │                                         │                               │
//! │                                         ▼                               │
//! │                    order total = Σ all lines (stored as "Total")        │
//! │                                         │                               │
//! │             at close:                   ▼                               │
//! │             pct / amt ──────► discount() ──► final_amount()             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{DiscountRate, FulfillmentMode, LineItem};
use crate::{DELIVERY_FEE, FREE_DELIVERY_THRESHOLD};

// =============================================================================
// Core Arithmetic
// =============================================================================

/// Σ(qty × price) over food items. The delivery-fee sentinel is excluded.
pub fn subtotal(items: &[LineItem]) -> Money {
    items
        .iter()
        .filter(|item| !item.is_delivery_fee())
        .map(LineItem::line_total)
        .sum()
}

/// Σ(qty × price) over every line, sentinel included.
pub fn line_sum(items: &[LineItem]) -> Money {
    items.iter().map(LineItem::line_total).sum()
}

/// Resolves a discount.
///
/// A positive percentage wins: `round_half_up(subtotal × pct / 100)`.
/// Otherwise the absolute amount applies, clamped to `[0, subtotal]`.
/// The result never exceeds `subtotal`.
///
/// ## Example
/// ```rust
/// use cafe_core::money::Money;
/// use cafe_core::pricing::discount;
/// use cafe_core::types::DiscountRate;
///
/// let s = Money::new(1000);
/// assert_eq!(discount(s, DiscountRate::from_percent(10.0), Money::zero()).amount(), 100);
/// assert_eq!(discount(s, DiscountRate::zero(), Money::new(5000)).amount(), 1000);
/// ```
pub fn discount(subtotal: Money, rate: DiscountRate, amount: Money) -> Money {
    let subtotal = subtotal.max(Money::zero());
    let raw = if !rate.is_zero() {
        subtotal.percent(rate)
    } else {
        amount.max(Money::zero())
    };
    raw.min(subtotal)
}

/// `max(subtotal − discount, 0)`.
#[inline]
pub fn final_amount(subtotal: Money, discount: Money) -> Money {
    subtotal.saturating_sub(discount)
}

/// Flat fee when mode is Delivery and `0 < food_subtotal < 500`.
pub fn delivery_surcharge(mode: FulfillmentMode, food_subtotal: Money) -> Money {
    let eligible = mode == FulfillmentMode::Delivery
        && food_subtotal.is_positive()
        && food_subtotal < Money::new(FREE_DELIVERY_THRESHOLD);

    if eligible {
        Money::new(DELIVERY_FEE)
    } else {
        Money::zero()
    }
}

/// Drops any existing delivery-fee line and appends a fresh one when the
/// surcharge applies. Idempotent.
pub fn apply_delivery_fee(items: Vec<LineItem>, mode: FulfillmentMode) -> Vec<LineItem> {
    let mut food: Vec<LineItem> = items.into_iter().filter(|i| !i.is_delivery_fee()).collect();
    if delivery_surcharge(mode, subtotal(&food)).is_positive() {
        food.push(LineItem::delivery_fee());
    }
    food
}

// =============================================================================
// Quotes
// =============================================================================

/// Totals shown in the cart and stored with the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PriceBreakdown {
    pub food_subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
}

/// Prices a set of food items for a mode. Any sentinel in `items` is ignored
/// and the fee is recomputed.
pub fn quote(items: &[LineItem], mode: FulfillmentMode) -> PriceBreakdown {
    let food_subtotal = subtotal(items);
    let delivery_fee = delivery_surcharge(mode, food_subtotal);
    PriceBreakdown {
        food_subtotal,
        delivery_fee,
        total: food_subtotal + delivery_fee,
    }
}

/// Result of settling an order at close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CloseQuote {
    /// Percentage actually applied (0 when an absolute amount was used).
    pub discount_percent: f64,
    pub discount: Money,
    pub final_amount: Money,
}

/// Settles an order total with the close dialog's inputs.
///
/// The base is the stored order total (delivery fee included), matching
/// what the manager sees in the dialog.
pub fn close_quote(total: Money, percent: f64, amount: Money) -> CloseQuote {
    let rate = DiscountRate::from_percent(percent);
    let discount = discount(total, rate, amount);
    CloseQuote {
        discount_percent: rate.percent(),
        discount,
        final_amount: final_amount(total, discount),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn items(pairs: &[(i64, i64)]) -> Vec<LineItem> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, &(price, qty))| LineItem::new(format!("item-{i}"), "Item", qty, price))
            .collect()
    }

    #[test]
    fn test_subtotal_excludes_sentinel() {
        let mut lines = items(&[(100, 2), (50, 1)]);
        assert_eq!(subtotal(&lines).amount(), 250);

        lines.push(LineItem::delivery_fee());
        assert_eq!(subtotal(&lines).amount(), 250);
        assert_eq!(line_sum(&lines).amount(), 300);
    }

    #[test]
    fn test_subtotal_is_exact_sum() {
        let grid = [(0, 1), (1, 1), (99, 99), (1250, 3), (7, 0)];
        for &(price, qty) in &grid {
            let lines = items(&[(price, qty), (40, 2)]);
            assert_eq!(subtotal(&lines).amount(), price * qty + 80);
        }
    }

    #[test]
    fn test_discount_percent() {
        let d = discount(Money::new(1000), DiscountRate::from_percent(10.0), Money::zero());
        assert_eq!(d.amount(), 100);
        assert_eq!(final_amount(Money::new(1000), d).amount(), 900);
    }

    #[test]
    fn test_discount_percent_rounding_and_range() {
        for s in [0_i64, 1, 5, 99, 135, 1001, 4999] {
            for p in [0_u32, 1, 10, 33, 50, 99, 100] {
                let subtotal = Money::new(s);
                let d = discount(subtotal, DiscountRate::from_bps(p * 100), Money::zero());
                // round half up of s*p/100
                let expected = (s * p as i64 * 2 + 100) / 200;
                assert_eq!(d.amount(), expected, "s={s} p={p}");
                assert_eq!(final_amount(subtotal, d).amount(), s - expected);
            }
        }
    }

    #[test]
    fn test_discount_never_exceeds_subtotal() {
        let s = Money::new(300);
        assert_eq!(discount(s, DiscountRate::zero(), Money::new(1000)).amount(), 300);
        assert_eq!(discount(s, DiscountRate::from_percent(150.0), Money::zero()).amount(), 300);
        assert_eq!(discount(s, DiscountRate::zero(), Money::new(-20)).amount(), 0);
        assert_eq!(final_amount(s, Money::new(1000)).amount(), 0);
    }

    #[test]
    fn test_percent_wins_over_amount() {
        let d = discount(Money::new(1000), DiscountRate::from_percent(5.0), Money::new(400));
        assert_eq!(d.amount(), 50);
    }

    #[test]
    fn test_delivery_surcharge_bounds() {
        let mode = FulfillmentMode::Delivery;
        assert_eq!(delivery_surcharge(mode, Money::new(0)).amount(), 0);
        assert_eq!(delivery_surcharge(mode, Money::new(1)).amount(), 50);
        assert_eq!(delivery_surcharge(mode, Money::new(499)).amount(), 50);
        assert_eq!(delivery_surcharge(mode, Money::new(500)).amount(), 0);
        assert_eq!(delivery_surcharge(mode, Money::new(900)).amount(), 0);

        assert_eq!(delivery_surcharge(FulfillmentMode::DineIn, Money::new(200)).amount(), 0);
        assert_eq!(delivery_surcharge(FulfillmentMode::Takeaway, Money::new(200)).amount(), 0);
    }

    #[test]
    fn test_delivery_scenario() {
        let quote = quote(&items(&[(100, 2), (50, 1)]), FulfillmentMode::Delivery);
        assert_eq!(quote.food_subtotal.amount(), 250);
        assert_eq!(quote.delivery_fee.amount(), 50);
        assert_eq!(quote.total.amount(), 300);
    }

    #[test]
    fn test_apply_delivery_fee_is_idempotent() {
        let once = apply_delivery_fee(items(&[(120, 2)]), FulfillmentMode::Delivery);
        assert_eq!(once.iter().filter(|i| i.is_delivery_fee()).count(), 1);

        let twice = apply_delivery_fee(once.clone(), FulfillmentMode::Delivery);
        assert_eq!(once, twice);
        assert_eq!(line_sum(&twice).amount(), 290);
    }

    #[test]
    fn test_apply_delivery_fee_removes_stale_fee() {
        let mut lines = items(&[(300, 2)]);
        lines.push(LineItem::delivery_fee());
        let fixed = apply_delivery_fee(lines, FulfillmentMode::Delivery);
        assert!(fixed.iter().all(|i| !i.is_delivery_fee()));

        let mut lines = items(&[(100, 1)]);
        lines.push(LineItem::delivery_fee());
        let fixed = apply_delivery_fee(lines, FulfillmentMode::Takeaway);
        assert!(fixed.iter().all(|i| !i.is_delivery_fee()));
    }

    #[test]
    fn test_close_quote_on_total() {
        let quote = close_quote(Money::new(1000), 10.0, Money::zero());
        assert_eq!(quote.discount.amount(), 100);
        assert_eq!(quote.final_amount.amount(), 900);
        assert_eq!(quote.discount_percent, 10.0);

        let quote = close_quote(Money::new(300), 0.0, Money::new(75));
        assert_eq!(quote.discount.amount(), 75);
        assert_eq!(quote.final_amount.amount(), 225);
        assert_eq!(quote.discount_percent, 0.0);
    }
}
