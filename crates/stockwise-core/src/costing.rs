//! # Weighted-Average Costing
//!
//! Recomputes a stock position's unit cost after each receipt.
//!
//! ```text
//! new_avg = (q1 × c1 + q2 × c2) / (q1 + q2)
//!
//!   on hand 10 @ 15.00 + receive 30 @ 11.00
//!   = (150.00 + 330.00) / 40 = 12.00
//! ```
//!
//! When the position is empty or negative (stock was oversold), the old cost
//! carries no information and the receipt cost becomes the new average.

use crate::money::{div_round, Money};
use crate::types::InventoryStock;

/// Quantity-weighted mean of the existing position and an incoming receipt.
///
/// ```rust
/// use stockwise_core::costing::weighted_average_cost;
/// use stockwise_core::money::Money;
///
/// let avg = weighted_average_cost(10, Money::from_cents(1_500), 30, Money::from_cents(1_100));
/// assert_eq!(avg.cents(), 1_200);
/// ```
pub fn weighted_average_cost(
    on_hand: i64,
    average_cost: Money,
    received: i64,
    unit_cost: Money,
) -> Money {
    if received <= 0 {
        return average_cost;
    }
    if on_hand <= 0 {
        return unit_cost;
    }

    let value = on_hand as i128 * average_cost.cents() as i128
        + received as i128 * unit_cost.cents() as i128;
    let quantity = on_hand as i128 + received as i128;

    Money::from_cents(div_round(value, quantity) as i64)
}

/// Applies an accepted receipt to a stock position in place.
///
/// Updates on-hand, available and the average cost. Returns the new on-hand
/// balance (what the ledger row records as `balance_after`).
pub fn apply_receipt(stock: &mut InventoryStock, accepted: i64, unit_cost: Money) -> i64 {
    let new_average = weighted_average_cost(
        stock.quantity_on_hand,
        stock.average_cost(),
        accepted,
        unit_cost,
    );
    stock.average_cost_cents = new_average.cents();
    stock.quantity_on_hand += accepted;
    stock.recompute_available();
    stock.quantity_on_hand
}

/// Applies a signed adjustment; average cost is unchanged.
pub fn apply_adjustment(stock: &mut InventoryStock, delta: i64) -> i64 {
    stock.quantity_on_hand += delta;
    stock.recompute_available();
    stock.quantity_on_hand
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_weighted_mean() {
        // (q1·c1 + q2·c2) / (q1 + q2)
        let avg = weighted_average_cost(10, Money::from_cents(1_000), 10, Money::from_cents(2_000));
        assert_eq!(avg.cents(), 1_500);

        let avg = weighted_average_cost(4, Money::from_cents(250), 6, Money::from_cents(300));
        assert_eq!(avg.cents(), (4 * 250 + 6 * 300) / 10);
    }

    #[test]
    fn test_rounds_to_nearest_minor_unit() {
        // (1×100 + 2×101) / 3 = 100.666… → 101
        let avg = weighted_average_cost(1, Money::from_cents(100), 2, Money::from_cents(101));
        assert_eq!(avg.cents(), 101);
    }

    #[test]
    fn test_empty_or_negative_position_takes_receipt_cost() {
        let cost = Money::from_cents(700);
        assert_eq!(weighted_average_cost(0, Money::from_cents(9_999), 5, cost), cost);
        assert_eq!(weighted_average_cost(-3, Money::from_cents(9_999), 5, cost), cost);
    }

    #[test]
    fn test_zero_receipt_keeps_average() {
        let avg = Money::from_cents(1_234);
        assert_eq!(weighted_average_cost(10, avg, 0, Money::from_cents(1)), avg);
    }

    #[test]
    fn test_apply_receipt_updates_position() {
        let mut stock = InventoryStock::empty(1, 1, Utc::now());
        stock.quantity_on_hand = 10;
        stock.quantity_reserved = 2;
        stock.average_cost_cents = 1_500;
        stock.recompute_available();

        let balance = apply_receipt(&mut stock, 30, Money::from_cents(1_100));

        assert_eq!(balance, 40);
        assert_eq!(stock.quantity_available, 38);
        assert_eq!(stock.average_cost_cents, 1_200);
    }

    #[test]
    fn test_apply_adjustment_keeps_cost() {
        let mut stock = InventoryStock::empty(1, 1, Utc::now());
        stock.quantity_on_hand = 10;
        stock.average_cost_cents = 500;
        stock.recompute_available();

        assert_eq!(apply_adjustment(&mut stock, -4), 6);
        assert_eq!(stock.quantity_available, 6);
        assert_eq!(stock.average_cost_cents, 500);
    }
}
