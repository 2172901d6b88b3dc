//! # Money Module
//!
//! The `Money` type for every amount on purchase orders, receipts and stock.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    2 × 100.00 × 0.9 × 1.18 = 212.39999999999998   ❌                    │
//! │                                                                         │
//! │  OUR SOLUTION: integer minor units + basis points                       │
//! │    20000 → −10% → 18000 → +18% → 21240   ✅                             │
//! │                                                                         │
//! │  Every percentage step rounds once, half away from zero.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts are in the smallest unit of the configured currency. The currency
//! itself (symbol, decimals) lives in [`crate::config::AppConfig`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// Basis points in 100%.
pub const BPS_SCALE: i128 = 10_000;

/// Integer division rounding half away from zero.
///
/// `den` must be positive.
pub(crate) fn div_round(num: i128, den: i128) -> i128 {
    let half = den / 2;
    if num >= 0 {
        (num + half) / den
    } else {
        (num - half) / den
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor units (cents, paise, fils...).
///
/// ## Where Money is Used
/// ```text
/// PurchaseOrderItem.unit_cost ──► LineTotals ──► DocumentTotals ──► PO header
///                                                        │
/// GrnItem.unit_cost ──► weighted_average_cost ──► InventoryStock.average_cost
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use stockwise_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies by a quantity (line gross, stock value).
    ///
    /// ```rust
    /// use stockwise_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(299).multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns `bps` basis points of this amount, rounded half away from zero.
    ///
    /// ```rust
    /// use stockwise_core::money::Money;
    ///
    /// // 10% of 200.00
    /// assert_eq!(Money::from_cents(20_000).percentage(1_000).cents(), 2_000);
    /// // 8.25% of 10.00 = 0.825 → 0.83
    /// assert_eq!(Money::from_cents(1_000).percentage(825).cents(), 83);
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        let part = div_round(self.0 as i128 * bps as i128, BPS_SCALE);
        Money(part as i64)
    }

    /// Tax charged on top of this (tax-exclusive) amount.
    #[inline]
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.percentage(rate.bps())
    }

    /// Tax contained in this tax-inclusive amount.
    ///
    /// `tax = gross − round(gross × 10000 / (10000 + bps))`
    ///
    /// ```rust
    /// use stockwise_core::money::Money;
    /// use stockwise_core::types::TaxRate;
    ///
    /// // 118.00 including 18% → 18.00 tax
    /// let tax = Money::from_cents(11_800).extract_inclusive_tax(TaxRate::from_bps(1_800));
    /// assert_eq!(tax.cents(), 1_800);
    /// ```
    pub fn extract_inclusive_tax(&self, rate: TaxRate) -> Money {
        if rate.is_zero() {
            return Money::zero();
        }
        let base = div_round(
            self.0 as i128 * BPS_SCALE,
            BPS_SCALE + rate.bps() as i128,
        );
        Money(self.0 - base as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering with two minor digits, no currency symbol.
///
/// Use [`crate::config::AppConfig::format_currency`] for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
