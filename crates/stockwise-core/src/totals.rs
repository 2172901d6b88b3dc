//! # Document Totals
//!
//! Line and document totals for purchase orders.
//!
//! ## Order of Operations
//! ```text
//! gross     = quantity × unit_price
//! discount  = round(gross × discount%)
//! net       = gross − discount                 ◄── discount first
//!
//! Exclusive: tax = round(net × tax%)            total = net + tax
//! Inclusive: tax = net − round(net / (1 + tax%)) total = net
//!
//! document: subtotal = Σ net, discount = Σ discount, tax = Σ tax,
//!           grand_total = Σ line total + shipping
//! ```
//!
//! Each percentage step rounds once, per line, so the document tax equals the
//! sum of the printed line taxes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{TaxMode, TaxRate};

/// Inputs for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInput {
    pub quantity: i64,
    pub unit_price: Money,
    /// Line discount in basis points.
    pub discount_bps: u32,
    pub tax_rate: TaxRate,
}

/// Computed amounts for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineTotals {
    pub gross: Money,
    pub discount: Money,
    /// Gross minus discount; the taxable base in exclusive mode.
    pub net: Money,
    pub tax: Money,
    pub total: Money,
}

impl LineTotals {
    /// Computes one line.
    ///
    /// ```rust
    /// use stockwise_core::money::Money;
    /// use stockwise_core::totals::{LineInput, LineTotals};
    /// use stockwise_core::types::{TaxMode, TaxRate};
    ///
    /// let line = LineTotals::compute(
    ///     &LineInput {
    ///         quantity: 2,
    ///         unit_price: Money::from_cents(10_000),
    ///         discount_bps: 1_000,
    ///         tax_rate: TaxRate::from_bps(1_800),
    ///     },
    ///     TaxMode::Exclusive,
    /// );
    /// assert_eq!(line.net.cents(), 18_000);
    /// assert_eq!(line.tax.cents(), 3_240);
    /// assert_eq!(line.total.cents(), 21_240);
    /// ```
    pub fn compute(input: &LineInput, mode: TaxMode) -> Self {
        let gross = input.unit_price.multiply_quantity(input.quantity);
        let discount = gross.percentage(input.discount_bps);
        let net = gross - discount;

        let (tax, total) = match mode {
            TaxMode::Exclusive => {
                let tax = net.calculate_tax(input.tax_rate);
                (tax, net + tax)
            }
            TaxMode::Inclusive => (net.extract_inclusive_tax(input.tax_rate), net),
        };

        LineTotals {
            gross,
            discount,
            net,
            tax,
            total,
        }
    }
}

/// Header totals for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentTotals {
    /// Σ line net.
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub shipping: Money,
    pub grand_total: Money,
}

impl DocumentTotals {
    /// Sums already-computed lines and adds shipping.
    pub fn from_lines(lines: &[LineTotals], shipping: Money) -> Self {
        let subtotal: Money = lines.iter().map(|l| l.net).sum();
        let discount: Money = lines.iter().map(|l| l.discount).sum();
        let tax: Money = lines.iter().map(|l| l.tax).sum();
        let lines_total: Money = lines.iter().map(|l| l.total).sum();

        DocumentTotals {
            subtotal,
            discount,
            tax,
            shipping,
            grand_total: lines_total + shipping,
        }
    }

    /// Computes every line, then the header.
    pub fn compute(inputs: &[LineInput], shipping: Money, mode: TaxMode) -> (Vec<LineTotals>, Self) {
        let lines: Vec<LineTotals> = inputs
            .iter()
            .map(|input| LineTotals::compute(input, mode))
            .collect();
        let totals = DocumentTotals::from_lines(&lines, shipping);
        (lines, totals)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
