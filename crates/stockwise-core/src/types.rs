//! # Domain Types
//!
//! Entities stored through the record store, plus the small value types they
//! use.
//!
//! ## Table Catalogue
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  vendors ◄──────── purchase_orders ────────► branches                   │
//! │                         │   ▲                   ▲                       │
//! │                         │   │                   │                       │
//! │          purchase_order_items   goods_received_notes                    │
//! │                 ▲                     │                                 │
//! │                 │                     ▼                                 │
//! │                 └─────────────── grn_items                              │
//! │                                       │ (accepted qty)                  │
//! │                                       ▼                                 │
//! │  products ◄──── inventory_stock ◄── stock_movements (append-only)       │
//! │                                                                         │
//! │  settings (single row)                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity has an integer `id` that is `None` until the store assigns
//! one. Monetary fields are minor units (`*_cents`), rates are basis points
//! (`*_bps`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{self, ValidationResult};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1800 bps = 18%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for configuration input).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Tax Mode
// =============================================================================

/// How document prices treat tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TaxMode {
    /// Tax is added on top of the discounted line amount.
    #[default]
    Exclusive,
    /// Prices already include tax; the tax portion is extracted.
    Inclusive,
}

impl TaxMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxMode::Exclusive => "exclusive",
            TaxMode::Inclusive => "inclusive",
        }
    }
}

impl std::str::FromStr for TaxMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exclusive" => Ok(TaxMode::Exclusive),
            "inclusive" => Ok(TaxMode::Inclusive),
            other => Err(ValidationError::InvalidFormat {
                field: "tax_mode".to_string(),
                reason: format!("unknown tax mode '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Tables & Entity Trait
// =============================================================================

/// Every collection the record store knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Vendors,
    Branches,
    Products,
    PurchaseOrders,
    PurchaseOrderItems,
    GoodsReceivedNotes,
    GrnItems,
    InventoryStock,
    StockMovements,
    Settings,
}

impl Table {
    /// All tables, in dependency order (parents first).
    pub const ALL: [Table; 10] = [
        Table::Vendors,
        Table::Branches,
        Table::Products,
        Table::PurchaseOrders,
        Table::PurchaseOrderItems,
        Table::GoodsReceivedNotes,
        Table::GrnItems,
        Table::InventoryStock,
        Table::StockMovements,
        Table::Settings,
    ];

    /// SQL table name.
    pub const fn name(&self) -> &'static str {
        match self {
            Table::Vendors => "vendors",
            Table::Branches => "branches",
            Table::Products => "products",
            Table::PurchaseOrders => "purchase_orders",
            Table::PurchaseOrderItems => "purchase_order_items",
            Table::GoodsReceivedNotes => "goods_received_notes",
            Table::GrnItems => "grn_items",
            Table::InventoryStock => "inventory_stock",
            Table::StockMovements => "stock_movements",
            Table::Settings => "settings",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record type stored in exactly one [`Table`].
///
/// The store serializes entities to JSON rows on the way in and decodes rows
/// back into the entity on the way out, so a row with the wrong shape never
/// reaches service code.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The table this entity lives in.
    const TABLE: Table;

    /// Store-assigned id (`None` before insert).
    fn id(&self) -> Option<i64>;

    /// Field-level rules checked before every insert/update.
    fn validate(&self) -> ValidationResult<()> {
        Ok(())
    }
}

// =============================================================================
// Master Data
// =============================================================================

/// A supplier purchase orders are placed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Vendor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Entity for Vendor {
    const TABLE: Table = Table::Vendors;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        validation::validate_name("vendor name", &self.name)
    }
}

/// A warehouse or store location holding stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Branch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Entity for Branch {
    const TABLE: Table = Table::Branches;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        validation::validate_code("branch code", &self.code)?;
        validation::validate_name("branch name", &self.name)
    }
}

/// A stocked product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub sku: String,
    pub name: String,
    /// Unit of measure ("pcs", "kg", "box").
    pub unit: String,
    /// Default purchase cost in minor units.
    pub cost_cents: i64,
    /// Selling price in minor units.
    pub price_cents: i64,
    pub tax_rate_bps: u32,
    /// Available quantity at or below which the product counts as low stock.
    pub reorder_level: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

impl Entity for Product {
    const TABLE: Table = Table::Products;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        validation::validate_sku(&self.sku)?;
        validation::validate_name("product name", &self.name)?;
        validation::validate_price_cents("cost", self.cost_cents)?;
        validation::validate_price_cents("price", self.price_cents)?;
        validation::validate_tax_rate_bps(self.tax_rate_bps)?;
        validation::validate_non_negative("reorder level", self.reorder_level)
    }
}

// =============================================================================
// Purchase Orders
// =============================================================================

/// Lifecycle of a purchase order.
///
/// ```text
/// draft ──► partially_received ──► fully_received
///   │
///   └──► cancelled (only while nothing has been received)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    #[default]
    Draft,
    PartiallyReceived,
    FullyReceived,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Draft => "draft",
            PurchaseOrderStatus::PartiallyReceived => "partially_received",
            PurchaseOrderStatus::FullyReceived => "fully_received",
            PurchaseOrderStatus::Cancelled => "cancelled",
        }
    }

    /// Goods can still be received against the order.
    pub fn is_receivable(&self) -> bool {
        matches!(
            self,
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::PartiallyReceived
        )
    }

    /// Order still expects deliveries (counts as "open" on the dashboard).
    pub fn is_open(&self) -> bool {
        self.is_receivable()
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purchase order header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseOrder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Business number, e.g. `PO-00001`.
    pub order_number: String,
    pub vendor_id: i64,
    /// Branch the goods are delivered to.
    pub branch_id: i64,
    #[ts(as = "String")]
    pub order_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub expected_date: Option<NaiveDate>,
    pub status: PurchaseOrderStatus,
    pub tax_mode: TaxMode,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl PurchaseOrder {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

impl Entity for PurchaseOrder {
    const TABLE: Table = Table::PurchaseOrders;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        validation::validate_document_number("order number", &self.order_number)?;
        validation::validate_price_cents("shipping", self.shipping_cents)?;
        if let Some(expected) = self.expected_date {
            if expected < self.order_date {
                return Err(ValidationError::InvalidFormat {
                    field: "expected date".to_string(),
                    reason: "must not be before the order date".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// A line on a purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseOrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub purchase_order_id: i64,
    pub product_id: i64,
    /// Ordered quantity.
    pub quantity: i64,
    /// Accepted quantity over all receipts so far.
    pub received_quantity: i64,
    pub unit_cost_cents: i64,
    pub discount_bps: u32,
    pub tax_rate_bps: u32,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub line_total_cents: i64,
}

impl PurchaseOrderItem {
    /// Quantity still expected from the vendor.
    #[inline]
    pub fn outstanding_quantity(&self) -> i64 {
        (self.quantity - self.received_quantity).max(0)
    }

    #[inline]
    pub fn is_fully_received(&self) -> bool {
        self.received_quantity >= self.quantity
    }

    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }
}

impl Entity for PurchaseOrderItem {
    const TABLE: Table = Table::PurchaseOrderItems;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        validation::validate_quantity(self.quantity)?;
        validation::validate_non_negative("received quantity", self.received_quantity)?;
        validation::validate_price_cents("unit cost", self.unit_cost_cents)?;
        validation::validate_discount_bps(self.discount_bps)?;
        validation::validate_tax_rate_bps(self.tax_rate_bps)
    }
}

// =============================================================================
// Goods Received Notes
// =============================================================================

/// A delivery received against a purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GoodsReceivedNote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Business number, e.g. `GRN-00001`.
    pub grn_number: String,
    pub purchase_order_id: i64,
    pub vendor_id: i64,
    pub branch_id: i64,
    #[ts(as = "String")]
    pub received_date: NaiveDate,
    /// Σ accepted × unit cost.
    pub total_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Entity for GoodsReceivedNote {
    const TABLE: Table = Table::GoodsReceivedNotes;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        validation::validate_document_number("GRN number", &self.grn_number)
    }
}

/// A line on a GRN.
///
/// Invariant: `accepted + rejected ≤ received`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GrnItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub grn_id: i64,
    pub purchase_order_item_id: i64,
    pub product_id: i64,
    pub received_quantity: i64,
    pub accepted_quantity: i64,
    pub rejected_quantity: i64,
    pub unit_cost_cents: i64,
    /// accepted × unit cost.
    pub line_total_cents: i64,
    pub rejection_reason: Option<String>,
}

impl Entity for GrnItem {
    const TABLE: Table = Table::GrnItems;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        validation::validate_receipt_quantities(
            self.received_quantity,
            self.accepted_quantity,
            self.rejected_quantity,
        )?;
        validation::validate_price_cents("unit cost", self.unit_cost_cents)
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// On-hand position of one product in one branch.
///
/// Invariant: `quantity_available = quantity_on_hand − quantity_reserved`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryStock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub product_id: i64,
    pub branch_id: i64,
    pub quantity_on_hand: i64,
    pub quantity_reserved: i64,
    pub quantity_available: i64,
    /// Weighted-average unit cost in minor units.
    pub average_cost_cents: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InventoryStock {
    /// An empty position, ready for its first receipt.
    pub fn empty(product_id: i64, branch_id: i64, now: DateTime<Utc>) -> Self {
        InventoryStock {
            id: None,
            product_id,
            branch_id,
            quantity_on_hand: 0,
            quantity_reserved: 0,
            quantity_available: 0,
            average_cost_cents: 0,
            updated_at: now,
        }
    }

    #[inline]
    pub fn average_cost(&self) -> Money {
        Money::from_cents(self.average_cost_cents)
    }

    /// Stock value at average cost.
    #[inline]
    pub fn value(&self) -> Money {
        self.average_cost().multiply_quantity(self.quantity_on_hand)
    }

    /// Re-derives `quantity_available` from on-hand and reserved.
    pub fn recompute_available(&mut self) {
        self.quantity_available = self.quantity_on_hand - self.quantity_reserved;
    }
}

impl Entity for InventoryStock {
    const TABLE: Table = Table::InventoryStock;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        validation::validate_non_negative("reserved quantity", self.quantity_reserved)?;
        validation::validate_price_cents("average cost", self.average_cost_cents)?;
        if self.quantity_available != self.quantity_on_hand - self.quantity_reserved {
            return Err(ValidationError::InvalidFormat {
                field: "available quantity".to_string(),
                reason: "must equal on hand minus reserved".to_string(),
            });
        }
        Ok(())
    }
}

/// Why stock moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Goods accepted on a GRN.
    PurchaseReceipt,
    /// Manual correction (count, damage, write-off).
    Adjustment,
}

/// Append-only stock ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockMovement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub product_id: i64,
    pub branch_id: i64,
    pub movement_type: MovementType,
    /// Signed quantity delta.
    pub quantity: i64,
    pub unit_cost_cents: i64,
    /// On-hand quantity after this movement.
    pub balance_after: i64,
    /// Originating document kind ("grn").
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Entity for StockMovement {
    const TABLE: Table = Table::StockMovements;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        if self.quantity == 0 {
            return Err(ValidationError::OutOfRange {
                field: "movement quantity".to_string(),
                min: i64::MIN,
                max: i64::MAX,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Company-wide settings, stored as the single row of the settings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompanySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub company_name: String,
    /// ISO 4217 code.
    pub currency_code: String,
    pub currency_symbol: String,
    pub currency_decimals: u8,
    pub default_tax_rate_bps: u32,
    pub tax_mode: TaxMode,
    pub purchase_order_prefix: String,
    pub grn_prefix: String,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Entity for CompanySettings {
    const TABLE: Table = Table::Settings;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn validate(&self) -> ValidationResult<()> {
        validation::validate_name("company name", &self.company_name)?;
        validation::validate_currency_code(&self.currency_code)?;
        if self.currency_decimals > 4 {
            return Err(ValidationError::OutOfRange {
                field: "currency decimals".to_string(),
                min: 0,
                max: 4,
            });
        }
        validation::validate_tax_rate_bps(self.default_tax_rate_bps)?;
        validation::validate_prefix("purchase order prefix", &self.purchase_order_prefix)?;
        validation::validate_prefix("GRN prefix", &self.grn_prefix)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
