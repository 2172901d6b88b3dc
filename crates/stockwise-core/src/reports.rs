//! # Report Reducers
//!
//! Pure folds over whole tables, used by the dashboard and reports services.
//! The services load the tables; everything here is deterministic.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{
    GoodsReceivedNote, InventoryStock, Product, PurchaseOrder, PurchaseOrderItem,
    PurchaseOrderStatus, StockMovement, Vendor,
};

// =============================================================================
// Inventory Valuation
// =============================================================================

/// One product+branch position at average cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ValuationLine {
    pub product_id: i64,
    pub sku: String,
    pub product_name: String,
    pub branch_id: i64,
    pub quantity_on_hand: i64,
    pub average_cost: Money,
    pub value: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, TS)]
#[ts(export)]
pub struct InventoryValuation {
    pub lines: Vec<ValuationLine>,
    pub total_quantity: i64,
    pub total_value: Money,
}

/// Values every stock position, sorted by SKU then branch.
///
/// Positions whose product row is missing are still valued, with an empty SKU.
pub fn inventory_valuation(stock: &[InventoryStock], products: &[Product]) -> InventoryValuation {
    let by_id: HashMap<i64, &Product> = products
        .iter()
        .filter_map(|p| p.id.map(|id| (id, p)))
        .collect();

    let mut lines: Vec<ValuationLine> = stock
        .iter()
        .map(|s| {
            let product = by_id.get(&s.product_id);
            ValuationLine {
                product_id: s.product_id,
                sku: product.map(|p| p.sku.clone()).unwrap_or_default(),
                product_name: product.map(|p| p.name.clone()).unwrap_or_default(),
                branch_id: s.branch_id,
                quantity_on_hand: s.quantity_on_hand,
                average_cost: s.average_cost(),
                value: s.value(),
            }
        })
        .collect();
    lines.sort_by(|a, b| a.sku.cmp(&b.sku).then(a.branch_id.cmp(&b.branch_id)));

    InventoryValuation {
        total_quantity: lines.iter().map(|l| l.quantity_on_hand).sum(),
        total_value: lines.iter().map(|l| l.value).sum(),
        lines,
    }
}

// =============================================================================
// Stock Ledger
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct LedgerEntry {
    pub movement: StockMovement,
    /// Σ quantity of this and all earlier movements.
    pub running_balance: i64,
}

/// Movements of one product in one branch, oldest first, with a running
/// balance.
pub fn stock_ledger(movements: &[StockMovement], product_id: i64, branch_id: i64) -> Vec<LedgerEntry> {
    let mut relevant: Vec<&StockMovement> = movements
        .iter()
        .filter(|m| m.product_id == product_id && m.branch_id == branch_id)
        .collect();
    relevant.sort_by_key(|m| (m.created_at, m.id));

    let mut balance = 0;
    relevant
        .into_iter()
        .map(|m| {
            balance += m.quantity;
            LedgerEntry {
                movement: m.clone(),
                running_balance: balance,
            }
        })
        .collect()
}

// =============================================================================
// Purchases by Vendor
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct VendorPurchaseSummary {
    pub vendor_id: i64,
    pub vendor_name: String,
    pub order_count: usize,
    /// Σ order grand totals (cancelled orders excluded).
    pub ordered_value: Money,
    /// Σ GRN totals.
    pub received_value: Money,
}

/// Per-vendor purchase totals, sorted by vendor name.
///
/// Vendors without orders or receipts are omitted.
pub fn purchase_summary_by_vendor(
    vendors: &[Vendor],
    orders: &[PurchaseOrder],
    grns: &[GoodsReceivedNote],
) -> Vec<VendorPurchaseSummary> {
    let mut acc: BTreeMap<i64, (usize, Money, Money)> = BTreeMap::new();

    for order in orders
        .iter()
        .filter(|o| o.status != PurchaseOrderStatus::Cancelled)
    {
        let entry = acc.entry(order.vendor_id).or_default();
        entry.0 += 1;
        entry.1 += order.total();
    }
    for grn in grns {
        acc.entry(grn.vendor_id).or_default().2 += Money::from_cents(grn.total_cents);
    }

    let names: HashMap<i64, &str> = vendors
        .iter()
        .filter_map(|v| v.id.map(|id| (id, v.name.as_str())))
        .collect();

    let mut summary: Vec<VendorPurchaseSummary> = acc
        .into_iter()
        .map(|(vendor_id, (order_count, ordered_value, received_value))| VendorPurchaseSummary {
            vendor_id,
            vendor_name: names.get(&vendor_id).map(|n| n.to_string()).unwrap_or_default(),
            order_count,
            ordered_value,
            received_value,
        })
        .collect();
    summary.sort_by(|a, b| a.vendor_name.cmp(&b.vendor_name).then(a.vendor_id.cmp(&b.vendor_id)));
    summary
}

// =============================================================================
// Receiving Status
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ReceivingLine {
    pub item_id: i64,
    pub product_id: i64,
    pub ordered: i64,
    pub received: i64,
    pub outstanding: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ReceivingStatus {
    pub order_id: i64,
    pub order_number: String,
    pub status: PurchaseOrderStatus,
    pub lines: Vec<ReceivingLine>,
    pub ordered_quantity: i64,
    pub received_quantity: i64,
}

/// Ordered vs received per line of one order.
pub fn receiving_status(order: &PurchaseOrder, items: &[PurchaseOrderItem]) -> ReceivingStatus {
    let order_id = order.id.unwrap_or_default();
    let lines: Vec<ReceivingLine> = items
        .iter()
        .filter(|i| i.purchase_order_id == order_id)
        .map(|i| ReceivingLine {
            item_id: i.id.unwrap_or_default(),
            product_id: i.product_id,
            ordered: i.quantity,
            received: i.received_quantity,
            outstanding: i.outstanding_quantity(),
        })
        .collect();

    ReceivingStatus {
        order_id,
        order_number: order.order_number.clone(),
        status: order.status,
        ordered_quantity: lines.iter().map(|l| l.ordered).sum(),
        received_quantity: lines.iter().map(|l| l.received).sum(),
        lines,
    }
}

/// Status an order should have given its lines.
///
/// ```text
/// every line received ≥ ordered  → fully_received
/// anything received              → partially_received
/// nothing received               → current status (draft stays draft)
/// ```
pub fn derive_order_status(
    current: PurchaseOrderStatus,
    items: &[PurchaseOrderItem],
) -> PurchaseOrderStatus {
    if current == PurchaseOrderStatus::Cancelled {
        return current;
    }
    if !items.is_empty() && items.iter().all(PurchaseOrderItem::is_fully_received) {
        PurchaseOrderStatus::FullyReceived
    } else if items.iter().any(|i| i.received_quantity > 0) {
        PurchaseOrderStatus::PartiallyReceived
    } else {
        current
    }
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    /// Orders still expecting deliveries.
    pub open_orders: usize,
    /// Σ outstanding quantity × unit cost over open orders.
    pub outstanding_value: Money,
    pub inventory_value: Money,
    /// Products whose available stock across branches is at or below their
    /// reorder level.
    pub low_stock_products: usize,
    /// Newest first.
    pub recent_movements: Vec<StockMovement>,
}

/// Folds the tables behind the dashboard.
pub fn dashboard_summary(
    orders: &[PurchaseOrder],
    items: &[PurchaseOrderItem],
    stock: &[InventoryStock],
    products: &[Product],
    movements: &[StockMovement],
    recent_limit: usize,
) -> DashboardSummary {
    let open_ids: Vec<i64> = orders
        .iter()
        .filter(|o| o.status.is_open())
        .filter_map(|o| o.id)
        .collect();

    let outstanding_value: Money = items
        .iter()
        .filter(|i| open_ids.contains(&i.purchase_order_id))
        .map(|i| i.unit_cost().multiply_quantity(i.outstanding_quantity()))
        .sum();

    let mut available: HashMap<i64, i64> = HashMap::new();
    for s in stock {
        *available.entry(s.product_id).or_default() += s.quantity_available;
    }
    let low_stock_products = products
        .iter()
        .filter(|p| p.reorder_level > 0)
        .filter(|p| {
            let qty = p.id.and_then(|id| available.get(&id).copied()).unwrap_or(0);
            qty <= p.reorder_level
        })
        .count();

    let mut recent: Vec<StockMovement> = movements.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    recent.truncate(recent_limit);

    DashboardSummary {
        open_orders: open_ids.len(),
        outstanding_value,
        inventory_value: stock.iter().map(InventoryStock::value).sum(),
        low_stock_products,
        recent_movements: recent,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
