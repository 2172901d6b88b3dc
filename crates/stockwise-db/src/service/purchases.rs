//! # Purchases Service
//!
//! Vendors, purchase orders and goods receipt.
//!
//! ## Purchase Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. CREATE                                                              │
//! │     └── create_purchase_order() → PO-NNNNN { status: draft }            │
//! │         (line + document totals computed in the configured tax mode)    │
//! │                                                                         │
//! │  2. RECEIVE (repeatable)                                                │
//! │     └── create_grn() → GRN-NNNNN                                        │
//! │         ├── po item received_quantity += accepted                       │
//! │         ├── inventory_stock upsert (weighted-average cost)              │
//! │         ├── stock_movements append (purchase_receipt)                   │
//! │         └── status → partially_received | fully_received                │
//! │                                                                         │
//! │  3. (OPTIONAL, draft with nothing received)                             │
//! │     ├── cancel_purchase_order() → cancelled                             │
//! │     └── delete_purchase_order() → header and lines removed              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{ServiceError, ServiceResult};
use super::{finish, StockLock};
use crate::numbering::DocumentNumberGenerator;
use crate::store::{patch_of, RecordStore, RecordStoreExt, UnitOfWork};
use stockwise_core::costing;
use stockwise_core::money::Money;
use stockwise_core::reports::derive_order_status;
use stockwise_core::totals::{DocumentTotals, LineInput};
use stockwise_core::validation;
use stockwise_core::{
    AppConfig, Branch, CoreError, GoodsReceivedNote, GrnItem, InventoryStock, MovementType,
    Product, PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus, StockMovement, Table, TaxRate,
    ValidationError, Vendor,
};

/// `reference_type` of movements created by a GRN.
pub const GRN_REFERENCE: &str = "grn";

// =============================================================================
// Inputs & Outputs
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewVendor {
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPurchaseOrder {
    pub vendor_id: i64,
    pub branch_id: i64,
    pub order_date: NaiveDate,
    pub expected_date: Option<NaiveDate>,
    #[serde(default)]
    pub shipping_cents: i64,
    pub notes: Option<String>,
    pub items: Vec<NewPurchaseOrderItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPurchaseOrderItem {
    pub product_id: i64,
    pub quantity: i64,
    /// Defaults to the product's cost.
    pub unit_cost_cents: Option<i64>,
    #[serde(default)]
    pub discount_bps: u32,
    /// Defaults to the product's tax rate.
    pub tax_rate_bps: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseOrderDetail {
    pub order: PurchaseOrder,
    pub items: Vec<PurchaseOrderItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGrn {
    pub purchase_order_id: i64,
    pub received_date: NaiveDate,
    pub notes: Option<String>,
    pub items: Vec<GrnLineInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrnLineInput {
    pub purchase_order_item_id: i64,
    pub received_quantity: i64,
    pub accepted_quantity: i64,
    #[serde(default)]
    pub rejected_quantity: i64,
    /// Defaults to the order line's unit cost.
    pub unit_cost_cents: Option<i64>,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrnDetail {
    pub grn: GoodsReceivedNote,
    pub items: Vec<GrnItem>,
}

/// A GRN line after validation, ready to write.
#[derive(Debug)]
struct PlannedReceipt {
    line: GrnLineInput,
    item: PurchaseOrderItem,
    unit_cost: Money,
}

// =============================================================================
// Service
// =============================================================================

/// Purchasing workflows.
pub struct PurchasesService {
    store: Arc<dyn RecordStore>,
    config: AppConfig,
    numbers: DocumentNumberGenerator,
    /// Held for a whole receipt, from the position read until commit or
    /// rollback.
    stock_lock: StockLock,
}

impl PurchasesService {
    pub fn new(store: Arc<dyn RecordStore>, config: AppConfig) -> Self {
        PurchasesService {
            numbers: DocumentNumberGenerator::new(config.number_width),
            store,
            config,
            stock_lock: StockLock::default(),
        }
    }

    /// Shares a stock lock with other services writing the same positions.
    pub fn with_stock_lock(mut self, lock: StockLock) -> Self {
        self.stock_lock = lock;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Vendors
    // -------------------------------------------------------------------------

    pub async fn create_vendor(&self, input: NewVendor) -> ServiceResult<Vendor> {
        let mut vendor = Vendor {
            id: None,
            name: input.name.trim().to_string(),
            contact_person: input.contact_person,
            email: input.email,
            phone: input.phone,
            address: input.address,
            created_at: Utc::now(),
        };
        vendor.id = Some(self.store.insert(&vendor).await?);
        info!(id = ?vendor.id, name = %vendor.name, "Vendor created");
        Ok(vendor)
    }

    pub async fn list_vendors(&self) -> ServiceResult<Vec<Vendor>> {
        let mut vendors: Vec<Vendor> = self.store.find_all().await?;
        vendors.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(vendors)
    }

    pub async fn get_vendor(&self, id: i64) -> ServiceResult<Vendor> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Vendor", id))
    }

    // -------------------------------------------------------------------------
    // Purchase Orders
    // -------------------------------------------------------------------------

    /// Creates a draft purchase order with computed totals.
    ///
    /// ## Validation (before any write)
    /// - at least one line, at most `MAX_DOCUMENT_LINES`
    /// - vendor, branch and every product exist
    /// - quantities, costs, discounts and tax rates in range
    pub async fn create_purchase_order(
        &self,
        input: NewPurchaseOrder,
    ) -> ServiceResult<PurchaseOrderDetail> {
        if input.items.is_empty() {
            return Err(CoreError::EmptyDocument {
                document: "purchase order".to_string(),
            }
            .into());
        }
        validation::validate_line_count("purchase order", input.items.len())?;
        validation::validate_price_cents("shipping", input.shipping_cents)?;

        let vendor: Vendor = self
            .store
            .find_by_id(input.vendor_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Vendor", input.vendor_id))?;
        self.store
            .find_by_id::<Branch>(input.branch_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Branch", input.branch_id))?;

        let products: HashMap<i64, Product> = self
            .store
            .find_all::<Product>()
            .await?
            .into_iter()
            .filter_map(|p| p.id.map(|id| (id, p)))
            .collect();

        let mut lines = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let product = products
                .get(&item.product_id)
                .ok_or_else(|| ServiceError::not_found("Product", item.product_id))?;

            let unit_cost_cents = item.unit_cost_cents.unwrap_or(product.cost_cents);
            let tax_rate_bps = item.tax_rate_bps.unwrap_or(product.tax_rate_bps);

            validation::validate_quantity(item.quantity)?;
            validation::validate_price_cents("unit cost", unit_cost_cents)?;
            validation::validate_discount_bps(item.discount_bps)?;
            validation::validate_tax_rate_bps(tax_rate_bps)?;

            lines.push(LineInput {
                quantity: item.quantity,
                unit_price: Money::from_cents(unit_cost_cents),
                discount_bps: item.discount_bps,
                tax_rate: TaxRate::from_bps(tax_rate_bps),
            });
        }

        let (line_totals, totals) = DocumentTotals::compute(
            &lines,
            Money::from_cents(input.shipping_cents),
            self.config.tax_mode,
        );

        let uow = UnitOfWork::begin(self.store.clone());
        let outcome = async {
            let order_number = self
                .numbers
                .next(
                    &uow,
                    Table::PurchaseOrders,
                    "order_number",
                    &self.config.purchase_order_prefix,
                )
                .await?;

            let now = Utc::now();
            let mut order = PurchaseOrder {
                id: None,
                order_number,
                vendor_id: input.vendor_id,
                branch_id: input.branch_id,
                order_date: input.order_date,
                expected_date: input.expected_date,
                status: PurchaseOrderStatus::Draft,
                tax_mode: self.config.tax_mode,
                subtotal_cents: totals.subtotal.cents(),
                discount_cents: totals.discount.cents(),
                tax_cents: totals.tax.cents(),
                shipping_cents: totals.shipping.cents(),
                total_cents: totals.grand_total.cents(),
                notes: input.notes.clone(),
                created_at: now,
                updated_at: now,
            };
            let order_id = uow.insert(&order).await?;
            order.id = Some(order_id);

            let mut items = Vec::with_capacity(lines.len());
            for ((item, line), computed) in input.items.iter().zip(&lines).zip(&line_totals) {
                let mut row = PurchaseOrderItem {
                    id: None,
                    purchase_order_id: order_id,
                    product_id: item.product_id,
                    quantity: line.quantity,
                    received_quantity: 0,
                    unit_cost_cents: line.unit_price.cents(),
                    discount_bps: line.discount_bps,
                    tax_rate_bps: line.tax_rate.bps(),
                    discount_cents: computed.discount.cents(),
                    tax_cents: computed.tax.cents(),
                    line_total_cents: computed.total.cents(),
                };
                row.id = Some(uow.insert(&row).await?);
                items.push(row);
            }

            Ok::<_, ServiceError>(PurchaseOrderDetail { order, items })
        }
        .await;

        let detail = finish(uow, outcome).await?;
        info!(
            order_number = %detail.order.order_number,
            vendor = %vendor.name,
            lines = detail.items.len(),
            total = %self.config.format_currency(detail.order.total_cents),
            "Purchase order created"
        );
        Ok(detail)
    }

    pub async fn get_purchase_order(&self, id: i64) -> ServiceResult<PurchaseOrderDetail> {
        let order = self.load_order(id).await?;
        let items = self.order_items(id).await?;
        Ok(PurchaseOrderDetail { order, items })
    }

    /// All orders, newest first.
    pub async fn list_purchase_orders(&self) -> ServiceResult<Vec<PurchaseOrder>> {
        let mut orders: Vec<PurchaseOrder> = self.store.find_all().await?;
        orders.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(orders)
    }

    /// Cancels a draft order that has not received anything.
    pub async fn cancel_purchase_order(&self, id: i64) -> ServiceResult<PurchaseOrder> {
        let mut order = self.load_order(id).await?;
        let items = self.order_items(id).await?;
        ensure_untouched(&order, &items, "cancel")?;

        order.status = PurchaseOrderStatus::Cancelled;
        order.updated_at = Utc::now();
        self.store
            .patch::<PurchaseOrder>(
                id,
                patch_of([
                    ("status", json!(order.status)),
                    ("updated_at", json!(order.updated_at)),
                ]),
            )
            .await?;

        info!(order_number = %order.order_number, "Purchase order cancelled");
        Ok(order)
    }

    /// Deletes a draft order and its lines.
    pub async fn delete_purchase_order(&self, id: i64) -> ServiceResult<()> {
        let order = self.load_order(id).await?;
        let items = self.order_items(id).await?;
        ensure_untouched(&order, &items, "delete")?;

        let uow = UnitOfWork::begin(self.store.clone());
        let outcome = async {
            for item in &items {
                if let Some(item_id) = item.id {
                    uow.delete::<PurchaseOrderItem>(item_id).await?;
                }
            }
            uow.delete::<PurchaseOrder>(id).await?;
            Ok::<_, ServiceError>(())
        }
        .await;
        finish(uow, outcome).await?;

        info!(order_number = %order.order_number, "Purchase order deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Goods Received Notes
    // -------------------------------------------------------------------------

    /// Receives goods against a purchase order.
    ///
    /// Every line is validated before the first write. All writes share one
    /// unit of work: if any of them fails, the earlier ones are undone and
    /// the original error is returned.
    pub async fn create_grn(&self, input: CreateGrn) -> ServiceResult<GrnDetail> {
        let _receiving = self.stock_lock.lock().await;

        let order = self
            .store
            .find_by_id::<PurchaseOrder>(input.purchase_order_id)
            .await?
            .ok_or(CoreError::PurchaseOrderNotFound(input.purchase_order_id))?;

        if !order.status.is_receivable() {
            return Err(CoreError::InvalidOrderStatus {
                order_number: order.order_number,
                status: order.status.to_string(),
                operation: "receive goods".to_string(),
            }
            .into());
        }

        let items = self.order_items(input.purchase_order_id).await?;
        let plan = plan_receipt(&order, &items, &input)?;

        debug!(
            order_number = %order.order_number,
            lines = plan.len(),
            "Receipt validated"
        );

        let uow = UnitOfWork::begin(self.store.clone());
        let outcome = self.write_receipt(&uow, &order, items, plan, &input).await;
        let detail = finish(uow, outcome).await?;

        info!(
            grn_number = %detail.grn.grn_number,
            order_number = %order.order_number,
            total = %self.config.format_currency(detail.grn.total_cents),
            "Goods received"
        );
        Ok(detail)
    }

    async fn write_receipt(
        &self,
        uow: &UnitOfWork,
        order: &PurchaseOrder,
        mut items: Vec<PurchaseOrderItem>,
        plan: Vec<PlannedReceipt>,
        input: &CreateGrn,
    ) -> ServiceResult<GrnDetail> {
        let order_id = input.purchase_order_id;
        let now = Utc::now();

        let grn_number = self
            .numbers
            .next(uow, Table::GoodsReceivedNotes, "grn_number", &self.config.grn_prefix)
            .await?;

        let total: Money = plan
            .iter()
            .map(|p| p.unit_cost.multiply_quantity(p.line.accepted_quantity))
            .sum();

        let mut grn = GoodsReceivedNote {
            id: None,
            grn_number,
            purchase_order_id: order_id,
            vendor_id: order.vendor_id,
            branch_id: order.branch_id,
            received_date: input.received_date,
            total_cents: total.cents(),
            notes: input.notes.clone(),
            created_at: now,
        };
        let grn_id = uow.insert(&grn).await?;
        grn.id = Some(grn_id);

        let mut positions: HashMap<i64, InventoryStock> = uow
            .find_all::<InventoryStock>()
            .await?
            .into_iter()
            .filter(|s| s.branch_id == order.branch_id)
            .map(|s| (s.product_id, s))
            .collect();

        let mut grn_items = Vec::with_capacity(plan.len());
        for receipt in plan {
            let PlannedReceipt {
                line,
                item,
                unit_cost,
            } = receipt;
            let item_id = item.id.unwrap_or_default();

            let mut grn_item = GrnItem {
                id: None,
                grn_id,
                purchase_order_item_id: item_id,
                product_id: item.product_id,
                received_quantity: line.received_quantity,
                accepted_quantity: line.accepted_quantity,
                rejected_quantity: line.rejected_quantity,
                unit_cost_cents: unit_cost.cents(),
                line_total_cents: unit_cost.multiply_quantity(line.accepted_quantity).cents(),
                rejection_reason: line.rejection_reason.clone(),
            };
            grn_item.id = Some(uow.insert(&grn_item).await?);
            grn_items.push(grn_item);

            if line.accepted_quantity == 0 {
                continue;
            }

            let received = item.received_quantity + line.accepted_quantity;
            uow.patch::<PurchaseOrderItem>(
                item_id,
                patch_of([("received_quantity", json!(received))]),
            )
            .await?;
            if let Some(local) = items.iter_mut().find(|i| i.id == item.id) {
                local.received_quantity = received;
            }

            let position = positions
                .entry(item.product_id)
                .or_insert_with(|| InventoryStock::empty(item.product_id, order.branch_id, now));
            let balance = costing::apply_receipt(position, line.accepted_quantity, unit_cost);
            position.updated_at = now;

            match position.id {
                Some(stock_id) => {
                    uow.update(stock_id, &*position).await?;
                }
                None => {
                    position.id = Some(uow.insert(&*position).await?);
                }
            }

            let movement = StockMovement {
                id: None,
                product_id: item.product_id,
                branch_id: order.branch_id,
                movement_type: MovementType::PurchaseReceipt,
                quantity: line.accepted_quantity,
                unit_cost_cents: unit_cost.cents(),
                balance_after: balance,
                reference_type: Some(GRN_REFERENCE.to_string()),
                reference_id: Some(grn_id),
                reference_number: Some(grn.grn_number.clone()),
                notes: None,
                created_at: now,
            };
            uow.insert(&movement).await?;

            debug!(
                product_id = item.product_id,
                accepted = line.accepted_quantity,
                balance,
                average_cost = position.average_cost_cents,
                "Stock received"
            );
        }

        let status = derive_order_status(order.status, &items);
        if status != order.status {
            uow.patch::<PurchaseOrder>(
                order_id,
                patch_of([("status", json!(status)), ("updated_at", json!(now))]),
            )
            .await?;
            debug!(order_number = %order.order_number, from = %order.status, to = %status, "Order status changed");
        }

        Ok(GrnDetail {
            grn,
            items: grn_items,
        })
    }

    pub async fn get_grn(&self, id: i64) -> ServiceResult<GrnDetail> {
        let grn: GoodsReceivedNote = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Goods received note", id))?;
        let items = self
            .store
            .find_all::<GrnItem>()
            .await?
            .into_iter()
            .filter(|i| i.grn_id == id)
            .collect();
        Ok(GrnDetail { grn, items })
    }

    /// GRNs of one order, oldest first.
    pub async fn list_grns_for_order(
        &self,
        purchase_order_id: i64,
    ) -> ServiceResult<Vec<GoodsReceivedNote>> {
        Ok(self
            .store
            .find_all::<GoodsReceivedNote>()
            .await?
            .into_iter()
            .filter(|g| g.purchase_order_id == purchase_order_id)
            .collect())
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    async fn load_order(&self, id: i64) -> ServiceResult<PurchaseOrder> {
        Ok(self
            .store
            .find_by_id::<PurchaseOrder>(id)
            .await?
            .ok_or(CoreError::PurchaseOrderNotFound(id))?)
    }

    async fn order_items(&self, order_id: i64) -> ServiceResult<Vec<PurchaseOrderItem>> {
        Ok(self
            .store
            .find_all::<PurchaseOrderItem>()
            .await?
            .into_iter()
            .filter(|i| i.purchase_order_id == order_id)
            .collect())
    }
}

/// Orders can only be cancelled or deleted while draft with nothing received.
fn ensure_untouched(
    order: &PurchaseOrder,
    items: &[PurchaseOrderItem],
    operation: &str,
) -> ServiceResult<()> {
    let received = items.iter().any(|i| i.received_quantity > 0);
    if order.status != PurchaseOrderStatus::Draft || received {
        return Err(CoreError::InvalidOrderStatus {
            order_number: order.order_number.clone(),
            status: order.status.to_string(),
            operation: operation.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Checks every GRN line against the order before anything is written.
///
/// ## Rules
/// ```text
/// 1..=MAX_DOCUMENT_LINES lines
/// received > 0, accepted + rejected ≤ received
/// each order line at most once per GRN
/// the line belongs to this order
/// accepted ≤ ordered − received so far
/// ```
fn plan_receipt(
    order: &PurchaseOrder,
    items: &[PurchaseOrderItem],
    input: &CreateGrn,
) -> ServiceResult<Vec<PlannedReceipt>> {
    if input.items.is_empty() {
        return Err(CoreError::EmptyDocument {
            document: "goods received note".to_string(),
        }
        .into());
    }
    validation::validate_line_count("goods received note", input.items.len())?;

    let order_id = order.id.unwrap_or_default();
    let mut seen = HashSet::new();
    let mut plan = Vec::with_capacity(input.items.len());

    for line in &input.items {
        validation::validate_receipt_quantities(
            line.received_quantity,
            line.accepted_quantity,
            line.rejected_quantity,
        )?;

        if !seen.insert(line.purchase_order_item_id) {
            return Err(ValidationError::Duplicate {
                field: "purchase order item".to_string(),
                value: line.purchase_order_item_id.to_string(),
            }
            .into());
        }

        let item = items
            .iter()
            .find(|i| i.id == Some(line.purchase_order_item_id))
            .ok_or(CoreError::ItemNotOnOrder {
                item_id: line.purchase_order_item_id,
                order_id,
            })?;

        let outstanding = item.outstanding_quantity();
        if line.accepted_quantity > outstanding {
            return Err(CoreError::OverReceipt {
                item_id: line.purchase_order_item_id,
                outstanding,
                requested: line.accepted_quantity,
            }
            .into());
        }

        let unit_cost_cents = line.unit_cost_cents.unwrap_or(item.unit_cost_cents);
        validation::validate_price_cents("unit cost", unit_cost_cents)?;

        plan.push(PlannedReceipt {
            line: line.clone(),
            item: item.clone(),
            unit_cost: Money::from_cents(unit_cost_cents),
        });
    }

    Ok(plan)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::service::testing::{self, FailingStore, Fixture};
    use crate::service::ErrorCode;
    use crate::store::MemoryStore;
    use stockwise_core::{MAX_LINE_QUANTITY, MAX_PRICE_CENTS};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn order_input(fixture: &Fixture, lines: &[(i64, i64)]) -> NewPurchaseOrder {
        NewPurchaseOrder {
            vendor_id: fixture.vendor_id,
            branch_id: fixture.branch_id,
            order_date: date(1),
            expected_date: Some(date(10)),
            shipping_cents: 0,
            notes: None,
            items: lines
                .iter()
                .map(|&(product_id, quantity)| NewPurchaseOrderItem {
                    product_id,
                    quantity,
                    unit_cost_cents: None,
                    discount_bps: 0,
                    tax_rate_bps: None,
                })
                .collect(),
        }
    }

    fn receive(item: &PurchaseOrderItem, received: i64, accepted: i64, rejected: i64) -> GrnLineInput {
        GrnLineInput {
            purchase_order_item_id: item.id.unwrap(),
            received_quantity: received,
            accepted_quantity: accepted,
            rejected_quantity: rejected,
            unit_cost_cents: None,
            rejection_reason: (rejected > 0).then(|| "damaged".to_string()),
        }
    }

    fn grn(order: &PurchaseOrderDetail, items: Vec<GrnLineInput>) -> CreateGrn {
        CreateGrn {
            purchase_order_id: order.order.id.unwrap(),
            received_date: date(5),
            notes: None,
            items,
        }
    }

    async fn sqlite_store() -> crate::store::SqliteStore {
        crate::pool::Database::new(crate::pool::DbConfig::in_memory())
            .await
            .unwrap()
            .store()
    }

    async fn setup() -> (Arc<dyn RecordStore>, PurchasesService, Fixture) {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let fixture = testing::seed(store.clone()).await;
        let service = PurchasesService::new(store.clone(), AppConfig::default());
        (store, service, fixture)
    }

    #[tokio::test]
    async fn test_create_order_computes_totals() {
        let (_, service, fixture) = setup().await;

        let mut input = order_input(&fixture, &[(fixture.product_ids[0], 2)]);
        input.items[0].unit_cost_cents = Some(10_000);
        input.items[0].discount_bps = 1_000;
        input.items[0].tax_rate_bps = Some(1_800);
        input.shipping_cents = 500;

        let detail = service.create_purchase_order(input).await.unwrap();

        assert_eq!(detail.order.order_number, "PO-00001");
        assert_eq!(detail.order.status, PurchaseOrderStatus::Draft);
        assert_eq!(detail.items[0].line_total_cents, 21_240);
        assert_eq!(detail.order.subtotal_cents, 18_000);
        assert_eq!(detail.order.discount_cents, 2_000);
        assert_eq!(detail.order.tax_cents, 3_240);
        assert_eq!(detail.order.total_cents, 21_740);

        let stored = service.get_purchase_order(detail.order.id.unwrap()).await.unwrap();
        assert_eq!(stored, detail);
    }

    #[tokio::test]
    async fn test_order_numbers_are_sequential() {
        let (_, service, fixture) = setup().await;
        let mut numbers = Vec::new();
        for _ in 0..3 {
            let detail = service
                .create_purchase_order(order_input(&fixture, &[(fixture.product_ids[0], 1)]))
                .await
                .unwrap();
            numbers.push(detail.order.order_number);
        }
        assert_eq!(numbers, vec!["PO-00001", "PO-00002", "PO-00003"]);
    }

    #[tokio::test]
    async fn test_create_order_rejects_unknown_product() {
        let (store, service, fixture) = setup().await;
        let err = service
            .create_purchase_order(order_input(&fixture, &[(fixture.product_ids[0], 1), (999, 1)]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(store.find_all::<PurchaseOrder>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_order_requires_lines() {
        let (_, service, fixture) = setup().await;
        let err = service
            .create_purchase_order(order_input(&fixture, &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::EmptyDocument { .. })));
    }

    #[tokio::test]
    async fn test_create_order_rejects_cost_beyond_limit() {
        let (store, service, fixture) = setup().await;

        let mut input = order_input(&fixture, &[(fixture.product_ids[0], MAX_LINE_QUANTITY)]);
        input.items[0].unit_cost_cents = Some(100_000_000_000_000);
        let err = service.create_purchase_order(input).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(store.find_all::<PurchaseOrder>().await.unwrap().is_empty());
        assert!(store.find_all::<PurchaseOrderItem>().await.unwrap().is_empty());

        // The largest accepted line still totals without overflow
        let mut input = order_input(&fixture, &[(fixture.product_ids[0], MAX_LINE_QUANTITY)]);
        input.items[0].unit_cost_cents = Some(MAX_PRICE_CENTS);
        let detail = service.create_purchase_order(input).await.unwrap();
        assert_eq!(detail.order.subtotal_cents, MAX_PRICE_CENTS * MAX_LINE_QUANTITY);
    }

    #[tokio::test]
    async fn test_partial_then_full_receipt() {
        let (store, service, fixture) = setup().await;
        let order = service
            .create_purchase_order(order_input(
                &fixture,
                &[(fixture.product_ids[0], 10), (fixture.product_ids[1], 5)],
            ))
            .await
            .unwrap();
        let order_id = order.order.id.unwrap();

        // First delivery: all of line 2, part of line 1
        let first = service
            .create_grn(grn(
                &order,
                vec![receive(&order.items[0], 6, 6, 0), receive(&order.items[1], 5, 5, 0)],
            ))
            .await
            .unwrap();
        assert_eq!(first.grn.grn_number, "GRN-00001");
        assert_eq!(
            service.get_purchase_order(order_id).await.unwrap().order.status,
            PurchaseOrderStatus::PartiallyReceived
        );

        // Last outstanding line closes the order
        service
            .create_grn(grn(&order, vec![receive(&order.items[0], 4, 4, 0)]))
            .await
            .unwrap();
        let detail = service.get_purchase_order(order_id).await.unwrap();
        assert_eq!(detail.order.status, PurchaseOrderStatus::FullyReceived);
        assert!(detail.items.iter().all(PurchaseOrderItem::is_fully_received));

        let movements: Vec<StockMovement> = store.find_all().await.unwrap();
        assert_eq!(movements.len(), 3);
        assert!(movements
            .iter()
            .all(|m| m.movement_type == MovementType::PurchaseReceipt
                && m.reference_type.as_deref() == Some(GRN_REFERENCE)));

        assert_eq!(service.list_grns_for_order(order_id).await.unwrap().len(), 2);

        // Nothing left to receive
        let err = service
            .create_grn(grn(&order, vec![receive(&order.items[0], 1, 1, 0)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InvalidOrderStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_receipt_updates_weighted_average_cost() {
        let (store, service, fixture) = setup().await;
        let product_id = fixture.product_ids[0];

        // Existing position: 10 @ 15.00
        let mut position = InventoryStock::empty(product_id, fixture.branch_id, Utc::now());
        position.quantity_on_hand = 10;
        position.average_cost_cents = 1_500;
        position.recompute_available();
        store.insert(&position).await.unwrap();

        let mut input = order_input(&fixture, &[(product_id, 30)]);
        input.items[0].unit_cost_cents = Some(1_100);
        let order = service.create_purchase_order(input).await.unwrap();

        service
            .create_grn(grn(&order, vec![receive(&order.items[0], 30, 30, 0)]))
            .await
            .unwrap();

        let stock: Vec<InventoryStock> = store.find_all().await.unwrap();
        assert_eq!(stock.len(), 1);
        assert_eq!(stock[0].quantity_on_hand, 40);
        assert_eq!(stock[0].quantity_available, 40);
        assert_eq!(stock[0].average_cost_cents, 1_200);
    }

    #[tokio::test]
    async fn test_rejected_goods_do_not_reach_stock() {
        let (store, service, fixture) = setup().await;
        let order = service
            .create_purchase_order(order_input(&fixture, &[(fixture.product_ids[0], 10)]))
            .await
            .unwrap();

        let detail = service
            .create_grn(grn(&order, vec![receive(&order.items[0], 10, 7, 3)]))
            .await
            .unwrap();

        assert_eq!(detail.items[0].accepted_quantity, 7);
        assert_eq!(detail.items[0].rejection_reason.as_deref(), Some("damaged"));

        let stock: Vec<InventoryStock> = store.find_all().await.unwrap();
        assert_eq!(stock[0].quantity_on_hand, 7);

        let item: PurchaseOrderItem = store.find_by_id(order.items[0].id.unwrap()).await.unwrap().unwrap();
        assert_eq!(item.received_quantity, 7);
    }

    #[tokio::test]
    async fn test_quantity_mismatch_writes_nothing() {
        let (store, service, fixture) = setup().await;
        let order = service
            .create_purchase_order(order_input(&fixture, &[(fixture.product_ids[0], 20)]))
            .await
            .unwrap();

        // 8 accepted + 5 rejected > 10 received
        let err = service
            .create_grn(grn(&order, vec![receive(&order.items[0], 10, 8, 5)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::Validation(ValidationError::QuantityMismatch { .. }))
        ));
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(store.find_all::<GoodsReceivedNote>().await.unwrap().is_empty());
        assert!(store.find_all::<GrnItem>().await.unwrap().is_empty());
        assert!(store.find_all::<InventoryStock>().await.unwrap().is_empty());
        assert!(store.find_all::<StockMovement>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_over_receipt_is_rejected() {
        let (store, service, fixture) = setup().await;
        let order = service
            .create_purchase_order(order_input(&fixture, &[(fixture.product_ids[0], 10)]))
            .await
            .unwrap();
        service
            .create_grn(grn(&order, vec![receive(&order.items[0], 6, 6, 0)]))
            .await
            .unwrap();

        let err = service
            .create_grn(grn(&order, vec![receive(&order.items[0], 5, 5, 0)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Core(CoreError::OverReceipt {
                outstanding: 4,
                requested: 5,
                ..
            })
        ));
        assert_eq!(store.find_all::<GoodsReceivedNote>().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_and_foreign_lines_are_rejected() {
        let (_, service, fixture) = setup().await;
        let order = service
            .create_purchase_order(order_input(&fixture, &[(fixture.product_ids[0], 10)]))
            .await
            .unwrap();
        let other = service
            .create_purchase_order(order_input(&fixture, &[(fixture.product_ids[1], 10)]))
            .await
            .unwrap();

        let line = receive(&order.items[0], 1, 1, 0);
        let err = service
            .create_grn(grn(&order, vec![line.clone(), line]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = service
            .create_grn(grn(&order, vec![receive(&other.items[0], 1, 1, 0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::ItemNotOnOrder { .. })));
    }

    #[tokio::test]
    async fn test_failed_receipt_is_rolled_back() {
        let inner = Arc::new(MemoryStore::new());
        let failing =
            Arc::new(FailingStore::new(inner.clone()).failing_inserts(Table::StockMovements));
        let store: Arc<dyn RecordStore> = failing.clone();
        let fixture = testing::seed(store.clone()).await;
        let service = PurchasesService::new(store.clone(), AppConfig::default());

        let order = service
            .create_purchase_order(order_input(
                &fixture,
                &[(fixture.product_ids[0], 10), (fixture.product_ids[1], 10)],
            ))
            .await
            .unwrap();

        failing.arm();
        let err = service
            .create_grn(grn(
                &order,
                vec![receive(&order.items[0], 4, 4, 0), receive(&order.items[1], 4, 4, 0)],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Db(DbError::QueryFailed(_))));

        assert!(inner.find_all::<GoodsReceivedNote>().await.unwrap().is_empty());
        assert!(inner.find_all::<GrnItem>().await.unwrap().is_empty());
        assert!(inner.find_all::<InventoryStock>().await.unwrap().is_empty());
        let detail = service.get_purchase_order(order.order.id.unwrap()).await.unwrap();
        assert_eq!(detail, order);
    }

    #[tokio::test]
    async fn test_failed_rollback_reports_both_errors() {
        let inner: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let failing = Arc::new(
            FailingStore::new(inner.clone())
                .failing_inserts(Table::StockMovements)
                .failing_deletes(Table::GoodsReceivedNotes),
        );
        let store: Arc<dyn RecordStore> = failing.clone();
        let fixture = testing::seed(store.clone()).await;
        let service = PurchasesService::new(store, AppConfig::default());

        let order = service
            .create_purchase_order(order_input(&fixture, &[(fixture.product_ids[0], 10)]))
            .await
            .unwrap();

        failing.arm();
        let err = service
            .create_grn(grn(&order, vec![receive(&order.items[0], 4, 4, 0)]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Internal);
        match &err {
            ServiceError::RollbackFailed { original, rollback } => {
                assert!(original.contains("stock_movements"));
                assert!(rollback.contains("goods_received_notes"));
            }
            other => panic!("expected RollbackFailed, got {other:?}"),
        }

        // Every other step was still undone
        assert_eq!(inner.find_all::<GoodsReceivedNote>().await.unwrap().len(), 1);
        assert!(inner.find_all::<GrnItem>().await.unwrap().is_empty());
        assert!(inner.find_all::<InventoryStock>().await.unwrap().is_empty());
        let items: Vec<PurchaseOrderItem> = inner.find_all().await.unwrap();
        assert_eq!(items[0].received_quantity, 0);
    }

    #[tokio::test]
    async fn test_failed_receipt_is_rolled_back_on_sqlite() {
        let inner: Arc<dyn RecordStore> = Arc::new(sqlite_store().await);
        let failing =
            Arc::new(FailingStore::new(inner.clone()).failing_inserts(Table::StockMovements));
        let store: Arc<dyn RecordStore> = failing.clone();
        let fixture = testing::seed(store.clone()).await;
        let service = PurchasesService::new(store, AppConfig::default());

        let order = service
            .create_purchase_order(order_input(
                &fixture,
                &[(fixture.product_ids[0], 10), (fixture.product_ids[1], 10)],
            ))
            .await
            .unwrap();
        service
            .create_grn(grn(&order, vec![receive(&order.items[0], 2, 2, 0)]))
            .await
            .unwrap();
        let before: Vec<InventoryStock> = inner.find_all().await.unwrap();
        let partial = service.get_purchase_order(order.order.id.unwrap()).await.unwrap();

        failing.arm();
        let err = service
            .create_grn(grn(
                &order,
                vec![receive(&order.items[0], 3, 3, 0), receive(&order.items[1], 4, 4, 0)],
            ))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DatabaseError);

        assert_eq!(inner.find_all::<GoodsReceivedNote>().await.unwrap().len(), 1);
        assert_eq!(inner.find_all::<GrnItem>().await.unwrap().len(), 1);
        assert_eq!(inner.find_all::<InventoryStock>().await.unwrap(), before);
        assert_eq!(
            service.get_purchase_order(order.order.id.unwrap()).await.unwrap(),
            partial
        );
    }

    #[tokio::test]
    async fn test_failed_delete_restores_order_on_sqlite() {
        let inner: Arc<dyn RecordStore> = Arc::new(sqlite_store().await);
        let failing =
            Arc::new(FailingStore::new(inner.clone()).failing_deletes(Table::PurchaseOrders));
        let store: Arc<dyn RecordStore> = failing.clone();
        let fixture = testing::seed(store.clone()).await;
        let service = PurchasesService::new(store, AppConfig::default());

        let order = service
            .create_purchase_order(order_input(
                &fixture,
                &[(fixture.product_ids[0], 3), (fixture.product_ids[1], 7)],
            ))
            .await
            .unwrap();

        failing.arm();
        let err = service
            .delete_purchase_order(order.order.id.unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Db(DbError::QueryFailed(_))));

        // Lines deleted before the failure are back under their old ids
        let restored = service.get_purchase_order(order.order.id.unwrap()).await.unwrap();
        assert_eq!(restored, order);
    }

    #[tokio::test]
    async fn test_cancel_and_delete_only_untouched_drafts() {
        let (store, service, fixture) = setup().await;

        let cancelled = service
            .create_purchase_order(order_input(&fixture, &[(fixture.product_ids[0], 5)]))
            .await
            .unwrap();
        let order = service
            .cancel_purchase_order(cancelled.order.id.unwrap())
            .await
            .unwrap();
        assert_eq!(order.status, PurchaseOrderStatus::Cancelled);
        let err = service
            .create_grn(grn(&cancelled, vec![receive(&cancelled.items[0], 1, 1, 0)]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BusinessRule);

        let received = service
            .create_purchase_order(order_input(&fixture, &[(fixture.product_ids[0], 5)]))
            .await
            .unwrap();
        service
            .create_grn(grn(&received, vec![receive(&received.items[0], 1, 1, 0)]))
            .await
            .unwrap();
        assert!(service
            .delete_purchase_order(received.order.id.unwrap())
            .await
            .is_err());

        let draft = service
            .create_purchase_order(order_input(&fixture, &[(fixture.product_ids[1], 2)]))
            .await
            .unwrap();
        service
            .delete_purchase_order(draft.order.id.unwrap())
            .await
            .unwrap();
        assert!(store
            .find_all::<PurchaseOrderItem>()
            .await
            .unwrap()
            .iter()
            .all(|i| i.purchase_order_id != draft.order.id.unwrap()));
        assert_eq!(service.list_purchase_orders().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_receipt_on_sqlite() {
        let db = crate::pool::Database::new(crate::pool::DbConfig::in_memory())
            .await
            .unwrap();
        let store: Arc<dyn RecordStore> = Arc::new(db.store());
        let fixture = testing::seed(store.clone()).await;
        let service = PurchasesService::new(store.clone(), AppConfig::default());

        let order = service
            .create_purchase_order(order_input(&fixture, &[(fixture.product_ids[0], 8)]))
            .await
            .unwrap();
        assert_eq!(
            service.get_purchase_order(order.order.id.unwrap()).await.unwrap(),
            order
        );

        let detail = service
            .create_grn(grn(&order, vec![receive(&order.items[0], 8, 8, 0)]))
            .await
            .unwrap();
        assert_eq!(service.get_grn(detail.grn.id.unwrap()).await.unwrap(), detail);

        let stock: Vec<InventoryStock> = store.find_all().await.unwrap();
        assert_eq!(stock[0].quantity_on_hand, 8);
        assert_eq!(stock[0].average_cost_cents, 1_000);
        assert_eq!(
            service.get_purchase_order(order.order.id.unwrap()).await.unwrap().order.status,
            PurchaseOrderStatus::FullyReceived
        );
    }

    #[tokio::test]
    async fn test_vendors() {
        let (_, service, _) = setup().await;
        let vendor = service
            .create_vendor(NewVendor {
                name: "  Bolt Supply ".to_string(),
                ..NewVendor::default()
            })
            .await
            .unwrap();
        assert_eq!(vendor.name, "Bolt Supply");
        assert_eq!(service.get_vendor(vendor.id.unwrap()).await.unwrap(), vendor);

        let err = service.create_vendor(NewVendor::default()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(service.list_vendors().await.unwrap().len(), 2);
    }
}
