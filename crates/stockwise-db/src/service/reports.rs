//! # Reports Service
//!
//! Loads whole tables and hands them to the reducers in
//! [`stockwise_core::reports`].
//!
//! ```text
//! inventory_valuation ── inventory_stock + products
//! stock_ledger ───────── stock_movements (one product at one branch)
//! purchase_summary ───── vendors + purchase_orders + goods_received_notes
//! receiving_status ───── purchase_orders + purchase_order_items
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use super::error::{ServiceError, ServiceResult};
use crate::store::{RecordStore, RecordStoreExt};
use stockwise_core::reports::{self, InventoryValuation, LedgerEntry, ReceivingStatus, VendorPurchaseSummary};
use stockwise_core::{
    CoreError, GoodsReceivedNote, InventoryStock, Product, PurchaseOrder, PurchaseOrderItem,
    StockMovement, Vendor,
};

pub struct ReportsService {
    store: Arc<dyn RecordStore>,
}

impl ReportsService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        ReportsService { store }
    }

    /// Stock at average cost, optionally for one branch.
    pub async fn inventory_valuation(&self, branch_id: Option<i64>) -> ServiceResult<InventoryValuation> {
        let mut stock: Vec<InventoryStock> = self.store.find_all().await?;
        if let Some(branch_id) = branch_id {
            stock.retain(|s| s.branch_id == branch_id);
        }
        let products: Vec<Product> = self.store.find_all().await?;
        Ok(reports::inventory_valuation(&stock, &products))
    }

    /// Movements of one product at one branch with running balances.
    pub async fn stock_ledger(&self, product_id: i64, branch_id: i64) -> ServiceResult<Vec<LedgerEntry>> {
        self.store
            .find_by_id::<Product>(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        let movements: Vec<StockMovement> = self.store.find_all().await?;
        Ok(reports::stock_ledger(&movements, product_id, branch_id))
    }

    pub async fn purchase_summary_by_vendor(&self) -> ServiceResult<Vec<VendorPurchaseSummary>> {
        let vendors: Vec<Vendor> = self.store.find_all().await?;
        let orders: Vec<PurchaseOrder> = self.store.find_all().await?;
        let grns: Vec<GoodsReceivedNote> = self.store.find_all().await?;
        Ok(reports::purchase_summary_by_vendor(&vendors, &orders, &grns))
    }

    /// Receiving progress of every open order.
    pub async fn receiving_status(&self) -> ServiceResult<Vec<ReceivingStatus>> {
        let orders: Vec<PurchaseOrder> = self.store.find_all().await?;
        let mut items_by_order: HashMap<i64, Vec<PurchaseOrderItem>> = HashMap::new();
        for item in self.store.find_all::<PurchaseOrderItem>().await? {
            items_by_order.entry(item.purchase_order_id).or_default().push(item);
        }

        Ok(orders
            .iter()
            .filter(|o| o.status.is_open())
            .map(|o| {
                let items = o
                    .id
                    .and_then(|id| items_by_order.get(&id))
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                reports::receiving_status(o, items)
            })
            .collect())
    }

    /// Receiving progress of one order, whatever its status.
    pub async fn receiving_status_for(&self, order_id: i64) -> ServiceResult<ReceivingStatus> {
        let order: PurchaseOrder = self
            .store
            .find_by_id(order_id)
            .await?
            .ok_or(CoreError::PurchaseOrderNotFound(order_id))?;
        let items: Vec<PurchaseOrderItem> = self
            .store
            .find_all::<PurchaseOrderItem>()
            .await?
            .into_iter()
            .filter(|i| i.purchase_order_id == order_id)
            .collect();
        Ok(reports::receiving_status(&order, &items))
    }
}
