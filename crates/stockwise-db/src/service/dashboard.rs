//! Dashboard headline numbers.

use std::sync::Arc;
use tracing::debug;

use super::error::ServiceResult;
use crate::store::{RecordStore, RecordStoreExt};
use stockwise_core::reports::{dashboard_summary, DashboardSummary};
use stockwise_core::{InventoryStock, Product, PurchaseOrder, PurchaseOrderItem, StockMovement};

/// Movements shown in the "recent activity" list.
pub const RECENT_MOVEMENTS: usize = 10;

pub struct DashboardService {
    store: Arc<dyn RecordStore>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        DashboardService { store }
    }

    pub async fn summary(&self) -> ServiceResult<DashboardSummary> {
        let orders: Vec<PurchaseOrder> = self.store.find_all().await?;
        let items: Vec<PurchaseOrderItem> = self.store.find_all().await?;
        let stock: Vec<InventoryStock> = self.store.find_all().await?;
        let products: Vec<Product> = self.store.find_all().await?;
        let movements: Vec<StockMovement> = self.store.find_all().await?;

        let summary = dashboard_summary(
            &orders,
            &items,
            &stock,
            &products,
            &movements,
            RECENT_MOVEMENTS,
        );
        debug!(
            open_orders = summary.open_orders,
            low_stock = summary.low_stock_products,
            "Dashboard computed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::inventory::{InventoryService, StockAdjustment};
    use crate::service::purchases::{NewPurchaseOrder, NewPurchaseOrderItem, PurchasesService};
    use crate::service::testing;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use stockwise_core::AppConfig;

    #[tokio::test]
    async fn test_empty_store() {
        let service = DashboardService::new(Arc::new(MemoryStore::new()));
        let summary = service.summary().await.unwrap();
        assert_eq!(summary.open_orders, 0);
        assert!(summary.inventory_value.is_zero());
        assert!(summary.recent_movements.is_empty());
    }

    #[tokio::test]
    async fn test_summary_reflects_orders_and_stock() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let fixture = testing::seed(store.clone()).await;
        let purchases = PurchasesService::new(store.clone(), AppConfig::default());
        let inventory = InventoryService::new(store.clone(), AppConfig::default());

        // 4 × 10.00 outstanding
        purchases
            .create_purchase_order(NewPurchaseOrder {
                vendor_id: fixture.vendor_id,
                branch_id: fixture.branch_id,
                order_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                expected_date: None,
                shipping_cents: 0,
                notes: None,
                items: vec![NewPurchaseOrderItem {
                    product_id: fixture.product_ids[0],
                    quantity: 4,
                    unit_cost_cents: None,
                    discount_bps: 0,
                    tax_rate_bps: None,
                }],
            })
            .await
            .unwrap();

        // Gadget: 3 on hand, reorder level 5
        inventory
            .adjust_stock(StockAdjustment {
                product_id: fixture.product_ids[1],
                branch_id: fixture.branch_id,
                quantity: 3,
                reason: "opening balance".to_string(),
            })
            .await
            .unwrap();

        let summary = DashboardService::new(store).summary().await.unwrap();
        assert_eq!(summary.open_orders, 1);
        assert_eq!(summary.outstanding_value.cents(), 4_000);
        assert_eq!(summary.low_stock_products, 1);
        assert_eq!(summary.recent_movements.len(), 1);
    }
}
