//! # Inventory Service
//!
//! Branches, products, stock positions and manual adjustments.
//!
//! Receipts change stock through [`super::PurchasesService::create_grn`];
//! everything else goes through [`InventoryService::adjust_stock`]. Both
//! append a [`StockMovement`] so the ledger always explains the balance.

use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::error::{ServiceError, ServiceResult};
use super::{finish, StockLock};
use crate::error::DbError;
use crate::store::{RecordStore, RecordStoreExt, UnitOfWork};
use stockwise_core::costing;
use stockwise_core::validation;
use stockwise_core::{
    AppConfig, Branch, CoreError, InventoryStock, MovementType, Product, StockMovement,
    ValidationError,
};

/// `reference_type` of movements created by an adjustment.
pub const ADJUSTMENT_REFERENCE: &str = "adjustment";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBranch {
    pub code: String,
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    /// Defaults to "pcs".
    pub unit: Option<String>,
    #[serde(default)]
    pub cost_cents: i64,
    #[serde(default)]
    pub price_cents: i64,
    /// Defaults to the configured tax rate.
    pub tax_rate_bps: Option<u32>,
    #[serde(default)]
    pub reorder_level: i64,
}

/// A signed manual correction to one stock position.
#[derive(Debug, Clone, Deserialize)]
pub struct StockAdjustment {
    pub product_id: i64,
    pub branch_id: i64,
    /// Positive adds stock, negative removes it.
    pub quantity: i64,
    pub reason: String,
}

pub struct InventoryService {
    store: Arc<dyn RecordStore>,
    config: AppConfig,
    stock_lock: StockLock,
}

impl InventoryService {
    pub fn new(store: Arc<dyn RecordStore>, config: AppConfig) -> Self {
        InventoryService {
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

    // -------------------------------------------------------------------------
    // Branches
    // -------------------------------------------------------------------------

    /// Creates a branch; codes are unique ignoring case.
    pub async fn create_branch(&self, input: NewBranch) -> ServiceResult<Branch> {
        let code = input.code.trim().to_uppercase();
        let branches: Vec<Branch> = self.store.find_all().await?;
        if branches.iter().any(|b| b.code.eq_ignore_ascii_case(&code)) {
            return Err(DbError::duplicate("branch code", &code).into());
        }

        let mut branch = Branch {
            id: None,
            code,
            name: input.name.trim().to_string(),
            address: input.address,
            created_at: Utc::now(),
        };
        branch.id = Some(self.store.insert(&branch).await?);

        info!(code = %branch.code, "Branch created");
        Ok(branch)
    }

    pub async fn list_branches(&self) -> ServiceResult<Vec<Branch>> {
        let mut branches: Vec<Branch> = self.store.find_all().await?;
        branches.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(branches)
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    /// Creates a product; SKUs are unique ignoring case.
    pub async fn create_product(&self, input: NewProduct) -> ServiceResult<Product> {
        let sku = input.sku.trim().to_uppercase();
        let products: Vec<Product> = self.store.find_all().await?;
        if products.iter().any(|p| p.sku.eq_ignore_ascii_case(&sku)) {
            return Err(DbError::duplicate("sku", &sku).into());
        }

        let now = Utc::now();
        let mut product = Product {
            id: None,
            sku,
            name: input.name.trim().to_string(),
            unit: input
                .unit
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| "pcs".to_string()),
            cost_cents: input.cost_cents,
            price_cents: input.price_cents,
            tax_rate_bps: input
                .tax_rate_bps
                .unwrap_or(self.config.default_tax_rate_bps),
            reorder_level: input.reorder_level,
            created_at: now,
            updated_at: now,
        };
        product.id = Some(self.store.insert(&product).await?);

        info!(sku = %product.sku, "Product created");
        Ok(product)
    }

    /// Products sorted by SKU.
    pub async fn list_products(&self) -> ServiceResult<Vec<Product>> {
        let mut products: Vec<Product> = self.store.find_all().await?;
        products.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(products)
    }

    pub async fn get_product(&self, id: i64) -> ServiceResult<Product> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    // -------------------------------------------------------------------------
    // Stock
    // -------------------------------------------------------------------------

    /// Stock positions, optionally for one branch.
    pub async fn list_stock(&self, branch_id: Option<i64>) -> ServiceResult<Vec<InventoryStock>> {
        let mut stock: Vec<InventoryStock> = self.store.find_all().await?;
        if let Some(branch_id) = branch_id {
            stock.retain(|s| s.branch_id == branch_id);
        }
        stock.sort_by_key(|s| (s.branch_id, s.product_id));
        Ok(stock)
    }

    /// The position for a product at a branch; empty if never stocked.
    pub async fn stock_for(&self, product_id: i64, branch_id: i64) -> ServiceResult<InventoryStock> {
        Ok(self
            .find_position(self.store.as_ref(), product_id, branch_id)
            .await?
            .unwrap_or_else(|| InventoryStock::empty(product_id, branch_id, Utc::now())))
    }

    /// Applies a manual correction and records it in the ledger.
    ///
    /// The average cost is unchanged. Removals cannot exceed available stock.
    pub async fn adjust_stock(&self, input: StockAdjustment) -> ServiceResult<InventoryStock> {
        if input.quantity == 0 {
            return Err(ValidationError::MustBePositive {
                field: "adjustment quantity".to_string(),
            }
            .into());
        }
        validation::validate_quantity(input.quantity.abs())?;
        if input.reason.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "adjustment reason".to_string(),
            }
            .into());
        }

        self.store
            .find_by_id::<Product>(input.product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", input.product_id))?;
        self.store
            .find_by_id::<Branch>(input.branch_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Branch", input.branch_id))?;

        let _adjusting = self.stock_lock.lock().await;

        let now = Utc::now();
        let mut position = self
            .find_position(self.store.as_ref(), input.product_id, input.branch_id)
            .await?
            .unwrap_or_else(|| InventoryStock::empty(input.product_id, input.branch_id, now));

        if input.quantity < 0 && -input.quantity > position.quantity_available {
            warn!(
                product_id = input.product_id,
                available = position.quantity_available,
                requested = -input.quantity,
                "Adjustment exceeds available stock"
            );
            return Err(CoreError::InsufficientStock {
                product_id: input.product_id,
                available: position.quantity_available,
                requested: -input.quantity,
            }
            .into());
        }

        let balance = costing::apply_adjustment(&mut position, input.quantity);
        position.updated_at = now;

        let uow = UnitOfWork::begin(self.store.clone());
        let outcome = async {
            match position.id {
                Some(id) => {
                    uow.update(id, &position).await?;
                }
                None => {
                    position.id = Some(uow.insert(&position).await?);
                }
            }

            uow.insert(&StockMovement {
                id: None,
                product_id: input.product_id,
                branch_id: input.branch_id,
                movement_type: MovementType::Adjustment,
                quantity: input.quantity,
                unit_cost_cents: position.average_cost_cents,
                balance_after: balance,
                reference_type: Some(ADJUSTMENT_REFERENCE.to_string()),
                reference_id: None,
                reference_number: None,
                notes: Some(input.reason.trim().to_string()),
                created_at: now,
            })
            .await?;

            Ok::<_, ServiceError>(())
        }
        .await;
        finish(uow, outcome).await?;

        info!(
            product_id = input.product_id,
            branch_id = input.branch_id,
            delta = input.quantity,
            balance,
            "Stock adjusted"
        );
        Ok(position)
    }

    async fn find_position(
        &self,
        store: &dyn RecordStore,
        product_id: i64,
        branch_id: i64,
    ) -> ServiceResult<Option<InventoryStock>> {
        Ok(store
            .find_all::<InventoryStock>()
            .await?
            .into_iter()
            .find(|s| s.product_id == product_id && s.branch_id == branch_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
