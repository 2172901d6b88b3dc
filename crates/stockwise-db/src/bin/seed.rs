//! # Seed Data Generator
//!
//! Populates a database with demo purchasing data for development.
//!
//! ## Usage
//! ```bash
//! # Default path (./stockwise.db or $STOCKWISE_DB_PATH)
//! cargo run -p stockwise-db --bin seed
//!
//! # Specify database path
//! cargo run -p stockwise-db --bin seed -- --db ./data/stockwise.db
//!
//! # More logging
//! RUST_LOG=debug cargo run -p stockwise-db --bin seed
//! ```
//!
//! ## Generated Data
//! - 3 vendors, 2 branches
//! - Products across hardware categories with costs, prices and reorder levels
//! - One purchase order per vendor at the main branch
//! - A partial GRN against the first order (with a rejected line)
//! - An opening-balance adjustment at the second branch

use chrono::{Duration, Utc};
use std::env;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stockwise_core::AppConfig;
use stockwise_db::service::inventory::{NewBranch, NewProduct, StockAdjustment};
use stockwise_db::service::purchases::{
    CreateGrn, GrnLineInput, NewPurchaseOrder, NewPurchaseOrderItem, NewVendor,
};
use stockwise_db::{Database, DbConfig, RecordStore, Services};

const VENDORS: &[(&str, &str, &str)] = &[
    ("Acme Fasteners", "R. Patel", "orders@acme-fasteners.test"),
    ("Northwind Tools", "J. Okafor", "sales@northwind-tools.test"),
    ("Blue River Paints", "M. Ortiz", "supply@blueriver.test"),
];

const BRANCHES: &[(&str, &str)] = &[("MAIN", "Main Warehouse"), ("CITY", "City Store")];

/// (sku, name, unit, cost, price, tax bps, reorder level)
const PRODUCTS: &[(&str, &str, &str, i64, i64, u32, i64)] = &[
    ("BOLT-M8", "Hex Bolt M8x40", "pcs", 12, 25, 1_800, 500),
    ("NUT-M8", "Hex Nut M8", "pcs", 4, 10, 1_800, 500),
    ("WSH-M8", "Flat Washer M8", "pcs", 2, 5, 1_800, 1_000),
    ("DRL-500", "Cordless Drill 18V", "pcs", 4_500, 7_999, 1_800, 5),
    ("SAW-HND", "Hand Saw 20in", "pcs", 950, 1_899, 1_800, 10),
    ("TAPE-5M", "Measuring Tape 5m", "pcs", 320, 699, 1_800, 20),
    ("PNT-WHT", "Interior Paint White", "l", 610, 1_250, 1_200, 40),
    ("PNT-PRM", "Primer", "l", 480, 990, 1_200, 25),
    ("BRSH-50", "Paint Brush 50mm", "pcs", 150, 399, 1_200, 30),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config = DbConfig::from_env();
    let args: Vec<String> = env::args().collect();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if let Some(path) = args.get(i + 1) {
                    config = DbConfig::new(path);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockwise Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $STOCKWISE_DB_PATH or ./stockwise.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let db = Database::new(config).await?;
    let store: Arc<dyn RecordStore> = Arc::new(db.store());
    let app_config = stockwise_db::SettingsService::new(store.clone())
        .app_config()
        .await?;
    let services = Services::new(store, app_config);

    let existing = services.inventory.list_products().await?;
    if !existing.is_empty() {
        warn!(
            products = existing.len(),
            "Database already seeded, skipping (delete the file to regenerate)"
        );
        return Ok(());
    }

    let start = std::time::Instant::now();

    let mut vendor_ids = Vec::new();
    for (name, contact, email) in VENDORS {
        let vendor = services
            .purchases
            .create_vendor(NewVendor {
                name: name.to_string(),
                contact_person: Some(contact.to_string()),
                email: Some(email.to_string()),
                phone: None,
                address: None,
            })
            .await?;
        vendor_ids.extend(vendor.id);
    }

    let mut branch_ids = Vec::new();
    for (code, name) in BRANCHES {
        let branch = services
            .inventory
            .create_branch(NewBranch {
                code: code.to_string(),
                name: name.to_string(),
                address: None,
            })
            .await?;
        branch_ids.extend(branch.id);
    }

    let mut product_ids = Vec::new();
    for (sku, name, unit, cost, price, tax, reorder) in PRODUCTS {
        let product = services
            .inventory
            .create_product(NewProduct {
                sku: sku.to_string(),
                name: name.to_string(),
                unit: Some(unit.to_string()),
                cost_cents: *cost,
                price_cents: *price,
                tax_rate_bps: Some(*tax),
                reorder_level: *reorder,
            })
            .await?;
        product_ids.extend(product.id);
    }
    info!(
        vendors = vendor_ids.len(),
        branches = branch_ids.len(),
        products = product_ids.len(),
        "Master data created"
    );

    let today = Utc::now().date_naive();
    let main_branch = branch_ids[0];

    // Each vendor supplies three consecutive products
    let mut orders = Vec::new();
    for (n, vendor_id) in vendor_ids.iter().enumerate() {
        let items = product_ids
            .iter()
            .skip(n * 3)
            .take(3)
            .enumerate()
            .map(|(k, product_id)| NewPurchaseOrderItem {
                product_id: *product_id,
                quantity: 10 * (k as i64 + 1) * (n as i64 + 1),
                unit_cost_cents: None,
                discount_bps: if k == 0 { 500 } else { 0 },
                tax_rate_bps: None,
            })
            .collect();

        let order = services
            .purchases
            .create_purchase_order(NewPurchaseOrder {
                vendor_id: *vendor_id,
                branch_id: main_branch,
                order_date: today - Duration::days(7 - n as i64),
                expected_date: Some(today + Duration::days(7)),
                shipping_cents: 1_500,
                notes: None,
                items,
            })
            .await?;
        orders.push(order);
    }

    // Partial delivery of the first order, some goods damaged
    let first = &orders[0];
    let lines = first
        .items
        .iter()
        .take(2)
        .filter_map(|item| {
            let received = item.quantity / 2;
            let rejected = if item.product_id == product_ids[0] { 2 } else { 0 };
            Some(GrnLineInput {
                purchase_order_item_id: item.id?,
                received_quantity: received,
                accepted_quantity: received - rejected,
                rejected_quantity: rejected,
                unit_cost_cents: None,
                rejection_reason: (rejected > 0).then(|| "Damaged in transit".to_string()),
            })
        })
        .collect();
    let grn = services
        .purchases
        .create_grn(CreateGrn {
            purchase_order_id: first.order.id.unwrap_or_default(),
            received_date: today,
            notes: Some("Partial delivery".to_string()),
            items: lines,
        })
        .await?;

    if let (Some(branch_id), Some(product_id)) = (branch_ids.get(1), product_ids.get(3)) {
        services
            .inventory
            .adjust_stock(StockAdjustment {
                product_id: *product_id,
                branch_id: *branch_id,
                quantity: 3,
                reason: "Opening balance".to_string(),
            })
            .await?;
    }

    let summary = services.dashboard.summary().await?;
    info!(
        orders = orders.len(),
        grn = %grn.grn.grn_number,
        open_orders = summary.open_orders,
        low_stock = summary.low_stock_products,
        elapsed = ?start.elapsed(),
        "Seed complete"
    );

    db.close().await;
    Ok(())
}

/// Log filter comes from `RUST_LOG`, falling back to a sensible default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockwise=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
