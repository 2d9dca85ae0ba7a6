//! Batch ETL from the normalized source into the DuckDB star schema.
//!
//! Every run reads the four source tables in full, builds the fact and
//! dimension tables in memory, and writes them to the warehouse file.

mod load;
mod transform;

pub use load::{load, LoadMode, LoadStats, TableLoad};
pub use transform::{transform, StarSchema};

use crate::model::{Order, OrderItem, Product, User};
use crate::source::SourceStore;
use crate::warehouse::Warehouse;
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Full contents of the source tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceSnapshot {
    pub users: Vec<User>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
    pub order_items: Vec<OrderItem>,
}

/// Read every source table
pub fn extract<S: SourceStore + ?Sized>(store: &mut S) -> Result<SourceSnapshot> {
    let snapshot = SourceSnapshot {
        users: store.users()?,
        products: store.products()?,
        orders: store.orders()?,
        order_items: store.order_items()?,
    };
    info!(
        "Extracted {} users, {} products, {} orders, {} order items from {}",
        snapshot.users.len(),
        snapshot.products.len(),
        snapshot.orders.len(),
        snapshot.order_items.len(),
        store.describe()
    );
    Ok(snapshot)
}

/// Extract, transform and load into the warehouse at `warehouse_path`
pub fn run_etl<S: SourceStore + ?Sized>(
    store: &mut S,
    warehouse_path: &Path,
    mode: LoadMode,
) -> Result<LoadStats> {
    let snapshot = extract(store)?;
    let star = transform(&snapshot);
    info!(
        "Built {} fact rows over {} dates",
        star.fact_orders.len(),
        star.dim_date.len()
    );

    let warehouse = Warehouse::open(warehouse_path)?;
    let stats = load(&warehouse, &star, mode)?;
    info!("Warehouse {}: {}", warehouse_path.display(), stats);
    Ok(stats)
}
