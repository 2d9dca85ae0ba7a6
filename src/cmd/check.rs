//! Connection self-test for both stores.

use shop_etl::config::PipelineConfig;
use shop_etl::model::SourceTable;
use shop_etl::source;
use shop_etl::warehouse::{Warehouse, WAREHOUSE_TABLES};

pub fn run(config: PipelineConfig) -> anyhow::Result<()> {
    println!("Source: {}", config.source.describe());
    let mut store = source::connect(&config.source)?;
    store.ensure_schema()?;
    for table in SourceTable::ALL {
        println!("  {:<13} {} rows", table.name(), store.row_count(table)?);
    }
    drop(store);

    println!("Warehouse: {}", config.warehouse.display());
    if !config.warehouse.exists() {
        println!("  not built yet (run `shop-etl etl`)");
        return Ok(());
    }
    let warehouse = Warehouse::open_read_only(&config.warehouse)?;
    for table in WAREHOUSE_TABLES {
        if warehouse.table_exists(table)? {
            println!("  {:<13} {} rows", table, warehouse.row_count(table)?);
        } else {
            println!("  {:<13} missing", table);
        }
    }
    Ok(())
}
