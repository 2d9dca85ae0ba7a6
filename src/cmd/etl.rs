use shop_etl::config::PipelineConfig;
use shop_etl::etl::{run_etl, LoadMode, TableLoad};
use shop_etl::source;
use std::path::PathBuf;

pub fn run(
    mut config: PipelineConfig,
    refresh: bool,
    warehouse: Option<PathBuf>,
) -> anyhow::Result<()> {
    if let Some(path) = warehouse {
        config.warehouse = path;
    }
    let mode = if refresh {
        LoadMode::Refresh
    } else {
        LoadMode::CreateIfMissing
    };

    eprintln!(
        "ETL: {} -> {}",
        config.source.describe(),
        config.warehouse.display()
    );
    let mut store = source::connect(&config.source)?;
    let stats = run_etl(store.as_mut(), &config.warehouse, mode)?;

    println!("ETL complete:");
    for (table, status) in &stats.tables {
        match status {
            TableLoad::Created(n) => println!("  {:<13} {} rows", table, n),
            TableLoad::Skipped => println!("  {:<13} already exists, skipped", table),
        }
    }
    if stats.tables_created() < stats.tables.len() {
        println!("  Run with --refresh to rebuild existing tables.");
    }
    println!("  Elapsed: {:.2}s", stats.duration_secs);

    Ok(())
}
