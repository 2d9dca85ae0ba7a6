use shop_etl::config::PipelineConfig;
use shop_etl::report::Reporter;
use std::path::PathBuf;

pub fn run(
    mut config: PipelineConfig,
    output_dir: Option<PathBuf>,
    warehouse: Option<PathBuf>,
) -> anyhow::Result<()> {
    if let Some(dir) = output_dir {
        config.reports = dir;
    }
    if let Some(path) = warehouse {
        config.warehouse = path;
    }

    let outcomes = Reporter::new(&config.warehouse, &config.reports).run()?;

    println!("Reports written to {}:", config.reports.display());
    for outcome in &outcomes {
        println!(
            "  {:<24} {} rows",
            outcome.report.file_name(),
            outcome.rows
        );
    }
    Ok(())
}
