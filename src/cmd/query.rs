//! Ad-hoc SQL against the warehouse.

use anyhow::{Context, Result};
use shop_etl::config::PipelineConfig;
use shop_etl::warehouse::{OutputFormat, QueryResultFormatter, Warehouse};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub fn run(
    config: PipelineConfig,
    query: String,
    format: String,
    output: Option<PathBuf>,
    warehouse: Option<PathBuf>,
    timing: bool,
) -> Result<()> {
    let output_format: OutputFormat = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let path = warehouse.unwrap_or(config.warehouse);

    let warehouse = Warehouse::open_read_only(&path)?;
    let result = warehouse.query(&query)?;
    let formatted = QueryResultFormatter::format(&result, output_format);

    if let Some(output_path) = output {
        let file = File::create(&output_path)
            .with_context(|| format!("Cannot create output file: {}", output_path.display()))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(formatted.as_bytes())?;
        writer.flush()?;
        eprintln!(
            "Wrote {} rows to {}",
            result.row_count(),
            output_path.display()
        );
    } else {
        print!("{}", formatted);
    }

    if timing {
        eprintln!("Query executed in {:.3}s", result.execution_time_secs);
    }
    Ok(())
}
