//! Aggregation reports over the star schema, exported as CSV.

use crate::error::PipelineError;
use crate::warehouse::{OutputFormat, QueryResultFormatter, Warehouse};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// The reports produced by every run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    DailyPerformance,
    TopProducts,
    ActiveUsers,
}

impl Report {
    pub const ALL: [Report; 3] = [
        Report::DailyPerformance,
        Report::TopProducts,
        Report::ActiveUsers,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Report::DailyPerformance => "daily_performance.csv",
            Report::TopProducts => "top_products.csv",
            Report::ActiveUsers => "active_users.csv",
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            Report::DailyPerformance => {
                "SELECT order_date, \
                        COUNT(DISTINCT order_id) AS total_orders, \
                        ROUND(SUM(revenue), 2) AS gross_revenue \
                 FROM fact_orders \
                 GROUP BY order_date \
                 ORDER BY order_date"
            }
            Report::TopProducts => {
                "SELECT p.name AS product_name, \
                        ROUND(SUM(f.revenue), 2) AS total_revenue, \
                        SUM(f.quantity) AS total_units_sold \
                 FROM fact_orders f \
                 JOIN dim_products p ON f.product_id = p.id \
                 GROUP BY p.name \
                 ORDER BY total_revenue DESC \
                 LIMIT 10"
            }
            Report::ActiveUsers => {
                "SELECT order_date, \
                        COUNT(DISTINCT user_id) AS unique_customers \
                 FROM fact_orders \
                 GROUP BY order_date \
                 ORDER BY order_date"
            }
        }
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Report::DailyPerformance => write!(f, "daily performance"),
            Report::TopProducts => write!(f, "top products"),
            Report::ActiveUsers => write!(f, "active users"),
        }
    }
}

/// A report written to disk
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutcome {
    pub report: Report,
    pub path: PathBuf,
    pub rows: usize,
}

pub struct Reporter {
    warehouse: PathBuf,
    output_dir: PathBuf,
}

impl Reporter {
    pub fn new(warehouse: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            warehouse: warehouse.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Run every report.
    ///
    /// Nothing is created on disk when the warehouse file is missing.
    pub fn run(&self) -> Result<Vec<ReportOutcome>> {
        if !self.warehouse.exists() {
            return Err(PipelineError::MissingWarehouse(self.warehouse.clone()).into());
        }
        let warehouse = Warehouse::open_read_only(&self.warehouse)?;

        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                self.output_dir.display()
            )
        })?;

        Report::ALL
            .iter()
            .map(|report| self.write_report(&warehouse, *report))
            .collect()
    }

    fn write_report(&self, warehouse: &Warehouse, report: Report) -> Result<ReportOutcome> {
        let result = warehouse
            .query(report.sql())
            .with_context(|| format!("Failed to run the {} report", report))?;
        let path = self.output_dir.join(report.file_name());
        write_csv(&path, &result)?;
        info!("Wrote {} rows to {}", result.row_count(), path.display());
        Ok(ReportOutcome {
            report,
            path,
            rows: result.row_count(),
        })
    }
}

fn write_csv(path: &Path, result: &crate::warehouse::QueryResult) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Cannot create output file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    QueryResultFormatter::write(result, OutputFormat::Csv, &mut writer)?;
    writer.flush()?;
    Ok(())
}
