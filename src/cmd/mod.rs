mod check;
mod etl;
mod generate;
mod query;
mod report;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use shop_etl::config::PipelineConfig;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shop-etl")]
#[command(version)]
#[command(
    about = "Generate, transform and report on a demo e-commerce dataset",
    long_about = None
)]
pub struct Cli {
    /// YAML config file (environment variables override its values)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Populate empty source tables with synthetic rows
    #[command(after_help = "Examples:
  shop-etl generate
  shop-etl generate --scale small --progress
  DB_BACKEND=duckdb shop-etl generate --seed 7")]
    Generate {
        /// Random seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,

        /// Volume preset: small, medium, large
        #[arg(long)]
        scale: Option<String>,

        /// Rows per INSERT batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Show progress per table
        #[arg(short, long)]
        progress: bool,
    },

    /// Build the star schema warehouse from the source tables
    Etl {
        /// Drop existing warehouse tables and rebuild them
        #[arg(long)]
        refresh: bool,

        /// Warehouse DuckDB file (overrides WAREHOUSE_PATH)
        #[arg(short, long, value_name = "FILE")]
        warehouse: Option<PathBuf>,
    },

    /// Export the aggregation reports as CSV files
    Report {
        /// Directory for the CSV files (overrides REPORT_DIR)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Warehouse DuckDB file (overrides WAREHOUSE_PATH)
        #[arg(short, long, value_name = "FILE")]
        warehouse: Option<PathBuf>,
    },

    /// Verify that the source and warehouse can be opened
    Check,

    /// Run a SQL query against the warehouse
    #[command(after_help = "Examples:
  shop-etl query \"SELECT COUNT(*) FROM fact_orders\"
  shop-etl query \"SELECT * FROM dim_date LIMIT 5\" -f json
  shop-etl query \"SELECT * FROM dim_products\" -o products.csv -f csv")]
    Query {
        /// SQL query to execute
        #[arg(value_name = "QUERY")]
        query: String,

        /// Output format: table, json, jsonl, csv, tsv
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Write output to file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Warehouse DuckDB file (overrides WAREHOUSE_PATH)
        #[arg(short, long, value_name = "FILE")]
        warehouse: Option<PathBuf>,

        /// Show query execution time
        #[arg(long)]
        timing: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Completions { shell } = cli.command {
        generate(shell, &mut Cli::command(), "shop-etl", &mut io::stdout());
        return Ok(());
    }

    let config = PipelineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate {
            seed,
            scale,
            batch_size,
            progress,
        } => generate::run(config, seed, scale, batch_size, progress),
        Commands::Etl { refresh, warehouse } => etl::run(config, refresh, warehouse),
        Commands::Report {
            output_dir,
            warehouse,
        } => report::run(config, output_dir, warehouse),
        Commands::Check => check::run(config),
        Commands::Query {
            query,
            format,
            output,
            warehouse,
            timing,
        } => query::run(config, query, format, output, warehouse, timing),
        Commands::Completions { .. } => Ok(()),
    }
}
