//! Batch ETL demo over a synthetic e-commerce dataset.
//!
//! Three stages run as separate invocations:
//!
//! 1. [`generate`] fills the normalized source tables (PostgreSQL, or a DuckDB
//!    file for local work) with FK-consistent synthetic rows.
//! 2. [`etl`] reads the source, derives a star schema and loads it into a
//!    DuckDB warehouse file.
//! 3. [`report`] runs the aggregation queries and writes CSV files.

pub mod config;
pub mod error;
pub mod etl;
pub mod generate;
pub mod model;
pub mod progress;
pub mod report;
pub mod source;
pub mod warehouse;
