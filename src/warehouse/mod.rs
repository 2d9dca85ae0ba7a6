//! DuckDB analytical warehouse holding the star schema.
//!
//! The ETL step opens the warehouse read-write and creates its tables; the
//! reporter and the `query` command open it read-only.
//!
//! # Example
//!
//! ```ignore
//! use shop_etl::warehouse::{OutputFormat, QueryResultFormatter, Warehouse};
//! use std::path::Path;
//!
//! let warehouse = Warehouse::open_read_only(Path::new("olap.duckdb")).unwrap();
//! let result = warehouse.query("SELECT COUNT(*) FROM fact_orders").unwrap();
//! println!("{}", QueryResultFormatter::format(&result, OutputFormat::Table));
//! ```

mod output;

pub use output::{OutputFormat, QueryResultFormatter};

use crate::error::PipelineError;
use anyhow::{Context, Result};
use duckdb::types::ValueRef;
use duckdb::{AccessMode, Config, Connection};
use std::path::{Path, PathBuf};

pub const DIM_USERS: &str = "dim_users";
pub const DIM_PRODUCTS: &str = "dim_products";
pub const FACT_ORDERS: &str = "fact_orders";
pub const DIM_DATE: &str = "dim_date";

/// Warehouse tables in load order
pub const WAREHOUSE_TABLES: [&str; 4] = [DIM_USERS, DIM_PRODUCTS, FACT_ORDERS, DIM_DATE];

/// CREATE TABLE statement for a warehouse table
pub fn create_table_sql(table: &str) -> Option<&'static str> {
    match table {
        DIM_USERS => Some(
            "CREATE TABLE dim_users (id BIGINT, name VARCHAR, email VARCHAR, signup_date DATE)",
        ),
        DIM_PRODUCTS => Some(
            "CREATE TABLE dim_products (id BIGINT, name VARCHAR, category VARCHAR, price DOUBLE)",
        ),
        FACT_ORDERS => Some(
            "CREATE TABLE fact_orders (line_item_id BIGINT, order_id BIGINT, user_id BIGINT, \
             product_id BIGINT, order_date DATE, quantity INTEGER, unit_price DOUBLE, revenue DOUBLE)",
        ),
        DIM_DATE => Some(
            "CREATE TABLE dim_date (date DATE, year INTEGER, month INTEGER, day INTEGER, \
             day_of_week INTEGER)",
        ),
        _ => None,
    }
}

/// Result of a query execution
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Column types (as strings)
    pub column_types: Vec<String>,
    /// Rows of data, every value rendered as text
    pub rows: Vec<Vec<String>>,
    /// Query execution time in seconds
    pub execution_time_secs: f64,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Handle on the warehouse database file
pub struct Warehouse {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Warehouse {
    /// Open the warehouse for writing, creating the file on first use
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| PipelineError::connection(format!("warehouse {}", path.display()), e))?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an existing warehouse read-only.
    ///
    /// Fails with [`PipelineError::MissingWarehouse`] without touching the
    /// filesystem when the file does not exist.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::MissingWarehouse(path.to_path_buf()).into());
        }
        let config = Config::default()
            .access_mode(AccessMode::ReadOnly)
            .context("Failed to configure read-only access")?;
        let conn = Connection::open_with_flags(path, config)
            .map_err(|e| PipelineError::connection(format!("warehouse {}", path.display()), e))?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Scratch warehouse for tests and benchmarks
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| PipelineError::connection("in-memory warehouse", e))?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Execute a query and return the results
    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        let start = std::time::Instant::now();

        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| PipelineError::Query(format!("{}: {}", sql, e)))?;

        let mut rows_result = stmt
            .query([])
            .map_err(|e| PipelineError::Query(format!("{}: {}", sql, e)))?;

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut column_count = 0;

        while let Some(row) = rows_result.next()? {
            if column_count == 0 {
                column_count = row.as_ref().column_count();
            }

            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(match row.get_ref(i) {
                    Ok(value) => render_value(value),
                    Err(_) => "ERROR".to_string(),
                });
            }
            rows.push(values);
        }

        // Release the statement borrow before reading column metadata
        drop(rows_result);

        let column_count = stmt.column_count();
        let columns: Vec<String> = (0..column_count)
            .map(|i| {
                stmt.column_name(i)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| format!("col{}", i))
            })
            .collect();

        let column_types: Vec<String> = (0..column_count)
            .map(|i| format!("{:?}", stmt.column_type(i)))
            .collect();

        Ok(QueryResult {
            columns,
            column_types,
            rows,
            execution_time_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Execute a statement that doesn't return results (e.g., CREATE, DROP)
    pub fn execute(&self, sql: &str) -> Result<usize> {
        self.conn
            .execute(sql, [])
            .map_err(|e| PipelineError::Query(format!("{}: {}", sql, e)).into())
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_schema = 'main' AND table_name = ?",
                [table],
                |row| row.get(0),
            )
            .with_context(|| format!("Failed to look up table {}", table))?;
        Ok(count > 0)
    }

    /// Tables in the warehouse, sorted by name
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let result = self.query(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'main' ORDER BY table_name",
        )?;
        Ok(result.rows.into_iter().map(|r| r[0].clone()).collect())
    }

    pub fn row_count(&self, table: &str) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |row| {
                row.get(0)
            })
            .map_err(|e| PipelineError::Query(format!("COUNT(*) on {}: {}", table, e)))?;
        Ok(count as u64)
    }

    /// Get the underlying DuckDB connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Render one DuckDB value the way it appears in reports
fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Boolean(b) => b.to_string(),
        ValueRef::TinyInt(n) => n.to_string(),
        ValueRef::SmallInt(n) => n.to_string(),
        ValueRef::Int(n) => n.to_string(),
        ValueRef::BigInt(n) => n.to_string(),
        ValueRef::HugeInt(n) => n.to_string(),
        ValueRef::UTinyInt(n) => n.to_string(),
        ValueRef::USmallInt(n) => n.to_string(),
        ValueRef::UInt(n) => n.to_string(),
        ValueRef::UBigInt(n) => n.to_string(),
        ValueRef::Float(f) => f.to_string(),
        ValueRef::Double(f) => f.to_string(),
        ValueRef::Decimal(d) => d.to_string(),
        ValueRef::Text(s) => String::from_utf8_lossy(s).to_string(),
        ValueRef::Blob(b) => format!("<blob {} bytes>", b.len()),
        ValueRef::Timestamp(_, ts) => {
            // microseconds since epoch
            let secs = ts.div_euclid(1_000_000);
            let nanos = (ts.rem_euclid(1_000_000) * 1000) as u32;
            match chrono::DateTime::from_timestamp(secs, nanos) {
                Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => ts.to_string(),
            }
        }
        ValueRef::Date32(days) => {
            // 719163 = days from 0001-01-01 to 1970-01-01
            match chrono::NaiveDate::from_num_days_from_ce_opt(719_163 + days) {
                Some(date) => date.format("%Y-%m-%d").to_string(),
                None => days.to_string(),
            }
        }
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_only_open_of_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("olap.duckdb");

        let err = Warehouse::open_read_only(&path).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingWarehouse(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_query_renders_dates_and_numbers() {
        let wh = Warehouse::open_in_memory().unwrap();
        let result = wh
            .query("SELECT DATE '2024-03-10' AS d, 42::BIGINT AS n, 2.5::DOUBLE AS x, NULL AS z")
            .unwrap();
        assert_eq!(result.columns, vec!["d", "n", "x", "z"]);
        assert_eq!(result.rows, vec![vec!["2024-03-10", "42", "2.5", "NULL"]]);
    }

    #[test]
    fn test_table_exists_and_list() {
        let wh = Warehouse::open_in_memory().unwrap();
        assert!(!wh.table_exists(DIM_DATE).unwrap());

        for table in WAREHOUSE_TABLES {
            wh.execute(create_table_sql(table).unwrap()).unwrap();
        }
        assert!(wh.table_exists(DIM_DATE).unwrap());
        assert_eq!(
            wh.list_tables().unwrap(),
            vec!["dim_date", "dim_products", "dim_users", "fact_orders"]
        );
        assert_eq!(wh.row_count(FACT_ORDERS).unwrap(), 0);
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("olap.duckdb");
        {
            let wh = Warehouse::open(&path).unwrap();
            wh.execute(create_table_sql(DIM_USERS).unwrap()).unwrap();
        }

        let wh = Warehouse::open_read_only(&path).unwrap();
        assert!(wh.table_exists(DIM_USERS).unwrap());
        assert!(wh.execute("DROP TABLE dim_users").is_err());
    }
}
