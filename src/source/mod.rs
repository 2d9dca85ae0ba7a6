//! Access to the normalized source database.
//!
//! The generator and the ETL extract step only talk to a [`SourceStore`].
//! Two backends implement it: PostgreSQL (the real source) and a DuckDB
//! file, which serves local development and the test suite.

mod duck;
mod postgres;

pub use duck::DuckDbSource;
pub use postgres::PostgresSource;

use crate::config::{SourceBackend, SourceConfig};
use crate::model::{Order, OrderItem, Product, SourceTable, User};
use anyhow::Result;
use shop_data_gen::{ProductRef, Row, Schema, Table};

/// Recomputes every order's total from its line items.
pub const REFRESH_ORDER_TOTALS_SQL: &str = "UPDATE orders SET total_amount = COALESCE(\
     (SELECT SUM(oi.quantity * oi.price) FROM order_items oi WHERE oi.order_id = orders.id), 0)";

/// Operations the pipeline needs from the source database.
///
/// All calls block until the database answers. Transactions are explicit:
/// `insert_rows` issued between `begin` and `commit` become visible together.
pub trait SourceStore {
    /// Connection target for log messages
    fn describe(&self) -> String;

    /// Create the four source tables if they do not exist
    fn ensure_schema(&mut self) -> Result<()>;

    fn row_count(&mut self, table: SourceTable) -> Result<u64>;

    /// Primary keys of `table`, ascending
    fn ids(&mut self, table: SourceTable) -> Result<Vec<i64>>;

    fn begin(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;

    /// Insert rows given in the table's insert-column order; returns rows written
    fn insert_rows(&mut self, table: SourceTable, rows: &[Row]) -> Result<u64>;

    /// Execute a statement that returns no rows; returns rows affected
    fn execute(&mut self, sql: &str) -> Result<u64>;

    fn users(&mut self) -> Result<Vec<User>>;
    fn products(&mut self) -> Result<Vec<Product>>;
    fn orders(&mut self) -> Result<Vec<Order>>;
    fn order_items(&mut self) -> Result<Vec<OrderItem>>;

    /// Product keys with their catalog prices
    fn product_refs(&mut self) -> Result<Vec<ProductRef>> {
        Ok(self
            .products()?
            .into_iter()
            .map(|p| ProductRef {
                id: p.id,
                price: p.price,
            })
            .collect())
    }

    fn refresh_order_totals(&mut self) -> Result<u64> {
        self.execute(REFRESH_ORDER_TOTALS_SQL)
    }
}

/// Open the source database described by `config`
pub fn connect(config: &SourceConfig) -> Result<Box<dyn SourceStore>> {
    Ok(match config.backend {
        SourceBackend::Postgres => Box::new(PostgresSource::connect(config)?),
        SourceBackend::DuckDb => Box::new(DuckDbSource::open(&config.path)?),
    })
}

/// Look up the definition of a source table
pub(crate) fn table_def(schema: &Schema, table: SourceTable) -> Result<&Table> {
    schema
        .get_table(table.name())
        .ok_or_else(|| anyhow::anyhow!("Table '{}' missing from source schema", table))
}

/// Build a multi-row INSERT for `row_count` rows.
///
/// `placeholder` receives the 1-based parameter index and the column's type
/// and returns the SQL text for that slot.
pub(crate) fn insert_sql<F>(table: &Table, row_count: usize, mut placeholder: F) -> String
where
    F: FnMut(usize, &shop_data_gen::SqlType) -> String,
{
    let columns = table.insert_columns();
    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ",
        table.name,
        columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut param_idx = 1;
    for r in 0..row_count {
        if r > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for (i, col) in columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&placeholder(param_idx, &col.sql_type));
            param_idx += 1;
        }
        sql.push(')');
    }
    sql
}

/// Reject rows whose arity does not match the table's insert columns
pub(crate) fn check_row_width(table: &Table, rows: &[Row]) -> Result<()> {
    let width = table.insert_columns().len();
    if let Some(bad) = rows.iter().find(|r| r.len() != width) {
        anyhow::bail!(
            "Row for '{}' has {} values, expected {}",
            table.name,
            bad.len(),
            width
        );
    }
    Ok(())
}
