//! DuckDB-file source backend for local development and tests.

use super::{check_row_width, insert_sql, table_def, SourceStore};
use crate::error::PipelineError;
use crate::model::{Order, OrderItem, Product, SourceTable, User};
use anyhow::{Context, Result};
use duckdb::types::Value;
use duckdb::{params_from_iter, Connection};
use shop_data_gen::schema::Dialect;
use shop_data_gen::{source_schema, Row, Schema, SqlType, SqlValue};
use std::path::Path;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rows per INSERT statement; larger batches are split
const MAX_ROWS_PER_STATEMENT: usize = 1_000;

pub struct DuckDbSource {
    conn: Connection,
    schema: Schema,
    target: String,
}

impl DuckDbSource {
    /// Open (creating if needed) a DuckDB source file
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| {
            PipelineError::connection(format!("source database {}", path.display()), e)
        })?;
        Ok(Self {
            conn,
            schema: source_schema(),
            target: format!("duckdb:{}", path.display()),
        })
    }

    /// In-memory source, gone when dropped
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| PipelineError::connection("in-memory source database", e))?;
        Ok(Self {
            conn,
            schema: source_schema(),
            target: "duckdb::memory:".to_string(),
        })
    }

    /// The underlying connection (for fixtures and assertions)
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn query_rows<T, F>(&self, sql: &str, map: F) -> Result<Vec<T>>
    where
        F: FnMut(&duckdb::Row<'_>) -> duckdb::Result<T>,
    {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| PipelineError::Query(format!("{}: {}", sql, e)))?;
        let rows = stmt
            .query_map([], map)
            .map_err(|e| PipelineError::Query(format!("{}: {}", sql, e)))?;
        rows.collect::<duckdb::Result<Vec<T>>>()
            .with_context(|| format!("Failed to read rows: {}", sql))
    }
}

impl SourceStore for DuckDbSource {
    fn describe(&self) -> String {
        self.target.clone()
    }

    fn ensure_schema(&mut self) -> Result<()> {
        for table in self.schema.tables_in_order() {
            for stmt in table.create_statements(Dialect::DuckDb) {
                debug!("DDL: {}", stmt);
                self.conn
                    .execute_batch(&stmt)
                    .with_context(|| format!("Failed to execute: {}", stmt))?;
            }
        }
        Ok(())
    }

    fn row_count(&mut self, table: SourceTable) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| PipelineError::Query(format!("{}: {}", sql, e)))?;
        Ok(count as u64)
    }

    fn ids(&mut self, table: SourceTable) -> Result<Vec<i64>> {
        let sql = format!("SELECT id FROM {} ORDER BY id", table);
        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<duckdb::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    fn begin(&mut self) -> Result<()> {
        self.conn
            .execute_batch("BEGIN TRANSACTION")
            .context("Failed to begin transaction")
    }

    fn commit(&mut self) -> Result<()> {
        self.conn
            .execute_batch("COMMIT")
            .context("Failed to commit transaction")
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn
            .execute_batch("ROLLBACK")
            .context("Failed to roll back transaction")
    }

    fn insert_rows(&mut self, table: SourceTable, rows: &[Row]) -> Result<u64> {
        let def = table_def(&self.schema, table)?;
        check_row_width(def, rows)?;
        let mut written = 0u64;

        for chunk in rows.chunks(MAX_ROWS_PER_STATEMENT) {
            // Dates travel as text and are cast server-side
            let sql = insert_sql(def, chunk.len(), |_, ty| match ty {
                SqlType::Date => "CAST(? AS DATE)".to_string(),
                SqlType::Timestamp => "CAST(? AS TIMESTAMP)".to_string(),
                _ => "?".to_string(),
            });
            let params = chunk.iter().flatten().map(duck_param);
            let n = self
                .conn
                .execute(&sql, params_from_iter(params))
                .map_err(|e| PipelineError::Query(format!("INSERT INTO {}: {}", table, e)))?;
            written += n as u64;
        }

        Ok(written)
    }

    fn execute(&mut self, sql: &str) -> Result<u64> {
        let n = self
            .conn
            .execute(sql, [])
            .map_err(|e| PipelineError::Query(format!("{}: {}", sql, e)))?;
        Ok(n as u64)
    }

    fn users(&mut self) -> Result<Vec<User>> {
        self.query_rows(
            "SELECT id, name, email, signup_date FROM users ORDER BY id",
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    signup_date: row.get(3)?,
                })
            },
        )
    }

    fn products(&mut self) -> Result<Vec<Product>> {
        self.query_rows(
            "SELECT id, name, category, price FROM products ORDER BY id",
            |row| {
                Ok(Product {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    category: row.get(2)?,
                    price: row.get(3)?,
                })
            },
        )
    }

    fn orders(&mut self) -> Result<Vec<Order>> {
        self.query_rows(
            "SELECT id, user_id, order_date, total_amount FROM orders ORDER BY id",
            |row| {
                Ok(Order {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    order_date: row.get(2)?,
                    total_amount: row.get(3)?,
                })
            },
        )
    }

    fn order_items(&mut self) -> Result<Vec<OrderItem>> {
        self.query_rows(
            "SELECT id, order_id, product_id, quantity, price FROM order_items ORDER BY id",
            |row| {
                Ok(OrderItem {
                    id: row.get(0)?,
                    order_id: row.get(1)?,
                    product_id: row.get(2)?,
                    quantity: row.get(3)?,
                    price: row.get(4)?,
                })
            },
        )
    }
}

fn duck_param(value: &SqlValue) -> Value {
    match value {
        SqlValue::Int(n) => Value::Int(*n),
        SqlValue::BigInt(n) => Value::BigInt(*n),
        SqlValue::Money(v) => Value::Double(*v),
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Date(d) => Value::Text(d.format(DATE_FORMAT).to_string()),
        SqlValue::Timestamp(ts) => Value::Text(ts.format(TIMESTAMP_FORMAT).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn store() -> DuckDbSource {
        let mut store = DuckDbSource::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
    }

    #[test]
    fn test_ensure_schema_is_repeatable() {
        let mut store = store();
        store.ensure_schema().unwrap();
        for table in SourceTable::ALL {
            assert_eq!(store.row_count(table).unwrap(), 0);
        }
    }

    #[test]
    fn test_insert_assigns_ids_and_reads_back() {
        let mut store = store();
        let rows = vec![
            vec![
                SqlValue::Text("Ada Lovelace".into()),
                SqlValue::Text("ada@example.com".into()),
                SqlValue::Date(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap()),
            ],
            vec![
                SqlValue::Text("Alan Turing".into()),
                SqlValue::Text("alan@example.com".into()),
                SqlValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
            ],
        ];
        assert_eq!(store.insert_rows(SourceTable::Users, &rows).unwrap(), 2);

        let users = store.users().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, 1);
        assert_eq!(users[1].email, "alan@example.com");
        assert_eq!(
            users[1].signup_date,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(store.ids(SourceTable::Users).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_typed_reads_keep_decimals_and_timestamps() {
        let mut store = store();
        store
            .insert_rows(
                SourceTable::Users,
                &[vec![
                    SqlValue::Text("Ada".into()),
                    SqlValue::Text("ada@example.com".into()),
                    SqlValue::Date(NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()),
                ]],
            )
            .unwrap();
        store
            .insert_rows(
                SourceTable::Products,
                &[vec![
                    SqlValue::Text("Kettle".into()),
                    SqlValue::Text("Kitchen".into()),
                    SqlValue::Money(19.99),
                ]],
            )
            .unwrap();
        let ts = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        store
            .insert_rows(
                SourceTable::Orders,
                &[vec![
                    SqlValue::BigInt(1),
                    SqlValue::Timestamp(ts),
                    SqlValue::Money(39.98),
                ]],
            )
            .unwrap();
        store
            .insert_rows(
                SourceTable::OrderItems,
                &[vec![
                    SqlValue::BigInt(1),
                    SqlValue::BigInt(1),
                    SqlValue::Int(2),
                    SqlValue::Money(19.99),
                ]],
            )
            .unwrap();

        assert_eq!(store.products().unwrap()[0].price, 19.99);
        let order = &store.orders().unwrap()[0];
        assert_eq!(order.order_date, ts);
        assert_eq!(order.total_amount, 39.98);
        let item = &store.order_items().unwrap()[0];
        assert_eq!((item.order_id, item.product_id, item.quantity), (1, 1, 2));
        assert_eq!(item.price, 19.99);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let mut store = store();
        let row = vec![
            SqlValue::Text("Ada".into()),
            SqlValue::Text("same@example.com".into()),
            SqlValue::Date(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()),
        ];
        store.insert_rows(SourceTable::Users, &[row.clone()]).unwrap();
        let err = store.insert_rows(SourceTable::Users, &[row]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Query(_))
        ));
    }

    #[test]
    fn test_rollback_discards_rows() {
        let mut store = store();
        store.begin().unwrap();
        store
            .insert_rows(
                SourceTable::Products,
                &[vec![
                    SqlValue::Text("Lamp".into()),
                    SqlValue::Text("Home".into()),
                    SqlValue::Money(12.5),
                ]],
            )
            .unwrap();
        store.rollback().unwrap();
        assert_eq!(store.row_count(SourceTable::Products).unwrap(), 0);
    }

    #[test]
    fn test_refresh_order_totals() {
        let mut store = store();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        store
            .insert_rows(
                SourceTable::Users,
                &[vec![
                    SqlValue::Text("Ada".into()),
                    SqlValue::Text("ada@example.com".into()),
                    SqlValue::Date(day),
                ]],
            )
            .unwrap();
        store
            .insert_rows(
                SourceTable::Products,
                &[
                    vec![
                        SqlValue::Text("A".into()),
                        SqlValue::Text("Books".into()),
                        SqlValue::Money(10.0),
                    ],
                    vec![
                        SqlValue::Text("B".into()),
                        SqlValue::Text("Books".into()),
                        SqlValue::Money(2.5),
                    ],
                ],
            )
            .unwrap();
        let ts = day.and_hms_opt(9, 30, 0).unwrap();
        store
            .insert_rows(
                SourceTable::Orders,
                &[
                    vec![
                        SqlValue::BigInt(1),
                        SqlValue::Timestamp(ts),
                        SqlValue::Money(0.0),
                    ],
                    vec![
                        SqlValue::BigInt(1),
                        SqlValue::Timestamp(ts),
                        SqlValue::Money(99.0),
                    ],
                ],
            )
            .unwrap();
        store
            .insert_rows(
                SourceTable::OrderItems,
                &[
                    vec![
                        SqlValue::BigInt(1),
                        SqlValue::BigInt(1),
                        SqlValue::Int(2),
                        SqlValue::Money(10.0),
                    ],
                    vec![
                        SqlValue::BigInt(1),
                        SqlValue::BigInt(2),
                        SqlValue::Int(1),
                        SqlValue::Money(2.5),
                    ],
                ],
            )
            .unwrap();

        store.refresh_order_totals().unwrap();
        let orders = store.orders().unwrap();
        assert_eq!(orders[0].total_amount, 22.5);
        assert_eq!(orders[0].order_date, ts);
        // no items: total resets to zero
        assert_eq!(orders[1].total_amount, 0.0);

        let refs = store.product_refs().unwrap();
        assert_eq!(refs[1].id, 2);
        assert_eq!(refs[1].price, 2.5);
    }
}
