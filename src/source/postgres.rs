//! PostgreSQL source backend.
//!
//! `tokio-postgres` is async; the pipeline is not. The store owns a
//! current-thread runtime and blocks on every call, so the connection task
//! only makes progress while a query is in flight.

use super::{check_row_width, insert_sql, table_def, SourceStore};
use crate::config::SourceConfig;
use crate::error::PipelineError;
use crate::model::{Order, OrderItem, Product, SourceTable, User};
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use shop_data_gen::schema::Dialect;
use shop_data_gen::{source_schema, Row, Schema, SqlType, SqlValue};
use std::future::Future;
use tokio::runtime::Runtime;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error};

/// PostgreSQL caps a statement at 65535 bind parameters
const MAX_PARAMS_PER_STATEMENT: usize = 65_535;

pub struct PostgresSource {
    runtime: Runtime,
    client: Client,
    schema: Schema,
    target: String,
}

impl PostgresSource {
    /// Connect with the settings from `config`
    pub fn connect(config: &SourceConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start the database I/O runtime")?;

        let mut pg = tokio_postgres::Config::new();
        pg.host(&config.host)
            .port(config.port)
            .dbname(&config.database)
            .user(&config.user);
        if let Some(ref password) = config.password {
            pg.password(password);
        }

        let (client, connection) = runtime
            .block_on(pg.connect(NoTls))
            .map_err(|e| PipelineError::connection("source database", e))?;

        runtime.spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });

        let store = Self {
            runtime,
            client,
            schema: source_schema(),
            target: config.describe(),
        };
        store
            .block_on(store.client.simple_query("SELECT 1"))
            .map_err(|e| PipelineError::connection("source database", e))?;

        Ok(store)
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn batch_execute(&self, sql: &str) -> Result<()> {
        self.block_on(self.client.batch_execute(sql))
            .with_context(|| format!("Failed to execute: {}", sql))
    }

    fn query(&self, sql: &str) -> Result<Vec<tokio_postgres::Row>> {
        self.block_on(self.client.query(sql, &[]))
            .map_err(|e| PipelineError::Query(format!("{}: {}", sql, e)).into())
    }
}

impl SourceStore for PostgresSource {
    fn describe(&self) -> String {
        self.target.clone()
    }

    fn ensure_schema(&mut self) -> Result<()> {
        for table in self.schema.tables_in_order() {
            for stmt in table.create_statements(Dialect::Postgres) {
                debug!("DDL: {}", stmt);
                self.batch_execute(&stmt)?;
            }
        }
        Ok(())
    }

    fn row_count(&mut self, table: SourceTable) -> Result<u64> {
        let rows = self.query(&format!("SELECT COUNT(*) FROM {}", table))?;
        let count: i64 = rows
            .first()
            .ok_or_else(|| anyhow::anyhow!("COUNT(*) on {} returned no rows", table))?
            .try_get(0)?;
        Ok(count as u64)
    }

    fn ids(&mut self, table: SourceTable) -> Result<Vec<i64>> {
        let rows = self.query(&format!("SELECT id FROM {} ORDER BY id", table))?;
        rows.iter()
            .map(|r| r.try_get::<_, i64>(0).map_err(anyhow::Error::from))
            .collect()
    }

    fn begin(&mut self) -> Result<()> {
        self.batch_execute("BEGIN")
    }

    fn commit(&mut self) -> Result<()> {
        self.batch_execute("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.batch_execute("ROLLBACK")
    }

    fn insert_rows(&mut self, table: SourceTable, rows: &[Row]) -> Result<u64> {
        let def = table_def(&self.schema, table)?;
        check_row_width(def, rows)?;
        let types: Vec<SqlType> = def
            .insert_columns()
            .iter()
            .map(|c| c.sql_type.clone())
            .collect();
        if rows.is_empty() || types.is_empty() {
            return Ok(0);
        }

        let rows_per_statement = (MAX_PARAMS_PER_STATEMENT / types.len()).max(1);
        let mut written = 0;

        for chunk in rows.chunks(rows_per_statement) {
            let sql = insert_sql(def, chunk.len(), |i, _| format!("${}", i));

            let mut params: Vec<Box<dyn ToSql + Sync + Send>> =
                Vec::with_capacity(chunk.len() * types.len());
            for row in chunk {
                for (value, ty) in row.iter().zip(&types) {
                    params.push(pg_param(value, ty)?);
                }
            }
            let param_refs: Vec<&(dyn ToSql + Sync)> = params
                .iter()
                .map(|p| p.as_ref() as &(dyn ToSql + Sync))
                .collect();

            written += self
                .block_on(self.client.execute(sql.as_str(), &param_refs))
                .map_err(|e| PipelineError::Query(format!("INSERT INTO {}: {}", table, e)))?;
        }

        Ok(written)
    }

    fn execute(&mut self, sql: &str) -> Result<u64> {
        self.block_on(self.client.execute(sql, &[]))
            .map_err(|e| PipelineError::Query(format!("{}: {}", sql, e)).into())
    }

    fn users(&mut self) -> Result<Vec<User>> {
        self.query("SELECT id, name, email, signup_date FROM users ORDER BY id")?
            .iter()
            .map(|r| -> Result<User> {
                Ok(User {
                    id: r.try_get(0)?,
                    name: r.try_get(1)?,
                    email: r.try_get(2)?,
                    signup_date: r.try_get::<_, NaiveDate>(3)?,
                })
            })
            .collect()
    }

    fn products(&mut self) -> Result<Vec<Product>> {
        self.query("SELECT id, name, category, price FROM products ORDER BY id")?
            .iter()
            .map(|r| -> Result<Product> {
                Ok(Product {
                    id: r.try_get(0)?,
                    name: r.try_get(1)?,
                    category: r.try_get(2)?,
                    price: decimal_to_f64(r.try_get(3)?)?,
                })
            })
            .collect()
    }

    fn orders(&mut self) -> Result<Vec<Order>> {
        self.query("SELECT id, user_id, order_date, total_amount FROM orders ORDER BY id")?
            .iter()
            .map(|r| -> Result<Order> {
                Ok(Order {
                    id: r.try_get(0)?,
                    user_id: r.try_get(1)?,
                    order_date: r.try_get::<_, NaiveDateTime>(2)?,
                    total_amount: decimal_to_f64(r.try_get(3)?)?,
                })
            })
            .collect()
    }

    fn order_items(&mut self) -> Result<Vec<OrderItem>> {
        self.query(
            "SELECT id, order_id, product_id, quantity, price FROM order_items ORDER BY id",
        )?
        .iter()
        .map(|r| -> Result<OrderItem> {
            Ok(OrderItem {
                id: r.try_get(0)?,
                order_id: r.try_get(1)?,
                product_id: r.try_get(2)?,
                quantity: r.try_get(3)?,
                price: decimal_to_f64(r.try_get(4)?)?,
            })
        })
        .collect()
    }
}

/// Convert a generated value to a bind parameter of the column's PostgreSQL type.
///
/// tokio-postgres checks the Rust type against the column type when binding,
/// so a mismatch is rejected here with the column type in the message.
fn pg_param(value: &SqlValue, ty: &SqlType) -> Result<Box<dyn ToSql + Sync + Send>> {
    let param: Box<dyn ToSql + Sync + Send> = match (value, ty) {
        (SqlValue::Int(n), SqlType::Integer) => Box::new(*n),
        (SqlValue::Int(n), SqlType::BigInt | SqlType::Serial) => Box::new(i64::from(*n)),
        (SqlValue::BigInt(n), SqlType::BigInt | SqlType::Serial) => Box::new(*n),
        (SqlValue::Money(v), SqlType::Decimal(_, scale)) => {
            let d = Decimal::from_f64(*v)
                .ok_or_else(|| anyhow::anyhow!("Amount {} is not representable", v))?;
            Box::new(d.round_dp(u32::from(*scale)))
        }
        (SqlValue::Text(s), SqlType::VarChar(_)) => Box::new(s.clone()),
        (SqlValue::Date(d), SqlType::Date) => Box::new(*d),
        (SqlValue::Timestamp(ts), SqlType::Timestamp) => Box::new(*ts),
        (value, ty) => anyhow::bail!("Cannot bind {:?} to a {:?} column", value, ty),
    };
    Ok(param)
}

fn decimal_to_f64(d: Decimal) -> Result<f64> {
    d.to_f64()
        .ok_or_else(|| anyhow::anyhow!("NUMERIC value {} does not fit in f64", d))
}
