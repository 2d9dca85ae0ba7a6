//! Writing the star schema into the warehouse.

use super::StarSchema;
use crate::warehouse::{
    create_table_sql, Warehouse, DIM_DATE, DIM_PRODUCTS, DIM_USERS, FACT_ORDERS, WAREHOUSE_TABLES,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use duckdb::{params, Connection};
use std::time::Instant;
use tracing::{debug, info, warn};

/// How to treat warehouse tables left by an earlier run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Create missing tables; existing ones are kept as they are
    #[default]
    CreateIfMissing,
    /// Drop all warehouse tables first and rebuild them
    Refresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLoad {
    /// Table created with this many rows
    Created(u64),
    /// Table already existed
    Skipped,
}

/// Statistics from a warehouse load
#[derive(Debug, Default, Clone)]
pub struct LoadStats {
    /// Per-table results in load order
    pub tables: Vec<(&'static str, TableLoad)>,
    pub duration_secs: f64,
}

impl LoadStats {
    pub fn status(&self, table: &str) -> Option<TableLoad> {
        self.tables
            .iter()
            .find(|(t, _)| *t == table)
            .map(|(_, status)| *status)
    }

    pub fn tables_created(&self) -> usize {
        self.tables
            .iter()
            .filter(|(_, s)| matches!(s, TableLoad::Created(_)))
            .count()
    }

    pub fn rows_loaded(&self) -> u64 {
        self.tables
            .iter()
            .map(|(_, s)| match s {
                TableLoad::Created(n) => *n,
                TableLoad::Skipped => 0,
            })
            .sum()
    }
}

impl std::fmt::Display for LoadStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} tables, {} rows loaded in {:.2}s",
            self.tables_created(),
            self.rows_loaded(),
            self.duration_secs
        )
    }
}

/// Create and fill the warehouse tables.
///
/// Tables are handled one at a time with no surrounding transaction: a failure
/// part way leaves the tables created so far in place. `dim_date` is always
/// derived from the `fact_orders` table in the warehouse, which may predate
/// this run when it was skipped.
pub fn load(warehouse: &Warehouse, star: &StarSchema, mode: LoadMode) -> Result<LoadStats> {
    let start = Instant::now();
    let mut stats = LoadStats::default();

    if mode == LoadMode::Refresh {
        for table in WAREHOUSE_TABLES.iter().rev() {
            warehouse.execute(&format!("DROP TABLE IF EXISTS {}", table))?;
        }
        info!("Dropped existing warehouse tables");
    }

    for table in WAREHOUSE_TABLES {
        if warehouse.table_exists(table)? {
            warn!(
                "{} already exists and was left unchanged (use --refresh to rebuild)",
                table
            );
            stats.tables.push((table, TableLoad::Skipped));
            continue;
        }

        let ddl = create_table_sql(table)
            .with_context(|| format!("No definition for warehouse table {}", table))?;
        debug!("DDL: {}", ddl);
        warehouse.execute(ddl)?;

        let rows = if table == DIM_DATE {
            fill_date_dim(warehouse)
        } else {
            append_rows(warehouse.connection(), table, star)
        }
        .with_context(|| format!("Failed to load {}", table))?;
        info!("{}: loaded {} rows", table, rows);
        stats.tables.push((table, TableLoad::Created(rows)));
    }

    stats.duration_secs = start.elapsed().as_secs_f64();
    Ok(stats)
}

fn date_text(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Sunday = 0, matching [`crate::model::DateDim`]
const DATE_DIM_FROM_FACTS: &str = "INSERT INTO dim_date \
     SELECT DISTINCT order_date, year(order_date), month(order_date), day(order_date), \
     dayofweek(order_date) FROM fact_orders ORDER BY order_date";

fn fill_date_dim(warehouse: &Warehouse) -> Result<u64> {
    Ok(warehouse.execute(DATE_DIM_FROM_FACTS)? as u64)
}

fn append_rows(conn: &Connection, table: &str, star: &StarSchema) -> Result<u64> {
    let mut appender = conn.appender(table)?;

    let rows = match table {
        DIM_USERS => {
            for u in &star.dim_users {
                appender.append_row(params![u.id, u.name, u.email, date_text(u.signup_date)])?;
            }
            star.dim_users.len()
        }
        DIM_PRODUCTS => {
            for p in &star.dim_products {
                appender.append_row(params![p.id, p.name, p.category, p.price])?;
            }
            star.dim_products.len()
        }
        FACT_ORDERS => {
            for f in &star.fact_orders {
                appender.append_row(params![
                    f.line_item_id,
                    f.order_id,
                    f.user_id,
                    f.product_id,
                    date_text(f.order_date),
                    f.quantity,
                    f.unit_price,
                    f.revenue
                ])?;
            }
            star.fact_orders.len()
        }
        other => anyhow::bail!("Unknown warehouse table {}", other),
    };

    appender.flush()?;
    Ok(rows as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DateDim, FactOrder, Product, User};

    fn star() -> StarSchema {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        StarSchema {
            dim_users: vec![User {
                id: 1,
                name: "Ada".into(),
                email: "ada@example.com".into(),
                signup_date: NaiveDate::from_ymd_opt(2023, 11, 2).unwrap(),
            }],
            dim_products: vec![Product {
                id: 5,
                name: "Desk, Oak".into(),
                category: "Office".into(),
                price: 120.0,
            }],
            fact_orders: vec![FactOrder {
                line_item_id: 1,
                order_id: 1,
                user_id: 1,
                product_id: 5,
                order_date: day,
                quantity: 2,
                unit_price: 120.0,
                revenue: 240.0,
            }],
            dim_date: vec![DateDim::from(day)],
        }
    }

    #[test]
    fn test_load_creates_all_tables() {
        let wh = Warehouse::open_in_memory().unwrap();
        let stats = load(&wh, &star(), LoadMode::CreateIfMissing).unwrap();

        assert_eq!(stats.tables_created(), 4);
        assert_eq!(stats.rows_loaded(), 4);
        let dates = wh
            .query("SELECT date, year, month, day, day_of_week FROM dim_date")
            .unwrap();
        assert_eq!(dates.rows, vec![vec!["2024-03-10", "2024", "3", "10", "0"]]);
        let users = wh.query("SELECT signup_date FROM dim_users").unwrap();
        assert_eq!(users.rows[0][0], "2023-11-02");
    }

    #[test]
    fn test_existing_tables_are_skipped() {
        let wh = Warehouse::open_in_memory().unwrap();
        load(&wh, &star(), LoadMode::CreateIfMissing).unwrap();

        let mut changed = star();
        changed.dim_users.clear();
        let stats = load(&wh, &changed, LoadMode::CreateIfMissing).unwrap();

        assert_eq!(stats.status(DIM_USERS), Some(TableLoad::Skipped));
        assert_eq!(stats.tables_created(), 0);
        assert_eq!(wh.row_count(DIM_USERS).unwrap(), 1);
    }

    #[test]
    fn test_date_dim_follows_existing_facts() {
        let wh = Warehouse::open_in_memory().unwrap();
        load(&wh, &star(), LoadMode::CreateIfMissing).unwrap();
        wh.execute("DROP TABLE dim_date").unwrap();

        // fact_orders is kept, so dim_date must come from its dates, not these
        let may = NaiveDate::from_ymd_opt(2024, 5, 5).unwrap();
        let mut changed = star();
        changed.fact_orders[0].order_date = may;
        changed.dim_date = vec![DateDim::from(may)];
        let stats = load(&wh, &changed, LoadMode::CreateIfMissing).unwrap();

        assert_eq!(stats.status(FACT_ORDERS), Some(TableLoad::Skipped));
        assert_eq!(stats.status(DIM_DATE), Some(TableLoad::Created(1)));
        let facts = wh.query("SELECT DISTINCT order_date FROM fact_orders").unwrap();
        let dates = wh.query("SELECT date FROM dim_date").unwrap();
        assert_eq!(dates.rows, facts.rows);
        assert_eq!(dates.rows, vec![vec!["2024-03-10"]]);
    }

    #[test]
    fn test_date_dim_one_row_per_fact_date() {
        let wh = Warehouse::open_in_memory().unwrap();
        let mut two_lines = star();
        let mut second = two_lines.fact_orders[0].clone();
        second.line_item_id = 2;
        two_lines.fact_orders.push(second);
        let stats = load(&wh, &two_lines, LoadMode::CreateIfMissing).unwrap();

        assert_eq!(stats.status(DIM_DATE), Some(TableLoad::Created(1)));
        assert_eq!(wh.row_count(DIM_DATE).unwrap(), 1);
    }

    #[test]
    fn test_refresh_rebuilds() {
        let wh = Warehouse::open_in_memory().unwrap();
        load(&wh, &star(), LoadMode::CreateIfMissing).unwrap();

        let mut changed = star();
        changed.dim_users.clear();
        let stats = load(&wh, &changed, LoadMode::Refresh).unwrap();

        assert_eq!(stats.status(DIM_USERS), Some(TableLoad::Created(0)));
        assert_eq!(wh.row_count(DIM_USERS).unwrap(), 0);
        assert_eq!(wh.row_count(FACT_ORDERS).unwrap(), 1);
    }
}
