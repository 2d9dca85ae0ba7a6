//! Idempotent population of the source database with synthetic rows.
//!
//! Tables are filled parents-first. A table that already holds rows is left
//! alone, so re-running the generator against a populated store changes
//! nothing. Each table is written in its own transaction: rows are buffered
//! into bounded batches, and any failure rolls the whole table back.

mod batch;

pub use batch::RowBatch;

use crate::config::DEFAULT_BATCH_SIZE;
use crate::model::SourceTable;
use crate::progress;
use crate::source::SourceStore;
use anyhow::{bail, Result};
use chrono::NaiveDate;
use indicatif::ProgressBar;
use shop_data_gen::{source_schema, ProductRef, RowGenerator, Volumes};
use std::time::Instant;
use tracing::{debug, info, warn};

/// What happened to one table during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOutcome {
    /// The table was empty and this many rows were written
    Inserted(u64),
    /// The table already held this many rows and was left untouched
    Skipped(u64),
}

/// Statistics from a generator run
#[derive(Debug, Default, Clone)]
pub struct GenerateStats {
    /// Per-table outcomes in population order
    pub tables: Vec<(SourceTable, TableOutcome)>,
    pub duration_secs: f64,
}

impl GenerateStats {
    pub fn outcome(&self, table: SourceTable) -> Option<TableOutcome> {
        self.tables
            .iter()
            .find(|(t, _)| *t == table)
            .map(|(_, outcome)| *outcome)
    }

    pub fn rows_inserted(&self) -> u64 {
        self.tables
            .iter()
            .map(|(_, outcome)| match outcome {
                TableOutcome::Inserted(n) => *n,
                TableOutcome::Skipped(_) => 0,
            })
            .sum()
    }

    pub fn tables_skipped(&self) -> usize {
        self.tables
            .iter()
            .filter(|(_, o)| matches!(o, TableOutcome::Skipped(_)))
            .count()
    }
}

impl std::fmt::Display for GenerateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rows inserted, {} tables skipped in {:.2}s",
            self.rows_inserted(),
            self.tables_skipped(),
            self.duration_secs
        )
    }
}

/// Keys of already-populated parent tables
#[derive(Default)]
struct ParentKeys {
    user_ids: Vec<i64>,
    order_ids: Vec<i64>,
    products: Vec<ProductRef>,
}

/// Fills empty source tables with generated rows
pub struct Populator<'a, S: SourceStore + ?Sized> {
    store: &'a mut S,
    volumes: Volumes,
    seed: u64,
    anchor: NaiveDate,
    batch_size: usize,
    progress: bool,
}

impl<'a, S: SourceStore + ?Sized> Populator<'a, S> {
    /// Dates are generated relative to today unless [`Populator::anchor`] is set
    pub fn new(store: &'a mut S, volumes: Volumes, seed: u64) -> Self {
        Self {
            store,
            volumes,
            seed,
            anchor: chrono::Local::now().date_naive(),
            batch_size: DEFAULT_BATCH_SIZE,
            progress: false,
        }
    }

    /// Latest date any generated row may carry
    pub fn anchor(mut self, anchor: NaiveDate) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn run(&mut self) -> Result<GenerateStats> {
        let start = Instant::now();
        info!("Populating source database {}", self.store.describe());
        self.store.ensure_schema()?;

        let mut generator = RowGenerator::new(self.seed, self.anchor);
        let mut stats = GenerateStats::default();

        for def in source_schema().tables_in_order() {
            let Some(table) = SourceTable::from_name(&def.name) else {
                continue;
            };
            let outcome = self.populate(table, &mut generator)?;
            stats.tables.push((table, outcome));
        }

        stats.duration_secs = start.elapsed().as_secs_f64();
        info!("Generation finished: {}", stats);
        Ok(stats)
    }

    fn populate(
        &mut self,
        table: SourceTable,
        generator: &mut RowGenerator,
    ) -> Result<TableOutcome> {
        let existing = self.store.row_count(table)?;
        if existing > 0 {
            info!("{}: {} rows already present, skipping", table, existing);
            return Ok(TableOutcome::Skipped(existing));
        }

        let target = target_rows(&self.volumes, table);
        if target == 0 {
            return Ok(TableOutcome::Inserted(0));
        }

        let parents = self.parent_keys(table)?;
        let pb = progress::row_bar(target as u64, table.name(), self.progress)?;

        self.store.begin()?;
        match self.fill(table, target, &parents, generator, &pb) {
            Ok(written) => {
                self.store.commit()?;
                pb.finish_and_clear();
                info!("{}: inserted {} rows", table, written);
                Ok(TableOutcome::Inserted(written))
            }
            Err(e) => {
                pb.abandon();
                if let Err(rollback_err) = self.store.rollback() {
                    warn!("Rollback of {} failed: {}", table, rollback_err);
                }
                Err(e.context(format!("Failed to populate {}", table)))
            }
        }
    }

    fn parent_keys(&mut self, table: SourceTable) -> Result<ParentKeys> {
        let mut keys = ParentKeys::default();
        match table {
            SourceTable::Users | SourceTable::Products => {}
            SourceTable::Orders => {
                keys.user_ids = self.store.ids(SourceTable::Users)?;
                if keys.user_ids.is_empty() {
                    bail!("Cannot generate orders: the users table is empty");
                }
            }
            SourceTable::OrderItems => {
                keys.order_ids = self.store.ids(SourceTable::Orders)?;
                keys.products = self.store.product_refs()?;
                if keys.order_ids.is_empty() || keys.products.is_empty() {
                    bail!("Cannot generate order items: orders and products must not be empty");
                }
            }
        }
        debug!(
            "{}: {} user, {} order, {} product parent keys",
            table,
            keys.user_ids.len(),
            keys.order_ids.len(),
            keys.products.len()
        );
        Ok(keys)
    }

    fn fill(
        &mut self,
        table: SourceTable,
        target: usize,
        parents: &ParentKeys,
        generator: &mut RowGenerator,
        pb: &ProgressBar,
    ) -> Result<u64> {
        let mut batch = RowBatch::new(table, self.batch_size);

        for serial in 0..target {
            let row = match table {
                SourceTable::Users => generator.user_row(serial as u64),
                SourceTable::Products => generator.product_row(),
                SourceTable::Orders => generator.order_row(&parents.user_ids),
                SourceTable::OrderItems => {
                    generator.order_item_row(&parents.order_ids, &parents.products)
                }
            };
            if batch.push(row) {
                let written = batch.flush(&mut *self.store)?;
                pb.inc(written);
                debug!("{}: flushed {} rows", table, written);
            }
        }
        pb.inc(batch.flush(&mut *self.store)?);

        if table == SourceTable::OrderItems {
            let updated = self.store.refresh_order_totals()?;
            debug!("Recomputed total_amount for {} orders", updated);
        }

        Ok(batch.flushed())
    }
}

/// Configured row count for `table`
pub fn target_rows(volumes: &Volumes, table: SourceTable) -> usize {
    match table {
        SourceTable::Users => volumes.users,
        SourceTable::Products => volumes.products,
        SourceTable::Orders => volumes.orders,
        SourceTable::OrderItems => volumes.order_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DuckDbSource;

    fn tiny() -> Volumes {
        Volumes {
            users: 12,
            products: 5,
            orders: 30,
            order_items: 70,
        }
    }

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn test_populates_every_table() {
        let mut store = DuckDbSource::open_in_memory().unwrap();
        let stats = Populator::new(&mut store, tiny(), 7)
            .anchor(anchor())
            .batch_size(8)
            .run()
            .unwrap();

        assert_eq!(stats.outcome(SourceTable::Users), Some(TableOutcome::Inserted(12)));
        assert_eq!(
            stats.outcome(SourceTable::OrderItems),
            Some(TableOutcome::Inserted(70))
        );
        assert_eq!(stats.rows_inserted(), 12 + 5 + 30 + 70);
        assert_eq!(store.row_count(SourceTable::Orders).unwrap(), 30);
    }

    #[test]
    fn test_second_run_skips_everything() {
        let mut store = DuckDbSource::open_in_memory().unwrap();
        Populator::new(&mut store, tiny(), 7)
            .anchor(anchor())
            .run()
            .unwrap();
        let stats = Populator::new(&mut store, tiny(), 7)
            .anchor(anchor())
            .run()
            .unwrap();

        assert_eq!(stats.rows_inserted(), 0);
        assert_eq!(stats.tables_skipped(), 4);
        assert_eq!(
            stats.outcome(SourceTable::Products),
            Some(TableOutcome::Skipped(5))
        );
    }

    #[test]
    fn test_order_totals_match_line_items() {
        let mut store = DuckDbSource::open_in_memory().unwrap();
        Populator::new(&mut store, tiny(), 3)
            .anchor(anchor())
            .run()
            .unwrap();

        let items = store.order_items().unwrap();
        for order in store.orders().unwrap() {
            let expected: f64 = items
                .iter()
                .filter(|i| i.order_id == order.id)
                .map(|i| i.quantity as f64 * i.price)
                .sum();
            assert!((order.total_amount - expected).abs() < 0.005);
        }
    }

    #[test]
    fn test_orders_without_users_fail_and_roll_back() {
        let mut store = DuckDbSource::open_in_memory().unwrap();
        let volumes = Volumes {
            users: 0,
            ..tiny()
        };
        let err = Populator::new(&mut store, volumes, 1)
            .anchor(anchor())
            .run()
            .unwrap_err();

        assert!(err.to_string().contains("users table is empty"));
        assert_eq!(store.row_count(SourceTable::Orders).unwrap(), 0);
    }

    #[test]
    fn test_target_rows() {
        let volumes = tiny();
        assert_eq!(target_rows(&volumes, SourceTable::Products), 5);
        assert_eq!(target_rows(&volumes, SourceTable::OrderItems), 70);
    }
}
