//! Bounded row buffer for bulk inserts into the source store.

use crate::model::SourceTable;
use crate::source::SourceStore;
use anyhow::Result;
use shop_data_gen::Row;

/// Buffered rows for a single table, flushed once `max_rows` is reached
#[derive(Debug)]
pub struct RowBatch {
    table: SourceTable,
    rows: Vec<Row>,
    max_rows: usize,
    flushed: u64,
}

impl RowBatch {
    pub fn new(table: SourceTable, max_rows: usize) -> Self {
        let max_rows = max_rows.max(1);
        Self {
            table,
            rows: Vec::with_capacity(max_rows),
            max_rows,
            flushed: 0,
        }
    }

    /// Queue a row; returns true once the batch should be flushed
    pub fn push(&mut self, row: Row) -> bool {
        self.rows.push(row);
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() >= self.max_rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows written by all flushes so far
    pub fn flushed(&self) -> u64 {
        self.flushed
    }

    /// Write the buffered rows and clear the buffer; returns rows written
    pub fn flush<S: SourceStore + ?Sized>(&mut self, store: &mut S) -> Result<u64> {
        if self.rows.is_empty() {
            return Ok(0);
        }
        let written = store.insert_rows(self.table, &self.rows)?;
        self.rows.clear();
        self.flushed += written;
        Ok(written)
    }
}
