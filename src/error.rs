//! Error categories surfaced by the pipeline.
//!
//! Library functions return `anyhow::Result`; the variants below are attached
//! at the boundaries where a failure can be classified, so callers can
//! `downcast_ref::<PipelineError>()` to tell the categories apart.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The source or warehouse database could not be reached.
    #[error("Could not connect to the {store}: {details}")]
    Connection { store: String, details: String },

    /// A statement or transform step failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// A step ran before the one that produces its input.
    #[error("{} not found. Did you run the ETL step first?", .0.display())]
    MissingWarehouse(PathBuf),
}

impl PipelineError {
    pub fn connection(store: impl Into<String>, err: impl std::fmt::Display) -> Self {
        PipelineError::Connection {
            store: store.into(),
            details: err.to_string(),
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, PipelineError::Connection { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = PipelineError::MissingWarehouse(PathBuf::from("olap.duckdb"));
        assert_eq!(
            err.to_string(),
            "olap.duckdb not found. Did you run the ETL step first?"
        );

        let err = PipelineError::connection("source database", "refused");
        assert!(err.is_connection());
        assert_eq!(
            err.to_string(),
            "Could not connect to the source database: refused"
        );
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = PipelineError::Query("boom".into()).into();
        let err = err.context("while loading fact_orders");
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Query(_))
        ));
    }
}
