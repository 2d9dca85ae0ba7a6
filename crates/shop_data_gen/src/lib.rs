//! Synthetic e-commerce data generator for shop-etl.
//!
//! Produces deterministic, FK-consistent rows for the normalized source
//! schema (users, products, orders, order_items). The crate knows nothing
//! about databases: callers feed it the parent keys they fetched and get
//! dialect-agnostic [`Row`]s back.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use shop_data_gen::{RowGenerator, Scale};
//!
//! let anchor = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
//! let mut gen = RowGenerator::new(42, anchor);
//!
//! let user = gen.user_row(0);
//! assert_eq!(user.len(), 3);
//! assert_eq!(Scale::Small.volumes().users, 50);
//! ```

pub mod fake;
pub mod generator;
pub mod schema;

pub use generator::{ProductRef, Row, RowGenerator, Scale, SqlValue, Volumes};
pub use schema::{source_schema, Column, Dialect, ForeignKey, Schema, SqlType, Table};
