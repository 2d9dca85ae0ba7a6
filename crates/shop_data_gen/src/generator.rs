//! Row generators for the source tables.
//!
//! Each generator call produces one row in the insert-column order of its
//! table (see [`crate::schema`]). Child rows only ever reference the parent
//! keys they are handed, so FK consistency holds as long as callers pass the
//! keys that actually exist in the store.

use crate::fake::FakeData;
use chrono::{NaiveDate, NaiveDateTime};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// How far back signup dates reach from the anchor date
pub const SIGNUP_WINDOW_DAYS: i64 = 5 * 365;

/// How far back order dates reach from the anchor date
pub const ORDER_WINDOW_DAYS: i64 = 365;

/// Maximum quantity of a single line item
pub const MAX_QUANTITY: i64 = 5;

/// Row counts per source table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Volumes {
    pub users: usize,
    pub products: usize,
    pub orders: usize,
    pub order_items: usize,
}

impl Default for Volumes {
    fn default() -> Self {
        Self {
            users: 10_000,
            products: 500,
            orders: 50_000,
            order_items: 150_000,
        }
    }
}

/// Generation scale presets
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// ~1,000 total rows
    Small,
    /// ~50,000 total rows
    Medium,
    /// ~210,000 total rows, the default volumes
    Large,
}

impl Scale {
    pub fn volumes(&self) -> Volumes {
        match self {
            Scale::Small => Volumes {
                users: 50,
                products: 20,
                orders: 200,
                order_items: 600,
            },
            Scale::Medium => Volumes {
                users: 2_000,
                products: 200,
                orders: 12_000,
                order_items: 36_000,
            },
            Scale::Large => Volumes::default(),
        }
    }
}

impl std::str::FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" | "s" => Ok(Scale::Small),
            "medium" | "m" => Ok(Scale::Medium),
            "large" | "l" => Ok(Scale::Large),
            _ => Err(format!("Unknown scale: {}. Use small, medium, or large", s)),
        }
    }
}

/// SQL value representation, independent of the target database
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// 32-bit integer (INTEGER)
    Int(i32),
    /// 64-bit integer (BIGINT)
    BigInt(i64),
    /// Monetary amount with two decimal places
    Money(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(n) => Some(i64::from(*n)),
            SqlValue::BigInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Money(v) => Some(*v),
            _ => None,
        }
    }
}

/// A row of generated data
pub type Row = Vec<SqlValue>;

/// A product key together with its catalog price
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductRef {
    pub id: i64,
    pub price: f64,
}

/// Main row generator
pub struct RowGenerator {
    fake: FakeData<ChaCha8Rng>,
    anchor: NaiveDate,
}

impl RowGenerator {
    /// Create a generator; all dates fall on or before `anchor`.
    pub fn new(seed: u64, anchor: NaiveDate) -> Self {
        Self {
            fake: FakeData::new(ChaCha8Rng::seed_from_u64(seed)),
            anchor,
        }
    }

    /// `name, email, signup_date`
    ///
    /// `serial` makes the email unique; pass the row's position in the run.
    pub fn user_row(&mut self, serial: u64) -> Row {
        let first = self.fake.first_name();
        let last = self.fake.last_name();
        let email = self.fake.email(first, last, serial);
        let signup = self.fake.date_before(self.anchor, SIGNUP_WINDOW_DAYS);

        vec![
            SqlValue::Text(format!("{} {}", first, last)),
            SqlValue::Text(email),
            SqlValue::Date(signup),
        ]
    }

    /// `name, category, price`
    pub fn product_row(&mut self) -> Row {
        let name = self.fake.product_name();
        let category = self.fake.category();
        let price = self.fake.price(5.0, 500.0);

        vec![
            SqlValue::Text(name),
            SqlValue::Text(category.to_string()),
            SqlValue::Money(price),
        ]
    }

    /// `user_id, order_date, total_amount`
    ///
    /// The total starts at zero; it is recomputed from line items once they exist.
    pub fn order_row(&mut self, user_ids: &[i64]) -> Row {
        let user_id = self.fake.pick_id(user_ids);
        let order_date = self.fake.datetime_before(self.anchor, ORDER_WINDOW_DAYS);

        vec![
            SqlValue::BigInt(user_id),
            SqlValue::Timestamp(order_date),
            SqlValue::Money(0.0),
        ]
    }

    /// `order_id, product_id, quantity, price`
    pub fn order_item_row(&mut self, order_ids: &[i64], products: &[ProductRef]) -> Row {
        let order_id = self.fake.pick_id(order_ids);
        let product = *self.fake.pick(products);
        let quantity = self.fake.int_range(1, MAX_QUANTITY) as i32;

        vec![
            SqlValue::BigInt(order_id),
            SqlValue::BigInt(product.id),
            SqlValue::Int(quantity),
            SqlValue::Money(product.price),
        ]
    }
}
