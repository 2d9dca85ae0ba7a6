//! Row types for the source tables and the warehouse star schema.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// The four normalized source tables, in FK order (parents first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceTable {
    Users,
    Products,
    Orders,
    OrderItems,
}

impl SourceTable {
    pub const ALL: [SourceTable; 4] = [
        SourceTable::Users,
        SourceTable::Products,
        SourceTable::Orders,
        SourceTable::OrderItems,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SourceTable::Users => "users",
            SourceTable::Products => "products",
            SourceTable::Orders => "orders",
            SourceTable::OrderItems => "order_items",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl std::fmt::Display for SourceTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub signup_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub order_date: NaiveDateTime,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub price: f64,
}

/// One row per order line item
#[derive(Debug, Clone, PartialEq)]
pub struct FactOrder {
    pub line_item_id: i64,
    pub order_id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub order_date: NaiveDate,
    pub quantity: i32,
    pub unit_price: f64,
    pub revenue: f64,
}

/// Calendar attributes of a date present in the fact table
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateDim {
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Sunday = 0 through Saturday = 6
    pub day_of_week: u32,
}

impl From<NaiveDate> for DateDim {
    fn from(date: NaiveDate) -> Self {
        Self {
            date,
            year: date.year(),
            month: date.month(),
            day: date.day(),
            day_of_week: date.weekday().num_days_from_sunday(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_table_names_round_trip() {
        for table in SourceTable::ALL {
            assert_eq!(SourceTable::from_name(table.name()), Some(table));
        }
        assert_eq!(SourceTable::from_name("dim_users"), None);
    }

    #[test]
    fn test_date_dim_calendar_fields() {
        // 2024-03-10 was a Sunday
        let dim = DateDim::from(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!((dim.year, dim.month, dim.day), (2024, 3, 10));
        assert_eq!(dim.day_of_week, 0);

        let sat = DateDim::from(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
        assert_eq!(sat.day_of_week, 6);
    }
}
