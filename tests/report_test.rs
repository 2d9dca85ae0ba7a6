//! Tests for the CSV aggregation reports.

use chrono::NaiveDate;
use shop_etl::error::PipelineError;
use shop_etl::etl::{load, LoadMode, StarSchema};
use shop_etl::model::{DateDim, FactOrder, Product};
use shop_etl::report::{Report, Reporter};
use shop_etl::warehouse::Warehouse;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn product(id: i64, name: &str) -> Product {
    Product {
        id,
        name: name.to_string(),
        category: "Misc".to_string(),
        price: 100.0,
    }
}

fn fact(
    line_item_id: i64,
    order_id: i64,
    user_id: i64,
    product_id: i64,
    date: NaiveDate,
    quantity: i32,
    unit_price: f64,
) -> FactOrder {
    FactOrder {
        line_item_id,
        order_id,
        user_id,
        product_id,
        order_date: date,
        quantity,
        unit_price,
        revenue: quantity as f64 * unit_price,
    }
}

fn build_warehouse(dir: &Path, dim_products: Vec<Product>, fact_orders: Vec<FactOrder>) -> PathBuf {
    let dates: BTreeSet<NaiveDate> = fact_orders.iter().map(|f| f.order_date).collect();
    let star = StarSchema {
        dim_users: Vec::new(),
        dim_products,
        dim_date: dates.into_iter().map(DateDim::from).collect(),
        fact_orders,
    };
    let path = dir.join("olap.duckdb");
    let wh = Warehouse::open(&path).unwrap();
    load(&wh, &star, LoadMode::CreateIfMissing).unwrap();
    path
}

fn read(dir: &Path, report: Report) -> String {
    fs::read_to_string(dir.join(report.file_name())).unwrap()
}

// =============================================================================
// Daily performance / active users
// =============================================================================

#[test]
fn test_daily_performance_per_date() {
    let temp_dir = TempDir::new().unwrap();
    let products = vec![product(1, "Mug")];
    let facts = vec![
        // day 1: one order, two lines, 10.111 + 20.222
        fact(1, 1, 1, 1, day(1), 1, 10.111),
        fact(2, 1, 1, 1, day(1), 1, 20.222),
        // day 2: two orders from two users
        fact(3, 2, 1, 1, day(2), 1, 12.5),
        fact(4, 3, 2, 1, day(2), 3, 2.5),
    ];
    let wh_path = build_warehouse(temp_dir.path(), products, facts);
    let out = temp_dir.path().join("reports");

    let outcomes = Reporter::new(&wh_path, &out).run().unwrap();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| o.path.starts_with(&out)));

    assert_eq!(
        read(&out, Report::DailyPerformance),
        "order_date,total_orders,gross_revenue\n2024-01-01,1,30.33\n2024-01-02,2,20\n"
    );
    assert_eq!(
        read(&out, Report::ActiveUsers),
        "order_date,unique_customers\n2024-01-01,1\n2024-01-02,2\n"
    );
}

// =============================================================================
// Top products
// =============================================================================

#[test]
fn test_top_products_descending_revenue() {
    let temp_dir = TempDir::new().unwrap();
    let products = vec![product(1, "Anvil"), product(2, "Bucket"), product(3, "Chisel")];
    let facts = vec![
        fact(1, 1, 1, 3, day(1), 1, 100.0),
        fact(2, 1, 1, 1, day(1), 3, 100.0),
        fact(3, 2, 1, 2, day(2), 2, 100.0),
    ];
    let wh_path = build_warehouse(temp_dir.path(), products, facts);
    let out = temp_dir.path().join("reports");
    Reporter::new(&wh_path, &out).run().unwrap();

    assert_eq!(
        read(&out, Report::TopProducts),
        "product_name,total_revenue,total_units_sold\nAnvil,300,3\nBucket,200,2\nChisel,100,1\n"
    );
}

#[test]
fn test_top_products_capped_at_ten() {
    let temp_dir = TempDir::new().unwrap();
    let products: Vec<Product> = (1..=12).map(|i| product(i, &format!("Item {i:02}"))).collect();
    let facts: Vec<FactOrder> = (1..=12)
        .map(|i| fact(i, i, 1, i, day(1), 1, i as f64))
        .collect();
    let wh_path = build_warehouse(temp_dir.path(), products, facts);
    let out = temp_dir.path().join("reports");

    let outcomes = Reporter::new(&wh_path, &out).run().unwrap();
    let top = outcomes
        .iter()
        .find(|o| o.report == Report::TopProducts)
        .unwrap();
    assert_eq!(top.rows, 10);

    let csv = read(&out, Report::TopProducts);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 11);
    assert_eq!(lines[1], "Item 12,12,1");
    assert_eq!(lines[10], "Item 03,3,1");
}

// =============================================================================
// Failure path
// =============================================================================

#[test]
fn test_missing_warehouse_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let wh_path = temp_dir.path().join("olap.duckdb");
    let out = temp_dir.path().join("reports");

    let err = Reporter::new(&wh_path, &out).run().unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::MissingWarehouse(_))
    ));
    assert!(err.to_string().contains("Did you run the ETL step first?"));
    assert!(!out.exists());
    assert!(!wh_path.exists());
}

#[test]
fn test_reports_do_not_modify_warehouse() {
    let temp_dir = TempDir::new().unwrap();
    let wh_path = build_warehouse(
        temp_dir.path(),
        vec![product(1, "Mug")],
        vec![fact(1, 1, 1, 1, day(3), 2, 4.0)],
    );
    let out = temp_dir.path().join("reports");

    Reporter::new(&wh_path, &out).run().unwrap();
    Reporter::new(&wh_path, &out).run().unwrap();

    assert_eq!(
        read(&out, Report::DailyPerformance),
        "order_date,total_orders,gross_revenue\n2024-01-03,1,8\n"
    );
}
