//! Normalized source rows to star schema.

use super::SourceSnapshot;
use crate::model::{DateDim, FactOrder, Order, Product, User};
use std::collections::{BTreeSet, HashMap};

/// Warehouse tables built in memory before loading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StarSchema {
    pub dim_users: Vec<User>,
    pub dim_products: Vec<Product>,
    /// Ordered by (order_id, line_item_id)
    pub fact_orders: Vec<FactOrder>,
    /// One row per distinct fact date, ascending
    pub dim_date: Vec<DateDim>,
}

/// Build the star schema from a source snapshot.
///
/// Line items are inner-joined with their orders: an item whose order is
/// missing is dropped, and an order without items contributes no facts.
pub fn transform(snapshot: &SourceSnapshot) -> StarSchema {
    let orders: HashMap<i64, &Order> = snapshot.orders.iter().map(|o| (o.id, o)).collect();

    let mut fact_orders: Vec<FactOrder> = snapshot
        .order_items
        .iter()
        .filter_map(|item| {
            let order = orders.get(&item.order_id)?;
            Some(FactOrder {
                line_item_id: item.id,
                order_id: order.id,
                user_id: order.user_id,
                product_id: item.product_id,
                order_date: order.order_date.date(),
                quantity: item.quantity,
                unit_price: item.price,
                revenue: item.quantity as f64 * item.price,
            })
        })
        .collect();
    fact_orders.sort_by_key(|f| (f.order_id, f.line_item_id));

    let dates: BTreeSet<_> = fact_orders.iter().map(|f| f.order_date).collect();

    StarSchema {
        dim_users: snapshot.users.clone(),
        dim_products: snapshot.products.clone(),
        fact_orders,
        dim_date: dates.into_iter().map(DateDim::from).collect(),
    }
}
