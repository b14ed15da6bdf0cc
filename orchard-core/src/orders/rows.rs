//! Row mapping between [`Order`] and the hosted database tables
//!
//! The header lives in `orders`, one row per line item in `order_items`.
//! Both are written in the same step (or the same procedure call), so a
//! hydrated order is always either fully present or fully absent.

use crate::db::DbResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::models::{FulfillmentMode, Order, OrderLineItem, OrderStatus, PaymentStatus};

#[derive(Serialize, Deserialize)]
struct HeaderRow {
    id: String,
    customer_id: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    subtotal: f64,
    tax: f64,
    total: f64,
    fulfillment: FulfillmentMode,
    payment_method: String,
    payment_status: PaymentStatus,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delivery_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pickup_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pickup_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    special_instructions: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct LineRow {
    order_id: String,
    product_id: String,
    product_name: String,
    unit_price: f64,
    quantity: i32,
    subtotal: f64,
}

/// Render the order header as a JSON row
pub fn header_row(order: &Order) -> DbResult<Value> {
    let row = HeaderRow {
        id: order.id.clone(),
        customer_id: order.customer_id.clone(),
        customer_name: order.customer_name.clone(),
        customer_email: order.customer_email.clone(),
        customer_phone: order.customer_phone.clone(),
        subtotal: order.subtotal,
        tax: order.tax,
        total: order.total,
        fulfillment: order.fulfillment,
        payment_method: order.payment_method.clone(),
        payment_status: order.payment_status,
        status: order.status,
        created_at: order.created_at,
        updated_at: order.updated_at,
        delivery_address: order.delivery_address.clone(),
        pickup_date: order.pickup_date.clone(),
        pickup_time: order.pickup_time.clone(),
        special_instructions: order.special_instructions.clone(),
    };
    Ok(serde_json::to_value(row)?)
}

/// Render the order's line items as JSON rows
pub fn line_rows(order: &Order) -> DbResult<Vec<Value>> {
    order
        .items
        .iter()
        .map(|item| {
            let row = LineRow {
                order_id: order.id.clone(),
                product_id: item.product_id.clone(),
                product_name: item.product_name.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity,
                subtotal: item.subtotal,
            };
            Ok(serde_json::to_value(row)?)
        })
        .collect()
}

/// Hydrate an order from its header and line rows
pub fn order_from_rows(header: Value, lines: Vec<Value>) -> DbResult<Order> {
    let header: HeaderRow = serde_json::from_value(header)?;
    let items = lines
        .into_iter()
        .map(|line| {
            let row: LineRow = serde_json::from_value(line)?;
            Ok(OrderLineItem {
                product_id: row.product_id,
                product_name: row.product_name,
                unit_price: row.unit_price,
                quantity: row.quantity,
                subtotal: row.subtotal,
            })
        })
        .collect::<DbResult<Vec<_>>>()?;

    Ok(Order {
        id: header.id,
        customer_id: header.customer_id,
        customer_name: header.customer_name,
        customer_email: header.customer_email,
        customer_phone: header.customer_phone,
        items,
        subtotal: header.subtotal,
        tax: header.tax,
        total: header.total,
        fulfillment: header.fulfillment,
        payment_method: header.payment_method,
        payment_status: header.payment_status,
        status: header.status,
        created_at: header.created_at,
        updated_at: header.updated_at,
        delivery_address: header.delivery_address,
        pickup_date: header.pickup_date,
        pickup_time: header.pickup_time,
        special_instructions: header.special_instructions,
    })
}
