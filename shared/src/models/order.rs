//! Order domain model
//!
//! An [`Order`] is created only by the submission pipeline after inventory
//! has been reserved. Line items are owned by their order, written in the
//! same atomic step, and never mutated afterwards (a correction is a new
//! order, not an edit).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Order lifecycle status
///
/// Transitions are expected to be monotonic in practice but are not enforced
/// by a state machine; `Cancelled` triggers best-effort stock restoration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Ready,
    Completed,
    Cancelled,
}

/// Whether an order is picked up in person or delivered
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentMode {
    #[default]
    Pickup,
    Delivery,
}

/// Payment lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// One product line within an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLineItem {
    /// Product ID
    pub product_id: String,
    /// Product name snapshot at order time
    pub product_name: String,
    /// Unit price at order time
    pub unit_price: f64,
    /// Quantity ordered
    pub quantity: i32,
    /// Line subtotal (unit_price * quantity)
    pub subtotal: f64,
}

/// A persisted customer order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Globally unique order ID
    pub id: String,
    /// Customer ID
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    /// Ordered line items (non-empty)
    pub items: Vec<OrderLineItem>,
    /// Sum of line subtotals
    pub subtotal: f64,
    /// Tax amount (subtotal * tax rate, rounded to cents)
    pub tax: f64,
    /// Final amount (subtotal + tax)
    pub total: f64,
    pub fulfillment: FulfillmentMode,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Delivery address (required when fulfillment is delivery)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    /// Pickup date, YYYY-MM-DD (required when fulfillment is pickup)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_date: Option<String>,
    /// Pickup time, HH:MM (required when fulfillment is pickup)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

/// Line item input for a submission request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LineItemInput {
    #[validate(length(min = 1, message = "product id is required"))]
    pub product_id: String,
    #[validate(length(min = 1, message = "product name is required"))]
    pub product_name: String,
    #[validate(range(min = 0.0, message = "unit price must be non-negative"))]
    pub unit_price: f64,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    /// Client-computed line subtotal; reconciled against unit_price * quantity
    pub subtotal: f64,
}

/// Order submission request
///
/// Field-shape rules live on the struct; mode-conditional requirements
/// (delivery address, pickup schedule) are checked by the submission
/// pipeline before any I/O.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitOrderRequest {
    #[validate(length(min = 1, message = "customer id is required"))]
    pub customer_id: String,
    #[validate(length(min = 1, message = "customer name is required"))]
    pub customer_name: String,
    #[validate(email(message = "customer email is malformed"))]
    pub customer_email: String,
    #[validate(length(min = 7, message = "customer phone is required"))]
    pub customer_phone: String,
    #[validate(length(min = 1, message = "order must contain at least one item"), nested)]
    pub items: Vec<LineItemInput>,
    pub fulfillment: FulfillmentMode,
    #[validate(length(min = 1, message = "payment method is required"))]
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

impl SubmitOrderRequest {
    /// Distinct product ids referenced by the request, in first-seen order
    pub fn product_ids(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for item in &self.items {
            if !seen.contains(&item.product_id.as_str()) {
                seen.push(item.product_id.as_str());
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn valid_request() -> SubmitOrderRequest {
        SubmitOrderRequest {
            customer_id: "cust-1".to_string(),
            customer_name: "Ada Lovelace".to_string(),
            customer_email: "ada@example.com".to_string(),
            customer_phone: "5550001111".to_string(),
            items: vec![LineItemInput {
                product_id: "prod-1".to_string(),
                product_name: "Honeycrisp Apples".to_string(),
                unit_price: 3.99,
                quantity: 2,
                subtotal: 7.98,
            }],
            fulfillment: FulfillmentMode::Pickup,
            payment_method: "card".to_string(),
            delivery_address: None,
            pickup_date: Some("2025-06-01".to_string()),
            pickup_time: Some("10:30".to_string()),
            special_instructions: None,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_empty_items_rejected() {
        let mut req = valid_request();
        req.items.clear();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_malformed_email_rejected() {
        let mut req = valid_request();
        req.customer_email = "not-an-email".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut req = valid_request();
        req.items[0].quantity = 0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_negative_unit_price_rejected() {
        let mut req = valid_request();
        req.items[0].unit_price = -1.0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_product_ids_deduplicated() {
        let mut req = valid_request();
        req.items.push(LineItemInput {
            product_id: "prod-1".to_string(),
            product_name: "Honeycrisp Apples".to_string(),
            unit_price: 3.99,
            quantity: 1,
            subtotal: 3.99,
        });
        req.items.push(LineItemInput {
            product_id: "prod-2".to_string(),
            product_name: "Cider".to_string(),
            unit_price: 6.50,
            quantity: 1,
            subtotal: 6.50,
        });
        assert_eq!(req.product_ids(), vec!["prod-1", "prod-2"]);
    }

    #[test]
    fn test_status_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(
            serde_json::to_string(&FulfillmentMode::Delivery).unwrap(),
            "\"delivery\""
        );
    }
}
