//! Skip-on-error batch mapping of raw order rows
//!
//! Hydrates a list of raw rows (header with embedded items, the shape the
//! hosted database returns for nested selects) into typed orders. A row
//! that fails validation or parsing is logged through the monitor and
//! omitted; the output length may be less than the input length and
//! callers must not assume a 1:1 correspondence.

use crate::monitoring::ValidationMonitor;
use crate::orders::money;
use crate::validation::{
    FieldKind, FieldRule, Schema, Strictness, ValidateOptions, validate_input,
};
use serde_json::Value;
use shared::models::Order;

const ORDER_STATUSES: &[&str] = &[
    "pending",
    "confirmed",
    "processing",
    "ready",
    "completed",
    "cancelled",
];

/// Shape rule for one raw order row with embedded items
pub fn order_row_schema() -> Schema {
    let item = Schema::new()
        .field(FieldRule::string("product_id").required())
        .field(FieldRule::string("product_name").required())
        .field(FieldRule::number("unit_price").required().min(0.0))
        .field(FieldRule::integer("quantity").required().min(1.0))
        .field(FieldRule::number("subtotal").required());

    Schema::new()
        .field(FieldRule::string("id").required())
        .field(FieldRule::string("customer_id").required())
        .field(FieldRule::string("customer_name").required())
        .field(FieldRule::string("customer_email").required().email())
        .field(FieldRule::string("customer_phone").required())
        .field(FieldRule::array_of("items", FieldKind::Object(item)).required())
        .field(FieldRule::number("subtotal").required().min(0.0))
        .field(FieldRule::number("tax").required().min(0.0))
        .field(FieldRule::number("total").required())
        .field(FieldRule::one_of("fulfillment", &["pickup", "delivery"]).required())
        .field(FieldRule::string("payment_method").required())
        .field(
            FieldRule::one_of("payment_status", &["pending", "paid", "failed", "refunded"])
                .required(),
        )
        .field(FieldRule::one_of("status", ORDER_STATUSES).required())
        .field(FieldRule::string("created_at").required())
        .field(FieldRule::string("updated_at").required())
        .field(FieldRule::string("delivery_address"))
        .field(FieldRule::string("pickup_date"))
        .field(FieldRule::string("pickup_time"))
        .field(FieldRule::string("special_instructions"))
}

/// Validate and hydrate raw order rows, skipping malformed ones
pub fn map_order_rows(monitor: &ValidationMonitor, raw_rows: Vec<Value>) -> Vec<Order> {
    let schema = order_row_schema();
    let options = ValidateOptions {
        strictness: Strictness::Moderate,
        transform: false,
        context: "order_row".to_string(),
    };

    raw_rows
        .into_iter()
        .filter_map(|row| {
            let outcome = validate_input(monitor, &row, &schema, &options);
            if !outcome.success {
                // the pipeline already recorded the validation error
                return None;
            }
            match serde_json::from_value::<Order>(outcome.data?) {
                Ok(mut order) => {
                    money::reconcile_order(&mut order, monitor);
                    Some(order)
                }
                Err(e) => {
                    monitor.record_validation_error("order_row", &e.to_string());
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_row(id: &str) -> Value {
        json!({
            "id": id,
            "customer_id": "cust-1",
            "customer_name": "Ada",
            "customer_email": "ada@example.com",
            "customer_phone": "5550001111",
            "items": [{
                "product_id": "p1",
                "product_name": "Apples",
                "unit_price": 3.99,
                "quantity": 2,
                "subtotal": 7.98,
            }],
            "subtotal": 7.98,
            "tax": 0.68,
            "total": 8.66,
            "fulfillment": "pickup",
            "payment_method": "card",
            "payment_status": "pending",
            "status": "pending",
            "created_at": "2025-06-01T10:00:00Z",
            "updated_at": "2025-06-01T10:00:00Z",
            "pickup_date": "2025-06-01",
            "pickup_time": "10:30",
        })
    }

    #[test]
    fn test_valid_rows_all_mapped() {
        let monitor = ValidationMonitor::new();
        let orders = map_order_rows(&monitor, vec![valid_row("o1"), valid_row("o2")]);
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, "o1");
        assert_eq!(monitor.metrics().validation_errors, 0);
    }

    #[test]
    fn test_malformed_rows_skipped_not_fatal() {
        let monitor = ValidationMonitor::new();
        let mut bad_row = valid_row("o2");
        bad_row["total"] = json!("a lot"); // wrong primitive type
        let rows = vec![valid_row("o1"), bad_row, valid_row("o3")];

        let orders = map_order_rows(&monitor, rows);

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, "o1");
        assert_eq!(orders[1].id, "o3");
        // exactly one validation error for the one malformed row
        assert_eq!(monitor.metrics().validation_errors, 1);
    }

    #[test]
    fn test_missing_required_field_skips_row() {
        let monitor = ValidationMonitor::new();
        let mut bad_row = valid_row("o1");
        bad_row.as_object_mut().unwrap().remove("customer_email");

        let orders = map_order_rows(&monitor, vec![bad_row]);

        assert!(orders.is_empty());
        assert_eq!(monitor.metrics().validation_errors, 1);
    }

    #[test]
    fn test_stored_total_reconciled_on_read() {
        let monitor = ValidationMonitor::new();
        let mut row = valid_row("o1");
        row["total"] = json!(9.99); // disagrees with subtotal + tax = 8.66

        let orders = map_order_rows(&monitor, vec![row]);

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].total, 8.66);
        assert_eq!(monitor.metrics().calculation_mismatches, 1);
    }

    #[test]
    fn test_unknown_status_skips_row() {
        let monitor = ValidationMonitor::new();
        let mut row = valid_row("o1");
        row["status"] = json!("exploded");

        // enum mismatch is non-critical for moderate shape validation, but
        // the serde hydration cannot represent it either way
        let orders = map_order_rows(&monitor, vec![row]);

        assert!(orders.is_empty());
        assert_eq!(monitor.metrics().validation_errors, 1);
    }
}
