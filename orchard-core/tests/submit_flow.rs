//! End-to-end submission flow tests over the in-memory database
//!
//! Covers the all-or-nothing persistence contract, the conflict path, the
//! atomic-procedure path, status-update side effects and the batch mapping
//! behavior the mobile shell relies on.

use async_trait::async_trait;
use orchard_core::db::{MemoryDatabase, MemoryProcedures};
use orchard_core::monitoring::ValidationMonitor;
use orchard_core::notify::{
    ChangeBroadcaster, NotifyError, NotifyResult, OrderNotifier, StockRestorer,
};
use orchard_core::orders::{OrderService, SubmitError, map_order_rows};
use parking_lot::Mutex;
use serde_json::{Value, json};
use shared::models::{FulfillmentMode, LineItemInput, Order, OrderStatus, SubmitOrderRequest};
use std::sync::Arc;

// ==================== Recording collaborators ====================

#[derive(Default)]
struct RecordingNotifier {
    confirmations: Mutex<Vec<String>>,
    pickup_ready: Mutex<Vec<String>>,
}

#[async_trait]
impl OrderNotifier for RecordingNotifier {
    async fn send_order_confirmation(&self, order: &Order) -> NotifyResult<()> {
        self.confirmations.lock().push(order.id.clone());
        Ok(())
    }

    async fn send_pickup_ready(&self, order: &Order) -> NotifyResult<()> {
        self.pickup_ready.lock().push(order.id.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingRestorer {
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl StockRestorer for RecordingRestorer {
    async fn restore_stock(&self, order: &Order, reason: &str) -> NotifyResult<()> {
        self.calls.lock().push((order.id.clone(), reason.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingBroadcaster {
    events: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ChangeBroadcaster for RecordingBroadcaster {
    async fn broadcast(&self, channel: &str, event: &str, _payload: Value) -> NotifyResult<()> {
        self.events.lock().push((channel.to_string(), event.to_string()));
        Ok(())
    }
}

/// Notifier that always fails, for the swallow-and-log contract
struct FailingNotifier;

#[async_trait]
impl OrderNotifier for FailingNotifier {
    async fn send_order_confirmation(&self, _order: &Order) -> NotifyResult<()> {
        Err(NotifyError("smtp unreachable".to_string()))
    }

    async fn send_pickup_ready(&self, _order: &Order) -> NotifyResult<()> {
        Err(NotifyError("smtp unreachable".to_string()))
    }
}

// ==================== Fixtures ====================

fn seeded_db() -> Arc<MemoryDatabase> {
    let db = Arc::new(MemoryDatabase::new());
    db.seed(
        "products",
        vec![
            json!({"id": "p1", "name": "Honeycrisp Apples", "stock_quantity": 10}),
            json!({"id": "p2", "name": "Fresh Cider", "stock_quantity": 4}),
            json!({"id": "p3", "name": "Pumpkin Pie", "stock_quantity": 0}),
        ],
    );
    db
}

fn two_item_request() -> SubmitOrderRequest {
    SubmitOrderRequest {
        customer_id: "cust-1".to_string(),
        customer_name: "Ada Lovelace".to_string(),
        customer_email: "ada@example.com".to_string(),
        customer_phone: "5550001111".to_string(),
        items: vec![
            LineItemInput {
                product_id: "p1".to_string(),
                product_name: "Honeycrisp Apples".to_string(),
                unit_price: 3.99,
                quantity: 1,
                subtotal: 3.99,
            },
            LineItemInput {
                product_id: "p2".to_string(),
                product_name: "Fresh Cider".to_string(),
                unit_price: 3.99,
                quantity: 1,
                subtotal: 3.99,
            },
        ],
        fulfillment: FulfillmentMode::Pickup,
        payment_method: "card".to_string(),
        delivery_address: None,
        pickup_date: Some("2025-06-01".to_string()),
        pickup_time: Some("10:30".to_string()),
        special_instructions: None,
    }
}

fn service(db: Arc<MemoryDatabase>) -> OrderService {
    OrderService::new(db, Arc::new(ValidationMonitor::new()))
}

// ==================== Fallback path ====================

#[tokio::test]
async fn test_submit_persists_order_and_decrements_stock() {
    let db = seeded_db();
    let notifier = Arc::new(RecordingNotifier::default());
    let broadcaster = Arc::new(RecordingBroadcaster::default());
    let service = service(db.clone())
        .with_notifier(notifier.clone())
        .with_broadcaster(broadcaster.clone());

    let order = service.submit_order(&two_item_request()).await.unwrap();

    // Scenario: 2 line items at 8.5% tax, subtotal 7.98
    assert_eq!(order.subtotal, 7.98);
    assert_eq!(order.tax, 0.68);
    assert_eq!(order.total, 8.66);
    assert_eq!(order.status, OrderStatus::Pending);

    // Totals invariants
    let line_sum: f64 = order.items.iter().map(|i| i.subtotal).sum();
    assert!((order.subtotal - line_sum).abs() <= 0.01);
    assert!((order.total - (order.subtotal + order.tax)).abs() <= 0.01);

    // Persisted: header, lines, decremented stock
    assert_eq!(db.rows("orders").len(), 1);
    assert_eq!(db.rows("order_items").len(), 2);
    assert_eq!(db.rows("products")[0]["stock_quantity"], 9);
    assert_eq!(db.rows("products")[1]["stock_quantity"], 3);

    // Side effects fired once each
    assert_eq!(notifier.confirmations.lock().as_slice(), [order.id.clone()]);
    assert_eq!(
        broadcaster.events.lock().as_slice(),
        [("orders".to_string(), "new_order".to_string())]
    );
}

#[tokio::test]
async fn test_out_of_stock_rejected_with_conflict_list_and_no_writes() {
    let db = seeded_db();
    let service = service(db.clone());

    let mut request = two_item_request();
    request.items[0].product_id = "p3".to_string();
    request.items[0].product_name = "Pumpkin Pie".to_string();
    request.items[0].quantity = 2;

    let err = service.submit_order(&request).await.unwrap_err();
    let SubmitError::InventoryConflict(conflicts) = &err else {
        panic!("expected inventory conflict, got {:?}", err);
    };
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].product_id, "p3");
    assert_eq!(conflicts[0].requested, 2);
    assert_eq!(conflicts[0].available, 0);
    assert!(err.to_string().contains("Pumpkin Pie: requested 2, available 0"));

    // No rows written, no stock touched
    assert!(db.rows("orders").is_empty());
    assert!(db.rows("order_items").is_empty());
    assert_eq!(db.rows("products")[1]["stock_quantity"], 4);
}

#[tokio::test]
async fn test_conflict_rejection_is_idempotent() {
    let db = seeded_db();
    let service = service(db.clone());

    let mut request = two_item_request();
    request.items[0].quantity = 100; // far above p1's stock of 10

    let first = service.submit_order(&request).await.unwrap_err();
    let second = service.submit_order(&request).await.unwrap_err();

    assert_eq!(first.conflicts().unwrap(), second.conflicts().unwrap());
    assert!(db.rows("orders").is_empty());
}

#[tokio::test]
async fn test_missing_product_reported_as_conflict() {
    let db = seeded_db();
    let service = service(db);

    let mut request = two_item_request();
    request.items[1].product_id = "ghost".to_string();
    request.items[1].product_name = "Discontinued Jam".to_string();

    let err = service.submit_order(&request).await.unwrap_err();
    let conflicts = err.conflicts().unwrap();
    assert_eq!(conflicts[0].product_id, "ghost");
    assert_eq!(conflicts[0].available, 0);
    assert_eq!(conflicts[0].product_name, "Discontinued Jam");
}

#[tokio::test]
async fn test_line_insert_failure_removes_header() {
    let db = seeded_db();
    db.fail_inserts_on("order_items");
    let service = service(db.clone());

    let err = service.submit_order(&two_item_request()).await.unwrap_err();
    assert!(matches!(err, SubmitError::PersistenceFailure(_)));

    // Compensation removed the header; stock untouched
    assert!(db.rows("orders").is_empty());
    assert_eq!(db.rows("products")[0]["stock_quantity"], 10);
}

#[tokio::test]
async fn test_stock_failure_unwinds_everything() {
    let db = seeded_db();
    // First decrement (p1) succeeds, second (p2) fails
    db.fail_update_matching("products", "id", "p2");
    let service = service(db.clone());

    let request = two_item_request();
    let err = service.submit_order(&request).await.unwrap_err();
    assert!(matches!(err, SubmitError::StockUpdateFailure(_)));

    // All-or-nothing: order gone, lines gone, p1's decrement restored
    assert!(db.rows("orders").is_empty());
    assert!(db.rows("order_items").is_empty());
    assert_eq!(db.rows("products")[0]["stock_quantity"], 10);
    assert_eq!(db.rows("products")[1]["stock_quantity"], 4);
}

#[tokio::test]
async fn test_compensated_order_is_not_found() {
    let db = seeded_db();
    db.fail_update_matching("products", "id", "p2");
    let service = service(db.clone());

    service.submit_order(&two_item_request()).await.unwrap_err();

    // Whatever id was generated, the orders table is empty, so any get is
    // a miss
    assert!(db.rows("orders").is_empty());
    let missing = service.get_order("ord-anything").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_submission() {
    let db = seeded_db();
    let service = service(db.clone()).with_notifier(Arc::new(FailingNotifier));

    let order = service.submit_order(&two_item_request()).await.unwrap();
    assert_eq!(db.rows("orders").len(), 1);
    assert_eq!(order.total, 8.66);
}

// ==================== Atomic procedure path ====================

#[tokio::test]
async fn test_atomic_path_persists_via_procedure() {
    let db = seeded_db();
    let procedures = Arc::new(MemoryProcedures::new(db.clone()));
    let service = service(db.clone()).with_procedures(procedures);

    let order = service.submit_order(&two_item_request()).await.unwrap();

    assert_eq!(db.rows("orders").len(), 1);
    assert_eq!(db.rows("order_items").len(), 2);
    assert_eq!(db.rows("products")[0]["stock_quantity"], 9);

    let fetched = service.get_order(&order.id).await.unwrap().unwrap();
    assert_eq!(fetched.total, order.total);
    assert_eq!(fetched.items.len(), 2);
}

#[tokio::test]
async fn test_atomic_path_surfaces_procedure_conflicts() {
    let db = seeded_db();
    let procedures = Arc::new(MemoryProcedures::new(db.clone()));
    let service = service(db.clone()).with_procedures(procedures);

    let mut request = two_item_request();
    request.items[1].quantity = 50; // beyond p2's stock of 4

    let err = service.submit_order(&request).await.unwrap_err();
    let conflicts = err.conflicts().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].product_id, "p2");
    assert_eq!(conflicts[0].available, 4);
    assert!(db.rows("orders").is_empty());
}

// ==================== Status updates ====================

#[tokio::test]
async fn test_cancellation_triggers_stock_restoration_once() {
    let db = seeded_db();
    let restorer = Arc::new(RecordingRestorer::default());
    let service = service(db.clone()).with_stock_restorer(restorer.clone());

    let order = service.submit_order(&two_item_request()).await.unwrap();
    let updated = service
        .update_order_status(&order.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(updated.status, OrderStatus::Cancelled);
    assert_eq!(db.rows("orders")[0]["status"], "cancelled");
    assert_eq!(
        restorer.calls.lock().as_slice(),
        [(order.id.clone(), "order_cancelled".to_string())]
    );
}

#[tokio::test]
async fn test_ready_triggers_pickup_notification() {
    let db = seeded_db();
    let notifier = Arc::new(RecordingNotifier::default());
    let service = service(db.clone()).with_notifier(notifier.clone());

    let order = service.submit_order(&two_item_request()).await.unwrap();
    service
        .update_order_status(&order.id, OrderStatus::Ready)
        .await
        .unwrap();

    assert_eq!(notifier.pickup_ready.lock().as_slice(), [order.id.clone()]);
}

#[tokio::test]
async fn test_status_update_of_unknown_order_is_not_found() {
    let db = seeded_db();
    let service = service(db);

    let err = service
        .update_order_status("ord-missing", OrderStatus::Ready)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::OrderNotFound(_)));
}

#[tokio::test]
async fn test_bulk_status_update_applies_to_all() {
    let db = seeded_db();
    let notifier = Arc::new(RecordingNotifier::default());
    let service = service(db.clone()).with_notifier(notifier.clone());

    let first = service.submit_order(&two_item_request()).await.unwrap();
    let mut second_request = two_item_request();
    second_request.items.truncate(1);
    let second = service.submit_order(&second_request).await.unwrap();

    let ids = vec![first.id.clone(), second.id.clone()];
    let updated = service
        .update_order_status_bulk(&ids, OrderStatus::Ready)
        .await
        .unwrap();

    assert_eq!(updated.len(), 2);
    assert!(updated.iter().all(|o| o.status == OrderStatus::Ready));
    assert_eq!(notifier.pickup_ready.lock().len(), 2);
}

#[tokio::test]
async fn test_bulk_update_tolerates_missing_ids() {
    let db = seeded_db();
    let service = service(db.clone());

    let order = service.submit_order(&two_item_request()).await.unwrap();
    let ids = vec![order.id.clone(), "ord-phantom".to_string()];
    let updated = service
        .update_order_status_bulk(&ids, OrderStatus::Confirmed)
        .await
        .unwrap();

    // The phantom id is skipped, the real one still goes through
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].id, order.id);
}

// ==================== Reads and batch mapping ====================

#[tokio::test]
async fn test_list_orders_for_customer() {
    let db = seeded_db();
    let service = service(db);

    let first = service.submit_order(&two_item_request()).await.unwrap();
    let mut other = two_item_request();
    other.customer_id = "cust-2".to_string();
    service.submit_order(&other).await.unwrap();

    let orders = service.list_orders_for_customer("cust-1").await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, first.id);
}

#[tokio::test]
async fn test_submitted_orders_survive_batch_mapping() {
    let db = seeded_db();
    let monitor = Arc::new(ValidationMonitor::new());
    let service = OrderService::new(db.clone(), monitor.clone());

    let order = service.submit_order(&two_item_request()).await.unwrap();

    // Rebuild the raw nested-row shape the hosted database would return
    let mut raw = db.rows("orders")[0].clone();
    raw.as_object_mut()
        .unwrap()
        .insert("items".to_string(), Value::Array(db.rows("order_items")));

    let mapped = map_order_rows(&monitor, vec![raw, json!({"id": "garbage"})]);

    assert_eq!(mapped.len(), 1);
    assert_eq!(mapped[0].id, order.id);
    assert_eq!(mapped[0].total, order.total);
    // Exactly one error for the one malformed row
    assert_eq!(monitor.metrics().validation_errors, 1);
}
