//! Order submission pipeline
//!
//! Turns a validated request into a persisted order with correctly
//! reserved inventory, or fails cleanly with no partial state.
//!
//! Persistence prefers the server-side atomic procedure, which performs
//! check-and-reserve in one round trip. Without it the fallback path runs
//! insert header → insert lines → decrement stock, registering a
//! compensation for every completed step; any later failure unwinds them
//! in reverse so the net effect is all-or-nothing. The read-then-write gap
//! of the fallback path is inherent, which is why the procedure path is
//! preferred.

use crate::db::{Database, DbError, Filter, Procedures};
use crate::monitoring::ValidationMonitor;
use crate::notify::{ChangeBroadcaster, NullNotifier, OrderNotifier, StockRestorer, best_effort};
use crate::orders::saga::Compensations;
use crate::orders::{money, rows};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    FulfillmentMode, InventoryConflict, InventoryLevel, Order, OrderLineItem, SubmitOrderRequest,
    conflict_message,
};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

pub(crate) const ORDERS_TABLE: &str = "orders";
pub(crate) const ORDER_ITEMS_TABLE: &str = "order_items";
pub(crate) const PRODUCTS_TABLE: &str = "products";
pub(crate) const ORDERS_CHANNEL: &str = "orders";

const SUBMIT_ORDER_PROCEDURE: &str = "submit_order_atomic";
const DEFAULT_TAX_RATE: f64 = 0.085;

/// Submission failure taxonomy
///
/// Expected business conditions are values, never panics; anything outside
/// the taxonomy is folded into `Unexpected` at the pipeline boundary.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0}")]
    MissingRequiredField(String),

    #[error("{}", conflict_message(.0))]
    InventoryConflict(Vec<InventoryConflict>),

    #[error("Order could not be saved, please try again: {0}")]
    PersistenceFailure(String),

    #[error("Stock reservation failed, please try again: {0}")]
    StockUpdateFailure(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl SubmitError {
    /// Stable error code for the mobile shell
    pub fn code(&self) -> ErrorCode {
        match self {
            SubmitError::MissingRequiredField(_) => ErrorCode::RequiredField,
            SubmitError::InventoryConflict(_) => ErrorCode::InventoryConflict,
            SubmitError::PersistenceFailure(_) => ErrorCode::PersistenceFailure,
            SubmitError::StockUpdateFailure(_) => ErrorCode::StockUpdateFailure,
            SubmitError::OrderNotFound(_) => ErrorCode::OrderNotFound,
            SubmitError::Unexpected(_) => ErrorCode::InternalError,
        }
    }

    /// The structured conflict list, when this is an inventory conflict
    pub fn conflicts(&self) -> Option<&[InventoryConflict]> {
        match self {
            SubmitError::InventoryConflict(conflicts) => Some(conflicts),
            _ => None,
        }
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        let mut app = AppError::with_message(err.code(), err.to_string());
        if let SubmitError::InventoryConflict(conflicts) = &err {
            if let Ok(value) = serde_json::to_value(conflicts) {
                app = app.with_detail("conflicts", value);
            }
        }
        app
    }
}

pub type SubmitResult<T> = Result<T, SubmitError>;

/// Per-product reservation computed by the availability check
#[derive(Debug, Clone)]
pub(crate) struct ReservedLine {
    pub product_id: String,
    pub requested: i32,
    pub available: i32,
}

/// Reply shape of the atomic submission procedure
#[derive(Debug, Deserialize)]
struct ProcedureReply {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    inventory_conflicts: Option<Vec<InventoryConflict>>,
}

/// The order submission service
///
/// Collaborators are trait objects so tests and the mobile shell can wire
/// their own; defaults are no-ops except the database, which is required.
pub struct OrderService {
    pub(crate) db: Arc<dyn Database>,
    pub(crate) procedures: Option<Arc<dyn Procedures>>,
    pub(crate) notifier: Arc<dyn OrderNotifier>,
    pub(crate) broadcaster: Arc<dyn ChangeBroadcaster>,
    pub(crate) stock: Arc<dyn StockRestorer>,
    pub(crate) monitor: Arc<ValidationMonitor>,
    pub(crate) tax_rate: f64,
}

impl OrderService {
    pub fn new(db: Arc<dyn Database>, monitor: Arc<ValidationMonitor>) -> Self {
        Self {
            db,
            procedures: None,
            notifier: Arc::new(NullNotifier),
            broadcaster: Arc::new(NullNotifier),
            stock: Arc::new(NullNotifier),
            monitor,
            tax_rate: DEFAULT_TAX_RATE,
        }
    }

    /// Use the atomic submission procedure instead of the fallback path
    pub fn with_procedures(mut self, procedures: Arc<dyn Procedures>) -> Self {
        self.procedures = Some(procedures);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn OrderNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_broadcaster(mut self, broadcaster: Arc<dyn ChangeBroadcaster>) -> Self {
        self.broadcaster = broadcaster;
        self
    }

    pub fn with_stock_restorer(mut self, stock: Arc<dyn StockRestorer>) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_tax_rate(mut self, tax_rate: f64) -> Self {
        self.tax_rate = tax_rate;
        self
    }

    /// Submit an order: validate, check inventory, reserve stock, persist
    ///
    /// On success the returned order is fully hydrated (generated id,
    /// timestamps, reconciled totals) and already persisted. On failure
    /// nothing related to this submission remains in the database; an
    /// inventory conflict carries the full per-product conflict list.
    pub async fn submit_order(&self, request: &SubmitOrderRequest) -> SubmitResult<Order> {
        validate_request(request)?;

        let reserved = self.check_availability(request).await?;

        let mut order = build_order(request);
        money::finalize_totals(&mut order, self.tax_rate, &self.monitor);

        match &self.procedures {
            Some(procedures) => self.persist_atomic(procedures.as_ref(), &order).await?,
            None => self.persist_fallback(&order, &reserved).await?,
        }

        tracing::info!(
            order_id = %order.id,
            customer_id = %order.customer_id,
            total = order.total,
            "order submitted"
        );

        let payload = json!({
            "id": Uuid::new_v4().to_string(),
            "order_id": order.id,
            "status": order.status,
            "total": order.total,
        });
        best_effort(
            "broadcast_new_order",
            self.broadcaster.broadcast(ORDERS_CHANNEL, "new_order", payload),
        )
        .await;
        best_effort(
            "order_confirmation",
            self.notifier.send_order_confirmation(&order),
        )
        .await;

        Ok(order)
    }

    /// Fetch one order with its line items, reconciling stored totals
    pub async fn get_order(&self, order_id: &str) -> SubmitResult<Option<Order>> {
        let headers = self
            .db
            .select(ORDERS_TABLE, Filter::new().eq("id", order_id))
            .await
            .map_err(unexpected)?;
        let Some(header) = headers.into_iter().next() else {
            return Ok(None);
        };

        let lines = self
            .db
            .select(ORDER_ITEMS_TABLE, Filter::new().eq("order_id", order_id))
            .await
            .map_err(unexpected)?;

        let mut order = rows::order_from_rows(header, lines).map_err(unexpected)?;
        money::reconcile_order(&mut order, &self.monitor);
        Ok(Some(order))
    }

    /// Fetch a customer's orders, newest first
    pub async fn list_orders_for_customer(&self, customer_id: &str) -> SubmitResult<Vec<Order>> {
        let headers = self
            .db
            .select(ORDERS_TABLE, Filter::new().eq("customer_id", customer_id))
            .await
            .map_err(unexpected)?;

        let mut orders = Vec::with_capacity(headers.len());
        for header in headers {
            let order_id = header
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let lines = self
                .db
                .select(ORDER_ITEMS_TABLE, Filter::new().eq("order_id", order_id))
                .await
                .map_err(unexpected)?;
            let mut order = rows::order_from_rows(header, lines).map_err(unexpected)?;
            money::reconcile_order(&mut order, &self.monitor);
            orders.push(order);
        }
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Read current stock for every referenced product and collect
    /// conflicts; no writes happen here
    async fn check_availability(
        &self,
        request: &SubmitOrderRequest,
    ) -> SubmitResult<Vec<ReservedLine>> {
        // Aggregate requested quantities per product, first-seen order
        let mut requested: Vec<(String, String, i32)> = Vec::new();
        for item in &request.items {
            match requested.iter_mut().find(|(id, _, _)| *id == item.product_id) {
                Some((_, _, total)) => *total += item.quantity,
                None => requested.push((
                    item.product_id.clone(),
                    item.product_name.clone(),
                    item.quantity,
                )),
            }
        }

        let ids: Vec<Value> = requested.iter().map(|(id, _, _)| json!(id)).collect();
        let products = self
            .db
            .select(PRODUCTS_TABLE, Filter::new().in_list("id", ids))
            .await
            .map_err(unexpected)?;

        // Read-time stock snapshot; recomputed on every attempt
        let levels: Vec<InventoryLevel> = products
            .iter()
            .filter_map(|p| {
                Some(InventoryLevel {
                    product_id: p.get("id")?.as_str()?.to_string(),
                    product_name: p.get("name").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                    available: p.get("stock_quantity").and_then(|v| v.as_i64()).unwrap_or(0) as i32,
                })
            })
            .collect();

        let mut reserved = Vec::new();
        let mut conflicts = Vec::new();
        for (product_id, request_name, quantity) in requested {
            let level = levels.iter().find(|l| l.product_id == product_id);
            let available = level.map(|l| l.available).unwrap_or(0);
            let product_name = level
                .map(|l| l.product_name.clone())
                .filter(|name| !name.is_empty())
                .unwrap_or(request_name);

            if available < quantity {
                conflicts.push(InventoryConflict {
                    product_id,
                    product_name,
                    requested: quantity,
                    available,
                });
            } else {
                reserved.push(ReservedLine {
                    product_id,
                    requested: quantity,
                    available,
                });
            }
        }

        if !conflicts.is_empty() {
            tracing::info!(
                conflict_count = conflicts.len(),
                "order rejected on inventory conflicts"
            );
            return Err(SubmitError::InventoryConflict(conflicts));
        }
        Ok(reserved)
    }

    /// Single round-trip persistence via the server-side procedure
    async fn persist_atomic(
        &self,
        procedures: &dyn Procedures,
        order: &Order,
    ) -> SubmitResult<()> {
        let params = json!({
            "order": rows::header_row(order).map_err(unexpected)?,
            "items": rows::line_rows(order).map_err(unexpected)?,
        });

        let reply = procedures
            .invoke(SUBMIT_ORDER_PROCEDURE, params)
            .await
            .map_err(|e| SubmitError::PersistenceFailure(e.to_string()))?;
        let reply: ProcedureReply = serde_json::from_value(reply)
            .map_err(|e| SubmitError::Unexpected(format!("malformed procedure reply: {}", e)))?;

        if reply.success {
            return Ok(());
        }
        match reply.inventory_conflicts {
            Some(conflicts) if !conflicts.is_empty() => {
                Err(SubmitError::InventoryConflict(conflicts))
            }
            _ => Err(SubmitError::PersistenceFailure(
                reply
                    .error
                    .unwrap_or_else(|| "procedure rejected the order".to_string()),
            )),
        }
    }

    /// Fallback persistence: header, lines, then per-product decrement,
    /// with compensations unwinding every completed step on failure
    async fn persist_fallback(
        &self,
        order: &Order,
        reserved: &[ReservedLine],
    ) -> SubmitResult<()> {
        let mut compensations = Compensations::new();

        let header = rows::header_row(order).map_err(unexpected)?;
        let lines = rows::line_rows(order).map_err(unexpected)?;

        self.db
            .insert(ORDERS_TABLE, vec![header])
            .await
            .map_err(|e| SubmitError::PersistenceFailure(e.to_string()))?;
        {
            let db = self.db.clone();
            let order_id = order.id.clone();
            compensations.push("delete_order_header", move || {
                Box::pin(async move {
                    db.delete(ORDERS_TABLE, Filter::new().eq("id", order_id)).await
                })
            });
        }

        if let Err(e) = self.db.insert(ORDER_ITEMS_TABLE, lines).await {
            compensations.run().await;
            return Err(SubmitError::PersistenceFailure(e.to_string()));
        }
        {
            let db = self.db.clone();
            let order_id = order.id.clone();
            compensations.push("delete_order_items", move || {
                Box::pin(async move {
                    db.delete(ORDER_ITEMS_TABLE, Filter::new().eq("order_id", order_id))
                        .await
                })
            });
        }

        for line in reserved {
            let patch = json!({"stock_quantity": line.available - line.requested});
            let filter = Filter::new().eq("id", line.product_id.clone());
            if let Err(e) = self.db.update(PRODUCTS_TABLE, patch, filter).await {
                compensations.run().await;
                return Err(SubmitError::StockUpdateFailure(e.to_string()));
            }
            let db = self.db.clone();
            let product_id = line.product_id.clone();
            let previous = line.available;
            compensations.push("restore_stock_level", move || {
                Box::pin(async move {
                    db.update(
                        PRODUCTS_TABLE,
                        json!({"stock_quantity": previous}),
                        Filter::new().eq("id", product_id),
                    )
                    .await
                    .map(|_| ())
                })
            });
        }

        Ok(())
    }
}

/// Shape and mode-conditional request checks; runs before any I/O
fn validate_request(request: &SubmitOrderRequest) -> SubmitResult<()> {
    if let Err(errors) = request.validate() {
        return Err(SubmitError::MissingRequiredField(flatten_messages(&errors)));
    }

    match request.fulfillment {
        FulfillmentMode::Delivery => {
            if !has_content(&request.delivery_address) {
                return Err(SubmitError::MissingRequiredField(
                    "delivery orders require a delivery address".to_string(),
                ));
            }
        }
        FulfillmentMode::Pickup => {
            if !has_content(&request.pickup_date) || !has_content(&request.pickup_time) {
                return Err(SubmitError::MissingRequiredField(
                    "pickup orders require a pickup date and time".to_string(),
                ));
            }
        }
    }
    Ok(())
}

fn has_content(field: &Option<String>) -> bool {
    field.as_deref().map(str::trim).is_some_and(|s| !s.is_empty())
}

fn flatten_messages(errors: &validator::ValidationErrors) -> String {
    errors.to_string().replace('\n', "; ")
}

fn build_order(request: &SubmitOrderRequest) -> Order {
    let now = Utc::now();
    Order {
        id: shared::util::order_id(),
        customer_id: request.customer_id.clone(),
        customer_name: request.customer_name.clone(),
        customer_email: request.customer_email.clone(),
        customer_phone: request.customer_phone.clone(),
        items: request
            .items
            .iter()
            .map(|item| OrderLineItem {
                product_id: item.product_id.clone(),
                product_name: item.product_name.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity,
                subtotal: item.subtotal,
            })
            .collect(),
        subtotal: 0.0,
        tax: 0.0,
        total: 0.0,
        fulfillment: request.fulfillment,
        payment_method: request.payment_method.clone(),
        payment_status: Default::default(),
        status: Default::default(),
        created_at: now,
        updated_at: now,
        delivery_address: request.delivery_address.clone(),
        pickup_date: request.pickup_date.clone(),
        pickup_time: request.pickup_time.clone(),
        special_instructions: request.special_instructions.clone(),
    }
}

fn unexpected(e: DbError) -> SubmitError {
    SubmitError::Unexpected(e.to_string())
}
