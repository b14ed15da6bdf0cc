//! Order status updates
//!
//! Status changes are single-statement writes followed by a re-fetch for
//! downstream notification. Side effects (pickup-ready notification, stock
//! restoration on cancellation) are best-effort: their failure is logged
//! and never reverts the status change.

use crate::db::Filter;
use crate::notify::best_effort;
use crate::orders::submit::{ORDERS_CHANNEL, ORDERS_TABLE, OrderService, SubmitError, SubmitResult};
use chrono::Utc;
use serde_json::{Value, json};
use shared::models::{Order, OrderStatus};
use uuid::Uuid;

/// Reason passed to the stock restorer when an order is cancelled
const CANCEL_RESTOCK_REASON: &str = "order_cancelled";

impl OrderService {
    /// Update one order's status and notify downstream
    pub async fn update_order_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
    ) -> SubmitResult<Order> {
        let patch = json!({"status": new_status, "updated_at": Utc::now()});
        let updated = self
            .db
            .update(ORDERS_TABLE, patch, Filter::new().eq("id", order_id))
            .await
            .map_err(|e| SubmitError::PersistenceFailure(e.to_string()))?;
        if updated.is_empty() {
            return Err(SubmitError::OrderNotFound(order_id.to_string()));
        }

        let order = self
            .get_order(order_id)
            .await?
            .ok_or_else(|| SubmitError::OrderNotFound(order_id.to_string()))?;

        tracing::info!(order_id = %order.id, status = ?new_status, "order status updated");
        self.emit_status_side_effects(&order).await;
        Ok(order)
    }

    /// Apply the same status to a set of orders in one write, then fetch
    /// and notify per order
    ///
    /// A per-order fetch or notification failure is logged and does not
    /// affect the other ids; the returned list contains the orders that
    /// could be re-fetched.
    pub async fn update_order_status_bulk(
        &self,
        order_ids: &[String],
        new_status: OrderStatus,
    ) -> SubmitResult<Vec<Order>> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Value> = order_ids.iter().map(|id| json!(id)).collect();
        let patch = json!({"status": new_status, "updated_at": Utc::now()});
        self.db
            .update(ORDERS_TABLE, patch, Filter::new().in_list("id", ids))
            .await
            .map_err(|e| SubmitError::PersistenceFailure(e.to_string()))?;

        let mut orders = Vec::with_capacity(order_ids.len());
        for order_id in order_ids {
            match self.get_order(order_id).await {
                Ok(Some(order)) => {
                    self.emit_status_side_effects(&order).await;
                    orders.push(order);
                }
                Ok(None) => {
                    tracing::warn!(order_id = %order_id, "order missing after bulk status update");
                }
                Err(e) => {
                    tracing::warn!(
                        order_id = %order_id,
                        error = %e,
                        "failed to fetch order after bulk status update"
                    );
                }
            }
        }
        Ok(orders)
    }

    /// Best-effort side effects of a status transition
    async fn emit_status_side_effects(&self, order: &Order) {
        let payload = json!({
            "id": Uuid::new_v4().to_string(),
            "order_id": order.id,
            "status": order.status,
        });
        best_effort(
            "broadcast_order_updated",
            self.broadcaster.broadcast(ORDERS_CHANNEL, "order_updated", payload),
        )
        .await;

        match order.status {
            OrderStatus::Ready => {
                best_effort(
                    "pickup_ready_notification",
                    self.notifier.send_pickup_ready(order),
                )
                .await;
            }
            OrderStatus::Cancelled => {
                best_effort(
                    "restore_stock",
                    self.stock.restore_stock(order, CANCEL_RESTOCK_REASON),
                )
                .await;
            }
            _ => {}
        }
    }
}
