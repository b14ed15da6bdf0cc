//! Best-effort collaborator seams
//!
//! Notifications, stock restoration and change broadcasts are informational
//! side effects: the triggering write succeeds or fails on its own, and
//! [`best_effort`] makes the swallow-and-log contract explicit at the call
//! site instead of scattering `let _ =` around the codebase.

use async_trait::async_trait;
use serde_json::Value;
use shared::models::Order;
use std::future::Future;
use thiserror::Error;

/// Side-effect failure; only ever logged
#[derive(Debug, Error)]
#[error("{0}")]
pub struct NotifyError(pub String);

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Customer-facing order notifications
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn send_order_confirmation(&self, order: &Order) -> NotifyResult<()>;
    async fn send_pickup_ready(&self, order: &Order) -> NotifyResult<()>;
}

/// Returns reserved stock to inventory after a cancellation
#[async_trait]
pub trait StockRestorer: Send + Sync {
    async fn restore_stock(&self, order: &Order, reason: &str) -> NotifyResult<()>;
}

/// Publishes change events to the client-side cache channel
#[async_trait]
pub trait ChangeBroadcaster: Send + Sync {
    async fn broadcast(&self, channel: &str, event: &str, payload: Value) -> NotifyResult<()>;
}

/// No-op implementation of every collaborator seam
pub struct NullNotifier;

#[async_trait]
impl OrderNotifier for NullNotifier {
    async fn send_order_confirmation(&self, _order: &Order) -> NotifyResult<()> {
        Ok(())
    }

    async fn send_pickup_ready(&self, _order: &Order) -> NotifyResult<()> {
        Ok(())
    }
}

#[async_trait]
impl StockRestorer for NullNotifier {
    async fn restore_stock(&self, _order: &Order, _reason: &str) -> NotifyResult<()> {
        Ok(())
    }
}

#[async_trait]
impl ChangeBroadcaster for NullNotifier {
    async fn broadcast(&self, _channel: &str, _event: &str, _payload: Value) -> NotifyResult<()> {
        Ok(())
    }
}

/// Run a side effect whose outcome is informational only
///
/// The failure is logged at warn severity and never propagated; the return
/// value reports whether the effect succeeded, for callers that want to
/// count outcomes.
pub async fn best_effort<F>(what: &'static str, fut: F) -> bool
where
    F: Future<Output = NotifyResult<()>>,
{
    match fut.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(side_effect = what, error = %e, "best-effort side effect failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_best_effort_swallows_failure() {
        let ok = best_effort("always_fails", async {
            Err(NotifyError("unreachable host".to_string()))
        })
        .await;
        assert!(!ok);

        let ok = best_effort("always_succeeds", async { Ok(()) }).await;
        assert!(ok);
    }
}
