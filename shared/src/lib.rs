//! Shared types for the Orchard ordering core
//!
//! Common types used across crates: domain models, error codes and
//! structured errors, and utility functions.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCode};
pub use models::inventory::{InventoryConflict, InventoryLevel};
pub use models::order::{
    FulfillmentMode, LineItemInput, Order, OrderLineItem, OrderStatus, PaymentStatus,
    SubmitOrderRequest,
};
pub use serde::{Deserialize, Serialize};
