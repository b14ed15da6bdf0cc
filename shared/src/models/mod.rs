//! Domain models

pub mod inventory;
pub mod order;

// Re-exports
pub use inventory::{InventoryConflict, InventoryLevel, conflict_message};
pub use order::{
    FulfillmentMode, LineItemInput, Order, OrderLineItem, OrderStatus, PaymentStatus,
    SubmitOrderRequest,
};
