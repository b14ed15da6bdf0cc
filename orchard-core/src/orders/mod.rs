//! Order submission pipeline
//!
//! - **submit**: the `OrderService`: availability check, totals,
//!   RPC-atomic persistence with a manual-compensation fallback
//! - **status**: single and bulk status updates with best-effort
//!   notifications
//! - **saga**: the reverse-order compensation runner for the fallback path
//! - **money**: decimal arithmetic, tolerance checks, totals reconciliation
//! - **rows**: mapping between orders and their header/line rows
//! - **mapping**: skip-on-error batch hydration of raw rows
//!
//! # Flow
//!
//! ```text
//! request → validate → availability check → totals → persist
//!                           ↓ (conflicts)      ↓ (procedure or saga)
//!                    conflict report      order + side effects
//! ```

pub mod mapping;
pub mod money;
pub mod rows;
pub mod saga;
pub mod status;
pub mod submit;

// Re-exports
pub use mapping::{map_order_rows, order_row_schema};
pub use money::{MONEY_TOLERANCE, TOLERANCE, money_eq};
pub use saga::Compensations;
pub use submit::{OrderService, SubmitError, SubmitResult};
