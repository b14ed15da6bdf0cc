//! Orchard Order Core - business-rule layer for the farmstand ordering app
//!
//! This library sits between the mobile shell and a hosted
//! backend-as-a-service. It owns the two flows with real invariants:
//!
//! - **orders**: order submission with inventory reservation and
//!   compensating cleanup, plus status updates and reads
//! - **validation**: the generic sanitize/validate/transform pipeline with
//!   tolerance-based numeric reconciliation
//!
//! # Architecture
//!
//! ```text
//! SubmitOrderRequest → OrderService → Database / Procedures (hosted BaaS)
//!        ↓                  ↓                     ↓
//!   validation        Compensations         best-effort
//!    pipeline        (fallback saga)     notify / broadcast
//!        ↓
//!  ValidationMonitor (counters + health status)
//! ```
//!
//! # Module structure
//!
//! ```text
//! orchard-core/src/
//! ├── config.rs      # Environment-driven configuration
//! ├── logger.rs      # tracing bootstrap
//! ├── db/            # Database + Procedures seams (REST adapter, in-memory)
//! ├── validation/    # Schema rules, sanitizer, transforms, pipeline
//! ├── monitoring.rs  # Injectable counters + health status
//! ├── notify.rs      # Best-effort collaborator seams
//! └── orders/        # Submission pipeline, saga, status updates, mapping
//! ```

pub mod config;
pub mod db;
pub mod logger;
pub mod monitoring;
pub mod notify;
pub mod orders;
pub mod validation;

// Re-export public types
pub use config::Config;
pub use db::{Database, DbError, DbResult, Filter, MemoryDatabase, MemoryProcedures, Procedures, RestDatabase};
pub use logger::init_logger;
pub use monitoring::{CalculationMismatch, Health, HealthStatus, MismatchKind, ValidationMonitor};
pub use notify::{ChangeBroadcaster, NullNotifier, OrderNotifier, StockRestorer};
pub use orders::{OrderService, SubmitError, SubmitResult};
pub use validation::{
    Schema, Strictness, ValidateOptions, ValidationError, ValidationOutcome, validate_input,
    validate_input_lenient, validate_input_moderate, validate_input_strict,
};
