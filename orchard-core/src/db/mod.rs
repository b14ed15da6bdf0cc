//! Database access seam
//!
//! The core talks to the hosted database through two narrow traits:
//!
//! - [`Database`]: row-level select/insert/update/delete with filters
//! - [`Procedures`]: single round-trip invocation of a server-side routine
//!   (used for the atomic check-and-reserve path)
//!
//! No panics and no vendor types cross this boundary; every call returns a
//! [`DbResult`]. [`RestDatabase`] adapts the traits to a PostgREST-style
//! endpoint; [`MemoryDatabase`] backs the test suite.

pub mod filter;
pub mod memory;
pub mod rest;

pub use filter::Filter;
pub use memory::{MemoryDatabase, MemoryProcedures};
pub use rest::RestDatabase;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Database error types
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Procedure error: {0}")]
    Procedure(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;

impl From<reqwest::Error> for DbError {
    fn from(err: reqwest::Error) -> Self {
        DbError::Transport(err.to_string())
    }
}

/// Row-level access to the hosted database
///
/// Rows are dynamic JSON until the validation pipeline turns them into
/// typed models.
#[async_trait]
pub trait Database: Send + Sync {
    /// Read rows matching the filter
    async fn select(&self, table: &str, filter: Filter) -> DbResult<Vec<Value>>;

    /// Insert rows, returning the inserted representation
    async fn insert(&self, table: &str, rows: Vec<Value>) -> DbResult<Vec<Value>>;

    /// Patch rows matching the filter, returning the updated representation
    async fn update(&self, table: &str, patch: Value, filter: Filter) -> DbResult<Vec<Value>>;

    /// Delete rows matching the filter
    async fn delete(&self, table: &str, filter: Filter) -> DbResult<()>;
}

/// Single round-trip invocation of server-side procedures
///
/// Used to perform check-and-reserve as one database-side operation,
/// closing the read-then-write race of the fallback path. Calls are not
/// retried automatically.
#[async_trait]
pub trait Procedures: Send + Sync {
    async fn invoke(&self, procedure: &str, params: Value) -> DbResult<Value>;
}
