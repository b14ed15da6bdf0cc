//! In-memory database for tests
//!
//! Tables are plain JSON rows behind a single lock. [`MemoryProcedures`]
//! models the server-side atomic routine: its whole body runs under the
//! write lock, so check-and-reserve is indivisible the way the hosted
//! procedure is.
//!
//! Fault injection (`fail_inserts_on` / `fail_updates_on`) lets the test
//! suite drive the compensation paths without a real backend.

use super::filter::Clause;
use super::{Database, DbError, DbResult, Filter, Procedures};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// In-memory table store
#[derive(Default)]
pub struct MemoryDatabase {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    failing_inserts: RwLock<HashSet<String>>,
    failing_updates: RwLock<HashSet<String>>,
    failing_update_matches: RwLock<Vec<(String, String, Value)>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a table's rows
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.tables.write().insert(table.to_string(), rows);
    }

    /// Snapshot a table's rows (empty if the table does not exist)
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.read().get(table).cloned().unwrap_or_default()
    }

    /// Make every insert into `table` fail until cleared
    pub fn fail_inserts_on(&self, table: &str) {
        self.failing_inserts.write().insert(table.to_string());
    }

    /// Make every update of `table` fail until cleared
    pub fn fail_updates_on(&self, table: &str) {
        self.failing_updates.write().insert(table.to_string());
    }

    /// Make updates of `table` fail only when the filter pins `column` to
    /// `value` (e.g. the decrement of one specific product)
    pub fn fail_update_matching(&self, table: &str, column: &str, value: impl Into<Value>) {
        self.failing_update_matches
            .write()
            .push((table.to_string(), column.to_string(), value.into()));
    }

    /// Clear all injected faults
    pub fn clear_failures(&self) {
        self.failing_inserts.write().clear();
        self.failing_updates.write().clear();
        self.failing_update_matches.write().clear();
    }

    fn update_should_fail(&self, table: &str, filter: &Filter) -> bool {
        if self.failing_updates.read().contains(table) {
            return true;
        }
        self.failing_update_matches.read().iter().any(|(t, column, value)| {
            t == table
                && filter
                    .clauses
                    .iter()
                    .any(|c| matches!(c, Clause::Eq(col, v) if col == column && v == value))
        })
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn select(&self, table: &str, filter: Filter) -> DbResult<Vec<Value>> {
        let tables = self.tables.read();
        let mut rows: Vec<Value> = tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        if let Some(n) = filter.limit {
            rows.truncate(n);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> DbResult<Vec<Value>> {
        if self.failing_inserts.read().contains(table) {
            return Err(DbError::Rejected(format!("insert into {} refused", table)));
        }
        let mut tables = self.tables.write();
        tables
            .entry(table.to_string())
            .or_default()
            .extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn update(&self, table: &str, patch: Value, filter: Filter) -> DbResult<Vec<Value>> {
        if self.update_should_fail(table, &filter) {
            return Err(DbError::Rejected(format!("update of {} refused", table)));
        }
        let patch_map = patch
            .as_object()
            .ok_or_else(|| DbError::Query("patch must be a JSON object".to_string()))?
            .clone();

        let mut tables = self.tables.write();
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|r| filter.matches(r)) {
                if let Some(obj) = row.as_object_mut() {
                    for (key, value) in &patch_map {
                        obj.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filter: Filter) -> DbResult<()> {
        let mut tables = self.tables.write();
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|r| !filter.matches(r));
        }
        Ok(())
    }
}

/// In-memory stand-in for the server-side atomic procedures
pub struct MemoryProcedures {
    db: Arc<MemoryDatabase>,
}

impl MemoryProcedures {
    pub fn new(db: Arc<MemoryDatabase>) -> Self {
        Self { db }
    }

    /// Check-and-reserve under one lock: verify stock for every item,
    /// write the order header and lines, and decrement stock, or report
    /// the full conflict list without writing anything.
    fn submit_order_atomic(&self, params: &Value) -> DbResult<Value> {
        let order = params
            .get("order")
            .ok_or_else(|| DbError::Procedure("missing 'order' param".to_string()))?;
        let items = params
            .get("items")
            .and_then(|v| v.as_array())
            .ok_or_else(|| DbError::Procedure("missing 'items' param".to_string()))?;

        let mut tables = self.db.tables.write();

        // Aggregate requested quantities per product
        let mut requested: Vec<(String, i64)> = Vec::new();
        for item in items {
            let product_id = item
                .get("product_id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| DbError::Procedure("item missing product_id".to_string()))?
                .to_string();
            let quantity = item.get("quantity").and_then(|v| v.as_i64()).unwrap_or(0);
            match requested.iter_mut().find(|(id, _)| *id == product_id) {
                Some((_, total)) => *total += quantity,
                None => requested.push((product_id, quantity)),
            }
        }

        // Availability check against current stock
        let products = tables.get("products").cloned().unwrap_or_default();
        let mut conflicts = Vec::new();
        for (product_id, qty) in &requested {
            let product = products
                .iter()
                .find(|p| p.get("id").and_then(|v| v.as_str()) == Some(product_id.as_str()));
            let available = product
                .and_then(|p| p.get("stock_quantity"))
                .and_then(|v| v.as_i64())
                .unwrap_or(0);
            if available < *qty {
                let name = product
                    .and_then(|p| p.get("name"))
                    .and_then(|v| v.as_str())
                    .unwrap_or(product_id)
                    .to_string();
                conflicts.push(json!({
                    "product_id": product_id,
                    "product_name": name,
                    "requested": qty,
                    "available": available,
                }));
            }
        }

        if !conflicts.is_empty() {
            return Ok(json!({
                "success": false,
                "inventory_conflicts": conflicts,
            }));
        }

        // Reserve and persist
        for (product_id, qty) in &requested {
            if let Some(products) = tables.get_mut("products") {
                for product in products.iter_mut() {
                    if product.get("id").and_then(|v| v.as_str()) == Some(product_id.as_str()) {
                        let available =
                            product.get("stock_quantity").and_then(|v| v.as_i64()).unwrap_or(0);
                        if let Some(obj) = product.as_object_mut() {
                            obj.insert("stock_quantity".to_string(), json!(available - qty));
                        }
                    }
                }
            }
        }
        tables.entry("orders".to_string()).or_default().push(order.clone());
        tables
            .entry("order_items".to_string())
            .or_default()
            .extend(items.iter().cloned());

        Ok(json!({"success": true, "order": order}))
    }
}

#[async_trait]
impl Procedures for MemoryProcedures {
    async fn invoke(&self, procedure: &str, params: Value) -> DbResult<Value> {
        match procedure {
            "submit_order_atomic" => self.submit_order_atomic(&params),
            other => Err(DbError::Procedure(format!("unknown procedure: {}", other))),
        }
    }
}
