//! Inventory read-time types
//!
//! [`InventoryLevel`] is an ephemeral snapshot fetched immediately before
//! reservation; it is recomputed on every submission attempt and never
//! persisted by this core.

use serde::{Deserialize, Serialize};

/// Read-time view of a product's available stock
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryLevel {
    pub product_id: String,
    pub product_name: String,
    /// Units currently available for sale
    pub available: i32,
}

/// One line of an inventory conflict report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryConflict {
    pub product_id: String,
    pub product_name: String,
    pub requested: i32,
    pub available: i32,
}

impl InventoryConflict {
    /// Human-readable one-line summary, e.g. `"Honeycrisp Apples: requested 3, available 1"`
    pub fn summary(&self) -> String {
        format!(
            "{}: requested {}, available {}",
            self.product_name, self.requested, self.available
        )
    }
}

/// Join conflict summaries into the message shown to the customer
pub fn conflict_message(conflicts: &[InventoryConflict]) -> String {
    let lines: Vec<String> = conflicts.iter().map(|c| c.summary()).collect();
    format!(
        "Some items are no longer available in the requested quantity: {}",
        lines.join("; ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_summary() {
        let conflict = InventoryConflict {
            product_id: "prod-1".to_string(),
            product_name: "Honeycrisp Apples".to_string(),
            requested: 3,
            available: 1,
        };
        assert_eq!(conflict.summary(), "Honeycrisp Apples: requested 3, available 1");
    }

    #[test]
    fn test_conflict_message_names_every_product() {
        let conflicts = vec![
            InventoryConflict {
                product_id: "prod-1".to_string(),
                product_name: "Apples".to_string(),
                requested: 3,
                available: 1,
            },
            InventoryConflict {
                product_id: "prod-2".to_string(),
                product_name: "Cider".to_string(),
                requested: 2,
                available: 0,
            },
        ];
        let msg = conflict_message(&conflicts);
        assert!(msg.contains("Apples: requested 3, available 1"));
        assert!(msg.contains("Cider: requested 2, available 0"));
    }
}
