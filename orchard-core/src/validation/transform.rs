//! Post-validation transforms
//!
//! Normalizes well-known field shapes in place: emails to lowercase and
//! trimmed, phone numbers to digits only, and numeric-looking strings in
//! money/quantity-named fields to actual numbers.

use serde_json::{Number, Value};

/// Field names whose string values are coerced to numbers when possible
const NUMERIC_FIELDS: &[&str] = &[
    "price",
    "unit_price",
    "subtotal",
    "total",
    "tax",
    "amount",
    "quantity",
    "qty",
    "stock_quantity",
];

const NUMERIC_SUFFIXES: &[&str] = &["_price", "_amount", "_total", "_quantity"];

fn is_numeric_field(key: &str) -> bool {
    NUMERIC_FIELDS.contains(&key) || NUMERIC_SUFFIXES.iter().any(|s| key.ends_with(s))
}

fn is_email_field(key: &str) -> bool {
    key == "email" || key.ends_with("_email")
}

fn is_phone_field(key: &str) -> bool {
    key.contains("phone")
}

/// Apply in-place transforms, returning whether anything changed
pub fn apply_transforms(value: &mut Value) -> bool {
    match value {
        Value::Object(map) => {
            let mut changed = false;
            for (key, entry) in map.iter_mut() {
                if let Value::String(s) = entry {
                    if is_email_field(key) {
                        let normalized = s.trim().to_lowercase();
                        if normalized != *s {
                            *entry = Value::String(normalized);
                            changed = true;
                        }
                        continue;
                    }
                    if is_phone_field(key) {
                        let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
                        if digits != *s {
                            *entry = Value::String(digits);
                            changed = true;
                        }
                        continue;
                    }
                    if is_numeric_field(key) {
                        if let Ok(n) = s.trim().parse::<f64>() {
                            if let Some(num) = Number::from_f64(n) {
                                *entry = Value::Number(num);
                                changed = true;
                            }
                        }
                        continue;
                    }
                }
                changed |= apply_transforms(entry);
            }
            changed
        }
        Value::Array(items) => {
            let mut changed = false;
            for item in items.iter_mut() {
                changed |= apply_transforms(item);
            }
            changed
        }
        _ => false,
    }
}
