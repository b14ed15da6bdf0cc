//! Validation and reconciliation monitoring
//!
//! [`ValidationMonitor`] is an explicitly-scoped accumulator: construct one
//! per process (or per test) and share it by reference. Counters are
//! observability only and never drive control flow.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Mismatch classification for derived numeric invariants
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// line.subtotal vs unit_price * quantity
    LineSubtotal,
    /// order.subtotal vs sum of line subtotals
    OrderSubtotal,
    /// order.total vs subtotal + tax
    OrderTotal,
}

/// Diagnostic record for a numeric invariant that deviated beyond tolerance
///
/// The system auto-corrects the stored value to the expected one and records
/// the mismatch; an order is never rejected solely for this reason.
#[derive(Debug, Clone, Serialize)]
pub struct CalculationMismatch {
    pub kind: MismatchKind,
    pub expected: f64,
    pub actual: f64,
    pub difference: f64,
    pub tolerance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
}

/// Overall health classification
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Healthy,
    Warning,
    Critical,
}

/// Counter snapshot included in a health report
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonitorMetrics {
    pub validation_errors: u64,
    pub calculation_mismatches: u64,
    pub data_quality_issues: u64,
    pub pattern_successes: u64,
}

/// Aggregated health report
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: Health,
    pub issues: Vec<String>,
    pub metrics: MonitorMetrics,
}

// Threshold tiers for health aggregation
const VALIDATION_ERROR_WARN: u64 = 10;
const VALIDATION_ERROR_CRITICAL: u64 = 50;
const MISMATCH_WARN: u64 = 5;
const MISMATCH_CRITICAL: u64 = 25;
const DATA_QUALITY_WARN: u64 = 10;
const DATA_QUALITY_CRITICAL: u64 = 50;

/// Process-lifetime counters with an explicit reset
#[derive(Debug, Default)]
pub struct ValidationMonitor {
    validation_errors: AtomicU64,
    calculation_mismatches: AtomicU64,
    data_quality_issues: AtomicU64,
    pattern_successes: AtomicU64,
}

impl ValidationMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a validation failure
    pub fn record_validation_error(&self, context: &str, detail: &str) {
        self.validation_errors.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(context, detail, "validation failed");
    }

    /// Record a successful validation pattern use
    pub fn record_pattern_success(&self, context: &str) {
        self.pattern_successes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(context, "validation succeeded");
    }

    /// Record a data-quality observation (e.g. input required sanitization)
    pub fn record_data_quality_issue(&self, context: &str, detail: &str) {
        self.data_quality_issues.fetch_add(1, Ordering::Relaxed);
        tracing::info!(context, detail, "data quality issue");
    }

    /// Record a calculation mismatch
    ///
    /// Log severity scales with how many multiples of the tolerance the
    /// difference represents: >10x is an error, >2x a warning, anything
    /// else informational. Never fails the caller.
    pub fn record_calculation_mismatch(&self, mismatch: &CalculationMismatch) {
        self.calculation_mismatches.fetch_add(1, Ordering::Relaxed);

        let ratio = if mismatch.tolerance > 0.0 {
            mismatch.difference.abs() / mismatch.tolerance
        } else {
            f64::INFINITY
        };

        if ratio > 10.0 {
            tracing::error!(
                kind = ?mismatch.kind,
                expected = mismatch.expected,
                actual = mismatch.actual,
                difference = mismatch.difference,
                order_id = mismatch.order_id.as_deref(),
                product_id = mismatch.product_id.as_deref(),
                "calculation mismatch far beyond tolerance"
            );
        } else if ratio > 2.0 {
            tracing::warn!(
                kind = ?mismatch.kind,
                expected = mismatch.expected,
                actual = mismatch.actual,
                difference = mismatch.difference,
                order_id = mismatch.order_id.as_deref(),
                product_id = mismatch.product_id.as_deref(),
                "calculation mismatch beyond tolerance"
            );
        } else {
            tracing::info!(
                kind = ?mismatch.kind,
                expected = mismatch.expected,
                actual = mismatch.actual,
                difference = mismatch.difference,
                "calculation mismatch auto-corrected"
            );
        }
    }

    /// Current counter values
    pub fn metrics(&self) -> MonitorMetrics {
        MonitorMetrics {
            validation_errors: self.validation_errors.load(Ordering::Relaxed),
            calculation_mismatches: self.calculation_mismatches.load(Ordering::Relaxed),
            data_quality_issues: self.data_quality_issues.load(Ordering::Relaxed),
            pattern_successes: self.pattern_successes.load(Ordering::Relaxed),
        }
    }

    /// Aggregate counters against the warning/critical tiers
    pub fn health_status(&self) -> HealthStatus {
        let metrics = self.metrics();
        let mut issues = Vec::new();
        let mut status = Health::Healthy;

        let mut check = |count: u64, warn: u64, critical: u64, what: &str| {
            if count >= critical {
                issues.push(format!("{}: {} (critical threshold {})", what, count, critical));
                status = Health::Critical;
            } else if count >= warn {
                issues.push(format!("{}: {} (warning threshold {})", what, count, warn));
                if status == Health::Healthy {
                    status = Health::Warning;
                }
            }
        };

        check(
            metrics.validation_errors,
            VALIDATION_ERROR_WARN,
            VALIDATION_ERROR_CRITICAL,
            "validation errors",
        );
        check(
            metrics.calculation_mismatches,
            MISMATCH_WARN,
            MISMATCH_CRITICAL,
            "calculation mismatches",
        );
        check(
            metrics.data_quality_issues,
            DATA_QUALITY_WARN,
            DATA_QUALITY_CRITICAL,
            "data quality issues",
        );

        HealthStatus { status, issues, metrics }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.validation_errors.store(0, Ordering::Relaxed);
        self.calculation_mismatches.store(0, Ordering::Relaxed);
        self.data_quality_issues.store(0, Ordering::Relaxed);
        self.pattern_successes.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch(difference: f64) -> CalculationMismatch {
        CalculationMismatch {
            kind: MismatchKind::OrderTotal,
            expected: 10.0,
            actual: 10.0 + difference,
            difference,
            tolerance: 0.01,
            order_id: Some("ord-1".to_string()),
            product_id: None,
        }
    }

    #[test]
    fn test_counters_accumulate() {
        let monitor = ValidationMonitor::new();
        monitor.record_validation_error("orders", "bad row");
        monitor.record_validation_error("orders", "bad row");
        monitor.record_calculation_mismatch(&mismatch(0.5));
        monitor.record_pattern_success("orders");

        let metrics = monitor.metrics();
        assert_eq!(metrics.validation_errors, 2);
        assert_eq!(metrics.calculation_mismatches, 1);
        assert_eq!(metrics.pattern_successes, 1);
    }

    #[test]
    fn test_reset_clears_counters() {
        let monitor = ValidationMonitor::new();
        monitor.record_validation_error("orders", "bad row");
        monitor.reset();
        assert_eq!(monitor.metrics().validation_errors, 0);
    }

    #[test]
    fn test_healthy_by_default() {
        let monitor = ValidationMonitor::new();
        let health = monitor.health_status();
        assert_eq!(health.status, Health::Healthy);
        assert!(health.issues.is_empty());
    }

    #[test]
    fn test_warning_tier() {
        let monitor = ValidationMonitor::new();
        for _ in 0..VALIDATION_ERROR_WARN {
            monitor.record_validation_error("orders", "bad row");
        }
        let health = monitor.health_status();
        assert_eq!(health.status, Health::Warning);
        assert_eq!(health.issues.len(), 1);
    }

    #[test]
    fn test_critical_tier_dominates() {
        let monitor = ValidationMonitor::new();
        for _ in 0..VALIDATION_ERROR_CRITICAL {
            monitor.record_validation_error("orders", "bad row");
        }
        for _ in 0..MISMATCH_WARN {
            monitor.record_calculation_mismatch(&mismatch(0.05));
        }
        let health = monitor.health_status();
        assert_eq!(health.status, Health::Critical);
        assert_eq!(health.issues.len(), 2);
    }

    #[test]
    fn test_mismatch_never_panics_on_zero_tolerance() {
        let monitor = ValidationMonitor::new();
        let mut m = mismatch(1.0);
        m.tolerance = 0.0;
        monitor.record_calculation_mismatch(&m);
        assert_eq!(monitor.metrics().calculation_mismatches, 1);
    }
}
