//! Money calculation utilities using rust_decimal for precision
//!
//! All monetary arithmetic is done with `Decimal` internally and converted
//! to `f64` only at serialization boundaries. Derived values that deviate
//! from their recomputed expectation by more than the tolerance are
//! auto-corrected and recorded with the monitor; an order is never rejected
//! for a calculation mismatch alone.

use crate::monitoring::{CalculationMismatch, MismatchKind, ValidationMonitor};
use rust_decimal::prelude::*;
use shared::models::Order;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// f64 mirror of [`MONEY_TOLERANCE`] for diagnostic records
pub const TOLERANCE: f64 = 0.01;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round to 2 decimal places, half-up
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Compare two monetary values for equality within the tolerance
pub fn money_eq(a: f64, b: f64) -> bool {
    (to_decimal(a) - to_decimal(b)).abs() <= MONEY_TOLERANCE
}

/// Tax for a subtotal at the given rate, rounded to cents
pub fn tax_for(subtotal: Decimal, tax_rate: f64) -> Decimal {
    round_money(subtotal * to_decimal(tax_rate))
}

/// Reconcile line subtotals and set the order's subtotal/tax/total
///
/// Each line's subtotal is checked against `unit_price * quantity`; a
/// deviation beyond tolerance is corrected to the expected value and
/// recorded. Totals are then derived from the corrected lines.
pub fn finalize_totals(order: &mut Order, tax_rate: f64, monitor: &ValidationMonitor) {
    let order_id = order.id.clone();
    let mut subtotal = Decimal::ZERO;

    for item in &mut order.items {
        let expected = round_money(to_decimal(item.unit_price) * Decimal::from(item.quantity));
        let actual = to_decimal(item.subtotal);
        if (expected - actual).abs() > MONEY_TOLERANCE {
            monitor.record_calculation_mismatch(&CalculationMismatch {
                kind: MismatchKind::LineSubtotal,
                expected: to_f64(expected),
                actual: item.subtotal,
                difference: to_f64(actual - expected),
                tolerance: TOLERANCE,
                order_id: Some(order_id.clone()),
                product_id: Some(item.product_id.clone()),
            });
            item.subtotal = to_f64(expected);
        }
        subtotal += to_decimal(item.subtotal);
    }

    let subtotal = round_money(subtotal);
    let tax = tax_for(subtotal, tax_rate);
    order.subtotal = to_f64(subtotal);
    order.tax = to_f64(tax);
    order.total = to_f64(subtotal + tax);
}

/// Reconcile a hydrated order read back from the database
///
/// Checks the stored order-level invariants (subtotal vs line sum, total vs
/// subtotal + tax) and the per-line invariant, correcting and recording any
/// deviation beyond tolerance.
pub fn reconcile_order(order: &mut Order, monitor: &ValidationMonitor) {
    let order_id = order.id.clone();
    let mut line_sum = Decimal::ZERO;

    for item in &mut order.items {
        let expected = round_money(to_decimal(item.unit_price) * Decimal::from(item.quantity));
        let actual = to_decimal(item.subtotal);
        if (expected - actual).abs() > MONEY_TOLERANCE {
            monitor.record_calculation_mismatch(&CalculationMismatch {
                kind: MismatchKind::LineSubtotal,
                expected: to_f64(expected),
                actual: item.subtotal,
                difference: to_f64(actual - expected),
                tolerance: TOLERANCE,
                order_id: Some(order_id.clone()),
                product_id: Some(item.product_id.clone()),
            });
            item.subtotal = to_f64(expected);
        }
        line_sum += to_decimal(item.subtotal);
    }

    let expected_subtotal = round_money(line_sum);
    let actual_subtotal = to_decimal(order.subtotal);
    if (expected_subtotal - actual_subtotal).abs() > MONEY_TOLERANCE {
        monitor.record_calculation_mismatch(&CalculationMismatch {
            kind: MismatchKind::OrderSubtotal,
            expected: to_f64(expected_subtotal),
            actual: order.subtotal,
            difference: to_f64(actual_subtotal - expected_subtotal),
            tolerance: TOLERANCE,
            order_id: Some(order_id.clone()),
            product_id: None,
        });
        order.subtotal = to_f64(expected_subtotal);
    }

    let expected_total = round_money(to_decimal(order.subtotal) + to_decimal(order.tax));
    let actual_total = to_decimal(order.total);
    if (expected_total - actual_total).abs() > MONEY_TOLERANCE {
        monitor.record_calculation_mismatch(&CalculationMismatch {
            kind: MismatchKind::OrderTotal,
            expected: to_f64(expected_total),
            actual: order.total,
            difference: to_f64(actual_total - expected_total),
            tolerance: TOLERANCE,
            order_id: Some(order_id),
            product_id: None,
        });
        order.total = to_f64(expected_total);
    }
}
