//! Validation & reconciliation pipeline
//!
//! One reusable contract for every service boundary: sanitize external
//! data, validate its shape against a declarative [`Schema`], optionally
//! transform it, and report exactly what happened as a
//! [`ValidationOutcome`]. Every outcome is reported to the
//! [`ValidationMonitor`] for health aggregation.
//!
//! The convenience wrappers (`validate_input_strict` and friends) are the
//! one place that converts a rejection into an error value, so callers
//! that just want "validated data or bail" can use `?`.

pub mod sanitize;
pub mod schema;
pub mod transform;

pub use sanitize::{sanitize_string, sanitize_value};
pub use schema::{FieldKind, FieldRule, Issue, IssueKind, Schema};
pub use transform::apply_transforms;

use crate::monitoring::ValidationMonitor;
use serde_json::Value;
use thiserror::Error;

/// Rejection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Any shape violation fails the input
    Strict,
    /// Critical violations fail; the rest degrade to warnings
    #[default]
    Moderate,
    /// Always return usable (sanitized) data when possible
    Lenient,
}

/// Pipeline options
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub strictness: Strictness,
    /// Apply post-validation transforms (email/phone/numeric normalization)
    pub transform: bool,
    /// Label used in monitoring records
    pub context: String,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            strictness: Strictness::Moderate,
            transform: true,
            context: "input".to_string(),
        }
    }
}

/// What the pipeline did with one input
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub success: bool,
    pub data: Option<Value>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub sanitized: bool,
    pub transformed: bool,
}

/// Error carrying the joined rejection messages
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Run the full sanitize → validate → transform pipeline
pub fn validate_input(
    monitor: &ValidationMonitor,
    data: &Value,
    schema: &Schema,
    options: &ValidateOptions,
) -> ValidationOutcome {
    // Step 1: sanitize
    let (clean, sanitized) = sanitize_value(data);
    if sanitized {
        monitor.record_data_quality_issue(&options.context, "input required sanitization");
    }

    // Step 2: shape validation
    let issues = schema.validate(&clean);
    let (critical, non_critical): (Vec<_>, Vec<_>) =
        issues.into_iter().partition(|issue| issue.critical);

    let rejected = match options.strictness {
        Strictness::Strict => !critical.is_empty() || !non_critical.is_empty(),
        Strictness::Moderate => !critical.is_empty(),
        // Lenient only rejects when sanitization produced nothing usable
        Strictness::Lenient => clean.is_null(),
    };

    if rejected {
        let errors: Vec<String> = match options.strictness {
            Strictness::Lenient => vec!["input could not be salvaged".to_string()],
            Strictness::Strict => critical
                .iter()
                .chain(non_critical.iter())
                .map(|i| i.message.clone())
                .collect(),
            Strictness::Moderate => critical.iter().map(|i| i.message.clone()).collect(),
        };
        let warnings: Vec<String> = match options.strictness {
            Strictness::Moderate => non_critical.iter().map(|i| i.message.clone()).collect(),
            _ => Vec::new(),
        };
        monitor.record_validation_error(&options.context, &errors.join("; "));
        return ValidationOutcome {
            success: false,
            data: None,
            errors,
            warnings,
            sanitized,
            transformed: false,
        };
    }

    // In lenient mode every issue degrades to a warning; in moderate mode
    // only the non-critical ones survive to this point.
    let warnings: Vec<String> = critical
        .iter()
        .chain(non_critical.iter())
        .map(|i| i.message.clone())
        .collect();

    // Step 3: transform
    let mut data = clean;
    let transformed = options.transform && apply_transforms(&mut data);

    monitor.record_pattern_success(&options.context);
    ValidationOutcome {
        success: true,
        data: Some(data),
        errors: Vec::new(),
        warnings,
        sanitized,
        transformed,
    }
}

fn outcome_to_result(outcome: ValidationOutcome) -> Result<Value, ValidationError> {
    if outcome.success {
        outcome
            .data
            .ok_or_else(|| ValidationError("validation produced no data".to_string()))
    } else {
        Err(ValidationError(outcome.errors.join("; ")))
    }
}

/// Strict call style: validated data or an error
pub fn validate_input_strict(
    monitor: &ValidationMonitor,
    data: &Value,
    schema: &Schema,
) -> Result<Value, ValidationError> {
    let options = ValidateOptions {
        strictness: Strictness::Strict,
        ..Default::default()
    };
    outcome_to_result(validate_input(monitor, data, schema, &options))
}

/// Default (moderate) call style: validated data or an error
pub fn validate_input_moderate(
    monitor: &ValidationMonitor,
    data: &Value,
    schema: &Schema,
) -> Result<Value, ValidationError> {
    outcome_to_result(validate_input(monitor, data, schema, &ValidateOptions::default()))
}

/// Lenient call style: sanitized data even on shape failure
pub fn validate_input_lenient(
    monitor: &ValidationMonitor,
    data: &Value,
    schema: &Schema,
) -> Result<Value, ValidationError> {
    let options = ValidateOptions {
        strictness: Strictness::Lenient,
        ..Default::default()
    };
    outcome_to_result(validate_input(monitor, data, schema, &options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn email_schema() -> Schema {
        Schema::new().field(FieldRule::string("email").required().email())
    }

    #[test]
    fn test_strict_fails_on_any_violation() {
        let monitor = ValidationMonitor::new();
        let schema = Schema::new()
            .field(FieldRule::string("name").required())
            .field(FieldRule::string("note").min(5.0));

        // note too short is non-critical, strict still fails
        let outcome = validate_input(
            &monitor,
            &json!({"name": "Ada", "note": "hi"}),
            &schema,
            &ValidateOptions {
                strictness: Strictness::Strict,
                ..Default::default()
            },
        );
        assert!(!outcome.success);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(monitor.metrics().validation_errors, 1);
    }

    #[test]
    fn test_moderate_downgrades_non_critical() {
        let monitor = ValidationMonitor::new();
        let schema = Schema::new()
            .field(FieldRule::string("name").required())
            .field(FieldRule::string("note").min(5.0));

        let outcome = validate_input(
            &monitor,
            &json!({"name": "Ada", "note": "hi"}),
            &schema,
            &ValidateOptions::default(),
        );
        assert!(outcome.success);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(monitor.metrics().pattern_successes, 1);
    }

    #[test]
    fn test_moderate_fails_on_critical() {
        let monitor = ValidationMonitor::new();
        let schema = Schema::new().field(FieldRule::string("name").required());

        let outcome = validate_input(
            &monitor,
            &json!({}),
            &schema,
            &ValidateOptions::default(),
        );
        assert!(!outcome.success);
        assert_eq!(outcome.errors, vec!["name is required"]);
    }

    #[test]
    fn test_lenient_returns_sanitized_data_on_shape_failure() {
        let monitor = ValidationMonitor::new();
        let schema = Schema::new().field(FieldRule::string("name").required());

        let outcome = validate_input(
            &monitor,
            &json!({"note": "  hello  "}),
            &schema,
            &ValidateOptions {
                strictness: Strictness::Lenient,
                ..Default::default()
            },
        );
        assert!(outcome.success);
        assert_eq!(outcome.data.unwrap()["note"], "hello");
        assert_eq!(outcome.warnings, vec!["name is required"]);
    }

    #[test]
    fn test_lenient_email_scenario() {
        // {email: "  Foo@Bar.com  "} → success, lowercased, sanitized and
        // transformed both set
        let monitor = ValidationMonitor::new();
        let outcome = validate_input(
            &monitor,
            &json!({"email": "  Foo@Bar.com  "}),
            &email_schema(),
            &ValidateOptions {
                strictness: Strictness::Lenient,
                ..Default::default()
            },
        );
        assert!(outcome.success);
        assert_eq!(outcome.data.unwrap()["email"], "foo@bar.com");
        assert!(outcome.sanitized);
        assert!(outcome.transformed);
    }

    #[test]
    fn test_wrapper_joins_error_messages() {
        let monitor = ValidationMonitor::new();
        let schema = Schema::new()
            .field(FieldRule::string("name").required())
            .field(FieldRule::number("total").required());

        let err = validate_input_strict(&monitor, &json!({}), &schema).unwrap_err();
        assert_eq!(err.to_string(), "name is required; total must be a number");
    }

    #[test]
    fn test_wrapper_returns_data() {
        let monitor = ValidationMonitor::new();
        let value =
            validate_input_moderate(&monitor, &json!({"email": "a@b.co"}), &email_schema())
                .unwrap();
        assert_eq!(value["email"], "a@b.co");
    }

    #[test]
    fn test_sanitization_recorded_as_data_quality_issue() {
        let monitor = ValidationMonitor::new();
        let _ = validate_input(
            &monitor,
            &json!({"email": "  a@b.co  "}),
            &email_schema(),
            &ValidateOptions::default(),
        );
        assert_eq!(monitor.metrics().data_quality_issues, 1);
    }
}
