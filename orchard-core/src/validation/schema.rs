//! Declarative shape rules for dynamic JSON rows
//!
//! A [`Schema`] is a list of [`FieldRule`]s applied to a JSON object.
//! Violations come back as structured [`Issue`]s with a field path and a
//! user-facing message; per-field custom messages override the generated
//! phrasing.
//!
//! Criticality drives the moderate-strictness policy: a missing required
//! field or a wrong primitive type is critical, range/format/enum issues
//! are not, and any issue on a security-flagged field is critical.

use serde_json::Value;

/// Issue classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    Missing,
    WrongType,
    TooSmall,
    TooBig,
    BadFormat,
    EnumMismatch,
}

/// One shape violation
#[derive(Debug, Clone)]
pub struct Issue {
    /// Field path, e.g. `items[2].quantity`
    pub path: String,
    pub kind: IssueKind,
    /// User-facing message
    pub message: String,
    /// Critical issues fail moderate validation; non-critical ones degrade
    /// to warnings
    pub critical: bool,
}

/// Value shape for a field
#[derive(Debug, Clone)]
pub enum FieldKind {
    String {
        min_len: Option<usize>,
        max_len: Option<usize>,
        email: bool,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    Integer {
        min: Option<i64>,
        max: Option<i64>,
    },
    Bool,
    Enum(Vec<String>),
    Object(Schema),
    Array(Box<FieldKind>),
}

impl FieldKind {
    fn type_name(&self) -> &'static str {
        match self {
            FieldKind::String { .. } => "string",
            FieldKind::Number { .. } => "number",
            FieldKind::Integer { .. } => "integer",
            FieldKind::Bool => "boolean",
            FieldKind::Enum(_) => "string",
            FieldKind::Object(_) => "object",
            FieldKind::Array(_) => "array",
        }
    }
}

/// One field's rule within a schema
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: String,
    kind: FieldKind,
    required: bool,
    security: bool,
    message: Option<String>,
}

impl FieldRule {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            security: false,
            message: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::String { min_len: None, max_len: None, email: false },
        )
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number { min: None, max: None })
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer { min: None, max: None })
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub fn one_of(name: impl Into<String>, options: &[&str]) -> Self {
        Self::new(
            name,
            FieldKind::Enum(options.iter().map(|s| s.to_string()).collect()),
        )
    }

    pub fn object(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, FieldKind::Object(schema))
    }

    pub fn array_of(name: impl Into<String>, element: FieldKind) -> Self {
        Self::new(name, FieldKind::Array(Box::new(element)))
    }

    /// Field must be present and non-null
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Any issue on this field is treated as critical
    pub fn security(mut self) -> Self {
        self.security = true;
        self
    }

    /// Override the generated message for every issue on this field
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Minimum: string length, or numeric lower bound
    pub fn min(mut self, value: f64) -> Self {
        match &mut self.kind {
            FieldKind::String { min_len, .. } => *min_len = Some(value as usize),
            FieldKind::Number { min, .. } => *min = Some(value),
            FieldKind::Integer { min, .. } => *min = Some(value as i64),
            _ => {}
        }
        self
    }

    /// Maximum: string length, or numeric upper bound
    pub fn max(mut self, value: f64) -> Self {
        match &mut self.kind {
            FieldKind::String { max_len, .. } => *max_len = Some(value as usize),
            FieldKind::Number { max, .. } => *max = Some(value),
            FieldKind::Integer { max, .. } => *max = Some(value as i64),
            _ => {}
        }
        self
    }

    /// String must look like an email address
    pub fn email(mut self) -> Self {
        if let FieldKind::String { email, .. } = &mut self.kind {
            *email = true;
        }
        self
    }
}

/// Declarative shape rule for a JSON object
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldRule>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    /// Validate a JSON value, returning every violation found
    pub fn validate(&self, value: &Value) -> Vec<Issue> {
        let mut issues = Vec::new();
        self.validate_at(value, "", &mut issues);
        issues
    }

    fn validate_at(&self, value: &Value, prefix: &str, issues: &mut Vec<Issue>) {
        let Some(obj) = value.as_object() else {
            let path = if prefix.is_empty() { "value" } else { prefix };
            issues.push(Issue {
                path: path.to_string(),
                kind: IssueKind::WrongType,
                message: format!("{} must be an object", path),
                critical: true,
            });
            return;
        };

        for rule in &self.fields {
            let path = join_path(prefix, &rule.name);
            match obj.get(&rule.name) {
                None | Some(Value::Null) => {
                    if rule.required {
                        push_issue(issues, rule, &path, IssueKind::Missing, || {
                            format!("{} is required", path)
                        });
                    }
                }
                Some(value) => check_value(&rule.kind, value, &path, rule, issues),
            }
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Push an issue, honoring the rule's custom message and security flag
fn push_issue(
    issues: &mut Vec<Issue>,
    rule: &FieldRule,
    path: &str,
    kind: IssueKind,
    default_message: impl FnOnce() -> String,
) {
    let message = rule.message.clone().unwrap_or_else(default_message);
    let critical =
        rule.security || matches!(kind, IssueKind::Missing | IssueKind::WrongType);
    issues.push(Issue {
        path: path.to_string(),
        kind,
        message,
        critical,
    });
}

fn check_value(kind: &FieldKind, value: &Value, path: &str, rule: &FieldRule, issues: &mut Vec<Issue>) {
    match kind {
        FieldKind::String { min_len, max_len, email } => {
            let Some(s) = value.as_str() else {
                return push_issue(issues, rule, path, IssueKind::WrongType, || {
                    format!("{} must be a string", path)
                });
            };
            if let Some(min) = min_len {
                if s.chars().count() < *min {
                    push_issue(issues, rule, path, IssueKind::TooSmall, || {
                        format!("{} is too short (minimum {} characters)", path, min)
                    });
                }
            }
            if let Some(max) = max_len {
                if s.chars().count() > *max {
                    push_issue(issues, rule, path, IssueKind::TooBig, || {
                        format!("{} is too long (maximum {} characters)", path, max)
                    });
                }
            }
            if *email && !looks_like_email(s) {
                push_issue(issues, rule, path, IssueKind::BadFormat, || {
                    format!("{} is not a valid email address", path)
                });
            }
        }
        FieldKind::Number { min, max } => {
            let Some(n) = value.as_f64() else {
                return push_issue(issues, rule, path, IssueKind::WrongType, || {
                    format!("{} must be a number", path)
                });
            };
            if let Some(min) = min {
                if n < *min {
                    push_issue(issues, rule, path, IssueKind::TooSmall, || {
                        format!("{} is too small (minimum {})", path, min)
                    });
                }
            }
            if let Some(max) = max {
                if n > *max {
                    push_issue(issues, rule, path, IssueKind::TooBig, || {
                        format!("{} is too large (maximum {})", path, max)
                    });
                }
            }
        }
        FieldKind::Integer { min, max } => {
            let Some(n) = value.as_i64() else {
                return push_issue(issues, rule, path, IssueKind::WrongType, || {
                    format!("{} must be an integer", path)
                });
            };
            if let Some(min) = min {
                if n < *min {
                    push_issue(issues, rule, path, IssueKind::TooSmall, || {
                        format!("{} is too small (minimum {})", path, min)
                    });
                }
            }
            if let Some(max) = max {
                if n > *max {
                    push_issue(issues, rule, path, IssueKind::TooBig, || {
                        format!("{} is too large (maximum {})", path, max)
                    });
                }
            }
        }
        FieldKind::Bool => {
            if !value.is_boolean() {
                push_issue(issues, rule, path, IssueKind::WrongType, || {
                    format!("{} must be a boolean", path)
                });
            }
        }
        FieldKind::Enum(options) => {
            let Some(s) = value.as_str() else {
                return push_issue(issues, rule, path, IssueKind::WrongType, || {
                    format!("{} must be a string", path)
                });
            };
            if !options.iter().any(|o| o == s) {
                push_issue(issues, rule, path, IssueKind::EnumMismatch, || {
                    format!("{} must be one of: {}", path, options.join(", "))
                });
            }
        }
        FieldKind::Object(schema) => {
            if value.is_object() {
                schema.validate_at(value, path, issues);
            } else {
                push_issue(issues, rule, path, IssueKind::WrongType, || {
                    format!("{} must be an object", path)
                });
            }
        }
        FieldKind::Array(element) => {
            let Some(items) = value.as_array() else {
                return push_issue(issues, rule, path, IssueKind::WrongType, || {
                    format!("{} must be an array", path)
                });
            };
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, i);
                check_value(element, item, &item_path, rule, issues);
            }
        }
    }
}

/// Minimal email shape check: non-empty local part, domain with a dot
fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !s.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kinds(issues: &[Issue]) -> Vec<IssueKind> {
        issues.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_required_missing_is_critical() {
        let schema = Schema::new().field(FieldRule::string("name").required());
        let issues = schema.validate(&json!({}));
        assert_eq!(kinds(&issues), vec![IssueKind::Missing]);
        assert!(issues[0].critical);
        assert_eq!(issues[0].message, "name is required");
    }

    #[test]
    fn test_null_counts_as_missing() {
        let schema = Schema::new().field(FieldRule::string("name").required());
        let issues = schema.validate(&json!({"name": null}));
        assert_eq!(kinds(&issues), vec![IssueKind::Missing]);
    }

    #[test]
    fn test_optional_field_may_be_absent() {
        let schema = Schema::new().field(FieldRule::string("note"));
        assert!(schema.validate(&json!({})).is_empty());
    }

    #[test]
    fn test_wrong_type_is_critical() {
        let schema = Schema::new().field(FieldRule::number("total").required());
        let issues = schema.validate(&json!({"total": "lots"}));
        assert_eq!(kinds(&issues), vec![IssueKind::WrongType]);
        assert!(issues[0].critical);
        assert_eq!(issues[0].message, "total must be a number");
    }

    #[test]
    fn test_range_issues_are_not_critical() {
        let schema = Schema::new()
            .field(FieldRule::integer("quantity").required().min(1.0).max(99.0));

        let issues = schema.validate(&json!({"quantity": 0}));
        assert_eq!(kinds(&issues), vec![IssueKind::TooSmall]);
        assert!(!issues[0].critical);

        let issues = schema.validate(&json!({"quantity": 100}));
        assert_eq!(kinds(&issues), vec![IssueKind::TooBig]);
    }

    #[test]
    fn test_security_flag_escalates() {
        let schema = Schema::new().field(FieldRule::string("role").security().min(1.0));
        let issues = schema.validate(&json!({"role": ""}));
        assert!(issues[0].critical);
    }

    #[test]
    fn test_email_format() {
        let schema = Schema::new().field(FieldRule::string("email").required().email());
        assert!(schema.validate(&json!({"email": "ada@example.com"})).is_empty());
        assert!(schema.validate(&json!({"email": "Foo@Bar.com"})).is_empty());

        let issues = schema.validate(&json!({"email": "not-an-email"}));
        assert_eq!(kinds(&issues), vec![IssueKind::BadFormat]);
        assert_eq!(issues[0].message, "email is not a valid email address");
    }

    #[test]
    fn test_enum_mismatch() {
        let schema =
            Schema::new().field(FieldRule::one_of("status", &["pending", "ready"]).required());
        let issues = schema.validate(&json!({"status": "exploded"}));
        assert_eq!(kinds(&issues), vec![IssueKind::EnumMismatch]);
        assert_eq!(issues[0].message, "status must be one of: pending, ready");
    }

    #[test]
    fn test_nested_array_paths() {
        let item = Schema::new()
            .field(FieldRule::string("product_id").required())
            .field(FieldRule::integer("quantity").required().min(1.0));
        let schema = Schema::new().field(
            FieldRule::array_of("items", FieldKind::Object(item)).required(),
        );

        let issues = schema.validate(&json!({
            "items": [
                {"product_id": "p1", "quantity": 2},
                {"quantity": 0},
            ]
        }));

        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert!(paths.contains(&"items[1].product_id"));
        assert!(paths.contains(&"items[1].quantity"));
    }

    #[test]
    fn test_custom_message_overrides() {
        let schema = Schema::new().field(
            FieldRule::string("customer_name")
                .required()
                .message("please tell us your name"),
        );
        let issues = schema.validate(&json!({}));
        assert_eq!(issues[0].message, "please tell us your name");
    }

    #[test]
    fn test_non_object_input() {
        let schema = Schema::new().field(FieldRule::string("name").required());
        let issues = schema.validate(&json!([1, 2, 3]));
        assert_eq!(kinds(&issues), vec![IssueKind::WrongType]);
        assert!(issues[0].critical);
    }
}
