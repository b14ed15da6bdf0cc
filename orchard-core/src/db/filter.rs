//! Row filters
//!
//! A [`Filter`] is a small conjunction of column predicates that both
//! backends understand: the REST adapter renders it as query parameters,
//! the in-memory database evaluates it directly.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Clause {
    Eq(String, Value),
    In(String, Vec<Value>),
}

/// Conjunction of column predicates with an optional row limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub(crate) clauses: Vec<Clause>,
    pub(crate) limit: Option<usize>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `column == value`
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq(column.into(), value.into()));
        self
    }

    /// Require `column` to be one of `values`
    pub fn in_list(mut self, column: impl Into<String>, values: Vec<Value>) -> Self {
        self.clauses.push(Clause::In(column.into(), values));
        self
    }

    /// Cap the number of returned rows
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Evaluate the filter against a JSON row
    pub fn matches(&self, row: &Value) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq(column, value) => row.get(column) == Some(value),
            Clause::In(column, values) => row
                .get(column)
                .map(|v| values.contains(v))
                .unwrap_or(false),
        })
    }

    /// Render as PostgREST-style query pairs, e.g. `("id", "eq.ord-1")`
    pub(crate) fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .clauses
            .iter()
            .map(|clause| match clause {
                Clause::Eq(column, value) => (column.clone(), format!("eq.{}", render(value))),
                Clause::In(column, values) => {
                    let joined: Vec<String> = values.iter().map(render).collect();
                    (column.clone(), format!("in.({})", joined.join(",")))
                }
            })
            .collect();
        if let Some(n) = self.limit {
            pairs.push(("limit".to_string(), n.to_string()));
        }
        pairs
    }
}

/// Render a JSON scalar without surrounding quotes
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
