//! Builder for the transfer service's textual query expressions
//!
//! The service accepts predicates of the form
//! `Kind where a=1 and (b="x" or c=true)`. Keeping the rendering in one
//! place means the repository methods never concatenate raw strings.

use std::fmt;

/// A literal value in a predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Embedded quotes are stripped; the grammar has no escape syntax.
            Self::Str(s) => write!(f, "\"{}\"", s.replace('"', "")),
            Self::Int(i) => write!(f, "{}", i),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// A predicate expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Eq(String, Value),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::Eq(field.to_string(), value.into())
    }

    pub fn and(exprs: Vec<Expr>) -> Self {
        Self::And(exprs)
    }

    pub fn or(exprs: Vec<Expr>) -> Self {
        Self::Or(exprs)
    }

    fn render(&self, nested: bool) -> String {
        match self {
            Self::Eq(field, value) => format!("{}={}", field, value),
            Self::And(exprs) => group(exprs, " and ", nested),
            Self::Or(exprs) => group(exprs, " or ", nested),
        }
    }
}

fn group(exprs: &[Expr], sep: &str, nested: bool) -> String {
    let body = exprs
        .iter()
        .map(|e| e.render(true))
        .collect::<Vec<_>>()
        .join(sep);
    if nested && exprs.len() > 1 {
        format!("({})", body)
    } else {
        body
    }
}

/// Render a full `Kind where <expr>` query string
pub fn query(kind: &str, expr: &Expr) -> String {
    format!("{} where {}", kind, expr.render(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_simple_equality() {
        let q = query("User", &Expr::eq("code", "alice@acme.com"));
        assert_eq!(q, "User where code=\"alice@acme.com\"");
    }

    #[test]
    fn renders_nested_disjunction() {
        let q = query(
            "Client",
            &Expr::and(vec![
                Expr::or(vec![Expr::eq("type", 0), Expr::eq("type", 2)]),
                Expr::eq("user", "u123"),
            ]),
        );
        assert_eq!(q, "Client where (type=0 or type=2) and user=\"u123\"");
    }

    #[test]
    fn renders_boolean_literal() {
        let q = query("Share", &Expr::eq("default", true));
        assert_eq!(q, "Share where default=true");
    }

    #[test]
    fn strips_embedded_quotes() {
        let q = query("Job", &Expr::eq("code", "a\"b"));
        assert_eq!(q, "Job where code=\"ab\"");
    }
}
