//! Tagged value schema shared by every protocol backend.
//!
//! # Design Decisions
//! - One tree shape for all backends, so normalizer and encoder never
//!   inspect protocol-specific structures
//! - Maps are `BTreeMap` so iteration (and therefore encoding) order is
//!   deterministic
//! - Serializes untagged: a `Text` is a JSON string, a `Map` a JSON object

use std::collections::BTreeMap;

use serde::Serialize;

/// Result of a single successful live query.
pub type QueryResult = BTreeMap<String, QueryValue>;

/// A single value in a query result tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<QueryValue>),
    Map(QueryResult),
}

impl QueryValue {
    /// Borrow the text content, if this is a `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            QueryValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            QueryValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[QueryValue]> {
        match self {
            QueryValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&QueryResult> {
        match self {
            QueryValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        QueryValue::Text(s)
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        QueryValue::Text(s.to_string())
    }
}

impl From<i64> for QueryValue {
    fn from(n: i64) -> Self {
        QueryValue::Int(n)
    }
}

impl From<u32> for QueryValue {
    fn from(n: u32) -> Self {
        QueryValue::Int(i64::from(n))
    }
}

impl From<u8> for QueryValue {
    fn from(n: u8) -> Self {
        QueryValue::Int(i64::from(n))
    }
}

impl From<f64> for QueryValue {
    fn from(n: f64) -> Self {
        QueryValue::Float(n)
    }
}

impl From<bool> for QueryValue {
    fn from(b: bool) -> Self {
        QueryValue::Bool(b)
    }
}

impl From<Vec<QueryValue>> for QueryValue {
    fn from(items: Vec<QueryValue>) -> Self {
        QueryValue::List(items)
    }
}

impl From<QueryResult> for QueryValue {
    fn from(map: QueryResult) -> Self {
        QueryValue::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape_is_untagged() {
        let mut player = QueryResult::new();
        player.insert("name".into(), "Sarge".into());
        player.insert("score".into(), QueryValue::Int(12));

        let mut result = QueryResult::new();
        result.insert("hostname".into(), "Arena".into());
        result.insert("players".into(), vec![QueryValue::Map(player)].into());

        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"hostname":"Arena","players":[{"name":"Sarge","score":12}]}"#
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(QueryValue::from("x").as_text(), Some("x"));
        assert_eq!(QueryValue::from(7i64).as_int(), Some(7));
        assert!(QueryValue::from(true).as_text().is_none());
    }
}
