//! PHP `serialize()` rendering of a query result.
//!
//! ```text
//! string  s:<byte length>:"<bytes>";
//! int     i:<n>;
//! float   d:<n>;          (INF, -INF, NAN for non-finite values)
//! bool    b:1; / b:0;
//! list    a:<len>:{i:0;<value>i:1;<value>...}
//! map     a:<len>:{<key><value>...}
//! ```
//!
//! Map keys that are canonical decimal integers are written as integer
//! keys, the way a PHP array stores them.

use std::fmt::Write;

use crate::protocol::{QueryResult, QueryValue};

/// Serialize a result as a PHP array.
pub fn to_string(result: &QueryResult) -> String {
    let mut out = String::new();
    write_map(&mut out, result);
    out
}

fn write_value(out: &mut String, value: &QueryValue) {
    match value {
        QueryValue::Text(s) => write_str(out, s),
        QueryValue::Int(n) => {
            let _ = write!(out, "i:{n};");
        }
        QueryValue::Float(n) => write_float(out, *n),
        QueryValue::Bool(b) => out.push_str(if *b { "b:1;" } else { "b:0;" }),
        QueryValue::List(items) => {
            let _ = write!(out, "a:{}:{{", items.len());
            for (i, item) in items.iter().enumerate() {
                let _ = write!(out, "i:{i};");
                write_value(out, item);
            }
            out.push('}');
        }
        QueryValue::Map(map) => write_map(out, map),
    }
}

fn write_map(out: &mut String, map: &QueryResult) {
    let _ = write!(out, "a:{}:{{", map.len());
    for (key, value) in map {
        match integer_key(key) {
            Some(n) => {
                let _ = write!(out, "i:{n};");
            }
            None => write_str(out, key),
        }
        write_value(out, value);
    }
    out.push('}');
}

fn write_str(out: &mut String, s: &str) {
    let _ = write!(out, "s:{}:\"{}\";", s.len(), s);
}

fn write_float(out: &mut String, n: f64) {
    if n.is_nan() {
        out.push_str("d:NAN;");
    } else if n.is_infinite() {
        out.push_str(if n > 0.0 { "d:INF;" } else { "d:-INF;" });
    } else {
        let _ = write!(out, "d:{n};");
    }
}

/// `"12"` → 12, but `"012"`, `"+1"`, `"-0"` and `"1.0"` stay strings.
fn integer_key(key: &str) -> Option<i64> {
    let digits = key.strip_prefix('-').unwrap_or(key);
    let canonical = match digits.as_bytes() {
        [b'0'] => digits.len() == key.len(),
        [b'1'..=b'9', rest @ ..] => rest.iter().all(u8::is_ascii_digit),
        _ => false,
    };
    if canonical {
        key.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        let mut result = QueryResult::new();
        result.insert("a".into(), QueryValue::Bool(true));
        result.insert("b".into(), QueryValue::Int(-3));
        result.insert("c".into(), QueryValue::Float(1.5));
        result.insert("d".into(), QueryValue::Float(100.0));
        result.insert("e".into(), "héllo".into());
        assert_eq!(
            to_string(&result),
            r#"a:5:{s:1:"a";b:1;s:1:"b";i:-3;s:1:"c";d:1.5;s:1:"d";d:100;s:1:"e";s:6:"héllo";}"#
        );
    }

    #[test]
    fn test_nested_list() {
        let mut player = QueryResult::new();
        player.insert("name".into(), "Sarge".into());
        let mut result = QueryResult::new();
        result.insert("players".into(), QueryValue::List(vec![QueryValue::Map(player)]));
        assert_eq!(
            to_string(&result),
            r#"a:1:{s:7:"players";a:1:{i:0;a:1:{s:4:"name";s:5:"Sarge";}}}"#
        );
    }

    #[test]
    fn test_non_finite_floats() {
        let mut result = QueryResult::new();
        result.insert("x".into(), QueryValue::Float(f64::NEG_INFINITY));
        assert_eq!(to_string(&result), r#"a:1:{s:1:"x";d:-INF;}"#);
    }

    #[test]
    fn test_integer_keys() {
        assert_eq!(integer_key("12"), Some(12));
        assert_eq!(integer_key("-7"), Some(-7));
        assert_eq!(integer_key("0"), Some(0));
        assert_eq!(integer_key("-0"), None);
        assert_eq!(integer_key("012"), None);
        assert_eq!(integer_key("1.0"), None);
        assert_eq!(integer_key("99999999999999999999"), None);
        assert_eq!(integer_key("name"), None);
    }
}
