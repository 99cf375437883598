//! Raw request parameters as they arrive on the query string.
//!
//! Every field is an optional string so that extraction itself never fails;
//! all judgement happens in the validator. Integer fields are read leniently:
//! leading whitespace, an optional sign and the leading digit run, with
//! anything else reading as zero (`"27960abc"` → 27960, `"abc"` → 0).

use serde::{Deserialize, Serialize};

/// Shape A parameters (multi-protocol gateway).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MultiParams {
    pub game_type: Option<String>,
    pub ip: Option<String>,
    pub c_port: Option<String>,
    pub q_port: Option<String>,
    pub s_port: Option<String>,
}

/// Shape B parameters (single-library gateway).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SingleParams {
    pub lgsl_type: Option<String>,
    pub ip: Option<String>,
    pub c_port: Option<String>,
    pub q_port: Option<String>,
    pub s_port: Option<String>,
    pub request: Option<String>,
}

/// Parse the leading integer of `raw`, saturating on overflow.
pub fn lenient_int(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return 0;
    };
    let trimmed = raw.trim_start_matches([' ', '\t', '\n', '\r', '\x0B', '\x0C']);
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i64 = 0;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(digit - b'0');
        value = value.saturating_mul(10);
        value = if negative {
            value.saturating_sub(digit)
        } else {
            value.saturating_add(digit)
        };
    }
    value
}

/// A parameter counts as absent when missing, empty or a lone `"0"`.
pub fn is_absent(raw: Option<&str>) -> bool {
    matches!(raw, None | Some("") | Some("0"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_int() {
        assert_eq!(lenient_int(None), 0);
        assert_eq!(lenient_int(Some("")), 0);
        assert_eq!(lenient_int(Some("27960")), 27960);
        assert_eq!(lenient_int(Some("  27960")), 27960);
        assert_eq!(lenient_int(Some("27960abc")), 27960);
        assert_eq!(lenient_int(Some("abc27960")), 0);
        assert_eq!(lenient_int(Some("-5")), -5);
        assert_eq!(lenient_int(Some("+5")), 5);
        assert_eq!(lenient_int(Some("12.9")), 12);
        assert_eq!(lenient_int(Some("99999999999999999999999")), i64::MAX);
        assert_eq!(lenient_int(Some("-99999999999999999999999")), i64::MIN);
    }

    #[test]
    fn test_is_absent() {
        assert!(is_absent(None));
        assert!(is_absent(Some("")));
        assert!(is_absent(Some("0")));
        assert!(!is_absent(Some("00")));
        assert!(!is_absent(Some("quake3")));
    }

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let raw = r#"{"lgsl_type":"quake3","ip":"1.2.3.4","request":"sep"}"#;
        let params: SingleParams = serde_json::from_str(raw).unwrap();
        assert_eq!(params.lgsl_type.as_deref(), Some("quake3"));
        assert!(params.c_port.is_none());
    }
}
