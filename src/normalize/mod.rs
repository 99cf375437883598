//! Result normalization for the multi-protocol feed.
//!
//! # Responsibilities
//! - Strip control characters from every key and string
//! - Coerce numeric-looking strings to numbers
//! - Fill canonical `gq_*` fields from protocol-specific synonyms
//!
//! # Design Decisions
//! - Raw keys are kept; canonical keys are added next to them
//! - Deterministic and idempotent: normalize(normalize(x)) == normalize(x)
//! - `gq_numplayers` falls back to the length of the `players` list

pub mod fields;

use std::sync::LazyLock;

use regex::Regex;

use crate::protocol::{QueryResult, QueryValue};
use fields::{FieldRule, PLAYER_FIELDS, SERVER_FIELDS};

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").unwrap());

/// Applies a field-mapping filter to raw results.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    server: &'static [FieldRule],
    player: &'static [FieldRule],
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            server: SERVER_FIELDS,
            player: PLAYER_FIELDS,
        }
    }
}

impl Normalizer {
    /// Produce the canonical form of `raw`.
    pub fn normalize(&self, raw: &QueryResult) -> QueryResult {
        let mut out = clean_map(raw);
        apply_rules(&mut out, self.server);

        if !out.contains_key("gq_numplayers") {
            let count = out.get("players").and_then(QueryValue::as_list).map(<[_]>::len);
            if let Some(count) = count {
                out.insert("gq_numplayers".to_string(), QueryValue::Int(count as i64));
            }
        }

        if let Some(QueryValue::List(players)) = out.get_mut("players") {
            for player in players.iter_mut() {
                if let QueryValue::Map(player) = player {
                    apply_rules(player, self.player);
                }
            }
        }
        out
    }
}

fn apply_rules(map: &mut QueryResult, rules: &[FieldRule]) {
    for rule in rules {
        let value = rule
            .synonyms
            .iter()
            .find_map(|key| map.get(*key))
            .cloned();
        if let Some(value) = value {
            map.insert(rule.canonical.to_string(), value);
        }
    }
}

fn clean_map(map: &QueryResult) -> QueryResult {
    map.iter()
        .map(|(key, value)| (strip_control(key), clean_value(value)))
        .collect()
}

fn clean_value(value: &QueryValue) -> QueryValue {
    match value {
        QueryValue::Text(s) => coerce(strip_control(s)),
        QueryValue::List(items) => QueryValue::List(items.iter().map(clean_value).collect()),
        QueryValue::Map(map) => QueryValue::Map(clean_map(map)),
        other => other.clone(),
    }
}

fn strip_control(s: &str) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}

/// Turn `"42"` into 42 and `"1.5"` into 1.5; anything else stays text.
fn coerce(s: String) -> QueryValue {
    if !NUMERIC.is_match(&s) {
        return QueryValue::Text(s);
    }
    if !s.contains('.') {
        return match s.parse::<i64>() {
            Ok(n) => QueryValue::Int(n),
            Err(_) => QueryValue::Text(s),
        };
    }
    match s.parse::<f64>() {
        Ok(n) if n.is_finite() => QueryValue::Float(n),
        _ => QueryValue::Text(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::php;

    fn raw() -> QueryResult {
        let mut players = Vec::new();
        for (name, score) in [("Sarge\x07", "12"), ("Doom", "-3")] {
            let mut player = QueryResult::new();
            player.insert("name".into(), name.into());
            player.insert("frags".into(), score.into());
            players.push(QueryValue::Map(player));
        }

        let mut raw = QueryResult::new();
        raw.insert("sv_hostname".into(), "^1Test\tArena\n".into());
        raw.insert("mapname".into(), "q3dm17".into());
        raw.insert("sv_maxclients".into(), "16".into());
        raw.insert("g_needpass".into(), "0".into());
        raw.insert("fps\x01".into(), "12.50".into());
        raw.insert("version".into(), "1.32b".into());
        raw.insert("players".into(), QueryValue::List(players));
        raw
    }

    #[test]
    fn test_canonical_fields() {
        let out = Normalizer::default().normalize(&raw());
        assert_eq!(out["gq_hostname"], QueryValue::from("^1TestArena"));
        assert_eq!(out["gq_mapname"], QueryValue::from("q3dm17"));
        assert_eq!(out["gq_maxplayers"], QueryValue::Int(16));
        assert_eq!(out["gq_password"], QueryValue::Int(0));
        assert_eq!(out["gq_numplayers"], QueryValue::Int(2));
        assert_eq!(out["fps"], QueryValue::Float(12.5));
        assert_eq!(out["version"], QueryValue::from("1.32b"));
        // Raw keys survive next to canonical ones.
        assert_eq!(out["sv_maxclients"], QueryValue::Int(16));
        assert!(!out.contains_key("gq_gametype"));
    }

    #[test]
    fn test_player_fields() {
        let out = Normalizer::default().normalize(&raw());
        let players = out["players"].as_list().unwrap();
        let first = players[0].as_map().unwrap();
        assert_eq!(first["gq_name"], QueryValue::from("Sarge"));
        assert_eq!(first["gq_score"], QueryValue::Int(12));
        let second = players[1].as_map().unwrap();
        assert_eq!(second["gq_score"], QueryValue::Int(-3));
    }

    #[test]
    fn test_idempotent() {
        let normalizer = Normalizer::default();
        let once = normalizer.normalize(&raw());
        let twice = normalizer.normalize(&once);
        assert_eq!(once, twice);
        assert_eq!(php::to_string(&once), php::to_string(&twice));
        assert_eq!(
            serde_json::to_string(&once).unwrap(),
            serde_json::to_string(&twice).unwrap()
        );
    }

    #[test]
    fn test_explicit_count_wins_over_list_length() {
        let mut raw = raw();
        raw.insert("numplayers".into(), "5".into());
        let out = Normalizer::default().normalize(&raw);
        assert_eq!(out["gq_numplayers"], QueryValue::Int(5));
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce("007".into()), QueryValue::Int(7));
        assert_eq!(coerce("-0".into()), QueryValue::Int(0));
        assert_eq!(coerce("1.0".into()), QueryValue::Float(1.0));
        assert_eq!(coerce("1e5".into()), QueryValue::from("1e5"));
        assert_eq!(coerce("1.".into()), QueryValue::from("1."));
        assert_eq!(coerce("".into()), QueryValue::from(""));
        assert_eq!(
            coerce("99999999999999999999".into()),
            QueryValue::from("99999999999999999999")
        );
    }
}
