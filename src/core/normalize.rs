//! Field-normalization adapter
//!
//! The ORM that produced our legacy exports drifted between snake_case and
//! camelCase over the years, so the same logical attribute can arrive under
//! more than one key. This module is the only place that alias knowledge
//! lives: records are read by a fixed priority order per field and always
//! written back under the single canonical spelling. Downstream code sees
//! exactly one attribute name per logical field.

use serde_json::{Map, Value};
use tracing::debug;

/// How a field's value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldShape {
    /// Pass the value through untouched
    Raw,
    /// Coerce to an integer count of seconds; 0 when absent or non-numeric
    Seconds,
    /// Genre set; accepts a JSON array or the legacy delimited string
    GenreList,
}

/// One logical attribute and every spelling it has been persisted under.
/// The first alias is the canonical one; the rest are read in order.
struct FieldSpec {
    aliases: &'static [&'static str],
    shape: FieldShape,
}

const ARTIST_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        aliases: &["id"],
        shape: FieldShape::Raw,
    },
    FieldSpec {
        // the stage name has lived under three spellings over time
        aliases: &["stage_name", "stageName", "name"],
        shape: FieldShape::Raw,
    },
    FieldSpec {
        aliases: &["owner_user_id", "ownerUserId"],
        shape: FieldShape::Raw,
    },
    FieldSpec {
        aliases: &["featured", "isFeatured"],
        shape: FieldShape::Raw,
    },
    FieldSpec {
        aliases: &["created_at", "createdAt"],
        shape: FieldShape::Raw,
    },
];

const SONG_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        aliases: &["id"],
        shape: FieldShape::Raw,
    },
    FieldSpec {
        aliases: &["title"],
        shape: FieldShape::Raw,
    },
    FieldSpec {
        aliases: &["artist_id", "artistId"],
        shape: FieldShape::Raw,
    },
    FieldSpec {
        aliases: &["featured", "isFeatured"],
        shape: FieldShape::Raw,
    },
    FieldSpec {
        aliases: &["status"],
        shape: FieldShape::Raw,
    },
    FieldSpec {
        aliases: &["duration_seconds", "durationSeconds", "duration"],
        shape: FieldShape::Seconds,
    },
    FieldSpec {
        aliases: &["genres", "genre"],
        shape: FieldShape::GenreList,
    },
    FieldSpec {
        aliases: &["created_at", "createdAt"],
        shape: FieldShape::Raw,
    },
];

/// Normalize an inbound artist record to canonical spellings
pub fn normalize_artist(raw: &Value) -> Value {
    normalize_record(ARTIST_FIELDS, raw)
}

/// Normalize an inbound song record to canonical spellings
pub fn normalize_song(raw: &Value) -> Value {
    normalize_record(SONG_FIELDS, raw)
}

fn normalize_record(fields: &[FieldSpec], raw: &Value) -> Value {
    let empty = Map::new();
    let raw = raw.as_object().unwrap_or(&empty);

    let mut out = Map::new();
    for spec in fields {
        let canonical = spec.aliases[0];
        let found = spec.aliases.iter().find_map(|alias| raw.get(*alias));

        match spec.shape {
            FieldShape::Raw => {
                if let Some(value) = found {
                    out.insert(canonical.to_string(), value.clone());
                }
            }
            FieldShape::Seconds => {
                out.insert(
                    canonical.to_string(),
                    Value::from(coerce_seconds(canonical, found)),
                );
            }
            FieldShape::GenreList => {
                if let Some(value) = found {
                    out.insert(canonical.to_string(), Value::from(parse_genre_list(value)));
                }
            }
        }
    }

    Value::Object(out)
}

/// Coerce a duration-like value to whole seconds.
///
/// Values arrive as numbers or as text; anything absent or non-numeric
/// becomes 0 (never null), with the substitution logged for diagnosis.
pub fn coerce_seconds(field: &str, value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i.max(0)
            } else if let Some(f) = n.as_f64() {
                f.max(0.0) as i64
            } else {
                debug!("substituting 0 for non-numeric {} = {}", field, n);
                0
            }
        }
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                i.max(0)
            } else if let Ok(f) = trimmed.parse::<f64>() {
                f.max(0.0) as i64
            } else {
                debug!("substituting 0 for non-numeric {} = '{}'", field, s);
                0
            }
        }
        Some(other) => {
            debug!("substituting 0 for non-numeric {} = {}", field, other);
            0
        }
        None => {
            debug!("substituting 0 for absent {}", field);
            0
        }
    }
}

/// Parse a genre set defensively.
///
/// The modern shape is a JSON array of names. Legacy exports carry a
/// delimited string with no documented separator or escaping, so every
/// separator seen in the wild is accepted. Duplicates are folded
/// case-insensitively, keeping the first casing seen.
pub fn parse_genre_list(value: &Value) -> Vec<String> {
    let candidates: Vec<String> = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
        Value::String(s) => s
            .split(|c| c == ';' || c == ',' || c == '/' || c == '|')
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for name in candidates {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_and_canonical_keys_normalize_identically() {
        let legacy = normalize_artist(&json!({"stage_name": "X"}));
        let canonical = normalize_artist(&json!({"stageName": "X"}));
        assert_eq!(legacy, canonical);
        assert_eq!(legacy["stage_name"], json!("X"));
        assert!(legacy.get("stageName").is_none());
    }

    #[test]
    fn test_read_priority_order_is_fixed() {
        // when both spellings are present the canonical one wins
        let both = normalize_artist(&json!({"stage_name": "A", "stageName": "B", "name": "C"}));
        assert_eq!(both["stage_name"], json!("A"));

        let fallback = normalize_artist(&json!({"stageName": "B", "name": "C"}));
        assert_eq!(fallback["stage_name"], json!("B"));
    }

    #[test]
    fn test_song_foreign_key_aliases() {
        let snake = normalize_song(&json!({"title": "T", "artist_id": 5}));
        let camel = normalize_song(&json!({"title": "T", "artistId": 5}));
        assert_eq!(snake["artist_id"], camel["artist_id"]);
    }

    #[test]
    fn test_duration_coercion() {
        assert_eq!(coerce_seconds("d", Some(&json!(215))), 215);
        assert_eq!(coerce_seconds("d", Some(&json!("215"))), 215);
        assert_eq!(coerce_seconds("d", Some(&json!(" 180.9 "))), 180);
        assert_eq!(coerce_seconds("d", Some(&json!("three minutes"))), 0);
        assert_eq!(coerce_seconds("d", Some(&json!(null))), 0);
        assert_eq!(coerce_seconds("d", None), 0);
        assert_eq!(coerce_seconds("d", Some(&json!(-5))), 0);
    }

    #[test]
    fn test_song_duration_always_present_after_normalize() {
        let song = normalize_song(&json!({"title": "T", "artistId": 1}));
        // 0, never null or missing
        assert_eq!(song["duration_seconds"], json!(0));
    }

    #[test]
    fn test_genre_list_from_legacy_string() {
        let parsed = parse_genre_list(&json!("Cumbia; rock/Indie,, cumbia"));
        assert_eq!(parsed, vec!["Cumbia", "rock", "Indie"]);
    }

    #[test]
    fn test_genre_list_from_array() {
        let parsed = parse_genre_list(&json!(["Jazz", " jazz ", "Soul"]));
        assert_eq!(parsed, vec!["Jazz", "Soul"]);
    }
}
