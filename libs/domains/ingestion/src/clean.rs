//! NUL-byte scrubbing.
//!
//! PostgreSQL rejects `\u{0}` inside text and jsonb values, and clients do
//! occasionally ship them (binary prompt fragments, broken encodings), so
//! every string leaf is scrubbed before validation and persistence.

use serde_json::Value;

/// Strip NUL bytes from every string leaf of a JSON value, recursively.
/// Keys are scrubbed too. Idempotent.
pub fn clean_json(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(strip_nul(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(clean_json).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (strip_nul(&k), clean_json(v)))
                .collect(),
        ),
        other => other,
    }
}

fn strip_nul(s: &str) -> String {
    if s.contains('\u{0}') {
        s.replace('\u{0}', "")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_nul_from_string_leaves() {
        let cleaned = clean_json(json!({ "text": "hi\u{0}there" }));
        assert_eq!(cleaned, json!({ "text": "hithere" }));
    }

    #[test]
    fn recurses_into_arrays_and_objects() {
        let cleaned = clean_json(json!({
            "nested": { "list": ["a\u{0}", { "deep": "\u{0}b\u{0}" }] },
            "count": 3,
        }));

        assert_eq!(
            cleaned,
            json!({
                "nested": { "list": ["a", { "deep": "b" }] },
                "count": 3,
            })
        );
    }

    #[test]
    fn scrubs_object_keys() {
        let cleaned = clean_json(json!({ "bad\u{0}key": 1 }));
        assert_eq!(cleaned, json!({ "badkey": 1 }));
    }

    #[test]
    fn untouched_values_pass_through() {
        let original = json!({ "text": "clean", "n": 1.5, "flag": true, "nothing": null });
        assert_eq!(clean_json(original.clone()), original);
    }

    #[test]
    fn cleaning_is_idempotent() {
        let original = json!({ "text": "a\u{0}b", "list": ["\u{0}"] });
        let once = clean_json(original);
        let twice = clean_json(once.clone());
        assert_eq!(once, twice);
    }
}
