//! Case-tolerant member lookup on decoded JSON objects.

use serde_json::{Map, Value};

use crate::DecodeError;

/// Finds `canonical` in `object`, trying the lower-case name first, then the
/// capitalised variant, then any key equal to it ignoring ASCII case.
pub(crate) fn lookup<'a>(object: &'a Map<String, Value>, canonical: &str) -> Option<&'a Value> {
    object
        .get(canonical)
        .or_else(|| object.get(&capitalise(canonical)))
        .or_else(|| {
            object
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(canonical))
                .map(|(_, value)| value)
        })
}

/// Reads an optional string member; `null` counts as absent.
pub(crate) fn optional_string(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, DecodeError> {
    match lookup(object, field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(other) => Err(DecodeError::InvalidField {
            field,
            expected: "string",
            found: json_kind(other),
        }),
    }
}

pub(crate) fn parse_object(line: &[u8]) -> Result<Map<String, Value>, DecodeError> {
    let text = std::str::from_utf8(strip_bom(line))?.trim();
    if text.is_empty() {
        return Err(DecodeError::Empty);
    }
    match serde_json::from_str::<Value>(text)? {
        Value::Object(object) => Ok(object),
        other => Err(DecodeError::NotAnObject {
            found: json_kind(&other),
        }),
    }
}

pub(crate) fn strip_bom(line: &[u8]) -> &[u8] {
    line.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(line)
}

pub(crate) const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn capitalise(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test value must be an object"),
        }
    }

    #[rstest]
    #[case(json!({"result": 1}), 1)]
    #[case(json!({"Result": 2}), 2)]
    #[case(json!({"RESULT": 3}), 3)]
    fn lookup_accepts_case_variants(#[case] value: Value, #[case] expected: i64) {
        let map = object(value);
        assert_eq!(lookup(&map, "result"), Some(&json!(expected)));
    }

    #[test]
    fn lookup_prefers_canonical_then_capitalised() {
        let map = object(json!({"RESULT": "upper", "Result": "pascal", "result": "lower"}));
        assert_eq!(lookup(&map, "result"), Some(&json!("lower")));

        let without_lower = object(json!({"RESULT": "upper", "Result": "pascal"}));
        assert_eq!(lookup(&without_lower, "result"), Some(&json!("pascal")));
    }

    #[test]
    fn parse_object_skips_byte_order_mark() {
        let map = parse_object(b"\xEF\xBB\xBF{\"id\":\"a\"}").expect("parse with bom");
        assert_eq!(map.get("id"), Some(&json!("a")));
    }

    #[rstest]
    #[case(b"[1,2]".as_slice(), "array")]
    #[case(b"\"text\"".as_slice(), "string")]
    #[case(b"null".as_slice(), "null")]
    fn parse_object_rejects_non_objects(#[case] line: &[u8], #[case] kind: &str) {
        let error = parse_object(line).expect_err("non-object should fail");
        assert!(matches!(error, DecodeError::NotAnObject { found } if found == kind));
    }
}
