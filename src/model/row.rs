//! Row records displayed by the windowed table
//!
//! A row is an opaque bag of named fields. The table never interprets it;
//! columns pull cells out of it by key.

use serde_json::{Map, Value};

/// A single record from the dataset
pub type Row = Map<String, Value>;

/// Render a JSON value the way a table cell shows it
///
/// Strings are shown without quotes and null renders as an empty cell.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Look up a field by key and render it, empty when missing
pub fn field_text(row: &Row, key: &str) -> String {
    row.get(key).map(display_value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_field_text_strings_are_unquoted() {
        let r = row(json!({"text": "book a table", "intent": "reserve"}));
        assert_eq!(field_text(&r, "text"), "book a table");
        assert_eq!(field_text(&r, "intent"), "reserve");
    }

    #[test]
    fn test_field_text_missing_and_null() {
        let r = row(json!({"confidence": null}));
        assert_eq!(field_text(&r, "confidence"), "");
        assert_eq!(field_text(&r, "nope"), "");
    }

    #[test]
    fn test_field_text_non_string_values() {
        let r = row(json!({"confidence": 0.93, "validated": true, "entities": ["city"]}));
        assert_eq!(field_text(&r, "confidence"), "0.93");
        assert_eq!(field_text(&r, "validated"), "true");
        assert_eq!(field_text(&r, "entities"), "[\"city\"]");
    }
}
