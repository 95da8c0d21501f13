use serde_json::{Map, Value};

/// Open key/value mapping shared by extracted page data, form data and the
/// merged record handed to the template engine.
pub type Record = Map<String, Value>;

/// Merge extracted data with user-edited form data. Form values win on collision.
pub fn merge_records(extracted: &Record, form: &Record) -> Record {
    let mut merged = extracted.clone();
    for (key, value) in form {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Walk a dotted path through a record, e.g. "book.author.name".
/// Numeric segments index into arrays. Returns `None` for missing or null values.
pub fn resolve_path<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = record.get(first)?;

    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(arr) => arr.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    match current {
        Value::Null => None,
        other => Some(other),
    }
}

/// String form of a resolved value as it appears in a rendered note.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Read a string field, treating non-string scalars by their display form.
pub fn get_str(record: &Record, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
        other => Some(other.to_string()),
    }
}

/// Read a string field that must contain something other than whitespace.
pub fn get_non_blank(record: &Record, key: &str) -> Option<String> {
    get_str(record, key).filter(|s| !s.trim().is_empty())
}

/// Coerce a list-like field into trimmed, non-empty entries.
/// Accepts a comma-separated string or an array of scalars.
pub fn get_list(record: &Record, key: &str) -> Option<Vec<String>> {
    match record.get(key)? {
        Value::String(s) => Some(split_list(s)),
        Value::Array(items) => Some(
            items
                .iter()
                .map(display_value)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        _ => None,
    }
}

pub fn get_bool(record: &Record, key: &str) -> bool {
    match record.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Split a comma-separated value into trimmed, non-empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_merge_form_wins() {
        let extracted = record(json!({"title": "Scraped", "author": "A. Writer"}));
        let form = record(json!({"title": "Edited", "location": "Books/Fiction"}));

        let merged = merge_records(&extracted, &form);
        assert_eq!(merged["title"], json!("Edited"));
        assert_eq!(merged["author"], json!("A. Writer"));
        assert_eq!(merged["location"], json!("Books/Fiction"));
    }

    #[test]
    fn test_resolve_nested_path() {
        let data = record(json!({
            "book": {"author": {"name": "Jane Doe"}},
            "genres": ["History", "Science"],
            "missing": null
        }));

        assert_eq!(resolve_path(&data, "book.author.name"), Some(&json!("Jane Doe")));
        assert_eq!(resolve_path(&data, "genres.1"), Some(&json!("Science")));
        assert_eq!(resolve_path(&data, "book.publisher.name"), None);
        assert_eq!(resolve_path(&data, "genres.7"), None);
        assert_eq!(resolve_path(&data, "missing"), None);
        assert_eq!(resolve_path(&data, "book.author.name.first"), None);
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("text")), "text");
        assert_eq!(display_value(&json!(3)), "3");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&json!(["a", "b"])), "a, b");
    }

    #[test]
    fn test_get_list_accepts_string_and_array() {
        let data = record(json!({
            "tags": " History, Media-Type/Book ,, ",
            "genres": ["Fiction", " Fantasy ", ""]
        }));
        assert_eq!(get_list(&data, "tags").unwrap(), vec!["History", "Media-Type/Book"]);
        assert_eq!(get_list(&data, "genres").unwrap(), vec!["Fiction", "Fantasy"]);
        assert!(get_list(&data, "absent").is_none());
    }

    #[test]
    fn test_get_bool() {
        let data = record(json!({"a": true, "b": "true", "c": "no"}));
        assert!(get_bool(&data, "a"));
        assert!(get_bool(&data, "b"));
        assert!(!get_bool(&data, "c"));
        assert!(!get_bool(&data, "d"));
    }
}
