//! Nested field addressing over JSON values.
//!
//! Every wire translator reads and writes payloads through [`get_value_by_path`] and
//! [`set_value_by_path`]. A path is a sequence of [`PathSegment`]s; the string form
//! accepted by [`PathSegment::parse`] uses `key[]` for "every element of the array at
//! `key`" and `key[0]` for "the first element of the array at `key`".

use serde_json::{Map, Value};

use crate::error::PathError;

/// Reserved single-segment path addressing the value itself.
pub const SELF_KEY: &str = "_self";

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object field.
    Key(String),
    /// Every element of the array stored under the key.
    Each(String),
    /// First element of the array stored under the key.
    First(String),
}

impl PathSegment {
    /// Parses the string form of a segment.
    pub fn parse(segment: &str) -> Self {
        if let Some(key) = segment.strip_suffix("[]") {
            PathSegment::Each(key.to_string())
        } else if let Some(key) = segment.strip_suffix("[0]") {
            PathSegment::First(key.to_string())
        } else {
            PathSegment::Key(segment.to_string())
        }
    }

    /// The object key this segment addresses.
    pub fn key(&self) -> &str {
        match self {
            PathSegment::Key(k) | PathSegment::Each(k) | PathSegment::First(k) => k,
        }
    }
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{k}"),
            PathSegment::Each(k) => write!(f, "{k}[]"),
            PathSegment::First(k) => write!(f, "{k}[0]"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(segment: &str) -> Self {
        PathSegment::parse(segment)
    }
}

/// Parses a list of string segments.
pub fn parse_path(segments: &[&str]) -> Vec<PathSegment> {
    segments.iter().map(|s| PathSegment::parse(s)).collect()
}

/// Reads the value at `path`.
///
/// Returns `None` whenever an intermediate value is missing or not an object. An
/// [`PathSegment::Each`] segment maps the rest of the path over the addressed array,
/// with `null` standing in for elements where the rest of the path is absent.
pub fn get_value_by_path(data: &Value, path: &[PathSegment]) -> Option<Value> {
    if let [PathSegment::Key(k)] = path {
        if k == SELF_KEY {
            return Some(data.clone());
        }
    }

    let mut current = data;
    for (i, segment) in path.iter().enumerate() {
        let object = current.as_object()?;
        match segment {
            PathSegment::Key(key) => current = object.get(key)?,
            PathSegment::First(key) => current = object.get(key)?.as_array()?.first()?,
            PathSegment::Each(key) => {
                let items = object.get(key)?.as_array()?;
                let rest = &path[i + 1..];
                return Some(Value::Array(
                    items
                        .iter()
                        .map(|item| get_value_by_path(item, rest).unwrap_or(Value::Null))
                        .collect(),
                ));
            }
        }
    }
    Some(current.clone())
}

/// Writes `value` at `path`, creating intermediate objects as needed.
///
/// - A [`PathSegment::Each`] segment over a missing key requires `value` to be an array
///   and creates one object per element; over an existing array, an array `value` is
///   applied pairwise and any other value is broadcast to every element.
/// - A [`PathSegment::First`] segment ensures a one-element array and writes into it.
/// - Writing over an existing value is a no-op when the new value is empty or equal,
///   merges when both are objects, and fails otherwise.
pub fn set_value_by_path(data: &mut Value, path: &[PathSegment], value: Value) -> Result<(), PathError> {
    let Some((last, parents)) = path.split_last() else {
        return Err(PathError::EmptyPath);
    };

    let mut current = data;
    for (i, segment) in parents.iter().enumerate() {
        let object = ensure_object(current);
        match segment {
            PathSegment::Each(key) => {
                if !object.contains_key(key) {
                    let Value::Array(items) = &value else {
                        return Err(PathError::ArrayValueRequired {
                            segment: segment.to_string(),
                        });
                    };
                    let fresh = items.iter().map(|_| Value::Object(Map::new())).collect();
                    object.insert(key.clone(), Value::Array(fresh));
                }
                let rest = &path[i + 1..];
                if let Some(Value::Array(targets)) = object.get_mut(key) {
                    match &value {
                        Value::Array(values) => {
                            for (target, item) in targets.iter_mut().zip(values) {
                                set_value_by_path(target, rest, item.clone())?;
                            }
                        }
                        _ => {
                            for target in targets.iter_mut() {
                                set_value_by_path(target, rest, value.clone())?;
                            }
                        }
                    }
                }
                return Ok(());
            }
            PathSegment::First(key) => {
                let slot = object
                    .entry(key.clone())
                    .or_insert_with(|| Value::Array(vec![Value::Object(Map::new())]));
                if !slot.is_array() {
                    *slot = Value::Array(Vec::new());
                }
                if let Value::Array(items) = slot {
                    if items.is_empty() {
                        items.push(Value::Object(Map::new()));
                    }
                    return set_value_by_path(&mut items[0], &path[i + 1..], value);
                }
                return Ok(());
            }
            PathSegment::Key(key) => {
                let slot = object.entry(key.clone()).or_insert(Value::Null);
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                current = slot;
            }
        }
    }

    let key = last.key();
    let object = ensure_object(current);
    match object.get_mut(key) {
        None => {
            object.insert(key.to_string(), value);
            Ok(())
        }
        Some(existing) => merge_existing(existing, value, key),
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

fn merge_existing(existing: &mut Value, value: Value, key: &str) -> Result<(), PathError> {
    if is_empty(&value) || *existing == value {
        return Ok(());
    }
    match (existing, value) {
        (Value::Object(target), Value::Object(source)) => {
            target.extend(source);
            Ok(())
        }
        (Value::Array(target), Value::Array(source)) => {
            for (index, item) in source.into_iter().enumerate() {
                match target.get_mut(index) {
                    Some(slot) => *slot = item,
                    None => target.push(item),
                }
            }
            Ok(())
        }
        _ => Err(PathError::ConflictingValue { key: key.to_string() }),
    }
}

/// Values that never overwrite an existing entry.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn p(segments: &[&str]) -> Vec<PathSegment> {
        parse_path(segments)
    }

    #[test]
    fn test_parse_segments() {
        assert_eq!(PathSegment::parse("contents[]"), PathSegment::Each("contents".into()));
        assert_eq!(PathSegment::parse("turns[0]"), PathSegment::First("turns".into()));
        assert_eq!(PathSegment::parse("model"), PathSegment::Key("model".into()));
        assert_eq!(PathSegment::Each("a".into()).to_string(), "a[]");
    }

    #[test]
    fn test_get_self_returns_whole_value() {
        let data = json!({"a": 1});
        assert_eq!(get_value_by_path(&data, &p(&["_self"])), Some(data.clone()));
    }

    #[test]
    fn test_get_nested_and_missing() {
        let data = json!({"a": {"b": {"c": 3}}, "s": "x"});
        assert_eq!(get_value_by_path(&data, &p(&["a", "b", "c"])), Some(json!(3)));
        assert_eq!(get_value_by_path(&data, &p(&["a", "z"])), None);
        assert_eq!(get_value_by_path(&data, &p(&["s", "deeper"])), None);
        assert_eq!(get_value_by_path(&json!(null), &p(&["a"])), None);
    }

    #[test]
    fn test_get_maps_over_array() {
        let data = json!({"items": [{"id": 1}, {"id": 2}, {"other": true}]});
        assert_eq!(
            get_value_by_path(&data, &p(&["items[]", "id"])),
            Some(json!([1, 2, null]))
        );
        assert_eq!(get_value_by_path(&json!({"items": 5}), &p(&["items[]", "id"])), None);
        assert_eq!(get_value_by_path(&json!({}), &p(&["items[]", "id"])), None);
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut data = json!({});
        set_value_by_path(&mut data, &p(&["setup", "generationConfig", "responseModalities"]), json!(["AUDIO"])).unwrap();
        assert_eq!(data, json!({"setup": {"generationConfig": {"responseModalities": ["AUDIO"]}}}));
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut data = json!({"a": 5});
        set_value_by_path(&mut data, &p(&["a", "b"]), json!(1)).unwrap();
        assert_eq!(data, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_set_each_requires_array_for_missing_key() {
        let mut data = json!({});
        let err = set_value_by_path(&mut data, &p(&["parts[]", "text"]), json!("x")).unwrap_err();
        assert_eq!(err, PathError::ArrayValueRequired { segment: "parts[]".into() });
    }

    #[test]
    fn test_set_each_pairwise_and_broadcast() {
        let mut data = json!({});
        set_value_by_path(&mut data, &p(&["parts[]", "text"]), json!(["a", "b"])).unwrap();
        assert_eq!(data, json!({"parts": [{"text": "a"}, {"text": "b"}]}));

        set_value_by_path(&mut data, &p(&["parts[]", "thought"]), json!(true)).unwrap();
        assert_eq!(
            data,
            json!({"parts": [{"text": "a", "thought": true}, {"text": "b", "thought": true}]})
        );
    }

    #[test]
    fn test_set_first_element() {
        let mut data = json!({});
        set_value_by_path(&mut data, &p(&["turns[0]", "role"]), json!("user")).unwrap();
        assert_eq!(data, json!({"turns": [{"role": "user"}]}));

        set_value_by_path(&mut data, &p(&["turns[0]", "parts"]), json!([])).unwrap();
        assert_eq!(data, json!({"turns": [{"role": "user", "parts": []}]}));
    }

    #[test]
    fn test_set_existing_value_rules() {
        let mut data = json!({"config": {"a": 1}, "name": "x"});

        set_value_by_path(&mut data, &p(&["config"]), json!({"b": 2})).unwrap();
        assert_eq!(data["config"], json!({"a": 1, "b": 2}));

        set_value_by_path(&mut data, &p(&["config"]), json!({})).unwrap();
        set_value_by_path(&mut data, &p(&["name"]), json!("x")).unwrap();
        set_value_by_path(&mut data, &p(&["name"]), json!("")).unwrap();
        assert_eq!(data, json!({"config": {"a": 1, "b": 2}, "name": "x"}));

        let err = set_value_by_path(&mut data, &p(&["name"]), json!("y")).unwrap_err();
        assert_eq!(err, PathError::ConflictingValue { key: "name".into() });
    }

    #[test]
    fn test_set_empty_path_fails() {
        let mut data = json!({});
        assert_eq!(set_value_by_path(&mut data, &[], json!(1)), Err(PathError::EmptyPath));
    }

    #[test]
    fn test_round_trip_plain_paths() {
        let values = [json!(1), json!("text"), json!([1, 2]), json!({"k": [true]}), json!(null)];
        let paths: [&[&str]; 3] = [&["a"], &["a", "b"], &["x", "y", "z", "w"]];

        for path in paths {
            for value in &values {
                let path = p(path);
                let mut data = json!({});
                set_value_by_path(&mut data, &path, value.clone()).unwrap();
                assert_eq!(get_value_by_path(&data, &path), Some(value.clone()));
            }
        }
    }
}
