use std::collections::HashMap;

use super::Value;

/// A flat mapping from field name to [`Value`], supplied at evaluation time.
///
/// Field names are matched exactly; `user.age` is a single key, not a path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    data: HashMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    #[must_use]
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value.into());
        self
    }

    /// Insert a field (mutable reference version).
    pub fn insert(&mut self, field: &str, value: Value) {
        self.data.insert(field.to_owned(), value);
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Build a record from a JSON object, such as a serialized stored entity.
    ///
    /// Strings, numbers and booleans become fields. `null`, arrays and nested
    /// objects are skipped, so leaves naming them resolve to their literal text.
    /// Anything other than an object yields an empty record.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut record = Record::new();
        if let serde_json::Value::Object(map) = value {
            for (key, field) in map {
                let converted = match field {
                    serde_json::Value::String(s) => Value::String(s.clone()),
                    serde_json::Value::Bool(b) => Value::Bool(*b),
                    serde_json::Value::Number(n) => match n.as_i64() {
                        Some(i) => Value::Int(i),
                        None => match n.as_f64() {
                            Some(f) => Value::Float(f),
                            None => continue,
                        },
                    },
                    serde_json::Value::Null
                    | serde_json::Value::Array(_)
                    | serde_json::Value::Object(_) => continue,
                };
                record.data.insert(key.clone(), converted);
            }
        }
        record
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn set_and_get() {
        let record = Record::new().set("name", "alice");
        assert_eq!(record.get("name"), Some(&Value::String("alice".to_owned())));
    }

    #[test]
    fn dotted_names_are_flat_keys() {
        let record = Record::new().set("user.age", 25_i64);
        assert_eq!(record.get("user.age"), Some(&Value::Int(25)));
        assert_eq!(record.get("user"), None);
    }

    #[test]
    fn overwrite_value() {
        let record = Record::new().set("score", 10_i64).set("score", 20_i64);
        assert_eq!(record.get("score"), Some(&Value::Int(20)));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn insert_mutable_ref() {
        let mut record = Record::new();
        record.insert("key", Value::Bool(true));
        assert_eq!(record.get("key"), Some(&Value::Bool(true)));
    }

    #[test]
    fn empty_record() {
        let record = Record::new();
        assert!(record.is_empty());
        assert_eq!(record.get("anything"), None);
    }

    #[test]
    fn from_iterator() {
        let record: Record = [("age", Value::Int(35)), ("department", Value::from("Sales"))]
            .into_iter()
            .collect();
        assert_eq!(record.get("age"), Some(&Value::Int(35)));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn from_json_object() {
        let record = Record::from_json(&json!({
            "age": 35,
            "salary": 52000.5,
            "department": "Sales",
            "active": true,
            "manager": null,
            "tags": ["a"],
            "address": {"city": "x"}
        }));
        assert_eq!(record.get("age"), Some(&Value::Int(35)));
        assert_eq!(record.get("salary"), Some(&Value::Float(52000.5)));
        assert_eq!(record.get("department"), Some(&Value::from("Sales")));
        assert_eq!(record.get("active"), Some(&Value::Bool(true)));
        assert_eq!(record.get("manager"), None);
        assert_eq!(record.get("tags"), None);
        assert_eq!(record.get("address"), None);
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn from_json_non_object_is_empty() {
        assert!(Record::from_json(&json!([1, 2])).is_empty());
    }
}
