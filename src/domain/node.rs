use serde_json::{Map, Value};

/// Structural category of a bound argument value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Collection,
    Composite,
    Scalar,
}

impl ValueKind {
    /// Whether scanning this kind means crossing a nesting boundary
    pub fn is_nested(self) -> bool {
        matches!(self, ValueKind::Collection | ValueKind::Composite)
    }
}

/// Borrowed view of a value, classified for traversal.
///
/// Strings are always leaves and never iterated as characters. Numbers,
/// booleans and nulls are opaque scalars and are never matched against the
/// disallowed pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
    String(&'a str),
    Collection(&'a [Value]),
    Composite(&'a Map<String, Value>),
    Scalar,
}

impl<'a> Node<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::String(text) => Node::String(text),
            Value::Array(items) => Node::Collection(items),
            Value::Object(fields) => Node::Composite(fields),
            Value::Null | Value::Bool(_) | Value::Number(_) => Node::Scalar,
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Node::String(_) => ValueKind::String,
            Node::Collection(_) => ValueKind::Collection,
            Node::Composite(_) => ValueKind::Composite,
            Node::Scalar => ValueKind::Scalar,
        }
    }
}

/// Classify a value without keeping the borrowed view
pub fn classify(value: &Value) -> ValueKind {
    Node::classify(value).kind()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;
    use std::collections::{BTreeSet, HashMap};

    #[derive(Serialize)]
    struct UserSettings {
        user_id: i64,
        user_code: String,
        user_name: Option<String>,
    }

    #[test]
    fn test_string_is_a_leaf() {
        let value = json!("thisisastring...");
        assert_eq!(classify(&value), ValueKind::String);
        assert!(!classify(&value).is_nested());
    }

    #[test]
    fn test_numbers_and_booleans_are_scalars() {
        assert_eq!(classify(&json!(42)), ValueKind::Scalar);
        assert_eq!(classify(&json!(4.2)), ValueKind::Scalar);
        assert_eq!(classify(&json!(true)), ValueKind::Scalar);
        assert_eq!(classify(&Value::Null), ValueKind::Scalar);
    }

    #[test]
    fn test_iterables_are_collections() {
        let list = serde_json::to_value(vec![1, 2, 3]).unwrap();
        let array = serde_json::to_value([1, 2, 3]).unwrap();
        let set = serde_json::to_value(BTreeSet::from([1, 2, 3])).unwrap();

        assert_eq!(classify(&list), ValueKind::Collection);
        assert_eq!(classify(&array), ValueKind::Collection);
        assert_eq!(classify(&set), ValueKind::Collection);
    }

    #[test]
    fn test_struct_is_composite_with_declared_fields() {
        let settings = UserSettings {
            user_id: 1,
            user_code: "Foobar".to_string(),
            user_name: None,
        };
        let value = serde_json::to_value(&settings).unwrap();

        match Node::classify(&value) {
            Node::Composite(fields) => {
                let names: Vec<&str> = fields.keys().map(String::as_str).collect();
                assert_eq!(names, vec!["user_id", "user_code", "user_name"]);
                assert_eq!(classify(&fields["user_id"]), ValueKind::Scalar);
                assert_eq!(classify(&fields["user_code"]), ValueKind::String);
                assert_eq!(classify(&fields["user_name"]), ValueKind::Scalar);
            }
            other => panic!("expected composite, got {:?}", other),
        }
    }

    #[test]
    fn test_string_map_is_composite() {
        let map = HashMap::from([("key".to_string(), "value".to_string())]);
        let value = serde_json::to_value(map).unwrap();
        assert_eq!(classify(&value), ValueKind::Composite);
    }

    #[test]
    fn test_classification_is_stable() {
        let value = json!({"a": [1, "two", {"three": 3}]});
        assert_eq!(classify(&value), classify(&value));
        assert_eq!(Node::classify(&value), Node::classify(&value));
    }
}
