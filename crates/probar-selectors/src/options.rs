//! Option bags passed to expression generators and filters.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Named option values for a single selector invocation.
///
/// Keys are kept sorted so descriptions and queries built from the bag are
/// stable for a given set of options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options {
    values: BTreeMap<String, Value>,
}

impl Options {
    /// Create an empty option bag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option (builder style)
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.values.insert(key.into(), value.into());
        self
    }

    /// Insert or replace an option
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Remove an option
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Raw value for a key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether the key was supplied at all (even as `null`)
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Whether the key carries a usable value.
    ///
    /// `null`, `false`, empty strings and empty arrays count as absent.
    #[must_use]
    pub fn is_present(&self, key: &str) -> bool {
        self.get(key).is_some_and(is_truthy)
    }

    /// String value for a key, if it is a string
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Boolean value for a key, if it is a boolean
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Values for a key as a list of strings.
    ///
    /// A single scalar becomes a one-element list; absent keys yield an empty list.
    #[must_use]
    pub fn get_strings(&self, key: &str) -> Vec<String> {
        self.get(key).map(value_strings).unwrap_or_default()
    }

    /// Number of options
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no options were supplied
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over options in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Whether a JSON value counts as "given" for optional query constraints
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// Flatten a scalar or array value into strings
#[must_use]
pub fn value_strings(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().flat_map(value_strings).collect(),
        Value::String(s) => vec![s.clone()],
        other => vec![other.to_string()],
    }
}

/// Human readable rendering of a value (strings quoted)
#[must_use]
pub fn inspect(value: &Value) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_and_get() {
        let opts = Options::new().with("class", "foo").with("disabled", true);
        assert_eq!(opts.get_str("class"), Some("foo"));
        assert_eq!(opts.get_bool("disabled"), Some(true));
        assert_eq!(opts.len(), 2);
    }

    #[test]
    fn test_is_present() {
        let opts = Options::new()
            .with("a", "")
            .with("b", json!([]))
            .with("c", Value::Null)
            .with("d", false)
            .with("e", "x")
            .with("f", 0);
        assert!(!opts.is_present("a"));
        assert!(!opts.is_present("b"));
        assert!(!opts.is_present("c"));
        assert!(!opts.is_present("d"));
        assert!(opts.is_present("e"));
        assert!(opts.is_present("f"));
        assert!(!opts.is_present("missing"));
        assert!(opts.contains_key("c"));
    }

    #[test]
    fn test_get_strings() {
        let opts = Options::new()
            .with("one", "a")
            .with("many", json!(["a", "b"]))
            .with("num", 3);
        assert_eq!(opts.get_strings("one"), vec!["a"]);
        assert_eq!(opts.get_strings("many"), vec!["a", "b"]);
        assert_eq!(opts.get_strings("num"), vec!["3"]);
        assert!(opts.get_strings("missing").is_empty());
    }

    #[test]
    fn test_iteration_is_sorted() {
        let opts: Options = vec![("z", 1), ("a", 2)].into_iter().collect();
        let keys: Vec<&str> = opts.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "z"]);
    }

    #[test]
    fn test_serde_transparent() {
        let opts: Options = serde_json::from_str(r#"{"class": ["a", "b"]}"#).unwrap();
        assert_eq!(opts.get_strings("class"), vec!["a", "b"]);
        assert_eq!(serde_json::to_string(&opts).unwrap(), r#"{"class":["a","b"]}"#);
    }

    #[test]
    fn test_inspect() {
        assert_eq!(inspect(&json!("Dog")), "\"Dog\"");
        assert_eq!(inspect(&json!(true)), "true");
    }
}
