//! Nested configuration values and path addressing.
//!
//! A techno-economic input arrives here already parsed, as an opaque
//! `serde_json::Value` tree of string-keyed mappings. Parameters are
//! addressed by `"top > middle > bottom"` path strings split into ordered
//! key sequences.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ConfigError, Lh2Error, Lh2Result};

/// Delimiter between keys in a parameter path string.
pub const PATH_DELIMITER: &str = " > ";

/// Ordered key sequence addressing a location inside a nested configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn new(keys: Vec<String>) -> Self {
        Self(keys)
    }

    /// Parse a `"top > middle > bottom"` path string into its key sequence.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(PATH_DELIMITER)
                .map(|key| key.trim().to_string())
                .collect(),
        )
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for KeyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(PATH_DELIMITER))
    }
}

/// Look up the value addressed by `path`, if present.
pub fn get_by_path<'a>(root: &'a Value, path: &KeyPath) -> Option<&'a Value> {
    let mut current = root;
    for key in path.keys() {
        current = current.as_object()?.get(key)?;
    }
    Some(current)
}

/// Write `value` at `path`, creating intermediate mappings where absent.
///
/// Descending through an existing non-mapping value is a configuration
/// error; sibling keys along the path are left untouched.
pub fn set_by_path(root: &mut Value, path: &KeyPath, value: Value) -> Lh2Result<()> {
    let Some((last, parents)) = path.keys().split_last() else {
        return Err(Lh2Error::Validation(
            "cannot set a value at an empty path".to_string(),
        ));
    };

    let mut current = root;
    let mut walked: Vec<&str> = Vec::with_capacity(path.len());
    for key in parents {
        let map = match current {
            Value::Object(map) => map,
            _ => {
                return Err(ConfigError::PathConflict {
                    path: walked.join(PATH_DELIMITER),
                    key: key.clone(),
                }
                .into())
            }
        };
        current = map
            .entry(key.clone())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        walked.push(key.as_str());
    }

    match current {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        _ => Err(ConfigError::PathConflict {
            path: walked.join(PATH_DELIMITER),
            key: last.clone(),
        }
        .into()),
    }
}

/// Interpret a configuration value as a float.
///
/// Input tables frequently quote their numbers, so numeric strings are
/// accepted alongside JSON numbers.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_splits_on_delimiter() {
        let path = KeyPath::parse("Technical Operating Parameters > Capacity Factor > Value");
        assert_eq!(
            path.keys(),
            &["Technical Operating Parameters", "Capacity Factor", "Value"]
        );
    }

    #[test]
    fn parse_trims_whitespace() {
        let path = KeyPath::parse("A >  B  > C");
        assert_eq!(path.keys(), &["A", "B", "C"]);
    }

    #[test]
    fn display_round_trips() {
        let raw = "Electrolyzer > Stack Cost > Value";
        assert_eq!(KeyPath::parse(raw).to_string(), raw);
    }

    #[test]
    fn get_by_path_resolves_nested_value() {
        let config = json!({"a": {"b": {"c": 42.0}}});
        let path = KeyPath::parse("a > b > c");
        assert_eq!(get_by_path(&config, &path), Some(&json!(42.0)));
    }

    #[test]
    fn get_by_path_missing_key_is_none() {
        let config = json!({"a": {"b": 1.0}});
        assert!(get_by_path(&config, &KeyPath::parse("a > missing")).is_none());
        assert!(get_by_path(&config, &KeyPath::parse("a > b > deeper")).is_none());
    }

    #[test]
    fn set_by_path_overwrites_leaf() {
        let mut config = json!({"a": {"b": 1.0, "sibling": "keep"}});
        set_by_path(&mut config, &KeyPath::parse("a > b"), json!(2.5)).unwrap();
        assert_eq!(config, json!({"a": {"b": 2.5, "sibling": "keep"}}));
    }

    #[test]
    fn set_by_path_creates_intermediate_mappings() {
        let mut config = json!({"existing": 1});
        set_by_path(&mut config, &KeyPath::parse("a > b > c"), json!(7.0)).unwrap();
        assert_eq!(config, json!({"existing": 1, "a": {"b": {"c": 7.0}}}));
    }

    #[test]
    fn set_by_path_rejects_non_mapping_intermediate() {
        let mut config = json!({"a": 3.0});
        let err = set_by_path(&mut config, &KeyPath::parse("a > b"), json!(1.0)).unwrap_err();
        match err {
            Lh2Error::Config(ConfigError::PathConflict { key, .. }) => assert_eq!(key, "b"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn coerce_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_f64(&json!(1.5)), Some(1.5));
        assert_eq!(coerce_f64(&json!("0.85")), Some(0.85));
        assert_eq!(coerce_f64(&json!(" 1e6 ")), Some(1e6));
        assert_eq!(coerce_f64(&json!("not a number")), None);
        assert_eq!(coerce_f64(&json!({"Value": 1.0})), None);
        assert_eq!(coerce_f64(&json!(null)), None);
    }
}
