//! Configuration: the flat parameter map shared by all stages and the JSON
//! run configurations of the binaries.
//!
//! Parameters travel as strings keyed by name, mirroring how host
//! applications hand them over. Typed structs such as
//! [`crate::markers::MarkerParams`] read from a [`ConfigMap`] with
//! [`ConfigMap::get_or`]: absent keys fall back to defaults, present but
//! unparseable values are errors.

pub mod qc;
pub mod slice_markers;

use crate::error::{QcError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Read and deserialize a JSON run configuration.
pub fn read_json_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path).map_err(|e| QcError::Load {
        path: path.to_path_buf(),
        reason: format!("failed to read config: {e}"),
    })?;
    serde_json::from_str(&data).map_err(|e| QcError::Load {
        path: path.to_path_buf(),
        reason: format!("failed to parse config: {e}"),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl RawValue {
    fn into_text(self) -> String {
        match self {
            RawValue::Bool(b) => b.to_string(),
            RawValue::Number(n) => n.to_string(),
            RawValue::Text(s) => s,
        }
    }
}

/// String-keyed, string-valued parameter map.
///
/// Deserialises from a JSON object whose values may be strings, numbers or
/// booleans; all of them are stored in their textual form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigMap {
    values: BTreeMap<String, String>,
}

impl<'de> Deserialize<'de> for ConfigMap {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = BTreeMap::<String, RawValue>::deserialize(deserializer)?;
        Ok(Self {
            values: raw.into_iter().map(|(k, v)| (k, v.into_text())).collect(),
        })
    }
}

impl Serialize for ConfigMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.values.insert(key.into(), value.to_string());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Typed lookup: `default` when absent, `ConfigParse` when unparseable.
    pub fn get_or<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.values.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| QcError::ConfigParse {
                key: key.to_string(),
                value: raw.clone(),
            }),
        }
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for ConfigMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ConfigMap::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_key_uses_default() {
        let map = ConfigMap::new();
        assert_eq!(map.get_or("se1", 11usize).unwrap(), 11);
    }

    #[test]
    fn present_key_is_parsed() {
        let map = ConfigMap::new().with("sigma", " 2.5 ");
        assert_eq!(map.get_or("sigma", 1.0f64).unwrap(), 2.5);
    }

    #[test]
    fn garbage_is_an_error_not_a_default() {
        let map = ConfigMap::new().with("se1", "eleven");
        let err = map.get_or("se1", 11usize).unwrap_err();
        assert!(matches!(err, QcError::ConfigParse { ref key, .. } if key == "se1"));
    }

    #[test]
    fn json_values_of_any_scalar_type() {
        let map: ConfigMap =
            serde_json::from_str(r#"{"se1": 9, "cannyMax": 0.4, "name": "x", "flag": true}"#)
                .unwrap();
        assert_eq!(map.get("se1"), Some("9"));
        assert_eq!(map.get_or("cannyMax", 0.3f64).unwrap(), 0.4);
        assert_eq!(map.get("name"), Some("x"));
        assert!(map.get_or("flag", false).unwrap());
    }
}
