//! Nested key-value settings tree.
//!
//! `Parameters` wraps a JSON object and offers the operations the solvers
//! need: typed accessors, partial overwrite, and merging a user document
//! against a defaults document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::validate::{ConfigError, ConfigResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(Value);

impl Default for Parameters {
    fn default() -> Self {
        Self::new()
    }
}

/// Coarse value kinds used for type compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Double,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => ValueKind::Int,
            Value::Number(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Double => "double",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }

    /// Whether a user value of kind `self` may replace a default of kind `default`.
    ///
    /// An integer is accepted where a double is expected, not the reverse.
    pub fn accepts_as(self, default: ValueKind) -> bool {
        self == default || (self == ValueKind::Int && default == ValueKind::Double)
    }
}

impl Parameters {
    /// An empty settings object.
    pub fn new() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Wrap a JSON value; the root must be an object.
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        if !value.is_object() {
            return Err(ConfigError::TypeMismatch {
                key: "<root>".to_string(),
                expected: ValueKind::Object.name(),
                got: ValueKind::of(&value).name(),
            });
        }
        Ok(Self(value))
    }

    /// Wrap an object literal built with `json!`; anything else yields an empty object.
    pub(crate) fn literal(value: Value) -> Self {
        match value {
            Value::Object(_) => Self(value),
            _ => Self::new(),
        }
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        Self::from_value(value)
    }

    pub fn to_pretty_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.0)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    fn map(&self) -> &Map<String, Value> {
        match &self.0 {
            Value::Object(map) => map,
            _ => unreachable!("Parameters root is always an object"),
        }
    }

    fn map_mut(&mut self) -> &mut Map<String, Value> {
        match &mut self.0 {
            Value::Object(map) => map,
            _ => unreachable!("Parameters root is always an object"),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.map().contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map().keys().map(String::as_str)
    }

    /// Whether `key` holds a nested settings object.
    pub fn is_sub_parameter(&self, key: &str) -> bool {
        self.map().get(key).is_some_and(Value::is_object)
    }

    pub fn get(&self, key: &str) -> ConfigResult<&Value> {
        self.map().get(key).ok_or_else(|| ConfigError::Missing {
            key: key.to_string(),
            reason: "key not present".to_string(),
        })
    }

    fn typed<'a, T>(
        &'a self,
        key: &str,
        expected: ValueKind,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> ConfigResult<T> {
        let value = self.get(key)?;
        extract(value).ok_or_else(|| ConfigError::TypeMismatch {
            key: key.to_string(),
            expected: expected.name(),
            got: ValueKind::of(value).name(),
        })
    }

    pub fn get_string(&self, key: &str) -> ConfigResult<&str> {
        self.typed(key, ValueKind::String, Value::as_str)
    }

    pub fn get_int(&self, key: &str) -> ConfigResult<i64> {
        self.typed(key, ValueKind::Int, Value::as_i64)
    }

    pub fn get_double(&self, key: &str) -> ConfigResult<f64> {
        self.typed(key, ValueKind::Double, Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> ConfigResult<bool> {
        self.typed(key, ValueKind::Bool, Value::as_bool)
    }

    pub fn get_array(&self, key: &str) -> ConfigResult<&[Value]> {
        self.typed(key, ValueKind::Array, |v| v.as_array().map(Vec::as_slice))
    }

    /// Copy of the nested settings object stored under `key`.
    pub fn sub(&self, key: &str) -> ConfigResult<Parameters> {
        let value = self.get(key)?;
        if !value.is_object() {
            return Err(ConfigError::TypeMismatch {
                key: key.to_string(),
                expected: ValueKind::Object.name(),
                got: ValueKind::of(value).name(),
            });
        }
        Ok(Parameters(value.clone()))
    }

    /// Insert or overwrite a single value.
    pub fn set_value(&mut self, key: &str, value: impl Into<Value>) {
        self.map_mut().insert(key.to_string(), value.into());
    }

    /// Insert or overwrite a nested settings object.
    pub fn set_sub(&mut self, key: &str, sub: Parameters) {
        self.map_mut().insert(key.to_string(), sub.0);
    }

    /// Insert `key` with a value only if it is not already present.
    pub fn add_value(&mut self, key: &str, value: impl Into<Value>) {
        self.map_mut()
            .entry(key.to_string())
            .or_insert_with(|| value.into());
    }

    pub fn remove_value(&mut self, key: &str) -> Option<Value> {
        self.map_mut().remove(key)
    }

    /// Check that every key of `self` exists in `defaults` with a compatible type.
    ///
    /// Only the first level is inspected.
    pub fn validate_defaults(&self, defaults: &Parameters) -> ConfigResult<()> {
        validate_level(self.map(), defaults.map(), "", false)
    }

    /// Copy every first-level default that is missing from `self`.
    pub fn add_missing_parameters(&mut self, defaults: &Parameters) {
        for (key, value) in defaults.map() {
            if !self.has(key) {
                self.map_mut().insert(key.clone(), value.clone());
            }
        }
    }

    /// Copy missing defaults at every level where both sides hold objects.
    pub fn recursively_add_missing_parameters(&mut self, defaults: &Parameters) {
        add_missing_level(self.map_mut(), defaults.map());
    }

    pub fn validate_and_assign_defaults(&mut self, defaults: &Parameters) -> ConfigResult<()> {
        self.validate_defaults(defaults)?;
        self.add_missing_parameters(defaults);
        Ok(())
    }

    /// Validate and fill defaults at every nesting level.
    pub fn recursively_validate_and_assign_defaults(
        &mut self,
        defaults: &Parameters,
    ) -> ConfigResult<()> {
        validate_level(self.map(), defaults.map(), "", true)?;
        self.recursively_add_missing_parameters(defaults);
        Ok(())
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn validate_level(
    user: &Map<String, Value>,
    defaults: &Map<String, Value>,
    prefix: &str,
    recursive: bool,
) -> ConfigResult<()> {
    for (key, value) in user {
        let path = join_key(prefix, key);
        let Some(default) = defaults.get(key) else {
            return Err(ConfigError::UnknownKey { key: path });
        };

        let got = ValueKind::of(value);
        let expected = ValueKind::of(default);
        if !got.accepts_as(expected) {
            return Err(ConfigError::TypeMismatch {
                key: path,
                expected: expected.name(),
                got: got.name(),
            });
        }

        if recursive && let (Value::Object(u), Value::Object(d)) = (value, default) {
            validate_level(u, d, &path, true)?;
        }
    }
    Ok(())
}

fn add_missing_level(user: &mut Map<String, Value>, defaults: &Map<String, Value>) {
    for (key, default) in defaults {
        match user.get_mut(key) {
            None => {
                user.insert(key.clone(), default.clone());
            }
            Some(Value::Object(u)) => {
                if let Value::Object(d) = default {
                    add_missing_level(u, d);
                }
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Parameters {
        Parameters::from_value(value).unwrap()
    }

    #[test]
    fn typed_accessors() {
        let p = params(json!({
            "name": "Main",
            "size": 3,
            "tol": 1e-6,
            "flag": true,
            "parts": ["a", "b"],
            "nested": {"x": 1}
        }));
        assert_eq!(p.get_string("name").unwrap(), "Main");
        assert_eq!(p.get_int("size").unwrap(), 3);
        assert_eq!(p.get_double("tol").unwrap(), 1e-6);
        assert_eq!(p.get_double("size").unwrap(), 3.0);
        assert!(p.get_bool("flag").unwrap());
        assert_eq!(p.get_array("parts").unwrap().len(), 2);
        assert_eq!(p.sub("nested").unwrap().get_int("x").unwrap(), 1);
    }

    #[test]
    fn accessor_type_mismatch_names_key() {
        let p = params(json!({"name": 5}));
        let err = p.get_string("name").unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { ref key, .. } if key == "name"));
        assert!(matches!(
            p.get_string("missing"),
            Err(ConfigError::Missing { .. })
        ));
    }

    #[test]
    fn root_must_be_object() {
        assert!(Parameters::from_value(json!([1, 2])).is_err());
        assert!(Parameters::from_json_str("3").is_err());
    }

    #[test]
    fn merge_keeps_user_values_and_fills_defaults() {
        let defaults = params(json!({"a": 1, "b": "x", "c": false}));
        let mut user = params(json!({"b": "y"}));
        user.validate_and_assign_defaults(&defaults).unwrap();
        assert_eq!(user.get_int("a").unwrap(), 1);
        assert_eq!(user.get_string("b").unwrap(), "y");
        assert!(!user.get_bool("c").unwrap());
    }

    #[test]
    fn merge_rejects_unknown_keys() {
        let defaults = params(json!({"a": 1}));
        let mut user = params(json!({"typo": 1}));
        let err = user.validate_and_assign_defaults(&defaults).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey { ref key } if key == "typo"));
    }

    #[test]
    fn merge_type_compatibility() {
        let defaults = params(json!({"tol": 1e-5, "count": 4}));

        let mut int_for_double = params(json!({"tol": 1}));
        int_for_double.validate_and_assign_defaults(&defaults).unwrap();

        let mut double_for_int = params(json!({"count": 1.5}));
        assert!(matches!(
            double_for_int.validate_and_assign_defaults(&defaults),
            Err(ConfigError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn recursive_merge_fills_nested_defaults() {
        let defaults = params(json!({
            "inner": {"solver_type": "AMGCL", "tolerance": 1e-9}
        }));
        let mut user = params(json!({"inner": {"tolerance": 1e-6}}));
        user.recursively_validate_and_assign_defaults(&defaults).unwrap();
        let inner = user.sub("inner").unwrap();
        assert_eq!(inner.get_string("solver_type").unwrap(), "AMGCL");
        assert_eq!(inner.get_double("tolerance").unwrap(), 1e-6);
    }

    #[test]
    fn recursive_merge_reports_nested_path() {
        let defaults = params(json!({"inner": {"a": 1}}));
        let mut user = params(json!({"inner": {"b": 1}}));
        let err = user
            .recursively_validate_and_assign_defaults(&defaults)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey { ref key } if key == "inner.b"));
    }

    #[test]
    fn flat_merge_does_not_descend() {
        let defaults = params(json!({"inner": {"a": 1, "b": 2}}));
        let mut user = params(json!({"inner": {"a": 5, "extra": 1}}));
        user.validate_and_assign_defaults(&defaults).unwrap();
        let inner = user.sub("inner").unwrap();
        assert!(inner.has("extra"));
        assert!(!inner.has("b"));
    }

    #[test]
    fn add_value_does_not_overwrite() {
        let mut p = params(json!({"a": 1}));
        p.add_value("a", 2);
        p.add_value("b", 3);
        assert_eq!(p.get_int("a").unwrap(), 1);
        assert_eq!(p.get_int("b").unwrap(), 3);
        p.set_value("a", 4);
        assert_eq!(p.get_int("a").unwrap(), 4);
    }
}
