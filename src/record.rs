//! Catalog records
//!
//! A [`Record`] is one entry in a navigation frame: a collection, a plugin, or a
//! content page. Fields are split in two ordered maps:
//!
//! - **visible** fields are rendered as menu columns and in content views
//! - **hidden** fields are annotations (shadowed, deprecated, ...) that the
//!   colorizer and heading query but generic rendering never shows
//!
//! Producer payloads mark hidden fields with a `__` key prefix. That prefix is
//! honoured only at the wire boundary ([`Record::from_wire`] / [`Record::to_wire`]).

use crate::error::{NavError, Result};
use serde_json::{Map, Value};

/// Key prefix that marks a hidden field in producer payloads.
pub const WIRE_HIDDEN_PREFIX: &str = "__";

/// One data item with visible and hidden fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    visible: Map<String, Value>,
    hidden: Map<String, Value>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON value received over the wire.
    ///
    /// Keys prefixed with `__` become hidden fields (prefix stripped).
    ///
    /// # Errors
    ///
    /// Returns a contract violation if `value` is not a JSON object.
    pub fn from_wire(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_wire_map(map)),
            other => Err(NavError::contract(format!(
                "a record must be a mapping, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Build a record from an already-decoded JSON object.
    pub fn from_wire_map(map: Map<String, Value>) -> Self {
        let mut record = Self::new();
        for (key, value) in map {
            match key.strip_prefix(WIRE_HIDDEN_PREFIX) {
                Some(stripped) if !stripped.is_empty() => {
                    record.hidden.insert(stripped.to_string(), value);
                }
                _ => {
                    record.visible.insert(key, value);
                }
            }
        }
        record
    }

    /// Serialize back to the wire shape, re-prefixing hidden fields.
    pub fn to_wire(&self) -> Value {
        let mut map = self.visible.clone();
        for (key, value) in &self.hidden {
            map.insert(format!("{WIRE_HIDDEN_PREFIX}{key}"), value.clone());
        }
        Value::Object(map)
    }

    /// Builder: add a visible field
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder: add a hidden field
    pub fn with_hidden(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_hidden(key, value);
        self
    }

    /// Insert or replace a visible field
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.visible.insert(key.into(), value.into());
    }

    /// Insert or replace a hidden field
    pub fn set_hidden(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.hidden.insert(key.into(), value.into());
    }

    /// Look up a visible field
    pub fn visible(&self, key: &str) -> Option<&Value> {
        self.visible.get(key)
    }

    /// Look up a hidden field
    pub fn hidden(&self, key: &str) -> Option<&Value> {
        self.hidden.get(key)
    }

    /// Look up a field, visible first.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.visible.get(key).or_else(|| self.hidden.get(key))
    }

    /// True when `key` exists only as a hidden field.
    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden.contains_key(key) && !self.visible.contains_key(key)
    }

    /// All visible fields, in insertion order
    pub fn visible_fields(&self) -> &Map<String, Value> {
        &self.visible
    }

    /// All hidden fields, in insertion order
    pub fn hidden_fields(&self) -> &Map<String, Value> {
        &self.hidden
    }

    /// Visible fields followed by hidden ones (hidden keys keep their wire prefix
    /// so both sets stay distinguishable when shown together).
    pub fn all_fields(&self) -> Map<String, Value> {
        match self.to_wire() {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// A hidden boolean flag; absent or non-boolean reads as `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.hidden(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// A string field (visible first).
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Render a visible field as a single table cell.
    ///
    /// Strings render bare, `null` and missing fields render empty, nested
    /// values render as compact JSON.
    pub fn display_value(&self, key: &str) -> String {
        match self.visible(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(nested) => nested.to_string(),
        }
    }
}

/// Short name of a JSON value's shape, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_wire_splits_hidden_fields() {
        let record = Record::from_wire(json!({
            "known_as": "a.b",
            "__shadowed": true,
            "path": "/tmp/a/b",
        }))
        .expect("object");

        assert_eq!(record.text("known_as"), Some("a.b"));
        assert!(record.is_hidden("shadowed"));
        assert!(record.flag("shadowed"));
        assert_eq!(record.visible_fields().len(), 2);
        assert!(record.visible("__shadowed").is_none());
    }

    #[test]
    fn test_from_wire_rejects_non_mapping() {
        let err = Record::from_wire(json!(["not", "a", "mapping"])).unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_to_wire_restores_prefix() {
        let record = Record::new().with("name", "x").with_hidden("deprecated", false);
        let wire = record.to_wire();
        assert_eq!(wire["name"], json!("x"));
        assert_eq!(wire["__deprecated"], json!(false));
        assert_eq!(Record::from_wire(wire).unwrap(), record);
    }

    #[test]
    fn test_display_value_shapes() {
        let record = Record::new()
            .with("s", "text")
            .with("n", 3)
            .with("b", true)
            .with("z", Value::Null)
            .with("o", json!({"k": 1}));
        assert_eq!(record.display_value("s"), "text");
        assert_eq!(record.display_value("n"), "3");
        assert_eq!(record.display_value("b"), "true");
        assert_eq!(record.display_value("z"), "");
        assert_eq!(record.display_value("missing"), "");
        assert_eq!(record.display_value("o"), r#"{"k":1}"#);
    }

    #[test]
    fn test_bare_prefix_key_stays_visible() {
        let record = Record::from_wire(json!({"__": 1})).unwrap();
        assert!(record.visible("__").is_some());
        assert!(record.hidden_fields().is_empty());
    }
}
