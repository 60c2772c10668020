//! Core value types and operations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Zero timestamp as serialized by the API server (RFC 3339).
pub const ZERO_TIMESTAMP_RFC3339: &str = "0001-01-01T00:00:00Z";

/// Zero timestamp in the platform's printed form.
pub const ZERO_TIMESTAMP_PRINTED: &str = "0001-01-01 00:00:00 +0000 UTC";

/// Value represents a JSON/YAML object tree. It is the in-memory tagged tree
/// that live and desired objects are lowered to before they are diffed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Map),
}

/// Map represents a key-value map where keys are strings, kept in key order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Map {
    pub fields: BTreeMap<String, Value>,
}

impl Value {
    /// Returns true if both values are collections of the same kind.
    pub fn same_collection_kind(&self, other: &Value) -> bool {
        matches!(
            (self, other),
            (Value::Map(_), Value::Map(_)) | (Value::List(_), Value::List(_))
        )
    }

    /// Renders a scalar as the single token used on a structural line.
    /// Collections render as their opening delimiter.
    pub fn token(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{:.1}", f)
                } else {
                    f.to_string()
                }
            }
            Value::String(s) => quote(s),
            Value::List(_) => "[".to_string(),
            Value::Map(_) => "{".to_string(),
        }
    }

    /// Reports whether this value is indistinguishable from "never set".
    ///
    /// Scalars follow [`is_logically_empty_token`]. Collections are empty when
    /// they have no members; their contents are not inspected.
    pub fn is_logically_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(_) => false,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::String(s) => s.is_empty() || is_zero_timestamp(s),
            Value::List(l) => l.is_empty(),
            Value::Map(m) => m.is_empty(),
        }
    }

    /// Lowers any serializable object into a Value tree.
    pub fn from_serialize<T: Serialize + ?Sized>(obj: &T) -> Result<Value, serde_json::Error> {
        serde_json::to_value(obj).map(Value::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => Value::Map(Map {
                fields: obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            }),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Map {
    pub fn new() -> Self {
        Map {
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Iterates the union of both maps' keys in order.
    pub fn union_keys<'a>(&'a self, other: &'a Map) -> impl Iterator<Item = &'a String> + 'a {
        let mut keys: Vec<&String> = self.fields.keys().chain(other.fields.keys()).collect();
        keys.sort();
        keys.dedup();
        keys.into_iter()
    }
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

fn is_zero_timestamp(s: &str) -> bool {
    s == ZERO_TIMESTAMP_RFC3339 || s == ZERO_TIMESTAMP_PRINTED
}

/// Reports whether a rendered line token is logically empty: the empty
/// string, numeric zero, the zero timestamp, or null.
///
/// Quoted and unquoted forms are both accepted, and a trailing `,` left by
/// pretty printers is ignored.
pub fn is_logically_empty_token(token: &str) -> bool {
    let token = token.trim().trim_end_matches(',').trim_end();
    let unquoted = token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token);

    if unquoted.is_empty() || is_zero_timestamp(unquoted) {
        return true;
    }
    if matches!(token, "null" | "nil" | "<nil>") {
        return true;
    }
    if unquoted.len() == token.len() {
        if let Ok(n) = token.parse::<f64>() {
            return n == 0.0;
        }
    }
    false
}

/// Parse a value from JSON.
pub fn from_json(json: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str::<serde_json::Value>(json).map(Value::from)
}

/// Parse a value from YAML. JSON input is accepted as well.
pub fn from_yaml(yaml: &str) -> Result<Value, serde_yaml::Error> {
    serde_yaml::from_str::<serde_json::Value>(yaml).map(Value::from)
}
