use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Runtime value of the expression language and of template documents.
///
/// Maps keep declaration order, so documents come out with their keys in the
/// order the template wrote them.
#[derive(Clone, Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

/// Largest magnitude an `f64` holds without losing integer precision.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

impl Value {
    /// Builds a number, preferring `Integer` when the value is whole.
    pub fn from_number(n: f64) -> Value {
        if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_EXACT_FLOAT {
            Value::Integer(n as i64)
        } else {
            Value::Float(n)
        }
    }

    /// Numeric view used by arithmetic and ordering. Strings that spell a
    /// finite number count as that number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Integer view for list indices; whole floats are accepted.
    pub fn as_index(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::List(_) | Value::Map(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Looks up a key when this is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Follows a dotted path such as `metadata.name` through nested maps.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |current, segment| current.get(segment))
    }

    /// Visits every string in the tree, depth first, with its location.
    pub fn visit_strings<F>(&self, location: &str, f: &mut F)
    where
        F: FnMut(&str, &str),
    {
        match self {
            Value::String(s) => f(location, s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    item.visit_strings(&format!("{}[{}]", location, i), f);
                }
            }
            Value::Map(map) => {
                for (key, item) in map {
                    item.visit_strings(&join_location(location, key), f);
                }
            }
            _ => {}
        }
    }
}

/// Appends a map key to a dotted location.
pub fn join_location(location: &str, key: &str) -> String {
    if location.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", location, key)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => match Value::from_number(*n) {
                Value::Integer(i) => write!(f, "{}", i),
                _ => write!(f, "{}", n),
            },
            Value::String(s) => write!(f, "{}", s),
            Value::List(_) | Value::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                write!(f, "{}", json)
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::from(i),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}
