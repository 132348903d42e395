//! The document value tree.
//!
//! `Value` is a tagged union over scalar, array, and object node kinds. It is
//! the in-memory shape the update engine compiles against and mutates; no wire
//! encoding is implied. Object fields preserve insertion order, which keeps
//! mutated documents byte-for-byte stable across no-op updates.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A document tree node.
///
/// Numbers are split into integer and double variants; arithmetic modifiers
/// promote to `Double` only when either side is a double.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit integer value.
    Int(i64),
    /// Double-precision floating point value.
    Double(f64),
    /// String value.
    String(String),
    /// Array of values.
    Array(Vec<Value>),
    /// Object mapping field names to values, insertion-ordered.
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Returns an empty object value.
    #[must_use]
    pub fn empty_object() -> Self {
        Self::Object(IndexMap::new())
    }

    /// Returns `true` if this is an object.
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Returns `true` if this is an array.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Returns `true` if this is a scalar, i.e. neither an object nor an
    /// array. Scalars block path creation through them.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        !self.is_object() && !self.is_array()
    }

    /// Returns `true` if this is an `Int` or `Double`.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Double(_))
    }

    /// Returns the object map if this is an `Object` variant.
    #[must_use]
    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the mutable object map if this is an `Object` variant.
    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the array if this is an `Array` variant.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(list) => Some(list),
            _ => None,
        }
    }

    /// Returns the mutable array if this is an `Array` variant.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::Array(list) => Some(list),
            _ => None,
        }
    }

    /// Returns the numeric value widened to `f64`, if numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => {
                #[allow(clippy::cast_precision_loss)]
                Some(*i as f64)
            }
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns `true` if a child element exists under `name`.
    ///
    /// For objects, `name` is a field name. For arrays, `name` must parse as
    /// an in-bounds index.
    #[must_use]
    pub fn has_child(&self, name: &str) -> bool {
        self.get_child(name).is_some()
    }

    /// Looks up the child element under `name`, treating numeric names as
    /// array indexes when this value is an array.
    #[must_use]
    pub fn get_child(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Object(map) => map.get(name),
            Self::Array(list) => name.parse::<usize>().ok().and_then(|idx| list.get(idx)),
            _ => None,
        }
    }

    /// Mutable variant of [`Value::get_child`].
    pub fn get_child_mut(&mut self, name: &str) -> Option<&mut Value> {
        match self {
            Self::Object(map) => map.get_mut(name),
            Self::Array(list) => name.parse::<usize>().ok().and_then(|idx| list.get_mut(idx)),
            _ => None,
        }
    }

    /// Creates a child under `name` if it does not exist and returns a
    /// mutable reference to it.
    ///
    /// For objects an absent field is appended. For arrays, `name` must
    /// parse as an index; indexes past the current length pad the array with
    /// nulls, the same way the storage layer materializes sparse array
    /// writes. An existing child is returned untouched, so sibling writes
    /// descending through the same new element land in one place. Returns
    /// `None` if this value is a scalar or the array name is not numeric.
    pub fn create_child(&mut self, name: &str, value: Value) -> Option<&mut Value> {
        match self {
            Self::Object(map) => Some(map.entry(name.to_owned()).or_insert(value)),
            Self::Array(list) => {
                let idx = name.parse::<usize>().ok()?;
                if idx >= list.len() {
                    list.resize(idx + 1, Value::Null);
                    list[idx] = value;
                }
                Some(&mut list[idx])
            }
            _ => None,
        }
    }

    /// Removes the child under `name`.
    ///
    /// Removing an array element sets it to null rather than shifting later
    /// elements, so sibling indexes stay stable.
    pub fn remove_child(&mut self, name: &str) -> bool {
        match self {
            Self::Object(map) => map.shift_remove(name).is_some(),
            Self::Array(list) => match name.parse::<usize>() {
                Ok(idx) if idx < list.len() => {
                    list[idx] = Value::Null;
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Renders a short single-line description of this value for error
    /// messages, e.g. `{a: 5}` or `"abc"`.
    #[must_use]
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Array(list) => {
                write!(f, "[")?;
                for (i, v) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Self::Object(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n.as_i64().map_or_else(
                || Self::Double(n.as_f64().unwrap_or(f64::NAN)),
                Self::Int,
            ),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(list) => {
                Self::Array(list.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
