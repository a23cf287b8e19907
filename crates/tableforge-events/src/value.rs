//! Self-describing field values carried by events.
//!
//! Event payloads are open maps rather than fixed structs: a board tracker
//! grows new event kinds faster than a wire protocol should churn, so the
//! bus ships `name → Value` maps and each handler destructures only the
//! fields it cares about. [`Value`] is the recursive datum those maps hold.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The field map of an event: field name → [`Value`].
///
/// A `BTreeMap` so that encoding a given map is deterministic — two events
/// with equal fields serialize to identical bytes regardless of insertion
/// order.
pub type Fields = BTreeMap<String, Value>;

/// A single event field value.
///
/// Covers everything the board tracker puts on the wire: scalars, UTF-8
/// text, raw blobs (texture data from the resource cache), and nested
/// lists/maps.
///
/// `#[serde(untagged)]` means values serialize as their natural
/// representation (`42`, `"north"`, `[1, 2]`) with no enum wrapper.
/// Variant order matters for decoding: integers are tried before floats so
/// `3` comes back as `Int(3)`, and `List` is tried before `Bytes` — under a
/// self-describing codec like JSON a blob round-trips as a list of small
/// integers. Binary codecs with a native blob type keep `Bytes` intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// No value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point (tick deltas, durations).
    Float(f64),
    /// UTF-8 text.
    Str(String),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Raw byte blob.
    Bytes(Vec<u8>),
    /// Nested field map.
    Map(Fields),
}

impl Value {
    /// Returns the integer if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the float if this is a `Float` (or an `Int`, widened).
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Returns the string slice if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions — keep `fields!` call sites free of Value:: noise
// ---------------------------------------------------------------------------

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Fields> for Value {
    fn from(v: Fields) -> Self {
        Value::Map(v)
    }
}

/// Builds a [`Fields`] map from `key => value` pairs.
///
/// ```
/// use tableforge_events::{fields, Value};
///
/// let f = fields! { "pawn" => 7, "dir" => "north" };
/// assert_eq!(f["pawn"], Value::Int(7));
/// ```
#[macro_export]
macro_rules! fields {
    () => { $crate::Fields::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Fields::new();
        $( map.insert(String::from($key), $crate::Value::from($value)); )+
        map
    }};
}
