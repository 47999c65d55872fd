//! Dynamic Values
//!
//! `Value` is the payload type carried by every tuple field. It is a closed
//! tagged union: words, numbers, ordered lists, string-keyed maps and raw
//! binary blobs, nested to any depth. `Null` stands for an absent or empty
//! value and is what reading a missing tuple key yields.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Shared empty value returned for missing keys
pub(crate) static NULL: Value = Value::Null;

/// Tagged dynamic value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Absent / empty value
    #[default]
    Null,
    /// UTF-8 word or string
    Word(String),
    /// Numeric value (integers are stored exactly up to 2^53)
    Number(f64),
    /// Ordered list of values
    List(Vec<Value>),
    /// Map with unique string keys
    Map(BTreeMap<String, Value>),
    /// Raw binary blob
    Binary(Vec<u8>),
}

impl Value {
    /// Create an empty list value
    pub fn list() -> Self {
        Value::List(Vec::new())
    }

    /// Create an empty map value
    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Create a binary value from raw bytes
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Binary(bytes.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Value::Binary(_))
    }

    /// Word contents, if this is a word
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Word(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Raw bytes of a word or binary blob
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Word(s) => Some(s.as_bytes()),
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// True for the number 1, the success marker used by responders
    pub fn is_truthy(&self) -> bool {
        matches!(self, Value::Number(n) if *n == 1.0)
    }

    /// Does this value contain `key`?
    ///
    /// For lists this is membership of the word `key`; for maps it is key
    /// presence. Any other variant contains nothing.
    pub fn has_value(&self, key: &str) -> bool {
        match self {
            Value::List(items) => items.iter().any(|item| item.as_str() == Some(key)),
            Value::Map(entries) => entries.contains_key(key),
            _ => false,
        }
    }

    /// Look up a map entry, yielding `Null` when missing or not a map
    pub fn get(&self, key: &str) -> &Value {
        match self {
            Value::Map(entries) => entries.get(key).unwrap_or(&NULL),
            _ => &NULL,
        }
    }

    /// Mutable map entry, converting this value into a map if needed
    pub fn entry(&mut self, key: impl Into<String>) -> &mut Value {
        if !matches!(self, Value::Map(_)) {
            *self = Value::map();
        }
        match self {
            Value::Map(entries) => entries.entry(key.into()).or_default(),
            _ => unreachable!("value was converted to a map above"),
        }
    }

    /// Append to a list, converting this value into a list if needed
    pub fn push(&mut self, value: impl Into<Value>) {
        match self {
            Value::List(items) => items.push(value.into()),
            _ => *self = Value::List(vec![value.into()]),
        }
    }

    /// Scalar rendering used by log summaries
    ///
    /// Integral numbers print without a fractional part; non-scalars render
    /// as an empty string.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Word(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            _ => String::new(),
        }
    }

    /// Indented recursive dump
    pub fn dump(&self, indent: usize) -> String {
        let pad = " ".repeat(indent);
        match self {
            Value::Null => "(null)\n".to_string(),
            Value::Word(s) => format!("{}\n", s),
            Value::Number(n) => format!("{}\n", format_number(*n)),
            Value::Binary(b) => format!("{}\n", hex::encode(b)),
            Value::List(items) => {
                let mut out = String::new();
                for item in items {
                    out.push_str(&pad);
                    out.push_str("- ");
                    if matches!(item, Value::List(_) | Value::Map(_)) {
                        out.push('\n');
                    }
                    out.push_str(&item.dump(indent + 4));
                }
                out
            }
            Value::Map(entries) => {
                let mut out = String::new();
                for (key, item) in entries {
                    out.push_str(&pad);
                    out.push_str(key);
                    out.push(':');
                    if matches!(item, Value::List(_) | Value::Map(_)) {
                        out.push('\n');
                    } else {
                        out.push(' ');
                    }
                    out.push_str(&item.dump(indent + 4));
                }
                out
            }
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// Words and binary blobs share a representation on the wire, so they compare
// by bytes.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (
                Value::Word(_) | Value::Binary(_),
                Value::Word(_) | Value::Binary(_),
            ) => self.as_bytes() == other.as_bytes(),
            _ => false,
        }
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Word(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, item)?;
                }
                write!(f, "}}")
            }
            Value::Binary(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Word(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Word(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Word(s.clone())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Number(if b { 1.0 } else { 0.0 })
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::List(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(feature = "serialization")]
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::from(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or_default()),
            serde_json::Value::String(s) => Value::Word(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(key, item)| (key, Value::from(item)))
                    .collect(),
            ),
        }
    }
}
