//! Tuple envelope
//!
//! A `Tuple` is one message: a map from key to [`Value`]. The envelope keys in
//! [`keys::ENVELOPE`] address the message; everything else is payload.

use crate::envelope::{keys, types};
use crate::value::{Value, NULL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use thiserror::Error;

/// Errors building a tuple from external input
#[derive(Debug, Error)]
pub enum TupleError {
    /// Input parsed but was not a key/value object
    #[error("Tuple must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },

    #[cfg(feature = "serialization")]
    #[error("Invalid tuple JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One message flowing through the tuple space
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tuple {
    values: BTreeMap<String, Value>,
}

impl Tuple {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tuple with only its `type` set
    pub fn of_type(tuple_type: &str) -> Self {
        Self::new().with(keys::TYPE, tuple_type)
    }

    /// Value for `key`, or `Null` when missing
    pub fn get(&self, key: &str) -> &Value {
        self.values.get(key).unwrap_or(&NULL)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.values.get_mut(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder form of [`Tuple::set`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn has_value(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn word(&self, key: &str) -> &str {
        self.get(key).as_str().unwrap_or("")
    }

    pub fn tuple_type(&self) -> &str {
        self.word(keys::TYPE)
    }

    pub fn source_actor(&self) -> &str {
        self.word(keys::SOURCE_ACTOR)
    }

    pub fn source_id(&self) -> &str {
        self.word(keys::SOURCE_ID)
    }

    pub fn destination_actor(&self) -> &str {
        self.word(keys::DESTINATION_ACTOR)
    }

    pub fn destination_id(&self) -> &str {
        self.word(keys::DESTINATION_ID)
    }

    pub fn set_tuple_type(&mut self, value: &str) {
        self.set(keys::TYPE, value);
    }

    pub fn set_source_actor(&mut self, value: &str) {
        self.set(keys::SOURCE_ACTOR, value);
    }

    pub fn set_source_id(&mut self, value: &str) {
        self.set(keys::SOURCE_ID, value);
    }

    pub fn set_destination_actor(&mut self, value: &str) {
        self.set(keys::DESTINATION_ACTOR, value);
    }

    pub fn set_destination_id(&mut self, value: &str) {
        self.set(keys::DESTINATION_ID, value);
    }

    /// Is this a subscription control tuple?
    pub fn is_control(&self) -> bool {
        self.tuple_type() == types::ROUTING_CRITERIA
    }

    /// One-line summary for traffic logs
    ///
    /// Prints the type followed by `key:value` for each scalar payload entry.
    /// Lists print as `[]`, maps as `{}`, the `data` blob as `(data)` and the
    /// sealing key as `***`.
    pub fn brief(&self) -> String {
        let mut out = String::from(self.tuple_type());
        for (key, value) in &self.values {
            if keys::ENVELOPE.contains(&key.as_str()) {
                continue;
            }
            out.push(' ');
            out.push_str(key);
            out.push(':');
            match (key.as_str(), value) {
                (keys::DATA, _) => out.push_str("(data)"),
                (keys::SEALING_KEY, _) => out.push_str("***"),
                (_, Value::List(_)) => out.push_str("[]"),
                (_, Value::Map(_)) => out.push_str("{}"),
                (_, Value::Binary(b)) => out.push_str(&format!("<{} bytes>", b.len())),
                (_, other) => out.push_str(&other.to_display_string()),
            }
        }
        out
    }

    /// Multi-line dump, envelope first
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let envelope = keys::ENVELOPE
            .iter()
            .filter_map(|key| self.values.get_key_value(*key));
        let payload = self
            .values
            .iter()
            .filter(|(key, _)| !keys::ENVELOPE.contains(&key.as_str()));

        for (key, value) in envelope.chain(payload) {
            out.push_str(key);
            out.push(':');
            match (key.as_str(), value) {
                (keys::SEALING_KEY, _) => out.push_str(" ***\n"),
                (keys::DATA, Value::Word(s)) => {
                    out.push(' ');
                    out.push_str(&hex::encode(s.as_bytes()));
                    out.push('\n');
                }
                (_, Value::List(_) | Value::Map(_)) => {
                    out.push('\n');
                    out.push_str(&value.dump(4));
                }
                _ => {
                    out.push(' ');
                    out.push_str(&value.dump(4));
                }
            }
        }
        out
    }

    /// Build a tuple from a JSON object string
    #[cfg(feature = "serialization")]
    pub fn from_json_str(input: &str) -> Result<Self, TupleError> {
        let json: serde_json::Value = serde_json::from_str(input)?;
        Self::from_json(json)
    }

    /// Build a tuple from a parsed JSON object
    #[cfg(feature = "serialization")]
    pub fn from_json(json: serde_json::Value) -> Result<Self, TupleError> {
        match json {
            serde_json::Value::Object(entries) => Ok(Self {
                values: entries
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            }),
            other => Err(TupleError::NotAnObject {
                found: json_kind(&other),
            }),
        }
    }
}

#[cfg(feature = "serialization")]
fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl Index<&str> for Tuple {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.get(key)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.brief())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Tuple {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
