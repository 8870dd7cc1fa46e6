//! Record sides
//!
//! Every value entering a side goes through that side's default conversion:
//! side A keeps structured values as JSON text, side B keeps them native.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One of the two schemas a record can be expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl Side {
    /// The opposite side.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Apply the default conversion for values crossing into this side.
    ///
    /// Converting an already converted value returns it unchanged.
    #[must_use]
    pub fn convert(self, value: Value) -> Value {
        match self {
            Side::A => to_json_text(value),
            Side::B => from_json_text(value),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Side::A => "a",
            Side::B => "b",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(Side::A),
            "b" => Ok(Side::B),
            _ => Err(crate::Error::UnknownSide(s.to_string())),
        }
    }
}

fn to_json_text(value: Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => match serde_json::to_string(&value) {
            Ok(text) => Value::String(text),
            Err(_) => value,
        },
        other => other,
    }
}

fn from_json_text(value: Value) -> Value {
    match value {
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(parsed) => parsed,
            // Not JSON: the string is the value.
            Err(_) => Value::String(text),
        },
        other => other,
    }
}
