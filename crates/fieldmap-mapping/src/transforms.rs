//! Transform registry
//!
//! Declarations reference transforms by name; the registry resolves those
//! names to pure value functions when a record is mapped.

use chrono::NaiveDateTime;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::declaration::TransformRef;

/// Type alias for a registered transform function
pub type TransformFn = Arc<dyn Fn(&Value) -> crate::Result<Value> + Send + Sync>;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
const ISO_PREFIX_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Named transform functions available to declarations
#[derive(Clone, Default)]
pub struct TransformRegistry {
    functions: HashMap<String, TransformFn>,
}

impl TransformRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in transforms
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register("identity", |value| Ok(value.clone()))
            .register("parse_int", parse_int)
            .register("to_string", to_string)
            .register("trim", |value| map_str(value, |s| s.trim().to_string()))
            .register("uppercase", |value| map_str(value, str::to_uppercase))
            .register("lowercase", |value| map_str(value, str::to_lowercase))
            .register("iso_to_datetime", iso_to_datetime)
            .register("datetime_to_iso", datetime_to_iso);
        registry
    }

    /// Register a transform, replacing any previous one with the same name
    pub fn register(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&Value) -> crate::Result<Value> + Send + Sync + 'static,
    ) -> &mut Self {
        self.functions.insert(name.into(), Arc::new(func));
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<TransformFn> {
        self.functions.get(name).cloned()
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Apply the referenced transforms in order
    ///
    /// # Errors
    ///
    /// Returns an error if a name is not registered or a transform fails.
    pub fn apply(&self, transform: &TransformRef, value: Value) -> crate::Result<Value> {
        transform.names().iter().try_fold(value, |current, name| {
            let func = self
                .get(name)
                .ok_or_else(|| crate::Error::UnknownTransform(name.clone()))?;
            func(&current)
        })
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

fn map_str(value: &Value, f: impl Fn(&str) -> String) -> crate::Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(f(s))),
        other => Ok(other.clone()),
    }
}

/// Parse the leading integer of a string; other values pass through
///
/// # Errors
///
/// Returns an error if the string does not start with an integer.
pub fn parse_int(value: &Value) -> crate::Result<Value> {
    let Value::String(s) = value else {
        return Ok(value.clone());
    };

    let trimmed = s.trim();
    let digits_end = trimmed
        .char_indices()
        .find(|&(index, ch)| !(ch.is_ascii_digit() || (index == 0 && matches!(ch, '+' | '-'))))
        .map_or(trimmed.len(), |(index, _)| index);

    trimmed[..digits_end]
        .parse::<i64>()
        .map(Value::from)
        .map_err(|_| crate::Error::Transform(format!("Cannot parse '{s}' as integer")))
}

/// Render numbers and booleans as text
///
/// # Errors
///
/// This function currently does not return an error.
pub fn to_string(value: &Value) -> crate::Result<Value> {
    match value {
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        other => Ok(other.clone()),
    }
}

/// `2018-02-09T12:44:26.000Z` to `2018-02-09 12:44:26`
///
/// The wall-clock time is kept as written; fractional seconds and any zone
/// suffix are dropped.
///
/// # Errors
///
/// Returns an error if the string does not start with `YYYY-MM-DDTHH:MM:SS`.
pub fn iso_to_datetime(value: &Value) -> crate::Result<Value> {
    let Value::String(s) = value else {
        return Ok(value.clone());
    };

    let (parsed, _suffix) = NaiveDateTime::parse_and_remainder(s, ISO_PREFIX_FORMAT)
        .map_err(|e| crate::Error::Transform(format!("Invalid ISO timestamp '{s}': {e}")))?;

    Ok(Value::String(parsed.format(DATETIME_FORMAT).to_string()))
}

/// `2018-02-09 12:44:26` to `2018-02-09T12:44:26.000Z`
///
/// # Errors
///
/// Returns an error if the string is not a `YYYY-MM-DD HH:MM:SS` datetime.
pub fn datetime_to_iso(value: &Value) -> crate::Result<Value> {
    let Value::String(s) = value else {
        return Ok(value.clone());
    };

    let parsed = NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map_err(|e| crate::Error::Transform(format!("Invalid datetime '{s}': {e}")))?;

    Ok(Value::String(parsed.format(ISO_FORMAT).to_string()))
}
