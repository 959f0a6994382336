//! Fetch-all body decoding
//!
//! The store answers with `{ dogs?: Row[], trainers?: Row[], sessions?: Row[] }`.
//! A missing or non-array table is an empty table; array elements that are
//! not objects are skipped.

use serde::Serialize;
use serde_json::Value;

use super::RawRow;

/// The three tables returned by the store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SheetPayload {
    pub dogs: Vec<RawRow>,
    pub trainers: Vec<RawRow>,
    pub sessions: Vec<RawRow>,
}

impl SheetPayload {
    /// Parse a fetch-all body. Only invalid JSON is an error.
    pub fn from_json(raw_json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(raw_json)?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        Self {
            dogs: table(value, "dogs"),
            trainers: table(value, "trainers"),
            sessions: table(value, "sessions"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dogs.is_empty() && self.trainers.is_empty() && self.sessions.is_empty()
    }
}

fn table(value: &Value, key: &str) -> Vec<RawRow> {
    match value.get(key) {
        Some(Value::Array(rows)) => rows
            .iter()
            .filter_map(|row| row.as_object().cloned())
            .collect(),
        _ => Vec::new(),
    }
}
