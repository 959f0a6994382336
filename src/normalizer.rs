//! Field normalization
//!
//! Every raw row from every table passes through here before any canonical
//! field is read:
//! - Keys trimmed and lower-cased so bilingual/case-varying headers line up
//! - Values left untouched
//! - Alias lookup and value coercion with total fallbacks

use serde_json::{Map, Value};

use crate::schema::{Field, RawRow};

/// Normalizer for spreadsheet rows
pub struct Normalizer;

impl Normalizer {
    /// Trim and lower-case every key. Values are unchanged.
    ///
    /// When two raw keys collapse onto the same normalized key, the one
    /// visited last wins.
    pub fn normalize(row: &RawRow) -> NormalizedRow {
        let mut keys = Map::new();
        for (key, value) in row {
            keys.insert(key.trim().to_lowercase(), value.clone());
        }
        NormalizedRow(keys)
    }
}

/// A row whose keys are trimmed and lower-cased
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRow(Map<String, Value>);

impl NormalizedRow {
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_raw(self) -> RawRow {
        self.0
    }

    /// First present value among the field's aliases.
    ///
    /// `null` and blank strings count as absent, so a blank primary column
    /// falls through to its localized alias.
    pub fn get(&self, field: Field) -> Option<&Value> {
        field
            .aliases()
            .iter()
            .filter_map(|alias| self.0.get(*alias))
            .find(|value| is_present(value))
    }

    /// Trimmed text of the field, if present
    pub fn text(&self, field: Field) -> Option<String> {
        self.get(field)
            .and_then(value_text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    }

    /// Trimmed text of the field, or `default`
    pub fn text_or(&self, field: Field, default: &str) -> String {
        self.text(field).unwrap_or_else(|| default.to_string())
    }

    /// Counter-like value: every character other than digits and `.` is
    /// stripped before parsing. Unparseable values collapse to 0.
    pub fn counter(&self, field: Field) -> u32 {
        self.get(field).map(clean_counter).unwrap_or(0)
    }

    /// Plain non-negative number, 0 when absent or unparseable
    pub fn number(&self, field: Field) -> f64 {
        let parsed = match self.get(field) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|n| n.is_finite() && *n >= 0.0)
            .unwrap_or(0.0)
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Render a cell as text the way the sheet shows it
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn clean_counter(value: &Value) -> u32 {
    let Some(text) = value_text(value) else {
        return 0;
    };
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    match digits.parse::<f64>() {
        // Fractional learning units are truncated
        Ok(n) if n.is_finite() && n >= 0.0 => n.min(u32::MAX as f64) as u32,
        _ => 0,
    }
}
