use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::measure::{Field, FieldValue, MeasurementEvent, Tag};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("malformed measurement: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("measurement name is empty")]
    EmptyName,

    #[error("measurement is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

#[derive(Deserialize)]
struct RawEvent {
    name: String,
    #[serde(default)]
    tags: Vec<(String, String)>,
    #[serde(default)]
    fields: Vec<RawField>,
}

#[derive(Deserialize)]
struct RawField {
    name: String,
    value: RawValue,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    DurationMs(u64),
}

impl From<RawValue> for FieldValue {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::Null => FieldValue::Null,
            RawValue::Bool(v) => FieldValue::Bool(v),
            RawValue::Int(v) => FieldValue::Int(v),
            RawValue::Uint(v) => FieldValue::Uint(v),
            RawValue::Float(v) => FieldValue::Float(v),
            RawValue::DurationMs(ms) => FieldValue::Duration(Duration::from_millis(ms)),
        }
    }
}

/// Decode a raw input line, `Ok(None)` when it holds only whitespace.
pub fn parse_line(bytes: &[u8]) -> Result<Option<MeasurementEvent>, InputError> {
    let line = std::str::from_utf8(bytes)?;
    if line.trim().is_empty() {
        return Ok(None);
    }
    parse_event(line).map(Some)
}

/// Parse one line of newline-delimited JSON into a measurement event.
pub fn parse_event(line: &str) -> Result<MeasurementEvent, InputError> {
    let raw: RawEvent = serde_json::from_str(line)?;
    if raw.name.is_empty() {
        return Err(InputError::EmptyName);
    }

    Ok(MeasurementEvent {
        name: raw.name,
        tags: raw
            .tags
            .into_iter()
            .map(|(name, value)| Tag { name, value })
            .collect(),
        fields: raw
            .fields
            .into_iter()
            .map(|f| Field {
                name: f.name,
                value: f.value.into(),
            })
            .collect(),
    })
}
