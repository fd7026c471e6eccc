use chrono::{DateTime, Utc};

use crate::measure::{Field, FieldValue, MeasurementEvent};

/// Number of leading name segments that identify the registration rather
/// than the metric itself.
pub const STRIPPED_SEGMENTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardUnit {
    Milliseconds,
}

impl StandardUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            StandardUnit::Milliseconds => "Milliseconds",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

/// One backend-ingestible data point.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
    pub value: f64,
    pub unit: Option<StandardUnit>,
    pub timestamp: DateTime<Utc>,
}

/// Drop up to `n` leading dot-separated segments from `name`.
///
/// A segment is only removed when a `.` follows a non-empty segment, so
/// `"a"` and `".a"` come back unchanged.
pub fn strip_prefix(name: &str, n: usize) -> &str {
    let mut rest = name;
    for _ in 0..n {
        match rest.find('.') {
            Some(i) if i > 0 => rest = &rest[i + 1..],
            _ => break,
        }
    }
    rest
}

pub fn metric_name(prefix: &str, field: &Field) -> String {
    if prefix.is_empty() {
        field.name.clone()
    } else {
        format!("{prefix}.{}", field.name)
    }
}

pub fn field_value(value: &FieldValue) -> (f64, Option<StandardUnit>) {
    match *value {
        FieldValue::Null => (0.0, None),
        FieldValue::Bool(b) => (if b { 1.0 } else { 0.0 }, None),
        FieldValue::Int(v) => (v as f64, None),
        FieldValue::Uint(v) => (v as f64, None),
        FieldValue::Float(v) => (v, None),
        FieldValue::Duration(d) => (d.as_millis() as f64, Some(StandardUnit::Milliseconds)),
    }
}

/// Translate every field of every event into a datum stamped with `timestamp`,
/// in event order then field order.
pub fn make_data(timestamp: DateTime<Utc>, events: &[MeasurementEvent]) -> Vec<Datum> {
    let mut data = Vec::with_capacity(events.iter().map(|e| e.fields.len()).sum());

    for event in events {
        let dimensions: Vec<Dimension> = event
            .tags
            .iter()
            .map(|tag| Dimension {
                name: tag.name.clone(),
                value: tag.value.clone(),
            })
            .collect();

        let prefix = strip_prefix(&event.name, STRIPPED_SEGMENTS);
        for field in &event.fields {
            let metric_name = metric_name(prefix, field);
            let (value, unit) = field_value(&field.value);
            tracing::debug!(
                source = %event.name,
                metric = %metric_name,
                value,
                "translated field"
            );
            data.push(Datum {
                metric_name,
                dimensions: dimensions.clone(),
                value,
                unit,
                timestamp,
            });
        }
    }

    data
}
