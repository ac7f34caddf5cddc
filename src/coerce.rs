//! Input normalization run just before the handler.
//!
//! Only `type: string` parameters are touched:
//! - `format: date` / `date-time` become [`FieldValue::Timestamp`]
//! - `format: json` strings are parsed; with `x-strut-schema` an object's keys
//!   are merged into the field set instead
//!
//! Absent and null fields are skipped.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde_json::Value;
use std::fmt;

use crate::context::{FieldValue, Fields};
use crate::spec::ParameterSpec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoerceError {
    InvalidDate {
        field: String,
        format: String,
        value: String,
    },
    InvalidJson {
        field: String,
        reason: String,
    },
}

impl fmt::Display for CoerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoerceError::InvalidDate {
                field,
                format,
                value,
            } => write!(f, "Field '{field}' is not a valid {format}: {value}"),
            CoerceError::InvalidJson { field, reason } => {
                write!(f, "Field '{field}' is not valid JSON: {reason}")
            }
        }
    }
}

impl std::error::Error for CoerceError {}

fn parse_date_str(format: &str, s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts);
    }
    if format != "date" {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().fixed_offset())
}

/// Strings per `format`; integers are epoch milliseconds.
fn parse_timestamp(format: &str, value: &Value) -> Option<DateTime<FixedOffset>> {
    match value {
        Value::String(s) => parse_date_str(format, s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.fixed_offset()),
        _ => None,
    }
}

/// Normalize `fields` in place according to the declared parameters.
pub fn coerce_fields(params: &[ParameterSpec], fields: &mut Fields) -> Result<(), CoerceError> {
    for param in params {
        if param.param_type.as_deref() != Some("string") {
            continue;
        }
        let Some(format) = param.format.as_deref() else {
            continue;
        };
        let Some(current) = fields.get(&param.name) else {
            continue;
        };
        if current.is_null() {
            continue;
        }
        let FieldValue::Json(raw) = current else {
            // already a timestamp
            continue;
        };

        match format {
            "date" | "date-time" => {
                let ts = parse_timestamp(format, raw).ok_or_else(|| CoerceError::InvalidDate {
                    field: param.name.clone(),
                    format: format.to_string(),
                    value: raw.to_string(),
                })?;
                fields.insert(param.name.clone(), FieldValue::Timestamp(ts));
            }
            "json" => {
                let Value::String(text) = raw else {
                    continue;
                };
                let parsed: Value =
                    serde_json::from_str(text).map_err(|e| CoerceError::InvalidJson {
                        field: param.name.clone(),
                        reason: e.to_string(),
                    })?;
                match parsed {
                    Value::Object(map) if param.expands_inline() => {
                        for (k, v) in map {
                            fields.insert(k, FieldValue::Json(v));
                        }
                    }
                    other => {
                        fields.insert(param.name.clone(), FieldValue::Json(other));
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}
