use crate::{
    db::store::StorageValue,
    schema::{AppType, ColumnKind, ColumnMeta},
    types::{Date, DateTime},
    value::{Value, ValueKind},
};
use thiserror::Error as ThisError;

///
/// TransformError
/// per-call value/column binding failures; recoverable
///

#[derive(Debug, ThisError)]
pub enum TransformError {
    #[error("column '{column}': expected a {expected} value, found {found}")]
    TypeMismatch {
        column: String,
        expected: AppType,
        found: ValueKind,
    },

    #[error("column '{column}': stored value has kind {found}, expected {expected}")]
    StoredKindMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("column '{column}': malformed stored temporal text '{text}'")]
    MalformedStored { column: String, text: String },

    #[error("column '{column}': '{value}' has no canonical stored form at this column's resolution")]
    OutOfRange { column: String, value: String },

    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },
}

/// Encode one application value into its canonical stored form.
///
/// `Null` passes through for every kind; nullability is the store's
/// concern. Anything else must match the column's declared application
/// type exactly, with no coercion. Temporal values encode to canonical
/// text: `YYYY-MM-DD` for date storage, `YYYY-MM-DD HH:MM:SS` with
/// exactly the declared number of fractional digits (truncated, never
/// rounded) for datetime storage. Text over date storage is a verbatim
/// string and is never reinterpreted as a temporal value.
pub fn to_storage(column: &ColumnMeta, value: &Value) -> Result<StorageValue, TransformError> {
    if !value.is_null() && !column.application_type().matches(value) {
        return Err(TransformError::TypeMismatch {
            column: column.name().to_string(),
            expected: column.application_type(),
            found: value.kind(),
        });
    }

    let stored = match value {
        Value::Null => StorageValue::Null,
        Value::Bool(b) => StorageValue::Bool(*b),
        Value::Int(i) => StorageValue::Int(*i),
        Value::Uint(u) => StorageValue::Uint(*u),
        Value::Text(s) => StorageValue::Text(s.clone()),
        Value::Date(d) => StorageValue::Text(d.to_string()),
        Value::DateTime(dt) => match column.kind() {
            ColumnKind::Date => {
                let day = dt.date();
                // The stored day must hydrate back through its midnight.
                if day.midnight().is_none() {
                    return Err(out_of_range(column, day));
                }
                StorageValue::Text(day.to_string())
            }
            ColumnKind::DateTime { precision } => match dt.truncate_checked(precision) {
                Some(floored) => StorageValue::Text(floored.format_with_precision(precision)),
                None => return Err(out_of_range(column, dt)),
            },
            _ => {
                return Err(TransformError::TypeMismatch {
                    column: column.name().to_string(),
                    expected: column.application_type(),
                    found: value.kind(),
                });
            }
        },
    };

    Ok(stored)
}

/// Decode one stored value back into the column's declared application
/// shape. Decoding an encoded value is canonical: re-encoding the result
/// yields the same stored form.
pub fn from_storage(column: &ColumnMeta, stored: &StorageValue) -> Result<Value, TransformError> {
    if stored.is_null() {
        return Ok(Value::Null);
    }

    let value = match column.application_type() {
        AppType::Bool => Value::Bool(expect_bool(column, stored)?),
        AppType::Int => Value::Int(expect_int(column, stored)?),
        AppType::Uint => Value::Uint(expect_uint(column, stored)?),
        // Covers text storage and string-typed date columns alike: the
        // stored text comes back verbatim.
        AppType::Text => Value::Text(expect_text(column, stored)?.to_string()),
        AppType::Date => Value::Date(parse_date(column, expect_text(column, stored)?)?),
        AppType::DateTime => {
            let text = expect_text(column, stored)?;
            match column.kind() {
                ColumnKind::Date => {
                    let date = parse_date(column, text)?;
                    let midnight = date.midnight().ok_or_else(|| out_of_range(column, date))?;
                    Value::DateTime(midnight)
                }
                _ => Value::DateTime(parse_datetime(column, text)?),
            }
        }
    };

    Ok(value)
}

// ---- helpers -----------------------------------------------------------

fn expect_text<'a>(
    column: &ColumnMeta,
    stored: &'a StorageValue,
) -> Result<&'a str, TransformError> {
    stored
        .as_text()
        .ok_or_else(|| stored_kind_mismatch(column, "text", stored))
}

fn expect_bool(column: &ColumnMeta, stored: &StorageValue) -> Result<bool, TransformError> {
    match stored {
        StorageValue::Bool(b) => Ok(*b),
        _ => Err(stored_kind_mismatch(column, "bool", stored)),
    }
}

fn expect_int(column: &ColumnMeta, stored: &StorageValue) -> Result<i64, TransformError> {
    match stored {
        StorageValue::Int(i) => Ok(*i),
        _ => Err(stored_kind_mismatch(column, "int", stored)),
    }
}

fn expect_uint(column: &ColumnMeta, stored: &StorageValue) -> Result<u64, TransformError> {
    match stored {
        StorageValue::Uint(u) => Ok(*u),
        _ => Err(stored_kind_mismatch(column, "uint", stored)),
    }
}

fn parse_date(column: &ColumnMeta, text: &str) -> Result<Date, TransformError> {
    Date::parse(text).ok_or_else(|| malformed(column, text))
}

fn parse_datetime(column: &ColumnMeta, text: &str) -> Result<DateTime, TransformError> {
    DateTime::parse(text).ok_or_else(|| malformed(column, text))
}

fn stored_kind_mismatch(
    column: &ColumnMeta,
    expected: &'static str,
    stored: &StorageValue,
) -> TransformError {
    TransformError::StoredKindMismatch {
        column: column.name().to_string(),
        expected,
        found: stored.kind_name(),
    }
}

fn malformed(column: &ColumnMeta, text: &str) -> TransformError {
    TransformError::MalformedStored {
        column: column.name().to_string(),
        text: text.to_string(),
    }
}

fn out_of_range(column: &ColumnMeta, value: impl std::fmt::Display) -> TransformError {
    TransformError::OutOfRange {
        column: column.name().to_string(),
        value: value.to_string(),
    }
}

///
/// TESTS
///
